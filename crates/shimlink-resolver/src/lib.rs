// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # shimlink-resolver
//!
//! Lets two mod loaders share one game process by reconciling how each names
//! the generated interop modules mods call into.
//!
//! When the host runtime fails to resolve a module on its own, the
//! [`ResolutionHook`] decides whether the request is one of the
//! ambiguously-named interop modules, finds the file in the generated
//! directory, loads it through the host, and the [`IdentityBypass`] lets the
//! host accept it even though its declared name differs from the requested
//! one.
//!
//! - Filter: [`RequestFilter`] rejects runtime/loader modules with no side
//!   effects
//! - Strategies: direct file name, discovered name map, alias table
//! - Discovery: lazy, re-armed by the secondary loader's "dependency ready"
//!   signal
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use shimlink_resolver::{Coordinator, ResolverConfig, ResolverState};
//! use std::sync::Arc;
//!
//! let config = ResolverConfig::load(Some(plugin_dir))?;
//! let state = Arc::new(ResolverState::new(config, host.load_context())?);
//! let coordinator = Coordinator::new(state);
//!
//! // Earliest extension point: identity bypass only
//! coordinator.on_early_bootstrap(&host)?;
//! // After the host's own bootstrap loads: the resolution hook
//! coordinator.on_late_bootstrap(&host)?;
//! // Handed to the secondary loader, fired once its generator has run
//! let signal = coordinator.ready_signal();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alias;
pub mod bypass;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod hook;
pub mod host;
pub mod inspect;
pub mod lifecycle;
pub mod metadata;
pub mod resolver;

// Re-exports
pub use alias::{AliasTable, NameMapping, Provenance};
pub use bypass::IdentityBypass;
pub use config::ResolverConfig;
pub use discovery::DirectoryLocator;
pub use error::{
    ConfigError, ImageError, InterceptionUnavailable, LifecycleError, LoadError, ResolveError,
    Result,
};
pub use filter::RequestFilter;
pub use hook::ResolutionHook;
pub use host::{
    Host, HostModule, IdentityInterceptor, LoadContext, ModuleHandle, ModuleIdentity,
    ModuleRequest, ResolvingHandler, Verdict, Version,
};
pub use inspect::InspectionContext;
pub use lifecycle::{Coordinator, LifecycleState, ReadySignal};
pub use metadata::{MetadataScanner, NameMap, ScanResult, ScannedModule};
pub use resolver::{
    Readiness, ResolvedModule, ResolverState, StatsSnapshot, Strategy,
};

/// Version of the resolver
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
