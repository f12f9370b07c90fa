// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolver state and the request pipeline
//!
//! A request goes through:
//!
//! 1. the [`RequestFilter`] (no side effects for names it rejects)
//! 2. the negative cache
//! 3. lazy discovery of the candidate directory and its name map
//! 4. the [`StrategyChain`]
//! 5. [`load_and_validate`] through the host load context
//!
//! Every failure is classified, logged and turned into `None` by
//! [`ResolverState::resolve`].

mod chain;
mod loader;
mod negative;
mod stats;

pub use chain::{Resolution, StrategyChain};
pub use loader::load_and_validate;
pub use negative::NegativeCache;
pub use stats::{ResolutionStats, StatsSnapshot, Strategy};

use crate::alias::AliasTable;
use crate::config::ResolverConfig;
use crate::discovery::DirectoryLocator;
use crate::error::{ConfigError, ResolveError, Result};
use crate::filter::RequestFilter;
use crate::host::{LoadContext, ModuleHandle, ModuleRequest};
use crate::metadata::{MetadataScanner, NameMap};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of the last discovery pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// Discovery has not run yet
    Pending,
    /// Candidate directory found and scanned
    Ready,
    /// Candidate directory missing; every request is declined
    Degraded,
}

/// Candidate directory plus the map scanned from it. Immutable once
/// published; a rebuild replaces it wholesale.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Candidate directory, if it exists
    pub directory: Option<PathBuf>,
    /// Name map scanned from the directory
    pub map: NameMap,
    /// Number of readable modules in the directory
    pub modules: usize,
    /// Locations probed when the directory was not found
    pub searched: usize,
}

/// A successful redirection, kept for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModule {
    /// Name as first requested
    pub name: String,
    /// File it was loaded from
    pub path: PathBuf,
    /// Strategy that found it
    pub strategy: Strategy,
}

/// All state behind the resolution hook and the identity bypass
pub struct ResolverState {
    config: ResolverConfig,
    filter: RequestFilter,
    aliases: AliasTable,
    locator: DirectoryLocator,
    scanner: MetadataScanner,
    context: Arc<dyn LoadContext>,
    /// Published discovery; `None` until the first filtered request
    discovery: RwLock<Option<Arc<Discovery>>>,
    /// Serializes discovery builds
    build_lock: Mutex<()>,
    negative: NegativeCache,
    /// Lowercased name -> first successful redirection
    resolved: DashMap<String, ResolvedModule>,
    stats: ResolutionStats,
}

impl ResolverState {
    /// Create resolver state loading modules through `context`
    pub fn new(
        config: ResolverConfig,
        context: Arc<dyn LoadContext>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            filter: RequestFilter::with_extra_prefixes(config.extra_redirect_prefixes.clone()),
            aliases: AliasTable::with_extra(&config.aliases),
            locator: DirectoryLocator::from_config(&config),
            scanner: MetadataScanner::new(config.module_extension.clone()),
            negative: NegativeCache::new(config.negative_cache_capacity),
            context,
            discovery: RwLock::new(None),
            build_lock: Mutex::new(()),
            resolved: DashMap::new(),
            stats: ResolutionStats::new(),
            config,
        })
    }

    /// Effective configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The request filter
    pub fn filter(&self) -> &RequestFilter {
        &self.filter
    }

    /// The effective alias table
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// The negative cache
    pub fn negative_cache(&self) -> &NegativeCache {
        &self.negative
    }

    /// State of discovery, without triggering it
    pub fn readiness(&self) -> Readiness {
        match self.discovery.read().as_deref() {
            None => Readiness::Pending,
            Some(Discovery {
                directory: Some(_), ..
            }) => Readiness::Ready,
            Some(_) => Readiness::Degraded,
        }
    }

    /// Current discovery, building it on first use
    pub fn discovery(&self) -> Arc<Discovery> {
        if let Some(discovery) = self.discovery.read().as_ref() {
            return Arc::clone(discovery);
        }

        let _guard = self.build_lock.lock();
        if let Some(discovery) = self.discovery.read().as_ref() {
            return Arc::clone(discovery);
        }
        let built = Arc::new(self.build_discovery());
        *self.discovery.write() = Some(Arc::clone(&built));
        built
    }

    fn build_discovery(&self) -> Discovery {
        match self.locator.locate() {
            Ok(directory) => {
                let scan = self.scanner.scan(&directory);
                info!(
                    "Interop directory {} ready: {} modules, {} mappings",
                    directory.display(),
                    scan.modules.len(),
                    scan.map.len()
                );
                Discovery {
                    directory: Some(directory),
                    map: scan.map,
                    modules: scan.modules.len(),
                    searched: 0,
                }
            }
            Err(e) => {
                let searched = match e {
                    ResolveError::DirectoryUnavailable { searched } => searched,
                    _ => 0,
                };
                info!("{}; declining interop requests until dependencies are ready", e);
                Discovery {
                    searched,
                    ..Discovery::default()
                }
            }
        }
    }

    /// Discard the discovery and the negative cache and rediscover from
    /// scratch. Successful redirections are kept: the host still holds
    /// those modules.
    pub fn rearm(&self) -> Readiness {
        let guard = self.build_lock.lock();
        let built = Arc::new(self.build_discovery());
        {
            let mut slot = self.discovery.write();
            self.negative.clear();
            *slot = Some(built);
        }
        drop(guard);
        self.readiness()
    }

    /// Discard the discovery and negative cache; the next request rebuilds
    pub fn reset(&self) {
        let _guard = self.build_lock.lock();
        let mut slot = self.discovery.write();
        self.negative.clear();
        *slot = None;
    }

    /// Handle a failed host resolution. Never fails: anything that goes
    /// wrong is logged and the request is declined.
    pub fn resolve(&self, request: &ModuleRequest) -> Option<ModuleHandle> {
        // Hot path for every framework and mod module; must not allocate
        if !self.filter.accepts(&request.name) {
            return None;
        }
        match self.try_resolve(request) {
            Ok(handle) => Some(handle),
            Err(ResolveError::NotApplicable) => None,
            Err(e @ ResolveError::LoadFailure { .. })
            | Err(e @ ResolveError::ValidationMismatch { .. }) => {
                warn!("{}", e);
                None
            }
            // DirectoryUnavailable lands here on every request while degraded;
            // build_discovery already reported it once at info
            Err(e) => {
                debug!("Declining '{}': {}", request.name, e);
                None
            }
        }
    }

    /// Run the pipeline, reporting why a request was declined
    pub fn try_resolve(&self, request: &ModuleRequest) -> Result<ModuleHandle> {
        let name = request.name.as_str();
        if !self.filter.accepts(name) {
            return Err(ResolveError::NotApplicable);
        }

        self.stats.inc_attempt();
        let result = self.resolve_filtered(name);
        if let Err(e) = &result {
            self.stats.inc_failure();
            match e {
                ResolveError::LoadFailure { .. } => self.stats.inc_bad_file(),
                ResolveError::ValidationMismatch { .. } => self.stats.inc_mismatch(),
                _ => {}
            }
        }
        result
    }

    fn resolve_filtered(&self, name: &str) -> Result<ModuleHandle> {
        if self.negative.contains(name) {
            self.stats.inc_negative_hit();
            return Err(ResolveError::module_not_found(name));
        }

        let discovery = self.discovery();
        let Some(directory) = discovery.directory.as_deref() else {
            return Err(ResolveError::DirectoryUnavailable {
                searched: discovery.searched,
            });
        };

        let chain = StrategyChain::new(
            directory,
            &self.config.module_extension,
            &discovery.map,
            &self.aliases,
            &self.stats,
        );
        let Some(resolution) = chain.resolve(name) else {
            self.remember_failure(name, &discovery);
            return Err(ResolveError::module_not_found(name));
        };

        let handle = load_and_validate(self.context.as_ref(), name, &resolution.path)
            .inspect_err(|e| {
                if e.is_cacheable() {
                    self.remember_failure(name, &discovery);
                }
            })?;

        self.register_success(name, &resolution);
        self.stats.record_success(resolution.strategy);
        debug!(
            "Redirected '{}' to {} ({})",
            name,
            resolution.path.display(),
            resolution.strategy
        );
        Ok(handle)
    }

    /// Negative-cache `name` unless the discovery it failed against has been
    /// replaced meanwhile. Rebuilds clear the cache while holding the write
    /// lock, so the check and the insert cannot straddle one.
    fn remember_failure(&self, name: &str, seen: &Arc<Discovery>) {
        let current = self.discovery.read();
        if current.as_ref().is_some_and(|d| Arc::ptr_eq(d, seen)) {
            self.negative.insert(name);
        } else {
            debug!("Discovery replaced while resolving '{}'; not caching the failure", name);
        }
    }

    /// Record the first success for a name; later successes leave it as is
    fn register_success(&self, name: &str, resolution: &Resolution) {
        self.resolved
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| ResolvedModule {
                name: name.to_string(),
                path: resolution.path.clone(),
                strategy: resolution.strategy,
            });
    }

    /// Whether `a` and `b` name the same module according to the discovered
    /// map or the alias table. Identical names are not aliases.
    pub fn recognizes_alias(&self, a: &str, b: &str) -> bool {
        if a.eq_ignore_ascii_case(b) {
            return false;
        }
        let discovered = self
            .discovery
            .read()
            .as_ref()
            .is_some_and(|discovery| discovery.map.links(a, b));
        discovered || self.aliases.links(a, b)
    }

    /// Successful redirections so far, sorted by name
    pub fn resolved_modules(&self) -> Vec<ResolvedModule> {
        let mut modules: Vec<_> = self.resolved.iter().map(|e| e.value().clone()).collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    /// Counters
    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    /// Snapshot of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Log the aggregate statistics and return them
    pub fn report(&self) -> StatsSnapshot {
        let snapshot = self.snapshot();
        info!("{}", snapshot);
        for module in self.resolved_modules() {
            debug!(
                "  {} -> {} ({})",
                module.name,
                module.path.display(),
                module.strategy
            );
        }
        snapshot
    }
}

impl std::fmt::Debug for ResolverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverState")
            .field("readiness", &self.readiness())
            .field("resolved", &self.resolved.len())
            .field("negative", &self.negative.len())
            .finish_non_exhaustive()
    }
}
