// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Header-only load context for dry runs
//!
//! Stands in for the host load context outside the game process: "loading" a
//! module reads its declared identity and remembers it, nothing is executed.

use crate::error::LoadError;
use crate::host::{HostModule, LoadContext, ModuleHandle, ModuleIdentity};
use crate::metadata::read_identity;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A module "loaded" by [`InspectionContext`]
#[derive(Debug, Clone)]
pub struct InspectedModule {
    identity: ModuleIdentity,
    location: PathBuf,
}

impl HostModule for InspectedModule {
    fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.location)
    }
}

/// Load context that only inspects headers
#[derive(Default)]
pub struct InspectionContext {
    /// Path -> module, so repeated loads return the same handle
    loaded: DashMap<PathBuf, ModuleHandle>,
}

impl InspectionContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct files loaded
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Whether nothing was loaded
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

impl LoadContext for InspectionContext {
    fn load_from_path(&self, path: &Path) -> Result<ModuleHandle, LoadError> {
        let location = path.canonicalize()?;
        if let Some(existing) = self.loaded.get(&location) {
            return Ok(Arc::clone(existing.value()));
        }

        let identity = read_identity(&location)?;
        let handle: ModuleHandle = Arc::new(InspectedModule {
            identity,
            location: location.clone(),
        });
        Ok(Arc::clone(
            self.loaded.entry(location).or_insert(handle).value(),
        ))
    }
}
