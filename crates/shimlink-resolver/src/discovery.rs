// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Locating the candidate directory
//!
//! The directory is produced by the secondary loader's generator, which may
//! not have run yet. Locations are probed in order:
//!
//! 1. `<plugin_dir>/<candidate_dir_name>`
//! 2. `<install_root>/<subdir>` for each configured subdirectory
//! 3. a depth-bounded search below `<install_root>` for a directory named
//!    `<candidate_dir_name>`

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Finds the candidate directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    /// Fixed locations, in priority order
    locations: Vec<PathBuf>,
    /// Root of the fallback tree search
    search_root: Option<PathBuf>,
    /// Directory name looked for during the tree search
    dir_name: String,
    /// Maximum tree search depth
    depth: usize,
}

impl DirectoryLocator {
    /// Build the probe list from configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut locations = Vec::new();
        if let Some(plugin_dir) = &config.plugin_dir {
            locations.push(plugin_dir.join(&config.candidate_dir_name));
        }
        if let Some(root) = &config.install_root {
            locations.extend(config.install_subdirs.iter().map(|sub| root.join(sub)));
        }

        Self {
            locations,
            search_root: config.install_root.clone(),
            dir_name: config.candidate_dir_name.clone(),
            depth: config.search_depth,
        }
    }

    /// Fixed locations probed before the tree search
    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }

    /// First existing candidate directory
    pub fn locate(&self) -> Result<PathBuf> {
        if let Some(found) = self.locations.iter().find(|path| path.is_dir()) {
            debug!("Candidate directory found at {}", found.display());
            return Ok(found.clone());
        }

        let mut searched = self.locations.len();
        if let Some(root) = &self.search_root {
            searched += 1;
            if let Some(found) = self.search(root) {
                debug!("Candidate directory found by search at {}", found.display());
                return Ok(found);
            }
        }

        Err(ResolveError::DirectoryUnavailable { searched })
    }

    fn search(&self, root: &Path) -> Option<PathBuf> {
        if self.depth == 0 || !root.is_dir() {
            return None;
        }
        WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.eq_ignore_ascii_case(&self.dir_name))
            })
            .map(|entry| entry.into_path())
    }
}
