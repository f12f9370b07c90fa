// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Directory scan building the discovered name map

use crate::alias::{NameMapping, Provenance};
use crate::error::ResolveError;
use crate::filter::ends_with_ignore_case;
use crate::host::ModuleIdentity;
use crate::metadata::image::read_identity;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CORELIB_SUFFIX: &str = ".Private.CoreLib";
const MSCORLIB_SUFFIX: &str = "mscorlib";

/// A module file found during a scan
#[derive(Debug, Clone)]
pub struct ScannedModule {
    /// Full path of the file
    pub path: PathBuf,
    /// File name without extension
    pub stem: String,
    /// Identity declared in the header
    pub identity: ModuleIdentity,
}

impl ScannedModule {
    /// Whether the file name and the declared name disagree
    pub fn is_renamed(&self) -> bool {
        !self.stem.eq_ignore_ascii_case(&self.identity.name)
    }
}

#[derive(Debug, Clone)]
struct MapEntry {
    mapping: NameMapping,
    /// Stem of the file that satisfies the key
    file_stem: String,
}

/// Name map derived from a candidate directory. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    entries: HashMap<String, MapEntry>,
}

impl NameMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Stem of the file that satisfies `name`
    pub fn file_stem(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|entry| entry.file_stem.as_str())
    }

    /// Mapping recorded for `name`
    pub fn get(&self, name: &str) -> Option<&NameMapping> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|entry| &entry.mapping)
    }

    /// Whether the map relates `a` and `b`, in either direction
    pub fn links(&self, a: &str, b: &str) -> bool {
        let points_to = |from: &str, to: &str| {
            self.entries
                .get(&from.to_ascii_lowercase())
                .is_some_and(|entry| {
                    entry.mapping.to.eq_ignore_ascii_case(to)
                        || entry.file_stem.eq_ignore_ascii_case(to)
                })
        };
        points_to(a, b) || points_to(b, a)
    }

    /// All mappings, in no particular order
    pub fn mappings(&self) -> impl Iterator<Item = &NameMapping> {
        self.entries.values().map(|entry| &entry.mapping)
    }

    /// Number of keys in the map
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert unless the key is already mapped
    fn insert(&mut self, from: &str, to: &str, file_stem: &str, provenance: Provenance) -> bool {
        let key = from.to_ascii_lowercase();
        if from.is_empty() || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            MapEntry {
                mapping: NameMapping {
                    from: from.to_string(),
                    to: to.to_string(),
                    provenance,
                },
                file_stem: file_stem.to_string(),
            },
        );
        true
    }
}

/// Result of scanning one directory
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Readable module files
    pub modules: Vec<ScannedModule>,
    /// Files with the module extension that could not be read
    pub skipped: usize,
    /// Discovered and heuristic mappings
    pub map: NameMap,
}

/// Reads declared identities of every module file in a directory
#[derive(Debug, Clone)]
pub struct MetadataScanner {
    extension: String,
}

impl MetadataScanner {
    /// Create a scanner for files with `extension` (without the dot)
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Scan `dir`. I/O failures on the directory itself yield an empty result.
    pub fn scan(&self, dir: &Path) -> ScanResult {
        let files = match self.module_files(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Cannot enumerate {}: {}", dir.display(), e);
                return ScanResult::default();
            }
        };

        let mut result = ScanResult::default();
        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match read_identity(&path) {
                Ok(identity) => result.modules.push(ScannedModule {
                    stem: stem.to_string(),
                    path: path.clone(),
                    identity,
                }),
                Err(source) => {
                    let err = ResolveError::UnreadableCandidate {
                        path: path.clone(),
                        source,
                    };
                    debug!("Skipping candidate: {}", err);
                    result.skipped += 1;
                }
            }
        }

        result.map = build_map(&result.modules);
        debug!(
            "Scanned {}: {} modules, {} skipped, {} mappings",
            dir.display(),
            result.modules.len(),
            result.skipped,
            result.map.len()
        );
        result
    }

    fn module_files(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Discovered pairs first, then convention transforms where a key is still free
fn build_map(modules: &[ScannedModule]) -> NameMap {
    let mut map = NameMap::new();

    for module in modules.iter().filter(|m| m.is_renamed()) {
        let declared = &module.identity.name;
        map.insert(declared, &module.stem, &module.stem, Provenance::Discovered);
        map.insert(&module.stem, declared, &module.stem, Provenance::Discovered);
    }

    for module in modules {
        for name in [&module.stem, &module.identity.name] {
            if let Some(alternate) = convention_alternate(name) {
                map.insert(&alternate, name, &module.stem, Provenance::Heuristic);
            }
        }
    }

    map
}

/// `<P>mscorlib` <-> `<P>.Private.CoreLib`
fn convention_alternate(name: &str) -> Option<String> {
    if name.len() > CORELIB_SUFFIX.len() && ends_with_ignore_case(name, CORELIB_SUFFIX) {
        let prefix = &name[..name.len() - CORELIB_SUFFIX.len()];
        return Some(format!("{prefix}{MSCORLIB_SUFFIX}"));
    }
    if name.len() > MSCORLIB_SUFFIX.len() && ends_with_ignore_case(name, MSCORLIB_SUFFIX) {
        let prefix = &name[..name.len() - MSCORLIB_SUFFIX.len()];
        return Some(format!("{prefix}{CORELIB_SUFFIX}"));
    }
    None
}
