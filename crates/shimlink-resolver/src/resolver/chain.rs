// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Ordered resolution strategies
//!
//! Direct > Discovered > Alias, first existing file wins. There is no
//! partial or fuzzy matching: a name either maps to a file through one of
//! these exact lookups or it doesn't resolve.

use crate::alias::AliasTable;
use crate::metadata::NameMap;
use crate::resolver::stats::{ResolutionStats, Strategy};
use std::path::{Path, PathBuf};

/// A file chosen for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// File to load
    pub path: PathBuf,
    /// Strategy that found it
    pub strategy: Strategy,
}

/// One pass over the strategies for a single candidate directory
pub struct StrategyChain<'a> {
    dir: &'a Path,
    extension: &'a str,
    map: &'a NameMap,
    aliases: &'a AliasTable,
    stats: &'a ResolutionStats,
}

impl<'a> StrategyChain<'a> {
    /// Chain over `dir` using `map` and `aliases`
    pub fn new(
        dir: &'a Path,
        extension: &'a str,
        map: &'a NameMap,
        aliases: &'a AliasTable,
        stats: &'a ResolutionStats,
    ) -> Self {
        Self {
            dir,
            extension,
            map,
            aliases,
            stats,
        }
    }

    /// Find the file for `name`
    pub fn resolve(&self, name: &str) -> Option<Resolution> {
        self.direct(name)
            .or_else(|| self.discovered(name))
            .or_else(|| self.alias(name))
    }

    fn direct(&self, name: &str) -> Option<Resolution> {
        self.probe(name).map(|path| Resolution {
            path,
            strategy: Strategy::Direct,
        })
    }

    fn discovered(&self, name: &str) -> Option<Resolution> {
        let stem = self.map.file_stem(name)?;
        self.probe(stem).map(|path| Resolution {
            path,
            strategy: Strategy::Discovered,
        })
    }

    fn alias(&self, name: &str) -> Option<Resolution> {
        self.aliases
            .candidates(name)?
            .iter()
            .find_map(|candidate| self.probe(candidate))
            .map(|path| Resolution {
                path,
                strategy: Strategy::Alias,
            })
    }

    /// `<dir>/<stem>.<ext>` if it is a file
    fn probe(&self, stem: &str) -> Option<PathBuf> {
        self.stats.inc_probe();
        let path = self.dir.join(format!("{}.{}", stem, self.extension));
        path.is_file().then_some(path)
    }
}
