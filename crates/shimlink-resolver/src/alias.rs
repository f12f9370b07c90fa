// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Known naming-convention equivalences between the two loaders

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Where a name mapping came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Observed in a module header during a directory scan
    Discovered,
    /// Derived from a naming-convention transform
    Heuristic,
    /// Listed in the alias table
    Hardcoded,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discovered => "discovered",
            Self::Heuristic => "heuristic",
            Self::Hardcoded => "hardcoded",
        })
    }
}

/// One simple-name to simple-name equivalence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMapping {
    /// Name as requested
    pub from: String,
    /// Name of the file that satisfies it
    pub to: String,
    /// Origin of the mapping
    pub provenance: Provenance,
}

/// Requested name -> candidate file stems, tried in order
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("Il2Cpp.Private.CoreLib", &["Il2Cppmscorlib"]),
    (
        "Il2Cppmscorlib",
        &["Il2Cpp.Private.CoreLib", "Il2CppSystem.Private.CoreLib"],
    ),
    ("Il2CppSystem.Private.CoreLib", &["Il2Cppmscorlib"]),
    ("Il2CppSystem.Runtime", &["Il2CppSystem", "Il2Cppmscorlib"]),
    ("Il2CppSystem", &["Il2CppSystem.Runtime"]),
    ("Il2Cppnetstandard", &["Il2Cppmscorlib"]),
    ("UnityEngine", &["UnityEngine.CoreModule"]),
];

/// Static alias table, optionally extended from configuration
#[derive(Debug, Clone)]
pub struct AliasTable {
    /// (requested name, candidates) in insertion order
    entries: Vec<(String, Vec<String>)>,
    /// Lowercased requested name -> index into `entries`
    index: HashMap<String, usize>,
}

impl AliasTable {
    /// The built-in table
    pub fn builtin() -> Self {
        let mut table = Self {
            entries: Vec::with_capacity(BUILTIN_ALIASES.len()),
            index: HashMap::with_capacity(BUILTIN_ALIASES.len()),
        };
        for (name, candidates) in BUILTIN_ALIASES {
            table.insert(name, candidates.iter().map(|c| c.to_string()).collect());
        }
        table
    }

    /// The built-in table plus `extra` entries. Built-in keys win.
    pub fn with_extra(extra: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::builtin();
        for (name, candidates) in extra {
            let candidates: Vec<String> = candidates
                .iter()
                .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(name))
                .cloned()
                .collect();
            if !name.is_empty() && !candidates.is_empty() {
                table.insert(name, candidates);
            }
        }
        table
    }

    fn insert(&mut self, name: &str, candidates: Vec<String>) {
        let key = name.to_ascii_lowercase();
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push((name.to_string(), candidates));
    }

    /// Candidate file stems for a requested name
    pub fn candidates(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| self.entries[i].1.as_slice())
    }

    /// Whether the table relates `a` and `b`, in either direction
    pub fn links(&self, a: &str, b: &str) -> bool {
        let lists = |from: &str, to: &str| {
            self.candidates(from)
                .is_some_and(|list| list.iter().any(|c| c.eq_ignore_ascii_case(to)))
        };
        lists(a, b) || lists(b, a)
    }

    /// Flattened mappings, for reporting
    pub fn mappings(&self) -> impl Iterator<Item = NameMapping> + '_ {
        self.entries.iter().flat_map(|(from, candidates)| {
            candidates.iter().map(move |to| NameMapping {
                from: from.clone(),
                to: to.clone(),
                provenance: Provenance::Hardcoded,
            })
        })
    }

    /// Number of requested names in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}
