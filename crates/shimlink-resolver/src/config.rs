// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolver configuration
//!
//! Values come from, in increasing priority: built-in defaults, a
//! `shimlink.toml` next to the plugin (or in the user config directory), and
//! `SHIMLINK_*` environment variables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file name looked up in the plugin directory
pub const CONFIG_FILE_NAME: &str = "shimlink.toml";

/// Prefix of environment overrides
const ENV_PREFIX: &str = "SHIMLINK_";

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Extension of module files, without the dot
    pub module_extension: String,

    /// Name of the directory holding generated interop modules
    pub candidate_dir_name: String,

    /// Directory the plugin was loaded from
    pub plugin_dir: Option<PathBuf>,

    /// Game install root
    pub install_root: Option<PathBuf>,

    /// Conventional candidate directories relative to the install root
    pub install_subdirs: Vec<PathBuf>,

    /// Maximum depth of the fallback directory-tree search
    pub search_depth: usize,

    /// Maximum number of names remembered as unresolvable
    pub negative_cache_capacity: usize,

    /// Additional name prefixes the request filter accepts
    pub extra_redirect_prefixes: Vec<String>,

    /// Additional alias entries (requested name -> candidate file stems)
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            module_extension: "dll".to_string(),
            candidate_dir_name: "Il2CppAssemblies".to_string(),
            plugin_dir: None,
            install_root: None,
            install_subdirs: vec![
                PathBuf::from("MelonLoader").join("Il2CppAssemblies"),
                PathBuf::from("UserLibs").join("Il2CppAssemblies"),
            ],
            search_depth: 4,
            negative_cache_capacity: 512,
            extra_redirect_prefixes: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration for a plugin living in `plugin_dir`.
    ///
    /// A missing config file is not an error; defaults apply.
    pub fn load(plugin_dir: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(plugin_dir, std::env::vars())
    }

    /// [`ResolverConfig::load`] against an explicit environment snapshot
    pub fn load_with_env<I>(plugin_dir: Option<&Path>, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let candidates = plugin_dir
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .into_iter()
            .chain(user_config_path());

        let mut config = match candidates.into_iter().find(|path| path.is_file()) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if config.plugin_dir.is_none() {
            config.plugin_dir = plugin_dir.map(Path::to_path_buf);
        }
        config.apply_env(vars);
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SHIMLINK_*` overrides from an environment snapshot
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                let config_key = config_key.to_ascii_lowercase();
                self.set(&config_key, &value);
            }
        }
    }

    /// Set a value by key. Unknown keys and unparsable numbers are ignored.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "module_extension" => {
                self.module_extension = value.trim_start_matches('.').to_string()
            }
            "candidate_dir_name" => self.candidate_dir_name = value.to_string(),
            "plugin_dir" => self.plugin_dir = Some(PathBuf::from(value)),
            "install_root" => self.install_root = Some(PathBuf::from(value)),
            "install_subdirs" => {
                self.install_subdirs = split_list(value).map(PathBuf::from).collect()
            }
            "search_depth" => {
                if let Ok(n) = value.parse() {
                    self.search_depth = n;
                }
            }
            "negative_cache_capacity" => {
                if let Ok(n) = value.parse() {
                    self.negative_cache_capacity = n;
                }
            }
            "extra_redirect_prefixes" => {
                self.extra_redirect_prefixes = split_list(value).map(String::from).collect()
            }
            _ => {}
        }
    }

    /// Reject values the resolver cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_extension.is_empty() {
            return Err(ConfigError::Invalid {
                key: "module_extension",
                reason: "must not be empty".to_string(),
            });
        }
        if self.candidate_dir_name.is_empty() {
            return Err(ConfigError::Invalid {
                key: "candidate_dir_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.negative_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "negative_cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Serialize the effective configuration
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Set the plugin directory
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dir = Some(dir.into());
        self
    }

    /// Set the install root
    pub fn with_install_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_root = Some(dir.into());
        self
    }

    /// Set the module file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.module_extension = extension.into();
        self
    }

    /// Set the candidate directory name
    pub fn with_candidate_dir_name(mut self, name: impl Into<String>) -> Self {
        self.candidate_dir_name = name.into();
        self
    }

    /// Set the negative cache capacity
    pub fn with_negative_cache_capacity(mut self, capacity: usize) -> Self {
        self.negative_cache_capacity = capacity;
        self
    }
}

/// Per-user config file location
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("shimlink").join(CONFIG_FILE_NAME))
}

/// Split a `;` or `,` separated list, dropping empty items
fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
}
