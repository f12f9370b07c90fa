// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the resolver

use std::path::PathBuf;
use thiserror::Error;

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that can occur while redirecting a module request.
///
/// None of these ever reach host code: the hook classifies, logs and turns
/// each of them into a declined request.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Request is outside the redirect filter
    #[error("Module is not handled by the resolver")]
    NotApplicable,

    /// Candidate directory has not been generated yet
    #[error("Interop directory is not available (searched {searched} locations)")]
    DirectoryUnavailable {
        /// Number of locations probed
        searched: usize,
    },

    /// A file in the candidate directory could not be read as a module
    #[error("Unreadable module candidate {path}: {source}")]
    UnreadableCandidate {
        /// Offending file
        path: PathBuf,
        /// Header parse failure
        #[source]
        source: ImageError,
    },

    /// The host failed to load a resolved file
    #[error("Failed to load '{module}' from {path}: {source}")]
    LoadFailure {
        /// Requested module name
        module: String,
        /// Resolved file
        path: PathBuf,
        /// Host load error
        #[source]
        source: LoadError,
    },

    /// The host returned a module from somewhere other than the resolved file
    #[error("Host returned '{module}' from {actual} instead of {expected}")]
    ValidationMismatch {
        /// Requested module name
        module: String,
        /// Path handed to the host
        expected: PathBuf,
        /// Location reported by the loaded module
        actual: PathBuf,
    },

    /// No strategy produced a file
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),
}

/// Failure to read a module identity out of an image
#[derive(Debug, Error)]
pub enum ImageError {
    /// The file is not a readable managed image
    #[error("Invalid module image: {0}")]
    Metadata(#[from] dotscope::Error),

    /// The image is a module without an assembly manifest
    #[error("Image has no assembly manifest")]
    NoManifest,
}

/// Error reported by the host load context
#[derive(Debug, Error)]
pub enum LoadError {
    /// File is not a loadable module for this host
    #[error("Bad image format: {0}")]
    BadFormat(String),

    /// The host refused or failed the load
    #[error("{0}")]
    Host(String),

    /// Header inspection failed
    #[error(transparent)]
    Image(#[from] ImageError),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

/// The host does not expose the identity validation routine
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct InterceptionUnavailable(pub String);

impl InterceptionUnavailable {
    /// Create a new unavailability report
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Lifecycle ordering violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// A later phase was requested before the earlier one ran
    #[error("'{phase}' called while in state {state}")]
    OutOfOrder {
        /// Phase that was requested
        phase: &'static str,
        /// State the coordinator was in
        state: &'static str,
    },

    /// The phase already ran
    #[error("'{0}' has already been installed")]
    AlreadyInstalled(&'static str),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("Invalid value for '{key}': {reason}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ResolveError {
    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Whether the failure should be remembered in the negative cache
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Self::ModuleNotFound(_) | Self::LoadFailure { .. } | Self::ValidationMismatch { .. }
        )
    }
}
