// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interfaces consumed from the host runtime
//!
//! The host drives everything: it raises the "could not resolve module"
//! notification on its own threads, optionally exposes its internal identity
//! validation as an interception point, and calls two bootstrap extension
//! points in a fixed order. These traits are the only surface the resolver
//! sees of it.

use crate::error::{InterceptionUnavailable, LoadError};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Four-part module version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
    /// Major component
    pub major: u16,
    /// Minor component
    pub minor: u16,
    /// Build component
    pub build: u16,
    /// Revision component
    pub revision: u16,
}

impl Version {
    /// Create a version from its four components
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse `major[.minor[.build[.revision]]]`
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = [0u16; 4];
        let mut count = 0;
        for (slot, piece) in parts.iter_mut().zip(text.trim().split('.')) {
            *slot = piece.trim().parse().ok()?;
            count += 1;
        }
        if count == 0 || text.trim().split('.').count() > 4 {
            return None;
        }
        Some(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// A module the host failed to resolve on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Simple name, without version/culture/key qualifiers
    pub name: String,
    /// Requested version, when the host supplied one
    pub version: Option<Version>,
}

impl ModuleRequest {
    /// Request a module by simple name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Attach a requested version
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Parse a display name such as
    /// `Il2Cppmscorlib, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null`
    pub fn parse(display_name: &str) -> Option<Self> {
        let mut parts = display_name.split(',');
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }

        let version = parts.find_map(|part| {
            let (key, value) = part.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("version") {
                Version::parse(value)
            } else {
                None
            }
        });

        Some(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ModuleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}, Version={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// Identity a module declares about itself in its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleIdentity {
    /// Declared simple name
    pub name: String,
    /// Declared version
    pub version: Version,
    /// Declared culture (empty for neutral)
    pub culture: String,
}

impl ModuleIdentity {
    /// Create a culture-neutral identity
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            culture: String::new(),
        }
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let culture = if self.culture.is_empty() {
            "neutral"
        } else {
            &self.culture
        };
        write!(
            f,
            "{}, Version={}, Culture={}",
            self.name, self.version, culture
        )
    }
}

/// A module living in the host's load context
pub trait HostModule: Send + Sync + fmt::Debug {
    /// Identity the module declares
    fn identity(&self) -> &ModuleIdentity;

    /// File the module was loaded from, if it came from disk
    fn location(&self) -> Option<&Path>;
}

/// Opaque handle to a loaded module. The host owns the module; dropping the
/// handle never unloads it.
pub type ModuleHandle = Arc<dyn HostModule>;

/// The host's module load context
pub trait LoadContext: Send + Sync {
    /// Load the module image at `path`
    fn load_from_path(&self, path: &Path) -> Result<ModuleHandle, LoadError>;
}

/// Receiver of the host's "module failed default resolution" notification
pub trait ResolvingHandler: Send + Sync {
    /// Return a loaded module, or `None` to let the host fall back to its
    /// default behavior
    fn resolve(&self, request: &ModuleRequest) -> Option<ModuleHandle>;
}

/// Outcome of an intercepted identity validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Skip the host check for this call and accept the module
    ForcePass,
    /// Run the host's original check unmodified
    Defer,
}

/// Hook into the host's internal post-resolution identity validation
pub trait IdentityInterceptor: Send + Sync {
    /// Decide whether `candidate` may stand in for `requested`
    fn check(&self, candidate: &ModuleIdentity, requested: &ModuleRequest) -> Verdict;
}

/// Two-phase registration surface of the host
///
/// Precondition: the host calls the early extension point before any mod
/// code runs and the late one only after its own bootstrap-phase module
/// loading has finished. The resolver relies on that ordering and never
/// installs the resolution hook from the early phase.
pub trait Host: Send + Sync {
    /// Install the identity-check interceptor. Hosts whose runtime does not
    /// expose the validation routine return [`InterceptionUnavailable`].
    fn register_early(
        &self,
        interceptor: Arc<dyn IdentityInterceptor>,
    ) -> Result<(), InterceptionUnavailable>;

    /// Subscribe the resolution hook to the failed-resolution notification
    fn register_late(&self, handler: Arc<dyn ResolvingHandler>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_name() {
        let request =
            ModuleRequest::parse("Il2Cppmscorlib, Version=1.2.0.0, Culture=neutral").unwrap();
        assert_eq!(request.name, "Il2Cppmscorlib");
        assert_eq!(request.version, Some(Version::new(1, 2, 0, 0)));

        let bare = ModuleRequest::parse("UnityEngine.CoreModule").unwrap();
        assert_eq!(bare.version, None);

        assert!(ModuleRequest::parse(" , Version=1.0").is_none());
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(Version::parse("4"), Some(Version::new(4, 0, 0, 0)));
        assert_eq!(Version::parse("4.0.30319"), Some(Version::new(4, 0, 30319, 0)));
        assert_eq!(Version::parse("1.2.3.4.5"), None);
        assert_eq!(Version::parse("x.1"), None);
        assert_eq!(Version::new(1, 0, 0, 0).to_string(), "1.0.0.0");
    }
}
