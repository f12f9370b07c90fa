// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loading a resolved file through the host and checking what came back

use crate::error::{ResolveError, Result};
use crate::host::{LoadContext, ModuleHandle};
use std::path::{Path, PathBuf};

/// Load `path` for the request `module` and verify the host really loaded
/// that file.
///
/// The host may unify the request with a module it already holds; if the
/// returned module lives anywhere else the load is rejected.
pub fn load_and_validate(
    context: &dyn LoadContext,
    module: &str,
    path: &Path,
) -> Result<ModuleHandle> {
    let handle = context
        .load_from_path(path)
        .map_err(|source| ResolveError::LoadFailure {
            module: module.to_string(),
            path: path.to_path_buf(),
            source,
        })?;

    let actual = handle.location().map(Path::to_path_buf);
    match actual {
        Some(actual) if same_file(&actual, path) => Ok(handle),
        other => Err(ResolveError::ValidationMismatch {
            module: module.to_string(),
            expected: path.to_path_buf(),
            actual: other.unwrap_or_else(|| PathBuf::from("<in-memory>")),
        }),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
    a == b || canonical(a) == canonical(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::host::{HostModule, ModuleIdentity, Version};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Loaded {
        identity: ModuleIdentity,
        location: Option<PathBuf>,
    }

    impl HostModule for Loaded {
        fn identity(&self) -> &ModuleIdentity {
            &self.identity
        }

        fn location(&self) -> Option<&Path> {
            self.location.as_deref()
        }
    }

    /// Always hands back a module from a fixed location
    struct Fixed(Option<PathBuf>);

    impl LoadContext for Fixed {
        fn load_from_path(&self, _path: &Path) -> std::result::Result<ModuleHandle, LoadError> {
            Ok(Arc::new(Loaded {
                identity: ModuleIdentity::new("Il2CppSystem", Version::default()),
                location: self.0.clone(),
            }))
        }
    }

    struct Failing;

    impl LoadContext for Failing {
        fn load_from_path(&self, _path: &Path) -> std::result::Result<ModuleHandle, LoadError> {
            Err(LoadError::BadFormat("not a module".into()))
        }
    }

    #[test]
    fn test_matching_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Il2CppSystem.dll");
        std::fs::write(&path, b"").unwrap();

        let handle = load_and_validate(&Fixed(Some(path.clone())), "Il2CppSystem", &path).unwrap();
        assert_eq!(handle.identity().name, "Il2CppSystem");
    }

    #[test]
    fn test_substituted_module_is_rejected() {
        let expected = PathBuf::from("/interop/Il2CppSystem.dll");
        let err = load_and_validate(
            &Fixed(Some(PathBuf::from("/game/Managed/Il2CppSystem.dll"))),
            "Il2CppSystem",
            &expected,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::ValidationMismatch { .. }));

        let err = load_and_validate(&Fixed(None), "Il2CppSystem", &expected).unwrap_err();
        assert!(matches!(err, ResolveError::ValidationMismatch { .. }));
    }

    #[test]
    fn test_load_error_is_classified() {
        let err = load_and_validate(&Failing, "Il2CppSystem", Path::new("/x.dll")).unwrap_err();
        assert!(matches!(err, ResolveError::LoadFailure { .. }));
        assert!(err.is_cacheable());
    }
}
