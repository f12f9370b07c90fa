// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Request filter in front of the resolution hook
//!
//! The host raises its failed-resolution notification for every module in the
//! process, so this check runs on every call and must not allocate, log or
//! touch the filesystem.

/// Core runtime modules matched by exact name
const CORE_MODULES: &[&str] = &["mscorlib", "netstandard", "System", "WindowsBase"];

/// Modules owned by the runtime, the patching/logging stack, or the secondary
/// loader. These are never redirected.
const DENIED_PREFIXES: &[&str] = &[
    "System.",
    "Microsoft.",
    "Mono.",
    "BepInEx",
    "0Harmony",
    "HarmonyX",
    "MonoMod",
    "Il2CppInterop",
    "MelonLoader",
];

/// Engine and game modules whose names differ between the two loaders
const REDIRECT_PREFIXES: &[&str] = &["Il2Cpp", "UnityEngine", "Unity.", "Assembly-CSharp"];

/// Naming-convention suffixes that mark an interop core library
const CORELIB_SUFFIX: &str = ".Private.CoreLib";
const MSCORLIB_SUFFIX: &str = "mscorlib";

/// ASCII case-insensitive `starts_with`
pub(crate) fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.len() >= prefix.len()
        && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// ASCII case-insensitive `ends_with`
pub(crate) fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.as_bytes()[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}

/// Decides which failed requests the resolver looks at
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    extra_prefixes: Vec<String>,
}

impl RequestFilter {
    /// Create a filter with the built-in rules only
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter that also redirects names starting with `prefixes`
    pub fn with_extra_prefixes(prefixes: Vec<String>) -> Self {
        Self {
            extra_prefixes: prefixes
                .into_iter()
                .filter(|prefix| !prefix.is_empty())
                .collect(),
        }
    }

    /// Whether the request is one the resolver should try to redirect
    pub fn accepts(&self, name: &str) -> bool {
        if name.is_empty() || self.is_protected(name) {
            return false;
        }

        REDIRECT_PREFIXES
            .iter()
            .any(|prefix| starts_with_ignore_case(name, prefix))
            || self
                .extra_prefixes
                .iter()
                .any(|prefix| starts_with_ignore_case(name, prefix))
            || is_convention_corelib(name)
    }

    /// Whether the module belongs to the runtime or one of the loaders
    pub fn is_protected(&self, name: &str) -> bool {
        CORE_MODULES
            .iter()
            .any(|core| name.eq_ignore_ascii_case(core))
            || DENIED_PREFIXES
                .iter()
                .any(|prefix| starts_with_ignore_case(name, prefix))
    }
}

/// `<P>.Private.CoreLib` or `<P>mscorlib` with a non-empty prefix `P`
fn is_convention_corelib(name: &str) -> bool {
    (name.len() > CORELIB_SUFFIX.len() && ends_with_ignore_case(name, CORELIB_SUFFIX))
        || (name.len() > MSCORLIB_SUFFIX.len() && ends_with_ignore_case(name, MSCORLIB_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_modules_are_rejected() {
        let filter = RequestFilter::new();
        for name in [
            "mscorlib",
            "System",
            "System.Private.CoreLib",
            "system.runtime",
            "netstandard",
            "Microsoft.CSharp",
            "Mono.Cecil",
            "BepInEx.Core",
            "0Harmony",
            "MonoMod.RuntimeDetour",
            "Il2CppInterop.Runtime",
            "MelonLoader",
        ] {
            assert!(!filter.accepts(name), "{name} should be rejected");
        }
    }

    #[test]
    fn test_game_modules_are_accepted() {
        let filter = RequestFilter::new();
        for name in [
            "Il2Cppmscorlib",
            "Il2CppSystem.Core",
            "UnityEngine.CoreModule",
            "Unity.TextMeshPro",
            "Assembly-CSharp",
            "Foo.Private.CoreLib",
            "Foomscorlib",
        ] {
            assert!(filter.accepts(name), "{name} should be accepted");
        }
    }

    #[test]
    fn test_unrelated_modules_are_rejected() {
        let filter = RequestFilter::new();
        assert!(!filter.accepts(""));
        assert!(!filter.accepts("Newtonsoft.Json"));
        assert!(!filter.accepts(".Private.CoreLib"));
    }

    #[test]
    fn test_extra_prefixes() {
        let filter = RequestFilter::with_extra_prefixes(vec!["Game.".into(), String::new()]);
        assert!(filter.accepts("Game.Logic"));
        assert!(!filter.accepts("Other.Logic"));
        assert!(!filter.accepts("MelonLoader.Support"));
    }

    #[test]
    fn test_case_helpers() {
        assert!(starts_with_ignore_case("il2cppSystem", "Il2Cpp"));
        assert!(!starts_with_ignore_case("Il2", "Il2Cpp"));
        assert!(ends_with_ignore_case("FooMSCORLIB", "mscorlib"));
        assert!(!ends_with_ignore_case("lib", "mscorlib"));
    }
}
