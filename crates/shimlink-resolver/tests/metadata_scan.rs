// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Header reading and directory scanning against real module images

mod common;

use common::{module_image, write_module, write_module_versioned};
use shimlink_resolver::metadata::read_identity_from_bytes;
use shimlink_resolver::{MetadataScanner, Provenance, Version};

#[test]
fn test_reads_declared_identity() {
    let bytes = module_image("Il2CppSystem.dll", "Il2CppSystem", [2, 1, 0, 7]);
    let identity = read_identity_from_bytes(bytes).unwrap();

    assert_eq!(identity.name, "Il2CppSystem");
    assert_eq!(identity.version, Version::new(2, 1, 0, 7));
    assert!(identity.culture.is_empty());
}

#[test]
fn test_reads_identity_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_module_versioned(
        dir.path(),
        "UnityEngine.CoreModule.dll",
        "UnityEngine.CoreModule",
        [0, 0, 0, 0],
    );

    let identity = shimlink_resolver::metadata::read_identity(&path).unwrap();
    assert_eq!(identity.name, "UnityEngine.CoreModule");
    assert_eq!(identity.to_string(), "UnityEngine.CoreModule, Version=0.0.0.0, Culture=neutral");
}

#[test]
fn test_scan_records_renamed_module() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "Il2Cppmscorlib.dll", "Il2Cpp.Private.CoreLib");
    write_module(dir.path(), "Il2CppSystem.dll", "Il2CppSystem");

    let scan = MetadataScanner::new("dll").scan(dir.path());
    assert_eq!(scan.modules.len(), 2);
    assert_eq!(scan.skipped, 0);

    let renamed: Vec<_> = scan.modules.iter().filter(|m| m.is_renamed()).collect();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].stem, "Il2Cppmscorlib");

    let mapping = scan.map.get("Il2Cpp.Private.CoreLib").unwrap();
    assert_eq!(mapping.to, "Il2Cppmscorlib");
    assert_eq!(mapping.provenance, Provenance::Discovered);

    // Either name leads to the same file
    assert_eq!(scan.map.file_stem("Il2Cpp.Private.CoreLib"), Some("Il2Cppmscorlib"));
    assert_eq!(scan.map.file_stem("il2cppmscorlib"), Some("Il2Cppmscorlib"));
}

#[test]
fn test_scan_skips_unreadable_and_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "Il2CppSystem.dll", "Il2CppSystem");
    std::fs::write(dir.path().join("Il2CppBroken.dll"), b"MZ but nothing else").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"notes").unwrap();

    let scan = MetadataScanner::new("dll").scan(dir.path());
    assert_eq!(scan.modules.len(), 1);
    assert_eq!(scan.skipped, 1);
}

#[test]
fn test_scan_honors_extension() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "Foomscorlib.bin", "Foo.Private.CoreLib");
    write_module(dir.path(), "Ignored.dll", "Ignored");

    let scan = MetadataScanner::new("bin").scan(dir.path());
    assert_eq!(scan.modules.len(), 1);
    assert_eq!(scan.map.file_stem("Foo.Private.CoreLib"), Some("Foomscorlib"));
}
