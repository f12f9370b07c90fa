// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module identity from an image's assembly manifest
//!
//! The image is parsed by `dotscope` with minimal validation; only the
//! `Assembly` row is consulted. Nothing is loaded into the host or executed.

use crate::error::ImageError;
use crate::host::{ModuleIdentity, Version};
use dotscope::{CilObject, ValidationConfig};
use std::path::Path;

/// Read the declared identity of the module at `path`
pub fn read_identity(path: &Path) -> Result<ModuleIdentity, ImageError> {
    let object = CilObject::from_path_with_validation(path, ValidationConfig::minimal())?;
    identity_of(&object)
}

/// Read the declared identity from an in-memory image
pub fn read_identity_from_bytes(bytes: Vec<u8>) -> Result<ModuleIdentity, ImageError> {
    let object = CilObject::from_mem_with_validation(bytes, ValidationConfig::minimal())?;
    identity_of(&object)
}

fn identity_of(object: &CilObject) -> Result<ModuleIdentity, ImageError> {
    // Netmodules carry metadata but no manifest
    let assembly = object.assembly().ok_or(ImageError::NoManifest)?;
    Ok(ModuleIdentity {
        name: assembly.name.clone(),
        version: Version::new(
            component(assembly.major_version),
            component(assembly.minor_version),
            component(assembly.build_number),
            component(assembly.revision_number),
        ),
        culture: assembly.culture.clone().unwrap_or_default(),
    })
}

/// Version parts are 16-bit on disk; anything wider saturates
fn component<T: TryInto<u16>>(value: T) -> u16 {
    value.try_into().unwrap_or(u16::MAX)
}
