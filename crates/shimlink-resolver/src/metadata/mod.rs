// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module metadata without loading
//!
//! - [`image`] reads a module's declared identity from its assembly manifest
//! - [`scanner`] applies that to a whole directory and derives the name map

pub mod image;
mod scanner;

pub use image::{read_identity, read_identity_from_bytes};
pub use scanner::{MetadataScanner, NameMap, ScanResult, ScannedModule};
