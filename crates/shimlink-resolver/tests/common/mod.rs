// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shared helpers for the integration tests
//!
//! - [`write_module`] emits a minimal PE32 image with a CLI header, a
//!   metadata root, a `#~` stream holding `Module`, `<Module>` type and
//!   `Assembly` rows, and the four heaps
//! - [`FakeHost`] records registrations and replays the host's behavior:
//!   call the hook, then run its own identity check unless the interceptor
//!   forces a pass

#![allow(dead_code)]

use parking_lot::Mutex;
use shimlink_resolver::{
    Host, IdentityInterceptor, InspectionContext, InterceptionUnavailable, LoadContext, LoadError,
    ModuleHandle, ModuleRequest, ResolverConfig, ResolverState, ResolvingHandler, Verdict,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SECTION_RVA: u32 = 0x2000;
const SECTION_FILE_OFFSET: usize = 0x200;
const CLI_HEADER_LEN: u32 = 72;

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn pad_to(buf: &mut Vec<u8>, align: usize) {
    while buf.len() % align != 0 {
        buf.push(0);
    }
}

/// Metadata blob declaring `declared` with `version`
fn metadata(module_name: &str, declared: &str, version: [u16; 4]) -> Vec<u8> {
    let mut strings = vec![0u8];
    let module_index = strings.len() as u16;
    strings.extend_from_slice(module_name.as_bytes());
    strings.push(0);
    let name_index = strings.len() as u16;
    strings.extend_from_slice(declared.as_bytes());
    strings.push(0);
    let type_index = strings.len() as u16;
    strings.extend_from_slice(b"<Module>\0");
    pad_to(&mut strings, 4);

    let user_strings = vec![0u8; 4];
    let guids = (1u8..=16).collect::<Vec<_>>();
    let blobs = vec![0u8; 4];

    let mut tables = Vec::new();
    put_u32(&mut tables, 0); // reserved
    tables.push(2); // major
    tables.push(0); // minor
    tables.push(0); // heap sizes: all 2-byte indexes
    tables.push(1); // reserved
    let valid = (1u64 << 0x00) | (1u64 << 0x02) | (1u64 << 0x20);
    tables.extend_from_slice(&valid.to_le_bytes());
    tables.extend_from_slice(&0u64.to_le_bytes()); // sorted
    put_u32(&mut tables, 1); // Module rows
    put_u32(&mut tables, 1); // TypeDef rows
    put_u32(&mut tables, 1); // Assembly rows
    // Module: Generation, Name, Mvid, EncId, EncBaseId
    put_u16(&mut tables, 0);
    put_u16(&mut tables, module_index);
    put_u16(&mut tables, 1);
    put_u16(&mut tables, 0);
    put_u16(&mut tables, 0);
    // TypeDef <Module>: Flags, Name, Namespace, Extends, FieldList, MethodList
    put_u32(&mut tables, 0);
    put_u16(&mut tables, type_index);
    put_u16(&mut tables, 0);
    put_u16(&mut tables, 0);
    put_u16(&mut tables, 1);
    put_u16(&mut tables, 1);
    // Assembly: HashAlgId, version, Flags, PublicKey, Name, Culture
    put_u32(&mut tables, 0x8004);
    for part in version {
        put_u16(&mut tables, part);
    }
    put_u32(&mut tables, 0);
    put_u16(&mut tables, 0);
    put_u16(&mut tables, name_index);
    put_u16(&mut tables, 0);
    pad_to(&mut tables, 4);

    let version_string = b"v4.0.30319\0\0";
    let streams: [(&[u8], &[u8]); 5] = [
        (b"#~\0\0", &tables),
        (b"#Strings\0\0\0\0", &strings),
        (b"#US\0", &user_strings),
        (b"#GUID\0\0\0", &guids),
        (b"#Blob\0\0\0", &blobs),
    ];
    let header_len = 16
        + version_string.len()
        + 4
        + streams.iter().map(|(name, _)| 8 + name.len()).sum::<usize>();

    let mut root = Vec::new();
    put_u32(&mut root, 0x424A_5342);
    put_u16(&mut root, 1);
    put_u16(&mut root, 1);
    put_u32(&mut root, 0);
    put_u32(&mut root, version_string.len() as u32);
    root.extend_from_slice(version_string);
    put_u16(&mut root, 0); // flags
    put_u16(&mut root, streams.len() as u16);
    let mut offset = header_len as u32;
    for (name, body) in &streams {
        put_u32(&mut root, offset);
        put_u32(&mut root, body.len() as u32);
        root.extend_from_slice(name);
        offset += body.len() as u32;
    }
    assert_eq!(root.len(), header_len);

    for (_, body) in &streams {
        root.extend_from_slice(body);
    }
    root
}

/// Bytes of a PE32 image whose manifest declares `declared`
pub fn module_image(file_name: &str, declared: &str, version: [u16; 4]) -> Vec<u8> {
    let metadata = metadata(file_name, declared, version);
    let cli_rva = SECTION_RVA + 8;
    let metadata_rva = cli_rva + CLI_HEADER_LEN;

    let mut section = vec![0u8; 8]; // import address table placeholder
    put_u32(&mut section, CLI_HEADER_LEN);
    put_u16(&mut section, 2);
    put_u16(&mut section, 5);
    put_u32(&mut section, metadata_rva);
    put_u32(&mut section, metadata.len() as u32);
    put_u32(&mut section, 1); // IL only
    section.resize(8 + CLI_HEADER_LEN as usize, 0);
    section.extend_from_slice(&metadata);
    let virtual_size = section.len() as u32;
    pad_to(&mut section, 0x200);

    let mut image = vec![0u8; 0x80];
    image[0] = b'M';
    image[1] = b'Z';
    image[0x3C..0x40].copy_from_slice(&0x80u32.to_le_bytes());

    image.extend_from_slice(b"PE\0\0");
    put_u16(&mut image, 0x014C); // i386
    put_u16(&mut image, 1); // sections
    put_u32(&mut image, 0);
    put_u32(&mut image, 0);
    put_u32(&mut image, 0);
    put_u16(&mut image, 0xE0); // optional header size
    put_u16(&mut image, 0x2102);

    let mut optional = vec![0u8; 0xE0];
    let image_size = SECTION_RVA + (virtual_size + 0x1FFF) / 0x2000 * 0x2000;
    optional[0..2].copy_from_slice(&0x10Bu16.to_le_bytes());
    optional[28..32].copy_from_slice(&0x40_0000u32.to_le_bytes()); // image base
    optional[32..36].copy_from_slice(&0x2000u32.to_le_bytes()); // section alignment
    optional[36..40].copy_from_slice(&0x200u32.to_le_bytes()); // file alignment
    optional[40..42].copy_from_slice(&4u16.to_le_bytes()); // OS version
    optional[48..50].copy_from_slice(&4u16.to_le_bytes()); // subsystem version
    optional[56..60].copy_from_slice(&image_size.to_le_bytes());
    optional[60..64].copy_from_slice(&(SECTION_FILE_OFFSET as u32).to_le_bytes());
    optional[68..70].copy_from_slice(&3u16.to_le_bytes()); // console subsystem
    optional[92..96].copy_from_slice(&16u32.to_le_bytes());
    let cli_dir = 96 + 14 * 8;
    optional[cli_dir..cli_dir + 4].copy_from_slice(&cli_rva.to_le_bytes());
    optional[cli_dir + 4..cli_dir + 8].copy_from_slice(&CLI_HEADER_LEN.to_le_bytes());
    image.extend_from_slice(&optional);

    image.extend_from_slice(b".text\0\0\0");
    put_u32(&mut image, virtual_size);
    put_u32(&mut image, SECTION_RVA);
    put_u32(&mut image, section.len() as u32);
    put_u32(&mut image, SECTION_FILE_OFFSET as u32);
    image.extend_from_slice(&[0u8; 12]);
    put_u32(&mut image, 0x6000_0020);

    image.resize(SECTION_FILE_OFFSET, 0);
    image.extend_from_slice(&section);
    image
}

/// Write `<dir>/<file_name>` declaring `declared`
pub fn write_module(dir: &Path, file_name: &str, declared: &str) -> PathBuf {
    write_module_versioned(dir, file_name, declared, [1, 0, 0, 0])
}

/// Write `<dir>/<file_name>` declaring `declared` at `version`
pub fn write_module_versioned(
    dir: &Path,
    file_name: &str,
    declared: &str,
    version: [u16; 4],
) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name);
    std::fs::write(&path, module_image(file_name, declared, version)).unwrap();
    path
}

/// Load context that counts loads and delegates to header inspection
#[derive(Default)]
pub struct CountingContext {
    inner: InspectionContext,
    loads: AtomicUsize,
}

impl CountingContext {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl LoadContext for CountingContext {
    fn load_from_path(&self, path: &Path) -> Result<ModuleHandle, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_from_path(path)
    }
}

/// Resolver rooted at a scratch install directory
pub struct Fixture {
    pub root: tempfile::TempDir,
    pub context: Arc<CountingContext>,
    pub state: Arc<ResolverState>,
}

impl Fixture {
    /// Default config, install root in a fresh temp dir
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Config customized by `tweak`
    pub fn with_config(tweak: impl FnOnce(ResolverConfig) -> ResolverConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        let config = tweak(
            ResolverConfig::default()
                .with_plugin_dir(root.path().join("BepInEx").join("plugins"))
                .with_install_root(root.path()),
        );
        let context = Arc::new(CountingContext::default());
        let state = Arc::new(ResolverState::new(config, context.clone()).unwrap());
        Self {
            root,
            context,
            state,
        }
    }

    /// Conventional install-root candidate directory
    pub fn interop_dir(&self) -> PathBuf {
        self.root.path().join("MelonLoader").join("Il2CppAssemblies")
    }
}

/// Host double
#[derive(Default)]
pub struct FakeHost {
    pub interception_supported: bool,
    interceptor: Mutex<Option<Arc<dyn IdentityInterceptor>>>,
    handler: Mutex<Option<Arc<dyn ResolvingHandler>>>,
    pub events: Mutex<Vec<&'static str>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            interception_supported: true,
            ..Self::default()
        }
    }

    pub fn without_interception() -> Self {
        Self::default()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    pub fn has_interceptor(&self) -> bool {
        self.interceptor.lock().is_some()
    }

    /// Simulate a failed default resolution followed by the host's identity
    /// check on whatever the handler returned
    pub fn resolve(&self, name: &str) -> Option<ModuleHandle> {
        let handler = self.handler.lock().clone()?;
        let request = ModuleRequest::new(name);
        let handle = handler.resolve(&request)?;

        if handle.identity().name == request.name {
            return Some(handle);
        }
        let interceptor = self.interceptor.lock().clone();
        match interceptor.map(|i| i.check(handle.identity(), &request)) {
            Some(Verdict::ForcePass) => Some(handle),
            // Original validation: names differ textually
            _ => None,
        }
    }
}

impl Host for FakeHost {
    fn register_early(
        &self,
        interceptor: Arc<dyn IdentityInterceptor>,
    ) -> Result<(), InterceptionUnavailable> {
        self.events.lock().push("early");
        if !self.interception_supported {
            return Err(InterceptionUnavailable::new("validation routine not found"));
        }
        *self.interceptor.lock() = Some(interceptor);
        Ok(())
    }

    fn register_late(&self, handler: Arc<dyn ResolvingHandler>) {
        self.events.lock().push("late");
        *self.handler.lock() = Some(handler);
    }
}
