//! Synthetic volume builders shared by the integration tests.
#![allow(dead_code)]

use rar_index::parsing::rar5::write_vint;
use rar_index::NameLengthLayout;

pub const RAR4_SIGNATURE: &[u8] = b"Rar!\x1a\x07\x00";
pub const RAR5_SIGNATURE: &[u8] = b"Rar!\x1a\x07\x01\x00";

pub const METHOD_STORE: u8 = 0x30;
pub const METHOD_NORMAL: u8 = 0x33;

/// Main header with the given flags.
pub fn rar4_main(flags: u16) -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x73];
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&13u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 6]);
    out
}

/// RAR 1.5-4.x file block header.
pub struct Rar4Header<'a> {
    pub name: &'a [u8],
    pub packed: u32,
    pub unpacked: u32,
    pub method: u8,
    pub flags: u16,
    pub layout: NameLengthLayout,
}

impl<'a> Rar4Header<'a> {
    pub fn stored(name: &'a str, packed: u32, unpacked: u32) -> Self {
        Self {
            name: name.as_bytes(),
            packed,
            unpacked,
            method: METHOD_STORE,
            flags: 0,
            layout: NameLengthLayout::Canonical,
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let size = 7 + 25 + self.name.len();
        let mut out = vec![0x00, 0x00, 0x74];
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&(size as u16).to_le_bytes());
        let mut fixed = [0u8; 25];
        fixed[0..4].copy_from_slice(&self.packed.to_le_bytes());
        fixed[4..8].copy_from_slice(&self.unpacked.to_le_bytes());
        fixed[18] = self.method;
        let at = self.layout.offset();
        fixed[at..at + 2].copy_from_slice(&(self.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&fixed);
        out.extend_from_slice(self.name);
        out
    }
}

/// Signature, plain main header, one file block and its payload.
pub fn rar4_volume(header: &Rar4Header<'_>, payload: &[u8]) -> Vec<u8> {
    let mut out = RAR4_SIGNATURE.to_vec();
    out.extend(rar4_main(0));
    out.extend(header.bytes());
    out.extend_from_slice(payload);
    out
}

/// Offset of the first payload byte in a [`rar4_volume`].
pub fn rar4_data_offset(name: &str) -> u64 {
    (7 + 13 + 7 + 25 + name.len()) as u64
}

pub fn stored_rar4(name: &str, payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    rar4_volume(&Rar4Header::stored(name, len, len), payload)
}

fn vint(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    write_vint(value, &mut out);
    out
}

/// RAR5 block with the given header type, type-specific fields and
/// optional data area size.
pub fn rar5_block(header_type: u64, body: &[u8], data_size: Option<u64>) -> Vec<u8> {
    let mut content = vint(header_type);
    content.extend(vint(if data_size.is_some() { 0x02 } else { 0 }));
    if let Some(size) = data_size {
        content.extend(vint(size));
    }
    content.extend_from_slice(body);

    let mut out = vec![0u8; 4];
    out.extend(vint(content.len() as u64));
    out.extend(content);
    out
}

/// RAR5 file header fields; `compression` 0 means stored.
pub fn rar5_file_body(name: &str, unpacked: u64, compression: u64) -> Vec<u8> {
    let mut body = vint(0);
    body.extend(vint(unpacked));
    body.extend(vint(0x20));
    body.extend(vint(compression));
    body.extend(vint(1));
    body.extend(vint(name.len() as u64));
    body.extend_from_slice(name.as_bytes());
    body
}

/// Signature, main header, then one stored file block per entry.
pub fn rar5_volume(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = RAR5_SIGNATURE.to_vec();
    out.extend(rar5_block(1, &[0], None));
    for (name, payload) in files {
        let body = rar5_file_body(name, payload.len() as u64, 0);
        out.extend(rar5_block(2, &body, Some(payload.len() as u64)));
        out.extend_from_slice(payload);
    }
    out.extend(rar5_block(5, &[0], None));
    out
}
