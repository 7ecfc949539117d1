#![no_main]
use std::path::Path;

use libfuzzer_sys::fuzz_target;
use rar_index::{index_volume, IndexOptions, MemoryFileSystem};

fuzz_target!(|data: &[u8]| {
    let mut volume = b"Rar!\x1a\x07\x00".to_vec();
    volume.extend_from_slice(data);

    for fs in [MemoryFileSystem::new(), MemoryFileSystem::sequential()] {
        let fs = fs.with_file("fuzz.rar", volume.clone());
        if let Ok(index) = index_volume(&fs, Path::new("fuzz.rar"), &IndexOptions::default()) {
            for block in &index.file_blocks {
                assert_eq!(block.data_offset, block.header_offset + block.header_len);
                assert!(block.data_end() <= volume.len() as u64);
            }
        }
    }
});
