mod common;

use std::path::Path;

use common::*;
use rar_index::{
    index_volume, index_volumes, index_volumes_parallel, list_files, IndexOptions,
    MemoryFileSystem, NameLengthLayout, RarError, RarVersion,
};

fn index_one(data: Vec<u8>) -> rar_index::Result<rar_index::VolumeIndex> {
    let fs = MemoryFileSystem::new().with_file("test.rar", data);
    index_volume(&fs, Path::new("test.rar"), &IndexOptions::default())
}

#[test]
fn single_stored_rar4_file() {
    let index = index_one(stored_rar4("file3.txt", b"hello")).unwrap();
    assert_eq!(index.format, RarVersion::Rar4);
    assert_eq!(index.file_blocks.len(), 1);

    let block = &index.file_blocks[0];
    assert_eq!(block.name, "file3.txt");
    assert_eq!(block.packed_size, 5);
    assert_eq!(block.unpacked_size, 5);
    assert!(block.stored);
    assert!(!block.continued);
    assert_eq!(block.data_offset, rar4_data_offset("file3.txt"));
    assert_eq!(index.total_header_bytes, block.data_offset);
}

#[test]
fn single_stored_rar5_file_without_data_area() {
    let mut data = RAR5_SIGNATURE.to_vec();
    data.extend(rar5_block(1, &[0], None));
    data.extend(rar5_block(2, &rar5_file_body("file5.data", 5, 0), None));

    let index = index_one(data.clone()).unwrap();
    assert_eq!(index.format, RarVersion::Rar5);
    assert_eq!(index.file_blocks.len(), 1);
    let block = &index.file_blocks[0];
    assert_eq!(block.name, "file5.data");
    assert_eq!(block.unpacked_size, 5);
    assert!(block.stored);
    assert_eq!(block.data_offset, data.len() as u64);
}

#[test]
fn rar5_volume_lists_every_file() {
    let data = rar5_volume(&[("a.txt", b"alpha"), ("b.txt", b"bravo!"), ("c.txt", b"")]);
    let index = index_one(data.clone()).unwrap();

    let names: Vec<_> = index.file_blocks.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
    for pair in index.file_blocks.windows(2) {
        assert!(pair[0].data_offset < pair[1].data_offset);
    }
    let b = &index.file_blocks[1];
    let start = b.data_offset as usize;
    assert_eq!(&data[start..start + b.volume_data_size as usize], b"bravo!");
    assert_eq!(index.total_header_bytes, index.file_blocks[0].data_offset);
}

#[test]
fn split_file_aggregates_across_volumes() {
    let fs = MemoryFileSystem::new()
        .with_file("multi.part1.rar", rar4_volume(&Rar4Header::stored("multi.bin", 5, 10), b"01234"))
        .with_file("multi.part2.rar", rar4_volume(&Rar4Header::stored("multi.bin", 3, 0), b"567"));
    let paths = ["multi.part1.rar", "multi.part2.rar"];

    let files = list_files(&fs, &paths, 2, &IndexOptions::default()).unwrap();
    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file.name, "multi.bin");
    assert_eq!(file.total_packed_size, 8);
    assert_eq!(file.total_unpacked_size, 10);
    assert_eq!(file.parts.len(), 2);
    assert!(file.all_stored);
}

#[test]
fn encrypted_main_header_is_password_protected() {
    let mut data = RAR4_SIGNATURE.to_vec();
    data.extend(rar4_main(0x0080));
    // A perfectly readable file header behind it must not be found by the
    // legacy scanner.
    data.extend(Rar4Header::stored("visible.txt", 2, 2).bytes());
    data.extend_from_slice(b"hi");

    let err = index_one(data).unwrap_err();
    assert!(err.is_password_protected());
    assert_eq!(err.path(), Some(Path::new("test.rar")));
}

#[test]
fn listing_rejects_compressed_file() {
    let header = Rar4Header {
        method: METHOD_NORMAL,
        ..Rar4Header::stored("packed.bin", 4, 9)
    };
    let fs = MemoryFileSystem::new()
        .with_file("a.rar", stored_rar4("plain.txt", b"plain"))
        .with_file("b.rar", rar4_volume(&header, b"\x01\x02\x03\x04"));
    let paths = ["a.rar", "b.rar"];

    let volumes = index_volumes(&fs, &paths, &IndexOptions::default()).unwrap();
    assert!(!volumes[1].file_blocks[0].stored);

    let err = list_files(&fs, &paths, 0, &IndexOptions::default()).unwrap_err();
    assert!(err.is_compressed_unsupported());
    assert!(matches!(&err, RarError::File { name, .. } if name == "packed.bin"));
}

#[test]
fn signature_after_sfx_stub() {
    let mut data = vec![0x4D; 32];
    data.extend(stored_rar4("file3.txt", b"hello"));

    let index = index_one(data).unwrap();
    assert_eq!(index.format, RarVersion::Rar4);
    let block = &index.file_blocks[0];
    assert_eq!(block.header_offset, 32 + 7 + 13);
    assert_eq!(block.data_offset, 32 + rar4_data_offset("file3.txt"));
}

#[test]
fn signature_beyond_scan_window_not_found() {
    let mut data = vec![0x4D; 2048];
    data.extend(stored_rar4("late.txt", b"x"));
    let err = index_one(data).unwrap_err();
    assert!(matches!(err.root(), RarError::SignatureNotFound));
}

#[test]
fn shifted_name_length_layout() {
    let header = Rar4Header {
        layout: NameLengthLayout::Shifted,
        ..Rar4Header::stored("shift.bin", 3, 3)
    };
    let fs = MemoryFileSystem::new().with_file("s.rar", rar4_volume(&header, b"abc"));
    let options = IndexOptions {
        name_length_layout: NameLengthLayout::Shifted,
        ..IndexOptions::default()
    };

    let index = index_volume(&fs, Path::new("s.rar"), &options).unwrap();
    assert_eq!(index.file_blocks[0].name, "shift.bin");
    assert_eq!(index.file_blocks[0].data_offset, rar4_data_offset("shift.bin"));
}

#[test]
fn legacy_scan_recovers_first_file() {
    // A bogus block whose ADD_SIZE swallows the rest of the volume.
    let mut data = RAR4_SIGNATURE.to_vec();
    data.extend_from_slice(&[0x11, 0x22, 0x75, 0x00, 0x80, 0x0B, 0x00, 0xFF, 0xFF, 0x00, 0x00]);
    let header_offset = data.len() as u64;
    data.extend(Rar4Header::stored("recovered.txt", 4, 4).bytes());
    data.extend_from_slice(b"data");

    for fs in [MemoryFileSystem::new(), MemoryFileSystem::sequential()] {
        let fs = fs.with_file("old.rar", data.clone());
        let index = index_volume(&fs, Path::new("old.rar"), &IndexOptions::default()).unwrap();
        assert_eq!(index.format, RarVersion::Rar4);
        assert_eq!(index.file_blocks.len(), 1);
        let block = &index.file_blocks[0];
        assert_eq!(block.name, "recovered.txt");
        assert_eq!(block.header_offset, header_offset);
        assert_eq!(block.data_offset, data.len() as u64 - 4);
    }
}

#[test]
fn sequential_sources_match_seekable() {
    let mut seekable = MemoryFileSystem::new();
    let mut sequential = MemoryFileSystem::sequential();
    let mut paths = Vec::new();
    for i in 0..4 {
        let path = format!("v{i}.rar");
        let data = if i % 2 == 0 {
            stored_rar4(&format!("f{i}.bin"), &vec![i as u8; 300])
        } else {
            rar5_volume(&[("x.bin", &[1u8; 20][..]), ("y.bin", &[2u8; 9000][..])])
        };
        seekable.insert(&path, data.clone());
        sequential.insert(&path, data);
        paths.push(path);
    }

    let options = IndexOptions::default();
    let expected = index_volumes(&seekable, &paths, &options).unwrap();
    assert_eq!(index_volumes(&sequential, &paths, &options).unwrap(), expected);
    assert_eq!(index_volumes_parallel(&sequential, &paths, 3, &options).unwrap(), expected);
}

#[test]
fn parallel_empty_input() {
    let paths: [&str; 0] = [];
    let volumes = index_volumes_parallel(&MemoryFileSystem::new(), &paths, 0, &IndexOptions::default()).unwrap();
    assert!(volumes.is_empty());
}

#[test]
fn parallel_reports_failing_path() {
    let mut fs = MemoryFileSystem::new();
    let mut paths = Vec::new();
    for i in 0..8 {
        let path = format!("set.part{i}.rar");
        let data = if i == 5 {
            b"garbage without any marker".to_vec()
        } else {
            stored_rar4("set.bin", &[i as u8; 64])
        };
        fs.insert(&path, data);
        paths.push(path);
    }

    let err = index_volumes_parallel(&fs, &paths, 4, &IndexOptions::default()).unwrap_err();
    assert_eq!(err.path(), Some(Path::new("set.part5.rar")));
    assert!(matches!(err.root(), RarError::SignatureNotFound));
}
