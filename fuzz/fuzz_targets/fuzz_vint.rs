#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_index::parsing::rar5::{read_vint, write_vint};

fuzz_target!(|data: &[u8]| {
    if let Ok((value, len)) = read_vint(data) {
        assert!(len <= 10 && len <= data.len());
        let mut encoded = Vec::new();
        let written = write_vint(value, &mut encoded);
        // Overlong encodings decode fine but re-encode shorter.
        assert!(written <= len);
        assert_eq!(read_vint(&encoded), Ok((value, written)));
    }
});
