//! RAR 2.x-4.x compact Unicode file names.
//!
//! When a file header carries the Unicode-name flag, its name field holds an
//! ASCII rendition, a zero byte, and a compressed description of the real
//! name. The description is a stream of flag bytes; each flag byte yields up
//! to four 2-bit opcodes (more with the extended form):
//!
//! | Opcode | Effect |
//! |--------|--------|
//! | 0 | copy the next ASCII byte |
//! | 1 | emit the next encoded byte as a character |
//! | 2 | emit `high << 8 | next encoded byte` |
//! | 3 | remember the next encoded byte as `high` |

/// Split a name field at its first zero byte and decode it.
pub fn decode_name_field(field: &[u8]) -> String {
    match field.iter().position(|&b| b == 0) {
        Some(zero) => decode_unicode_name(&field[..zero], &field[zero + 1..]),
        None => String::from_utf8_lossy(field).into_owned(),
    }
}

/// Expand the encoded tail against its ASCII base. Remaining ASCII bytes are
/// appended once the encoded data runs out.
pub fn decode_unicode_name(ascii: &[u8], encoded: &[u8]) -> String {
    if encoded.is_empty() {
        return String::from_utf8_lossy(ascii).into_owned();
    }

    let mut out = String::with_capacity(ascii.len());
    let mut ascii_pos = 0;
    let mut pos = 0;
    let mut high: u32 = 0;

    while pos < encoded.len() {
        let flags = encoded[pos];
        pos += 1;

        let (flag_bits, flag_count) = if flags & 0x80 != 0 {
            // Extended form: leading one bits pull in further flag bytes.
            let mut bits = u64::from(flags);
            let mut bit_count = 1;
            while bit_count < 8 && bits & (0x80 >> bit_count) != 0 && pos < encoded.len() {
                bits = ((bits & ((0x80 >> bit_count) - 1)) << 8) | u64::from(encoded[pos]);
                pos += 1;
                bit_count += 1;
            }
            (bits, bit_count * 4)
        } else {
            (u64::from(flags), 4)
        };

        for i in 0..flag_count {
            if ascii_pos >= ascii.len() && pos >= encoded.len() {
                break;
            }
            match (flag_bits >> (i * 2)) & 0x03 {
                0 => {
                    if let Some(&b) = ascii.get(ascii_pos) {
                        out.push(char::from(b));
                        ascii_pos += 1;
                    }
                }
                1 => {
                    if let Some(&b) = encoded.get(pos) {
                        out.push(char::from(b));
                        pos += 1;
                    }
                }
                2 => {
                    if let Some(&low) = encoded.get(pos) {
                        pos += 1;
                        let code = (high << 8) | u32::from(low);
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                }
                _ => {
                    if let Some(&b) = encoded.get(pos) {
                        high = u32::from(b);
                        pos += 1;
                    }
                }
            }
        }
    }

    out.extend(ascii[ascii_pos.min(ascii.len())..].iter().map(|&b| char::from(b)));
    out
}
