//! Nibble packer for lists of non-negative integers.
//!
//! The ids are joined into a comma-delimited decimal string and every
//! character of that string is stored in one nibble: digits keep their
//! value, the delimiter takes 0xA, and an odd character count is padded
//! with 0xF ("no digit here"). Two characters per byte roughly halves the
//! footprint of recently-viewed id lists inside the session map.

const DELIMITER_NIBBLE: u8 = 0xA;
const PAD_NIBBLE: u8 = 0xF;

/// Pack a list of ids into nibble-encoded bytes.
pub fn pack_ids(ids: &[u64]) -> Vec<u8> {
    let joined = ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let nibbles: Vec<u8> = joined
        .bytes()
        .map(|byte| match byte {
            b'0'..=b'9' => byte - b'0',
            _ => DELIMITER_NIBBLE,
        })
        .collect();

    let mut packed = Vec::with_capacity(nibbles.len().div_ceil(2));
    for pair in nibbles.chunks(2) {
        let high = pair[0];
        let low = if pair.len() == 2 { pair[1] } else { PAD_NIBBLE };
        packed.push((high << 4) | low);
    }
    packed
}

/// Unpack nibble-encoded bytes back into a list of ids.
///
/// Tolerant of garbled input: nibbles with no character mapping are
/// skipped and tokens that do not parse as a non-negative integer are
/// silently discarded, so a partially damaged pack yields the ids that
/// survived rather than an error.
pub fn unpack_ids(packed: &[u8]) -> Vec<u64> {
    let mut joined = String::with_capacity(packed.len() * 2);
    for &byte in packed {
        for nibble in [byte >> 4, byte & 0x0F] {
            match nibble {
                0..=9 => joined.push((b'0' + nibble) as char),
                DELIMITER_NIBBLE => joined.push(','),
                _ => {}
            }
        }
    }

    joined
        .split(',')
        .filter_map(|token| token.parse::<u64>().ok())
        .collect()
}
