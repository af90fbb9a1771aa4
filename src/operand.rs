//! Sentinel-delimited dual-operand packing.
//!
//! Arithmetic and comparison instructions carry two signed 32-bit operands in
//! one flat parameter buffer: the bytes of operand A, a single [`SEPARATOR`]
//! byte, then the bytes of operand B. Each side is normalized to exactly four
//! bytes (truncated from the end if longer, zero-padded at the end if
//! shorter) and read as a little-endian `i32`.

/// Byte separating operand A from operand B inside a parameter buffer.
pub const SEPARATOR: u8 = 254;

/// Decodes a parameter buffer into its two packed operands.
///
/// Only the first [`SEPARATOR`] splits the buffer; any later `254` bytes are
/// literal data belonging to operand B. A buffer without a separator puts
/// every byte into operand A and leaves operand B at zero; an empty buffer
/// yields `(0, 0)`.
pub fn decode_pair(bytes: &[u8]) -> (i32, i32) {
    match bytes.iter().position(|&b| b == SEPARATOR) {
        Some(split) => (
            read_normalized(&bytes[..split]),
            read_normalized(&bytes[split + 1..]),
        ),
        None => (read_normalized(bytes), 0),
    }
}

/// Packs two operands into the separator-delimited wire form.
pub fn encode_pair(a: i32, b: i32) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    out.extend_from_slice(&a.to_le_bytes());
    out.push(SEPARATOR);
    out.extend_from_slice(&b.to_le_bytes());
    out
}

/// Normalizes an operand segment to four bytes and reads it little-endian.
fn read_normalized(segment: &[u8]) -> i32 {
    let mut word = [0u8; 4];
    let len = segment.len().min(4);
    word[..len].copy_from_slice(&segment[..len]);
    i32::from_le_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero_pair() {
        assert_eq!(decode_pair(&[]), (0, 0));
    }

    #[test]
    fn no_separator_fills_operand_a() {
        assert_eq!(decode_pair(&[5]), (5, 0));
        assert_eq!(decode_pair(&[1, 2]), (0x0201, 0));
        assert_eq!(decode_pair(&[0xFF, 0xFF, 0xFF, 0xFF]), (-1, 0));
    }

    #[test]
    fn separator_splits_operands() {
        assert_eq!(decode_pair(&[5, 0, 0, 0, 254, 3, 0, 0, 0]), (5, 3));
        assert_eq!(decode_pair(&[254, 7]), (0, 7));
        assert_eq!(decode_pair(&[7, 254]), (7, 0));
    }

    #[test]
    fn short_segments_are_zero_padded() {
        assert_eq!(decode_pair(&[1, 254, 2]), (1, 2));
    }

    #[test]
    fn long_segments_are_truncated_from_the_end() {
        // A fifth byte on either side is dropped, not shifted in.
        assert_eq!(decode_pair(&[1, 0, 0, 0, 9, 254, 2, 0, 0, 0, 9]), (1, 2));
    }

    #[test]
    fn only_first_separator_splits() {
        // The second 254 is literal data in operand B's low byte.
        assert_eq!(decode_pair(&[1, 254, 254]), (1, 254));
    }

    #[test]
    fn encode_pair_round_trips() {
        for (a, b) in [(0, 0), (5, 3), (-1, i32::MAX), (i32::MIN, -7)] {
            assert_eq!(decode_pair(&encode_pair(a, b)), (a, b));
        }
    }
}
