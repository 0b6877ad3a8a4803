//! The stream trailer
//!
//! Every stream ends with a fixed 40-byte BGZF block that compresses to
//! nothing and carries one extra gzip subfield (`IP`) holding the virtual
//! file offset of the index section. The block doubles as the BGZF
//! end-of-file terminator, so a file is self-describing: the last 40 bytes
//! locate the index without inflating anything.

/// File extension for block-compressed interval streams
pub const BCI_EXTENSION: &str = "bci";

/// Number of bytes in the trailer block
pub const TRAILER_LEN: usize = 40;

/// Byte offset of the index pointer within the trailer block
pub const INDEX_POINTER_OFFSET: usize = 22;

/// The empty BGZF block template carrying the index pointer
///
/// Bytes 22..30 are a placeholder: they are patched with the little-endian
/// index offset when a stream is closed, and ignored when a trailer is
/// verified.
pub const TRAILER_TEMPLATE: [u8; TRAILER_LEN] = [
    0x1f, 0x8b, // gzip magic
    0x08, // deflate
    0x04, // FEXTRA
    0x00, 0x00, 0x00, 0x00, // modification time
    0x00, // extra flags
    0xff, // unknown OS
    0x12, 0x00, // XLEN = 18
    b'B', b'C', 0x02, 0x00, // BC subfield, 2 data bytes
    0x27, 0x00, // total block size - 1 = 39
    b'I', b'P', 0x08, 0x00, // IP subfield, 8 data bytes
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // index pointer (patched)
    0x03, 0x00, // empty deflate payload
    0x00, 0x00, 0x00, 0x00, // crc32 of empty input
    0x00, 0x00, 0x00, 0x00, // uncompressed size = 0
];

/// Returns the trailer block with `index_vpos` patched in
#[must_use]
pub(crate) fn with_index_pointer(index_vpos: u64) -> [u8; TRAILER_LEN] {
    let mut block = TRAILER_TEMPLATE;
    block[INDEX_POINTER_OFFSET..INDEX_POINTER_OFFSET + 8]
        .copy_from_slice(&index_vpos.to_le_bytes());
    block
}

/// Verifies a final block against the template and decodes the index pointer
///
/// Returns `None` when any byte outside the pointer region differs from the
/// template.
#[must_use]
pub(crate) fn read_index_pointer(block: &[u8; TRAILER_LEN]) -> Option<u64> {
    if block[..INDEX_POINTER_OFFSET] != TRAILER_TEMPLATE[..INDEX_POINTER_OFFSET]
        || block[INDEX_POINTER_OFFSET + 8..] != TRAILER_TEMPLATE[INDEX_POINTER_OFFSET + 8..]
    {
        return None;
    }
    let mut pointer = [0u8; 8];
    pointer.copy_from_slice(&block[INDEX_POINTER_OFFSET..INDEX_POINTER_OFFSET + 8]);
    Some(u64::from_le_bytes(pointer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_shape() {
        assert_eq!(TRAILER_TEMPLATE.len(), TRAILER_LEN);
        // gzip magic and the declared block size
        assert_eq!(&TRAILER_TEMPLATE[..2], &[0x1f, 0x8b]);
        assert_eq!(
            u16::from_le_bytes([TRAILER_TEMPLATE[16], TRAILER_TEMPLATE[17]]),
            (TRAILER_LEN - 1) as u16
        );
        // the IP subfield declares exactly the pointer bytes
        assert_eq!(&TRAILER_TEMPLATE[18..22], &[b'I', b'P', 0x08, 0x00]);
    }

    #[test]
    fn test_pointer_round_trip() {
        let block = with_index_pointer(0x0123_4567_89ab_cdef);
        assert_eq!(read_index_pointer(&block), Some(0x0123_4567_89ab_cdef));

        // prefix and suffix stay template-identical
        assert_eq!(&block[..INDEX_POINTER_OFFSET], &TRAILER_TEMPLATE[..INDEX_POINTER_OFFSET]);
        assert_eq!(&block[30..], &TRAILER_TEMPLATE[30..]);
    }

    #[test]
    fn test_pointer_is_little_endian() {
        let block = with_index_pointer(1);
        assert_eq!(block[INDEX_POINTER_OFFSET], 1);
        assert_eq!(&block[INDEX_POINTER_OFFSET + 1..INDEX_POINTER_OFFSET + 8], &[0; 7]);
    }

    #[test]
    fn test_mutated_template_is_rejected() {
        let mut block = with_index_pointer(1024);
        block[0] ^= 0xff;
        assert_eq!(read_index_pointer(&block), None);

        let mut block = with_index_pointer(1024);
        block[TRAILER_LEN - 1] ^= 0xff;
        assert_eq!(read_index_pointer(&block), None);
    }

    #[test]
    fn test_mutated_pointer_is_not_rejected() {
        // pointer bytes are data, not template: mutating them yields a
        // different offset but a structurally valid trailer
        let mut block = with_index_pointer(1024);
        block[INDEX_POINTER_OFFSET] ^= 0xff;
        let decoded = read_index_pointer(&block).unwrap();
        assert_ne!(decoded, 1024);
    }
}
