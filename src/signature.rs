//! Leading-byte signature check for the unsupported RAR5 container format.

/// Full 8-byte RAR5 magic.
const RAR5_SIGNATURE: [u8; 8] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x01, 0x00];

/// 7-byte variant of the magic, differing only in the trailing version byte.
const RAR5_SIGNATURE_SHORT: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

/// Inspects the first bytes of `buffer` for the RAR5 magic.
///
/// A match means the archive must be rejected before any decompression
/// provider is constructed. Buffers shorter than the magic never match.
pub fn is_rar5(buffer: &[u8]) -> bool {
    buffer.starts_with(&RAR5_SIGNATURE) || buffer.starts_with(&RAR5_SIGNATURE_SHORT)
}
