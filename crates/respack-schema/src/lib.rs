//! Shared types and wire format for respack packages.
//!
//! A package stream starts with a length-prefixed TOML descriptor followed
//! by the content tree. This crate knows how to frame those bytes; it does
//! not know how any particular content type is encoded.

pub mod descriptor;
pub mod hash;
pub mod types;
pub mod wire;

// Re-exports
pub use descriptor::{Descriptor, DescriptorError};
pub use hash::Blake3Hash;
pub use types::UsageMode;
pub use wire::{ContextFreeReader, ContextFreeWriter, FormatError};

/// Magic bytes for ZSTD compression (Little Endian: 0xFD2FB528 -> 28 B5 2F FD)
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Conventional file extension for package files.
pub const PACKAGE_EXTENSION: &str = "rpk";

/// Unwraps a zstd frame if `bytes` starts with one, otherwise returns them untouched.
///
/// An uncompressed stream can never be mistaken for a frame: its first
/// byte is the descriptor length and the bytes after it are UTF-8 text,
/// which never starts with `0xB5`.
///
/// # Errors
///
/// Returns an I/O error if the frame is corrupt.
pub fn decompress_if_needed(bytes: Vec<u8>) -> std::io::Result<Vec<u8>> {
    if bytes.len() >= 4 && bytes[0..4] == ZSTD_MAGIC {
        zstd::decode_all(&bytes[..])
    } else {
        Ok(bytes)
    }
}

/// Compresses an encoded package for distribution.
///
/// # Errors
///
/// Returns an I/O error if the encoder fails.
pub fn compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    zstd::encode_all(bytes, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bytes_pass_through() {
        let bytes = b"\x05hello".to_vec();
        assert_eq!(decompress_if_needed(bytes.clone()).unwrap(), bytes);
    }

    #[test]
    fn compressed_bytes_are_unwrapped() {
        let bytes = b"\x0bname = \"ui\"\x00".to_vec();
        let packed = compress(&bytes).unwrap();
        assert_eq!(packed[0..4], ZSTD_MAGIC);
        assert_eq!(decompress_if_needed(packed).unwrap(), bytes);
    }
}
