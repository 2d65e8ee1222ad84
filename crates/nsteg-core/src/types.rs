use serde::{Deserialize, Serialize};

/// Number of bits used for each size field when a header is embedded.
pub const SIZE_BITS: usize = 32;

/// Payload sizes before and after compression.
///
/// Produced once when the payload is packed and carried verbatim next to the
/// ciphertext. Both values are bound into the AEAD associated data, so the
/// header must be extracted bit-exact for decryption to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeHeader {
    /// Payload length before compression
    pub uncompressed: u32,
    /// Payload length after compression (the length that gets encrypted)
    pub compressed: u32,
}

impl SizeHeader {
    pub fn new(uncompressed: u32, compressed: u32) -> Self {
        Self {
            uncompressed,
            compressed,
        }
    }

    /// Header for a payload that was not compressed.
    pub fn uncompressed(len: u32) -> Self {
        Self::new(len, len)
    }

    /// Build a header from in-memory lengths, rejecting anything that does
    /// not fit the 32-bit wire fields.
    pub fn from_lengths(uncompressed: usize, compressed: usize) -> Option<Self> {
        Some(Self::new(
            u32::try_from(uncompressed).ok()?,
            u32::try_from(compressed).ok()?,
        ))
    }

    /// Compression ratio (compressed / uncompressed), 1.0 for empty payloads.
    pub fn ratio(&self) -> f64 {
        if self.uncompressed == 0 {
            1.0
        } else {
            self.compressed as f64 / self.uncompressed as f64
        }
    }
}
