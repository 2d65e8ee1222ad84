//! Associated data derived from the payload size header
//!
//! ```text
//! AAD (16 bytes) = compressed_bits[24..32] || uncompressed_bits[24..32]
//! ```
//!
//! Each AAD byte is one bit (0 or 1) of the embedded 32-bit size fields,
//! taken from the low-order end. The AAD is never embedded: the decoder
//! rebuilds it from the size header it extracted, so an envelope paired
//! with a header differing in the low byte of either size fails
//! authentication instead of being mis-parsed.
//!
//! Only those low bytes are bound. Changes confined to bits 8..32 of a size
//! leave the AAD unchanged; the carrier frame's envelope-length check and
//! the exact-length check on decompression are what catch those.

use nsteg_core::types::{SizeHeader, SIZE_BITS};

use crate::bits::{encode_u32, BitSequence};
use crate::error::{CryptoError, CryptoResult};
use crate::AAD_SIZE;

/// Bits taken from the tail of each size field.
const BITS_PER_FIELD: usize = AAD_SIZE / 2;

/// Fixed 16-byte associated data bound into the authentication tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssociatedData([u8; AAD_SIZE]);

impl AssociatedData {
    /// AAD for a size header, via its embedded bit representation.
    pub fn for_sizes(sizes: &SizeHeader) -> Self {
        let uncompressed = encode_u32(sizes.uncompressed);
        let compressed = encode_u32(sizes.compressed);
        Self::assemble(uncompressed.as_slice(), compressed.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; AAD_SIZE] {
        &self.0
    }

    fn assemble(uncompressed: &[u8], compressed: &[u8]) -> Self {
        let mut header = [0u8; AAD_SIZE];
        header[..BITS_PER_FIELD].copy_from_slice(&compressed[SIZE_BITS - BITS_PER_FIELD..]);
        header[BITS_PER_FIELD..].copy_from_slice(&uncompressed[SIZE_BITS - BITS_PER_FIELD..]);
        Self(header)
    }
}

/// Build the AAD from the 32-bit representations of both sizes.
pub fn build_aad(
    uncompressed_bits: &BitSequence,
    compressed_bits: &BitSequence,
) -> CryptoResult<AssociatedData> {
    for (name, bits) in [("uncompressed", uncompressed_bits), ("compressed", compressed_bits)] {
        if bits.len() != SIZE_BITS {
            return Err(CryptoError::Encoding(format!(
                "{name} size must be {SIZE_BITS} bits, got {}",
                bits.len()
            )));
        }
    }
    Ok(AssociatedData::assemble(
        uncompressed_bits.as_slice(),
        compressed_bits.as_slice(),
    ))
}
