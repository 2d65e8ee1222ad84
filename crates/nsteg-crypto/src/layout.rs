//! Carrier frame: the exact bit stream handed to a carrier embedder
//!
//! ```text
//! [32 bits: uncompressed size][32 bits: compressed size][8 bits: mode]
//! mode 0x01 (protected):
//!   [64 bits: scrypt salt]
//!   [(12 + compressed + 16) * 8 bits: nonce || ciphertext || tag]
//! mode 0x00 (plain):
//!   [compressed * 8 bits: payload]
//! ```
//!
//! All fields are MSB first. The body length is implied by the compressed
//! size and the mode, so extraction can stop reading carrier bits as soon as
//! the header is known. Bits after the frame are ignored.
//!
//! Nothing authenticates a plain frame or the mode byte itself. Turning a
//! protected frame into a plain one yields ciphertext bytes, which then fail
//! the exact-length check on decompression.

use nsteg_core::types::{SizeHeader, SIZE_BITS};

use crate::bits::{decode_u32, encode_u32, BitSequence};
use crate::cipher::{CipherEnvelope, Salt};
use crate::error::{CryptoError, CryptoResult};
use crate::facade::Protector;
use crate::password::PasswordSource;
use crate::{ENVELOPE_OVERHEAD, SALT_SIZE};

/// Width of the mode field.
pub const MODE_BITS: usize = 8;

/// Bits in front of every frame body: both sizes and the mode.
pub const FRAME_HEADER_BITS: usize = 2 * SIZE_BITS + MODE_BITS;

/// Whether a frame's payload is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Plain,
    Protected,
}

impl FrameMode {
    fn to_byte(self) -> u8 {
        match self {
            FrameMode::Plain => 0x00,
            FrameMode::Protected => 0x01,
        }
    }

    fn from_byte(byte: u8) -> CryptoResult<Self> {
        match byte {
            0x00 => Ok(FrameMode::Plain),
            0x01 => Ok(FrameMode::Protected),
            other => Err(CryptoError::Encoding(format!(
                "unknown frame mode {other:#04x}"
            ))),
        }
    }
}

/// Total carrier bits needed for a payload of `compressed` bytes.
pub fn frame_bit_len(compressed: u32, mode: FrameMode) -> u64 {
    let body_bytes = match mode {
        FrameMode::Plain => u64::from(compressed),
        FrameMode::Protected => {
            SALT_SIZE as u64 + u64::from(compressed) + ENVELOPE_OVERHEAD as u64
        }
    };
    FRAME_HEADER_BITS as u64 + body_bytes * 8
}

/// What follows the frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    Plain(Vec<u8>),
    Protected { salt: Salt, envelope: CipherEnvelope },
}

impl FrameBody {
    pub fn mode(&self) -> FrameMode {
        match self {
            FrameBody::Plain(_) => FrameMode::Plain,
            FrameBody::Protected { .. } => FrameMode::Protected,
        }
    }
}

/// Size header plus the payload it describes, encrypted or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierFrame {
    sizes: SizeHeader,
    body: FrameBody,
}

impl CarrierFrame {
    /// Assemble a protected frame, checking the envelope matches the
    /// declared compressed size.
    pub fn new(sizes: SizeHeader, salt: Salt, envelope: CipherEnvelope) -> CryptoResult<Self> {
        let expected = sizes.compressed as usize + ENVELOPE_OVERHEAD;
        if envelope.len() != expected {
            return Err(CryptoError::Encoding(format!(
                "envelope is {} bytes, size header implies {expected}",
                envelope.len()
            )));
        }
        Ok(Self {
            sizes,
            body: FrameBody::Protected { salt, envelope },
        })
    }

    /// Assemble an unencrypted frame around an already compressed payload.
    pub fn plain(sizes: SizeHeader, payload: Vec<u8>) -> CryptoResult<Self> {
        check_declared_len(&payload, &sizes)?;
        tracing::debug!(
            uncompressed = sizes.uncompressed,
            compressed = sizes.compressed,
            "building unencrypted frame"
        );
        Ok(Self {
            sizes,
            body: FrameBody::Plain(payload),
        })
    }

    /// Encrypt `payload` (already compressed, `sizes.compressed` bytes long)
    /// into a frame.
    pub fn protect<S>(
        protector: &Protector,
        payload: &[u8],
        sizes: SizeHeader,
        source: &S,
    ) -> CryptoResult<Self>
    where
        S: PasswordSource + ?Sized,
    {
        check_declared_len(payload, &sizes)?;
        let (salt, envelope) = protector.protect_from(payload, &sizes, source)?;
        Self::new(sizes, salt, envelope)
    }

    /// Recover the frame's compressed payload.
    ///
    /// Protected frames are authenticated against the frame's own size
    /// header. Plain frames never ask `source` for a password.
    pub fn unprotect<S>(&self, protector: &Protector, source: &S) -> CryptoResult<Vec<u8>>
    where
        S: PasswordSource + ?Sized,
    {
        match &self.body {
            FrameBody::Plain(payload) => Ok(payload.clone()),
            FrameBody::Protected { salt, envelope } => {
                protector.unprotect_from(envelope, salt, &self.sizes, source)
            }
        }
    }

    pub fn sizes(&self) -> &SizeHeader {
        &self.sizes
    }

    pub fn mode(&self) -> FrameMode {
        self.body.mode()
    }

    pub fn body(&self) -> &FrameBody {
        &self.body
    }

    pub fn bit_len(&self) -> usize {
        let body_bytes = match &self.body {
            FrameBody::Plain(payload) => payload.len(),
            FrameBody::Protected { envelope, .. } => SALT_SIZE + envelope.len(),
        };
        FRAME_HEADER_BITS + body_bytes * 8
    }

    pub fn to_bits(&self) -> BitSequence {
        let mut bits = BitSequence::with_capacity(self.bit_len());
        bits.append(&encode_u32(self.sizes.uncompressed));
        bits.append(&encode_u32(self.sizes.compressed));
        bits.append(&BitSequence::from_bytes(&[self.mode().to_byte()]));
        match &self.body {
            FrameBody::Plain(payload) => bits.append(&BitSequence::from_bytes(payload)),
            FrameBody::Protected { salt, envelope } => {
                bits.append(&BitSequence::from_bytes(salt.as_bytes()));
                bits.append(&BitSequence::from_bytes(envelope.as_bytes()));
            }
        }
        bits
    }

    /// Parse a frame from extracted carrier bits.
    pub fn from_bits(bits: &BitSequence) -> CryptoResult<Self> {
        if bits.len() < FRAME_HEADER_BITS {
            return Err(CryptoError::Encoding(format!(
                "carrier holds {} bits, frame header needs {FRAME_HEADER_BITS}",
                bits.len()
            )));
        }

        let uncompressed = decode_u32(&bits.slice(0, SIZE_BITS)?)?;
        let compressed = decode_u32(&bits.slice(SIZE_BITS, SIZE_BITS)?)?;
        let sizes = SizeHeader::new(uncompressed, compressed);

        let mode_byte = bits.slice(2 * SIZE_BITS, MODE_BITS)?.to_bytes()?;
        let mode = FrameMode::from_byte(mode_byte[0])?;

        let needed = frame_bit_len(compressed, mode);
        if (bits.len() as u64) < needed {
            return Err(CryptoError::Encoding(format!(
                "carrier holds {} bits, frame declares {needed}",
                bits.len()
            )));
        }
        tracing::trace!(uncompressed, compressed, ?mode, bits = needed, "parsed carrier frame");

        let body_bits = needed as usize - FRAME_HEADER_BITS;
        let body = bits.slice(FRAME_HEADER_BITS, body_bits)?.to_bytes()?;
        match mode {
            FrameMode::Plain => Self::plain(sizes, body),
            FrameMode::Protected => {
                let (salt, envelope) = body.split_at(SALT_SIZE);
                Self::new(
                    sizes,
                    Salt::from_slice(salt)?,
                    CipherEnvelope::from_bytes(envelope.to_vec()),
                )
            }
        }
    }
}

fn check_declared_len(payload: &[u8], sizes: &SizeHeader) -> CryptoResult<()> {
    if payload.len() != sizes.compressed as usize {
        return Err(CryptoError::Encoding(format!(
            "payload is {} bytes, size header declares {}",
            payload.len(),
            sizes.compressed
        )));
    }
    Ok(())
}
