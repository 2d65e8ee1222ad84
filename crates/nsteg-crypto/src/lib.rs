//! nsteg-crypto: payload protection for nsteg carriers
//!
//! Architecture: password-based AES-256-GCM with the size header as AAD
//!
//! Pipeline: payload → zstd compress → encrypt → bit stream → embed in carrier
//!
//! Key handling:
//! ```text
//! Password (PasswordBuffer, zeroized on drop)
//!   └── scrypt(N=2^18, r=8, p=8, salt=random 64-bit) → 256-bit key (zeroized on drop)
//!       └── AES-256-GCM (nonce=random 96-bit, AAD=low bytes of both sizes, 128-bit tag)
//! ```
//!
//! Envelope: `nonce(12) || ciphertext || tag(16)`. The salt travels next to
//! it in the carrier frame (see [`layout`]), which can also carry a payload
//! unencrypted.

pub mod aad;
pub mod bits;
pub mod cipher;
pub mod error;
pub mod facade;
pub mod kdf;
pub mod layout;
pub mod password;

pub use aad::{build_aad, AssociatedData};
pub use bits::{decode_bits, decode_u32, encode_bits, encode_u32, BitSequence};
pub use cipher::{decrypt, encrypt, CipherEnvelope, Salt};
pub use error::{CryptoError, CryptoResult};
pub use facade::{protect, unprotect, Protector};
pub use kdf::{derive_key, DerivedKey, KdfParams, MAX_KDF_MEMORY};
pub use layout::{frame_bit_len, CarrierFrame, FrameBody, FrameMode, FRAME_HEADER_BITS};
pub use password::{FixedPassword, PasswordBuffer, PasswordPurpose, PasswordSource};

/// Size of a derived AES key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of an scrypt salt (64-bit)
pub const SALT_SIZE: usize = 8;

/// Size of the associated data bound into every tag
pub const AAD_SIZE: usize = 16;

/// Bytes an envelope adds on top of its plaintext
pub const ENVELOPE_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;
