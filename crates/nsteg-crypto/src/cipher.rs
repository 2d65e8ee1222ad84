//! Password-based AES-256-GCM
//!
//! Envelope format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! The 8-byte scrypt salt is returned separately; it is embedded ahead of the
//! envelope by the carrier layout. Each call derives its own key, uses it for
//! exactly one AEAD operation, and wipes it together with the password before
//! returning.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::aad::AssociatedData;
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{derive_key, DerivedKey, KdfParams};
use crate::password::PasswordBuffer;
use crate::{ENVELOPE_OVERHEAD, NONCE_SIZE, SALT_SIZE};

/// Random 8-byte scrypt salt, stored in the clear next to the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Fresh salt from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; SALT_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::KeyDerivation(format!(
                "salt must be {SALT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// Fresh 96-bit GCM nonce from the thread-local CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// `nonce || ciphertext || tag`, the unit that gets embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherEnvelope {
    bytes: Vec<u8>,
}

impl CipherEnvelope {
    /// Wrap extracted bytes. Structure is only checked on decryption.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length of the plaintext this envelope decrypts to, if well-formed.
    pub fn plaintext_len(&self) -> Option<usize> {
        self.bytes.len().checked_sub(ENVELOPE_OVERHEAD)
    }

    /// Split into the leading nonce and `ciphertext || tag`.
    ///
    /// Anything too short to hold a nonce and a tag counts as a corrupted
    /// envelope and fails authentication.
    pub fn split(&self) -> CryptoResult<(&[u8], &[u8])> {
        if self.plaintext_len().is_none() {
            tracing::debug!(
                len = self.bytes.len(),
                min = ENVELOPE_OVERHEAD,
                "envelope too short"
            );
            return Err(CryptoError::Authentication);
        }
        Ok(self.bytes.split_at(NONCE_SIZE))
    }
}

/// Expand `key` into a cipher. The key is wiped as soon as the schedule
/// exists; the schedule itself is wiped when the cipher drops (`aes/zeroize`).
fn init_cipher(key: DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(key.as_bytes().into())
}

/// Encrypt `plaintext` under a key derived from `password` and a fresh salt.
///
/// Returns the salt and the `nonce || ciphertext || tag` envelope. The
/// password is consumed and wiped before this returns.
pub fn encrypt(
    plaintext: &[u8],
    aad: &AssociatedData,
    password: PasswordBuffer,
    params: &KdfParams,
) -> CryptoResult<(Salt, CipherEnvelope)> {
    if u32::try_from(plaintext.len()).is_err() {
        return Err(CryptoError::Encoding(format!(
            "payload of {} bytes exceeds the 32-bit size header",
            plaintext.len()
        )));
    }

    let salt = Salt::generate();
    let nonce_bytes = generate_nonce();

    let key = derive_key(&password, salt.as_bytes(), params)?;
    drop(password);
    let cipher = init_cipher(key);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|e| CryptoError::Encoding(format!("AES-GCM rejected payload: {e}")))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);

    tracing::trace!(
        plaintext_len = plaintext.len(),
        envelope_len = envelope.len(),
        "payload encrypted"
    );
    Ok((salt, CipherEnvelope::from_bytes(envelope)))
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// Fails with [`CryptoError::Authentication`] for a wrong password, a
/// modified envelope, or a mismatched AAD; no plaintext is released in any
/// of those cases. The password is consumed and wiped before this returns.
pub fn decrypt(
    envelope: &CipherEnvelope,
    salt: &Salt,
    aad: &AssociatedData,
    password: PasswordBuffer,
    params: &KdfParams,
) -> CryptoResult<Vec<u8>> {
    let (nonce_bytes, ciphertext) = envelope.split()?;

    let key = derive_key(&password, salt.as_bytes(), params)?;
    drop(password);
    let cipher = init_cipher(key);

    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| {
            tracing::debug!(envelope_len = envelope.len(), "tag verification failed");
            CryptoError::Authentication
        })
}
