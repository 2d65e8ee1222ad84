//! Password buffers and pluggable password sources
//!
//! The protection layer never prompts. Callers hand it either a
//! [`PasswordBuffer`] directly or a [`PasswordSource`] that is asked for one
//! right before key derivation.

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::error::CryptoResult;

/// Password bytes owned by a single protect/unprotect call.
///
/// Zeroized on drop, so moving a buffer into a call is enough to guarantee it
/// is wiped when that call returns, whichever path it returns by.
pub struct PasswordBuffer {
    bytes: Vec<u8>,
}

impl PasswordBuffer {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn from_secret(secret: &SecretString) -> Self {
        Self::from_bytes(secret.expose_secret().as_bytes().to_vec())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<SecretString> for PasswordBuffer {
    fn from(secret: SecretString) -> Self {
        Self::from_secret(&secret)
    }
}

impl From<&str> for PasswordBuffer {
    fn from(password: &str) -> Self {
        Self::from_bytes(password.as_bytes().to_vec())
    }
}

impl Drop for PasswordBuffer {
    fn drop(&mut self) {
        self.bytes.as_mut_slice().zeroize();
        #[cfg(test)]
        crate::wipe_log::record(
            crate::wipe_log::Secret::Password,
            self.bytes.iter().all(|&b| b == 0),
        );
        // Also clears spare capacity
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for PasswordBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordBuffer")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Why a password is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPurpose {
    /// Encrypting a payload; interactive sources usually ask twice.
    Protect,
    /// Decrypting a payload.
    Unprotect,
}

/// Anything that can hand out a password on demand: a prompt, an
/// environment variable, a pre-supplied secret, or a closure.
pub trait PasswordSource {
    fn acquire(&self, purpose: PasswordPurpose) -> CryptoResult<PasswordBuffer>;
}

impl<F> PasswordSource for F
where
    F: Fn(PasswordPurpose) -> CryptoResult<PasswordBuffer>,
{
    fn acquire(&self, purpose: PasswordPurpose) -> CryptoResult<PasswordBuffer> {
        self(purpose)
    }
}

/// A password supplied up front (config, tests, non-interactive callers).
pub struct FixedPassword(SecretString);

impl FixedPassword {
    pub fn new(secret: SecretString) -> Self {
        Self(secret)
    }
}

impl PasswordSource for FixedPassword {
    fn acquire(&self, _purpose: PasswordPurpose) -> CryptoResult<PasswordBuffer> {
        Ok(PasswordBuffer::from_secret(&self.0))
    }
}

impl std::fmt::Debug for FixedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FixedPassword").field(&"[REDACTED]").finish()
    }
}
