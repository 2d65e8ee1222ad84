//! Key derivation: scrypt password + salt → 256-bit AES key

use std::time::Instant;

use nsteg_core::config::CryptoConfig;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::password::PasswordBuffer;
use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit key derived from a password via scrypt.
///
/// Lives for one cipher operation and is zeroized on drop.
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
        #[cfg(test)]
        crate::wipe_log::record(
            crate::wipe_log::Secret::DerivedKey,
            self.bytes.iter().all(|&b| b == 0),
        );
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// scrypt cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost N (default: 18)
    pub log_n: u8,
    /// Block size (default: 8)
    pub r: u32,
    /// Parallelization (default: 8)
    pub p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: 18,
            r: 8,
            p: 8,
        }
    }
}

/// Largest scrypt working set accepted (`128 * r * N` bytes), 4 GiB.
pub const MAX_KDF_MEMORY: u64 = 4 << 30;

impl KdfParams {
    /// Bytes of memory scrypt needs for these parameters, if representable.
    pub fn memory_bytes(&self) -> Option<u64> {
        let n = 1u64.checked_shl(u32::from(self.log_n))?;
        128u64.checked_mul(u64::from(self.r))?.checked_mul(n)
    }

    /// Reject parameters scrypt cannot run, or cannot run within
    /// [`MAX_KDF_MEMORY`], before any allocation happens.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.r == 0 || self.p == 0 {
            return Err(CryptoError::KeyDerivation(format!(
                "scrypt r and p must be positive (r={}, p={})",
                self.r, self.p
            )));
        }
        // RFC 7914: N < 2^(128 * r / 8)
        if self.log_n == 0 || u64::from(self.log_n) >= u64::from(self.r) * 16 {
            return Err(CryptoError::KeyDerivation(format!(
                "scrypt log_n {} outside 1..{} for r={}",
                self.log_n,
                u64::from(self.r) * 16,
                self.r
            )));
        }
        match self.memory_bytes() {
            Some(bytes) if bytes <= MAX_KDF_MEMORY => Ok(()),
            _ => Err(CryptoError::KeyDerivation(format!(
                "scrypt log_n={} r={} needs more than {MAX_KDF_MEMORY} bytes",
                self.log_n, self.r
            ))),
        }
    }
}

impl From<&CryptoConfig> for KdfParams {
    fn from(config: &CryptoConfig) -> Self {
        Self {
            log_n: config.scrypt_log_n,
            r: config.scrypt_r,
            p: config.scrypt_p,
        }
    }
}

/// Derive a 256-bit key from a password and an 8-byte salt using scrypt.
///
/// The salt is not secret; it travels with the envelope. Deliberately slow:
/// at default parameters this takes hundreds of milliseconds or more and
/// cannot be interrupted.
pub fn derive_key(
    password: &PasswordBuffer,
    salt: &[u8],
    params: &KdfParams,
) -> CryptoResult<DerivedKey> {
    if salt.len() != SALT_SIZE {
        return Err(CryptoError::KeyDerivation(format!(
            "salt must be {SALT_SIZE} bytes, got {}",
            salt.len()
        )));
    }
    params.validate()?;

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_SIZE)
        .map_err(|e| CryptoError::KeyDerivation(format!("invalid scrypt params: {e}")))?;

    let started = Instant::now();
    let mut key = DerivedKey {
        bytes: [0u8; KEY_SIZE],
    };
    scrypt::scrypt(password.expose(), salt, &scrypt_params, &mut key.bytes)
        .map_err(|e| CryptoError::KeyDerivation(format!("scrypt failed: {e}")))?;

    tracing::debug!(
        log_n = params.log_n,
        r = params.r,
        p = params.p,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "derived key"
    );
    Ok(key)
}
