//! Single entry point for the embedding side.
//!
//! Both directions build the AAD from the same [`SizeHeader`] type, so an
//! encrypt call site and a decrypt call site cannot disagree on how the
//! sizes are bound into the tag.

use nsteg_core::SizeHeader;

use crate::aad::AssociatedData;
use crate::cipher::{self, CipherEnvelope, Salt};
use crate::error::CryptoResult;
use crate::kdf::KdfParams;
use crate::password::{PasswordBuffer, PasswordPurpose, PasswordSource};

/// Protects and recovers payloads with a fixed set of scrypt parameters.
///
/// Holds no secrets; independent calls may run concurrently on different
/// threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Protector {
    params: KdfParams,
}

impl Protector {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    pub fn protect(
        &self,
        payload: &[u8],
        sizes: &SizeHeader,
        password: PasswordBuffer,
    ) -> CryptoResult<(Salt, CipherEnvelope)> {
        tracing::debug!(
            uncompressed = sizes.uncompressed,
            compressed = sizes.compressed,
            payload_len = payload.len(),
            "protecting payload"
        );
        let aad = AssociatedData::for_sizes(sizes);
        cipher::encrypt(payload, &aad, password, &self.params)
    }

    pub fn unprotect(
        &self,
        envelope: &CipherEnvelope,
        salt: &Salt,
        sizes: &SizeHeader,
        password: PasswordBuffer,
    ) -> CryptoResult<Vec<u8>> {
        tracing::debug!(
            uncompressed = sizes.uncompressed,
            compressed = sizes.compressed,
            envelope_len = envelope.len(),
            "unprotecting payload"
        );
        let aad = AssociatedData::for_sizes(sizes);
        cipher::decrypt(envelope, salt, &aad, password, &self.params)
    }

    /// Like [`Protector::protect`], asking `source` for the password.
    pub fn protect_from<S>(
        &self,
        payload: &[u8],
        sizes: &SizeHeader,
        source: &S,
    ) -> CryptoResult<(Salt, CipherEnvelope)>
    where
        S: PasswordSource + ?Sized,
    {
        let password = source.acquire(PasswordPurpose::Protect)?;
        self.protect(payload, sizes, password)
    }

    /// Like [`Protector::unprotect`], asking `source` for the password.
    pub fn unprotect_from<S>(
        &self,
        envelope: &CipherEnvelope,
        salt: &Salt,
        sizes: &SizeHeader,
        source: &S,
    ) -> CryptoResult<Vec<u8>>
    where
        S: PasswordSource + ?Sized,
    {
        let password = source.acquire(PasswordPurpose::Unprotect)?;
        self.unprotect(envelope, salt, sizes, password)
    }
}

/// Encrypt `payload` bound to `sizes`, with the default scrypt cost.
pub fn protect(
    payload: &[u8],
    sizes: &SizeHeader,
    password: PasswordBuffer,
) -> CryptoResult<(Salt, CipherEnvelope)> {
    Protector::default().protect(payload, sizes, password)
}

/// Recover a payload sealed by [`protect`].
pub fn unprotect(
    envelope: &CipherEnvelope,
    salt: &Salt,
    sizes: &SizeHeader,
    password: PasswordBuffer,
) -> CryptoResult<Vec<u8>> {
    Protector::default().unprotect(envelope, salt, sizes, password)
}
