use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures surfaced by the protection layer.
///
/// Every variant is terminal for the call that raised it. Secrets held by
/// that call have already been wiped by the time the error reaches the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A bit-width or length precondition was violated.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// scrypt rejected its parameters or salt.
    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    /// Tag verification failed: wrong password, or the envelope or its size
    /// header was altered. The two causes are deliberately indistinguishable.
    #[error("authentication failed: wrong password or corrupted data")]
    Authentication,

    /// A password source could not produce a password.
    #[error("password unavailable: {0}")]
    PasswordUnavailable(String),
}
