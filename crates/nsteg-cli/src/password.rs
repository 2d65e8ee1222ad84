//! Password sources the CLI can hand to the protection layer.

use nsteg_crypto::{CryptoError, CryptoResult, PasswordBuffer, PasswordPurpose, PasswordSource};
use secrecy::{ExposeSecret, SecretString};

/// Interactive terminal prompt; asks twice when sealing.
#[derive(Debug, Default)]
pub struct PromptPassword;

impl PromptPassword {
    fn read(prompt: &str) -> CryptoResult<SecretString> {
        rpassword::prompt_password(prompt)
            .map(SecretString::from)
            .map_err(|e| CryptoError::PasswordUnavailable(format!("reading password: {e}")))
    }
}

impl PasswordSource for PromptPassword {
    fn acquire(&self, purpose: PasswordPurpose) -> CryptoResult<PasswordBuffer> {
        let password = Self::read("Password: ")?;
        if purpose == PasswordPurpose::Protect {
            let confirm = Self::read("Confirm password: ")?;
            if password.expose_secret() != confirm.expose_secret() {
                return Err(CryptoError::PasswordUnavailable(
                    "passwords do not match".into(),
                ));
            }
        }
        Ok(PasswordBuffer::from(password))
    }
}

/// Password read from an environment variable at acquisition time.
#[derive(Debug, Clone)]
pub struct EnvPassword {
    var: String,
}

impl EnvPassword {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl PasswordSource for EnvPassword {
    fn acquire(&self, _purpose: PasswordPurpose) -> CryptoResult<PasswordBuffer> {
        let value = std::env::var(&self.var).map_err(|e| {
            CryptoError::PasswordUnavailable(format!("{}: {e}", self.var))
        })?;
        Ok(PasswordBuffer::from(SecretString::from(value)))
    }
}

/// Environment source when `env_var` is given, terminal prompt otherwise.
pub fn select_source(env_var: Option<&str>) -> Box<dyn PasswordSource> {
    match env_var {
        Some(var) => Box::new(EnvPassword::new(var)),
        None => Box::new(PromptPassword),
    }
}
