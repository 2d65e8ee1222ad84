use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{NstegError, NstegResult};

/// Top-level configuration (loaded from nsteg.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NstegConfig {
    pub log: LogConfig,
    pub crypto: CryptoConfig,
    pub payload: PayloadConfig,
}

impl NstegConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> NstegResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| NstegError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> NstegResult<String> {
        toml::to_string_pretty(self).map_err(|e| NstegError::Config(format!("serializing: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// scrypt cost parameters for password-based key derivation.
///
/// Envelopes carry no record of these values: a payload sealed with
/// non-default parameters can only be opened with the same parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// log2 of the CPU/memory cost N (default: 18, N = 262144)
    pub scrypt_log_n: u8,
    /// Block size r (default: 8)
    pub scrypt_r: u32,
    /// Parallelization p (default: 8)
    pub scrypt_p: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            scrypt_log_n: 18,
            scrypt_r: 8,
            scrypt_p: 8,
        }
    }
}

impl CryptoConfig {
    /// Whether these are the fixed parameters every nsteg build agrees on.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// zstd compression level (default: 19)
    pub compression_level: i32,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            compression_level: 19,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[log]
level = "debug"
format = "json"

[crypto]
scrypt_log_n = 14
scrypt_r = 4
scrypt_p = 2

[payload]
compression_level = 3
"#;
        let config: NstegConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
        assert_eq!(config.crypto.scrypt_log_n, 14);
        assert_eq!(config.crypto.scrypt_r, 4);
        assert_eq!(config.crypto.scrypt_p, 2);
        assert!(!config.crypto.is_default());
        assert_eq!(config.payload.compression_level, 3);
    }

    #[test]
    fn test_parse_defaults() {
        let config: NstegConfig = toml::from_str("").unwrap();

        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
        assert_eq!(config.crypto.scrypt_log_n, 18);
        assert_eq!(config.crypto.scrypt_r, 8);
        assert_eq!(config.crypto.scrypt_p, 8);
        assert!(config.crypto.is_default());
        assert_eq!(config.payload.compression_level, 19);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[crypto]
scrypt_log_n = 10
"#;
        let config: NstegConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.crypto.scrypt_log_n, 10);
        // Defaults
        assert_eq!(config.crypto.scrypt_r, 8);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = NstegConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed: NstegConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = NstegConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, NstegConfig::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nsteg.toml");
        std::fs::write(&path, "[crypto]\nscrypt_r = \"eight\"\n").unwrap();

        let err = NstegConfig::load(&path).unwrap_err();
        assert!(matches!(err, NstegError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nsteg.toml");
        std::fs::write(&path, "[payload]\ncompression_level = 5\n").unwrap();

        let config = NstegConfig::load(&path).unwrap();
        assert_eq!(config.payload.compression_level, 5);
        assert!(config.crypto.is_default());
    }
}
