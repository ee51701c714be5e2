//! Configuration data model.
//!
//! The core only reads configuration; loading and saving the file is the
//! CLI's concern. Field names are camelCase on disk and every field has a
//! default, so a partial (or empty) file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OwlError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwlConfig {
    /// Directory receiving the day log files.
    pub out_dir: PathBuf,
    /// Seconds between captures in the perpetual loop.
    pub logging_interval: u64,
    /// Seconds without input after which a capture records idleness instead.
    pub idle_threshold: u64,
    pub encryption: EncryptionConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptionConfig {
    pub enabled: bool,
    pub rsa_public_key_path: PathBuf,
    pub rsa_private_key_path: PathBuf,
    pub salt_path: PathBuf,
    /// Entries covered by one AES key before a new one is announced.
    pub key_gen_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    /// Shell command printing a JSON array of open windows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_command: Option<String>,
    /// Shell command printing seconds since the last user input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_command: Option<String>,
}

impl Default for OwlConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("owl-logs"),
            logging_interval: 60,
            idle_threshold: 60,
            encryption: EncryptionConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rsa_public_key_path: PathBuf::from("keys/public.key"),
            rsa_private_key_path: PathBuf::from("keys/private.key"),
            salt_path: PathBuf::from("keys/salt"),
            key_gen_rate: 10,
        }
    }
}

impl EncryptionConfig {
    /// Rotation rate with zero treated as one.
    pub fn effective_key_gen_rate(&self) -> u32 {
        self.key_gen_rate.max(1)
    }
}

/// The three files an encryption set-up consists of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub public_key: PathBuf,
    pub private_key: PathBuf,
    pub salt: PathBuf,
}

impl From<&EncryptionConfig> for KeyPaths {
    fn from(config: &EncryptionConfig) -> Self {
        Self {
            public_key: config.rsa_public_key_path.clone(),
            private_key: config.rsa_private_key_path.clone(),
            salt: config.salt_path.clone(),
        }
    }
}

impl OwlConfig {
    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<()> {
        if self.logging_interval == 0 {
            return Err(OwlError::InvalidInput(
                "loggingInterval must be greater than zero".to_string(),
            ));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err(OwlError::InvalidInput("outDir cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve every relative path against `base_dir`.
    pub fn resolved_against(mut self, base_dir: &Path) -> Self {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };
        resolve(&mut self.out_dir);
        resolve(&mut self.encryption.rsa_public_key_path);
        resolve(&mut self.encryption.rsa_private_key_path);
        resolve(&mut self.encryption.salt_path);
        self
    }

    pub fn key_paths(&self) -> KeyPaths {
        KeyPaths::from(&self.encryption)
    }
}
