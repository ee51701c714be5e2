//! # Owl Core
//!
//! Core library for Owl - an activity logger that writes per-day logs,
//! optionally envelope-encrypted so only a password holder can read them.
//!
//! ## Architecture
//!
//! - **crypto**: PBKDF2 key derivation, AES-128-CBC `SymKey`, RSA-OAEP `AsymKey`
//! - **framing**: versioned, type-tagged, length-prefixed record format
//! - **entry**: log entry model and the `Capturer` trait
//! - **logger**: day-file writer with key rotation
//! - **decryptor**: streaming and batch decryption
//! - **setup**: creating and unlocking the password-protected key set
//! - **config**: configuration data model

pub mod config;
pub mod crypto;
pub mod decryptor;
pub mod entry;
pub mod error;
pub mod framing;
pub mod fs;
pub mod logger;
pub mod setup;

pub use config::{KeyPaths, OwlConfig};
pub use crypto::{AsymKey, KeyType, SymKey};
pub use decryptor::{
    decrypt_log_files, decrypt_log_files_with, BatchReport, DecryptedLog, FileReport, LogDecryptor,
};
pub use entry::{AppRecord, Capturer, LogEntry};
pub use error::{OwlError, Result};
pub use logger::{CaptureOutcome, Logger};
pub use setup::{setup_encryption, unlock_private_key};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
