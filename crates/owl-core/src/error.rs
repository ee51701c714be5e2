//! Error types for Owl core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing prompts and exit codes.

use thiserror::Error;

/// Result type alias for Owl operations.
pub type Result<T> = std::result::Result<T, OwlError>;

/// Appended to every decryption failure. Without a MAC the only integrity
/// signal is the padding/coding check, so the cause cannot be narrowed down.
const DECRYPTION_CAUSES: &str = "the password may be incorrect, the data may be corrupted, \
     or the data was encrypted with a different key or parameters";

/// Core error type for Owl operations.
#[derive(Debug, Error)]
pub enum OwlError {
    /// Cryptographic precondition violated (populated key slot, missing key, bad sizes)
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Ciphertext, padding or OAEP coding was invalid
    #[error("Decryption failed: {0} ({causes})", causes = DECRYPTION_CAUSES)]
    Decryption(String),

    /// Log file framing is invalid (bad version byte, oversized record, key order)
    #[error("Format error: {0}")]
    Format(String),

    /// A record header or payload ends before its declared length
    #[error("Format error: truncated record at byte {offset} (needed {needed} more bytes)")]
    TruncatedRecord { offset: u64, needed: usize },

    /// A record type byte that this version does not know
    #[error("Unknown record type {byte:#04x} at byte {offset}")]
    UnknownRecordType { byte: u8, offset: u64 },

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl OwlError {
    /// True for every framing failure, including truncation and unknown record types.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            OwlError::Format(_) | OwlError::TruncatedRecord { .. } | OwlError::UnknownRecordType { .. }
        )
    }

    /// True when the cause is likely a mistyped password.
    pub fn is_decryption(&self) -> bool {
        matches!(self, OwlError::Decryption(_))
    }
}
