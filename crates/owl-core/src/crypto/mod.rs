//! Cryptographic primitives for envelope-encrypted logs.
//!
//! - [`SymKey`]: AES-128-CBC with a random IV, used for log entries and for
//!   the private key at rest
//! - [`AsymKey`]: RSA-OAEP-SHA256, wraps each rotating [`SymKey`]
//! - [`kdf`]: PBKDF2 password derivation and salt files

pub mod asym;
pub mod kdf;
pub mod password;
pub mod sym;

pub use asym::{AsymKey, KeyType, DEFAULT_RSA_BITS};
pub use kdf::{encode_salt, generate_salt, load_salt, PBKDF2_ITERATIONS, SALT_LEN};
pub use password::validate_password;
pub use sym::{SymKey, AES_BLOCK_SIZE, AES_KEY_LEN};

use crate::error::{OwlError, Result};

/// Fill a fixed-size buffer from the OS random source.
pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| OwlError::Crypto(format!("Failed to generate random bytes: {}", e)))?;
    Ok(bytes)
}
