//! Password-based key derivation and salt persistence.
//!
//! Keys protecting the RSA private key at rest are derived with
//! PBKDF2-HMAC-SHA256. The iteration count is not recorded anywhere on
//! disk, so the same constant must be used to derive and re-derive a key.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use super::random_bytes;
use super::sym::AES_KEY_LEN;
use crate::error::{OwlError, Result};

/// PBKDF2 rounds (OWASP 2023 recommendation for HMAC-SHA256).
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Length of a freshly generated salt in bytes.
pub const SALT_LEN: usize = 32;

/// Salts shorter than this are rejected when loaded.
const MIN_SALT_LEN: usize = 16;

/// Derive a 16-byte AES secret from a password.
///
/// Same password + salt + iterations always produces the same secret.
///
/// # Errors
///
/// Returns `OwlError::InvalidInput` when the password or salt is empty,
/// or when `iterations` is zero.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Zeroizing<[u8; AES_KEY_LEN]>> {
    if password.is_empty() {
        return Err(OwlError::InvalidInput("Password cannot be empty".to_string()));
    }
    if salt.is_empty() {
        return Err(OwlError::InvalidInput("Salt cannot be empty".to_string()));
    }
    if iterations == 0 {
        return Err(OwlError::InvalidInput(
            "PBKDF2 iteration count must be positive".to_string(),
        ));
    }

    let mut secret = Zeroizing::new([0u8; AES_KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut secret[..]);
    Ok(secret)
}

/// Generate a random salt of [`SALT_LEN`] bytes.
pub fn generate_salt() -> Result<Vec<u8>> {
    Ok(random_bytes::<SALT_LEN>()?.to_vec())
}

/// Base64 text of a salt file.
pub fn encode_salt(salt: &[u8]) -> String {
    let mut encoded = STANDARD.encode(salt);
    encoded.push('\n');
    encoded
}

/// Read a base64 salt file in the [`encode_salt`] format.
///
/// Whitespace (including line wrapping) is ignored.
pub fn load_salt(path: &Path) -> Result<Vec<u8>> {
    debug!(path = %path.display(), "reading salt");
    let text = std::fs::read_to_string(path)?;
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let salt = STANDARD.decode(compact.as_bytes()).map_err(|e| {
        OwlError::Format(format!("Salt file {} is not valid base64: {}", path.display(), e))
    })?;
    if salt.len() < MIN_SALT_LEN {
        return Err(OwlError::Format(format!(
            "Salt file {} holds {} bytes, expected at least {}",
            path.display(),
            salt.len(),
            MIN_SALT_LEN
        )));
    }
    Ok(salt)
}
