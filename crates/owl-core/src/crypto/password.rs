//! Password validation.
//!
//! Enforces minimum requirements for the password that protects the RSA
//! private key. Only applied when a new key pair is set up; unlocking an
//! existing key accepts whatever the user typed.

use crate::error::{OwlError, Result};

/// Minimum password length in characters.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate a new password.
///
/// # Requirements
///
/// - At least 8 characters long
/// - Not empty or only whitespace
pub fn validate_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(OwlError::InvalidInput("Password cannot be empty".to_string()));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(OwlError::InvalidInput(format!(
            "Password must be at least {} characters (got {})",
            MIN_PASSWORD_LENGTH, length
        )));
    }

    Ok(())
}
