//! Creating and unlocking the password-protected key set.
//!
//! A set-up produces three files: a random salt, the RSA public key in the
//! clear, and the RSA private key encrypted with an AES key derived from the
//! password and that salt.

use tracing::{debug, info};

use crate::config::KeyPaths;
use crate::crypto::{encode_salt, generate_salt, load_salt, validate_password};
use crate::crypto::{AsymKey, KeyType, SymKey, PBKDF2_ITERATIONS};
use crate::error::{OwlError, Result};
use crate::fs::StagedWrite;

/// Create a new salt and RSA key pair protected by `password`.
///
/// Existing files at `paths` are replaced. Returns the generated pair.
pub fn setup_encryption(password: &str, bits: usize, paths: &KeyPaths) -> Result<AsymKey> {
    setup_encryption_with_iterations(password, bits, paths, PBKDF2_ITERATIONS)
}

/// [`setup_encryption`] with an explicit PBKDF2 round count.
///
/// Nothing on disk changes until the new key set is complete: all three
/// files are staged next to their destinations first and only then moved
/// into place, so a failed re-setup leaves the previous key set usable.
pub fn setup_encryption_with_iterations(
    password: &str,
    bits: usize,
    paths: &KeyPaths,
    iterations: u32,
) -> Result<AsymKey> {
    validate_password(password)?;

    let salt = generate_salt()?;
    let sym_key = SymKey::from_password_with_iterations(password, &salt, iterations)?;

    let mut key = AsymKey::new();
    key.generate(bits)?;
    if !key.validate(KeyType::Private)? || !key.validate(KeyType::Public)? {
        return Err(OwlError::Crypto(
            "Generated RSA key pair failed validation".to_string(),
        ));
    }

    let public = key.encode_for_file(KeyType::Public, None)?;
    let private = key.encode_for_file(KeyType::Private, Some(&sym_key))?;
    let staged = [
        StagedWrite::new(&paths.public_key, public.as_bytes(), false)?,
        StagedWrite::new(&paths.private_key, private.as_bytes(), true)?,
        StagedWrite::new(&paths.salt, encode_salt(&salt).as_bytes(), false)?,
    ];
    for file in staged {
        debug!(path = %file.destination().display(), "committing key file");
        file.commit()?;
    }

    info!(
        public_key = %paths.public_key.display(),
        private_key = %paths.private_key.display(),
        "encryption set up"
    );
    Ok(key)
}

/// Load and check the private key protected by `password`.
///
/// # Errors
///
/// - `OwlError::Decryption` if the password is wrong
/// - `OwlError::Crypto` if the key decrypts but fails validation
pub fn unlock_private_key(password: &str, paths: &KeyPaths) -> Result<AsymKey> {
    unlock_private_key_with_iterations(password, paths, PBKDF2_ITERATIONS)
}

/// [`unlock_private_key`] with an explicit PBKDF2 round count.
pub fn unlock_private_key_with_iterations(
    password: &str,
    paths: &KeyPaths,
    iterations: u32,
) -> Result<AsymKey> {
    if password.is_empty() {
        return Err(OwlError::InvalidInput("Password cannot be empty".to_string()));
    }

    let salt = load_salt(&paths.salt)?;
    let sym_key = SymKey::from_password_with_iterations(password, &salt, iterations)?;

    let mut key = AsymKey::new();
    key.load_from_file(KeyType::Private, &paths.private_key, Some(&sym_key))?;
    if !key.validate(KeyType::Private)? {
        return Err(OwlError::Crypto(format!(
            "Private key {} failed validation",
            paths.private_key.display()
        )));
    }
    Ok(key)
}

/// Whether any of the key files already exists.
pub fn keys_exist(paths: &KeyPaths) -> bool {
    paths.public_key.exists() || paths.private_key.exists() || paths.salt.exists()
}
