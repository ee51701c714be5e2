//! RSA key pair used to wrap the rotating AES keys.
//!
//! Writers only ever hold the public half; the private half lives on disk
//! encrypted with a password-derived [`SymKey`] and is unlocked for
//! decryption only.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::sym::SymKey;
use crate::error::{OwlError, Result};
use crate::fs::write_atomic;

/// SHA-256 output length, the OAEP hash overhead unit.
const OAEP_HASH_LEN: usize = 32;

/// Public moduli below this size fail validation.
const MIN_MODULUS_BITS: usize = 512;

/// Default key size offered by the setup flow.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Which half of the key pair an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Public,
    Private,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Public => write!(f, "public key"),
            KeyType::Private => write!(f, "private key"),
        }
    }
}

/// Holds at most one RSA private key and one RSA public key.
///
/// Slots are filled once, by [`AsymKey::generate`] or
/// [`AsymKey::load_from_file`]; neither overwrites a populated slot.
#[derive(Clone, Default)]
pub struct AsymKey {
    private_key: Option<RsaPrivateKey>,
    public_key: Option<RsaPublicKey>,
}

impl AsymKey {
    /// Create an empty key holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the given slot holds a key.
    pub fn has(&self, key_type: KeyType) -> bool {
        match key_type {
            KeyType::Public => self.public_key.is_some(),
            KeyType::Private => self.private_key.is_some(),
        }
    }

    /// Generate a fresh key pair of `bits` bits, filling both slots.
    ///
    /// # Errors
    ///
    /// Returns `OwlError::Crypto` if either slot is already populated or
    /// key generation fails.
    pub fn generate(&mut self, bits: usize) -> Result<()> {
        if self.private_key.is_some() || self.public_key.is_some() {
            return Err(OwlError::Crypto(
                "Cannot generate a new key pair on an already populated AsymKey".to_string(),
            ));
        }

        info!(bits, "generating RSA key pair");
        let started = std::time::Instant::now();
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| OwlError::Crypto(format!("RSA key generation failed: {}", e)))?;
        let public_key = RsaPublicKey::from(&private_key);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "RSA key pair generated"
        );

        self.private_key = Some(private_key);
        self.public_key = Some(public_key);
        Ok(())
    }

    /// Modulus size in bytes, which is also the OAEP ciphertext length.
    pub fn cipher_length(&self) -> Result<usize> {
        if let Some(public_key) = &self.public_key {
            return Ok(public_key.size());
        }
        if let Some(private_key) = &self.private_key {
            return Ok(private_key.size());
        }
        Err(OwlError::Crypto(
            "Cannot size ciphertext: no RSA key is loaded".to_string(),
        ))
    }

    /// Largest plaintext OAEP-SHA256 can wrap with this key.
    pub fn max_plaintext_length(&self) -> Result<usize> {
        let k = self.cipher_length()?;
        Ok(k.saturating_sub(2 * OAEP_HASH_LEN + 2))
    }

    /// Encrypt a small payload (an AES secret) with RSA-OAEP-SHA256.
    pub fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>> {
        let public_key = self.public_key.as_ref().ok_or_else(|| {
            OwlError::Crypto("Cannot encrypt: public key is not loaded".to_string())
        })?;

        let max = self.max_plaintext_length()?;
        if plain.len() > max {
            return Err(OwlError::Crypto(format!(
                "Plaintext of {} bytes exceeds the RSA-OAEP limit of {} bytes",
                plain.len(),
                max
            )));
        }

        public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plain)
            .map_err(|e| OwlError::Crypto(format!("RSA encryption failed: {}", e)))
    }

    /// Decrypt an RSA-OAEP-SHA256 ciphertext with the private key.
    ///
    /// # Errors
    ///
    /// Returns `OwlError::Decryption` when the OAEP coding is invalid
    /// (corrupted ciphertext or a different key).
    pub fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>> {
        let private_key = self.private_key.as_ref().ok_or_else(|| {
            OwlError::Crypto("Cannot decrypt: private key is not loaded".to_string())
        })?;

        private_key
            .decrypt(Oaep::new::<Sha256>(), cipher)
            .map_err(|e| OwlError::Decryption(format!("RSA-OAEP unwrap failed: {}", e)))
    }

    /// Save one half of the key pair as base64 text.
    ///
    /// The key is serialized as DER (PKCS#8 for the private key, SPKI for the
    /// public key). When `sym_key` is given the DER bytes are encrypted with it
    /// before base64 encoding.
    pub fn save_to_file(
        &self,
        key_type: KeyType,
        path: &Path,
        sym_key: Option<&SymKey>,
    ) -> Result<()> {
        info!(path = %path.display(), "saving {}", key_type);
        let encoded = self.encode_for_file(key_type, sym_key)?;
        write_atomic(path, encoded.as_bytes(), key_type == KeyType::Private)?;
        Ok(())
    }

    /// The exact file contents [`AsymKey::save_to_file`] writes.
    pub fn encode_for_file(
        &self,
        key_type: KeyType,
        sym_key: Option<&SymKey>,
    ) -> Result<Zeroizing<String>> {
        let der = self.to_der(key_type)?;

        let payload = match sym_key {
            Some(sym_key) => {
                debug!(plain_len = der.len(), "encrypting {} at rest", key_type);
                Zeroizing::new(sym_key.encrypt(&der)?)
            }
            None => der,
        };

        let mut encoded = Zeroizing::new(STANDARD.encode(payload.as_slice()));
        encoded.push('\n');
        Ok(encoded)
    }

    /// Load one half of the key pair from a file written by [`AsymKey::save_to_file`].
    ///
    /// # Errors
    ///
    /// - `OwlError::Crypto` if the slot is already populated
    /// - `OwlError::Format` if the base64 or DER is malformed and no `sym_key` was given
    /// - `OwlError::Decryption` if `sym_key` was given and the contents do not decrypt
    ///   to a valid key
    pub fn load_from_file(
        &mut self,
        key_type: KeyType,
        path: &Path,
        sym_key: Option<&SymKey>,
    ) -> Result<()> {
        if self.has(key_type) {
            return Err(OwlError::Crypto(format!(
                "Cannot load {}: slot is already populated",
                key_type
            )));
        }

        info!(path = %path.display(), "loading {}", key_type);
        let text = Zeroizing::new(std::fs::read_to_string(path)?);
        let compact: Zeroizing<String> =
            Zeroizing::new(text.chars().filter(|c| !c.is_whitespace()).collect());
        let decoded = Zeroizing::new(STANDARD.decode(compact.as_bytes()).map_err(|e| {
            OwlError::Format(format!(
                "Key file {} is not valid base64: {}",
                path.display(),
                e
            ))
        })?);

        let der = match sym_key {
            Some(sym_key) => Zeroizing::new(sym_key.decrypt(&decoded)?),
            None => decoded,
        };

        let parse_error = |detail: String| match sym_key {
            // Padding can accidentally validate under a wrong key; the DER check
            // is the second line of defence and must read as a decryption failure.
            Some(_) => OwlError::Decryption(format!("decrypted {} is not valid DER", key_type)),
            None => OwlError::Format(format!(
                "Key file {} does not hold a valid {}: {}",
                path.display(),
                key_type,
                detail
            )),
        };

        match key_type {
            KeyType::Private => {
                let key = RsaPrivateKey::from_pkcs8_der(&der)
                    .map_err(|e| parse_error(e.to_string()))?;
                self.private_key = Some(key);
            }
            KeyType::Public => {
                let key = RsaPublicKey::from_public_key_der(&der)
                    .map_err(|e| parse_error(e.to_string()))?;
                self.public_key = Some(key);
            }
        }
        Ok(())
    }

    /// Check the mathematical validity of one half of the key pair.
    ///
    /// # Errors
    ///
    /// Returns `OwlError::Crypto` if the requested slot is empty.
    pub fn validate(&self, key_type: KeyType) -> Result<bool> {
        match key_type {
            KeyType::Private => {
                let key = self.private_key.as_ref().ok_or_else(|| {
                    OwlError::Crypto(
                        "Cannot validate private key as it's not loaded or generated yet"
                            .to_string(),
                    )
                })?;
                Ok(key.validate().is_ok() && public_parts_valid(key))
            }
            KeyType::Public => {
                let key = self.public_key.as_ref().ok_or_else(|| {
                    OwlError::Crypto(
                        "Cannot validate public key as it's not loaded or generated yet"
                            .to_string(),
                    )
                })?;
                Ok(public_parts_valid(key))
            }
        }
    }

    fn to_der(&self, key_type: KeyType) -> Result<Zeroizing<Vec<u8>>> {
        let missing = || {
            OwlError::Crypto(format!(
                "Cannot save a {} that is not initialized",
                key_type
            ))
        };
        let der = match key_type {
            KeyType::Private => self
                .private_key
                .as_ref()
                .ok_or_else(missing)?
                .to_pkcs8_der()
                .map_err(|e| OwlError::Crypto(format!("Failed to encode private key: {}", e)))?
                .as_bytes()
                .to_vec(),
            KeyType::Public => self
                .public_key
                .as_ref()
                .ok_or_else(missing)?
                .to_public_key_der()
                .map_err(|e| OwlError::Crypto(format!("Failed to encode public key: {}", e)))?
                .as_bytes()
                .to_vec(),
        };
        Ok(Zeroizing::new(der))
    }
}

/// Modulus odd and large enough, exponent odd and greater than one.
fn public_parts_valid<K: PublicKeyParts>(key: &K) -> bool {
    let n = key.n().to_bytes_be();
    let e = key.e().to_bytes_be();

    let n_odd = n.last().is_some_and(|byte| byte & 1 == 1);
    let e_odd = e.last().is_some_and(|byte| byte & 1 == 1);
    let e_above_one = e.len() > 1 || e.first().is_some_and(|byte| *byte > 1);

    n_odd && key.n().bits() >= MIN_MODULUS_BITS && e_odd && e_above_one
}

impl fmt::Debug for AsymKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymKey")
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("public_key", &self.public_key.as_ref().map(|k| k.size() * 8))
            .finish()
    }
}
