//! AES-128-CBC symmetric key.
//!
//! Ciphertext layout is `IV (16 bytes) || CBC(PKCS#7(plain))`. There is no
//! MAC: a bad padding block is the only sign of a wrong key or tampering.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::ZeroizeOnDrop;

use super::kdf::{derive_key, PBKDF2_ITERATIONS};
use super::random_bytes;
use crate::error::{OwlError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES-128 key length in bytes.
pub const AES_KEY_LEN: usize = 16;

/// AES block size in bytes (also the IV length).
pub const AES_BLOCK_SIZE: usize = 16;

/// A 16-byte AES secret, zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SymKey {
    secret: [u8; AES_KEY_LEN],
}

impl SymKey {
    /// Generate a key from the OS random source.
    pub fn generate_random() -> Result<Self> {
        Ok(Self {
            secret: random_bytes::<AES_KEY_LEN>()?,
        })
    }

    /// Derive a key from a password and salt with [`PBKDF2_ITERATIONS`] rounds.
    pub fn from_password(password: &str, salt: &[u8]) -> Result<Self> {
        Self::from_password_with_iterations(password, salt, PBKDF2_ITERATIONS)
    }

    /// Derive a key with an explicit PBKDF2 round count.
    pub fn from_password_with_iterations(
        password: &str,
        salt: &[u8],
        iterations: u32,
    ) -> Result<Self> {
        let derived = derive_key(password.as_bytes(), salt, iterations)?;
        Ok(Self { secret: *derived })
    }

    /// Rebuild a key from raw secret bytes, e.g. after RSA unwrapping.
    ///
    /// # Errors
    ///
    /// Returns `OwlError::Crypto` unless exactly [`AES_KEY_LEN`] bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let secret: [u8; AES_KEY_LEN] = bytes.try_into().map_err(|_| {
            OwlError::Crypto(format!(
                "AES secret must be {} bytes, got {}",
                AES_KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self { secret })
    }

    /// Raw secret bytes.
    ///
    /// Avoid storing or logging this value; it is only exposed for RSA wrapping.
    pub fn as_bytes(&self) -> &[u8; AES_KEY_LEN] {
        &self.secret
    }

    /// Exact length of `encrypt` output for a plaintext of `plain_len` bytes.
    ///
    /// PKCS#7 always pads (a full block when already aligned), so the body is
    /// the next multiple of the block size strictly above `plain_len`.
    pub fn cipher_length(plain_len: usize) -> usize {
        AES_BLOCK_SIZE + (plain_len / AES_BLOCK_SIZE + 1) * AES_BLOCK_SIZE
    }

    /// Encrypt with a fresh random IV, returning `IV || ciphertext`.
    pub fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>> {
        let iv = random_bytes::<AES_BLOCK_SIZE>()?;
        let encryptor = Aes128CbcEnc::new_from_slices(&self.secret, &iv)
            .map_err(|e| OwlError::Crypto(format!("Failed to initialise AES-CBC: {}", e)))?;

        let mut cipher = Vec::with_capacity(Self::cipher_length(plain.len()));
        cipher.extend_from_slice(&iv);
        cipher.extend_from_slice(&encryptor.encrypt_padded_vec_mut::<Pkcs7>(plain));
        Ok(cipher)
    }

    /// Decrypt `IV || ciphertext` produced by [`SymKey::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `OwlError::Decryption` when the input is too short, not block
    /// aligned, or the padding is invalid.
    pub fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>> {
        if cipher.len() < 2 * AES_BLOCK_SIZE {
            return Err(OwlError::Decryption(format!(
                "ciphertext of {} bytes is shorter than IV plus one block",
                cipher.len()
            )));
        }
        if cipher.len() % AES_BLOCK_SIZE != 0 {
            return Err(OwlError::Decryption(format!(
                "ciphertext of {} bytes is not a multiple of the block size",
                cipher.len()
            )));
        }

        let (iv, body) = cipher.split_at(AES_BLOCK_SIZE);
        let decryptor = Aes128CbcDec::new_from_slices(&self.secret, iv)
            .map_err(|e| OwlError::Crypto(format!("Failed to initialise AES-CBC: {}", e)))?;
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(body)
            .map_err(|_| OwlError::Decryption("invalid block padding".to_string()))
    }
}

impl std::fmt::Debug for SymKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = SymKey::generate_random().unwrap();
        let plaintext = b"{\"time\":1700000000,\"apps\":[]}";

        let cipher = key.encrypt(plaintext).unwrap();
        assert_eq!(key.decrypt(&cipher).unwrap(), plaintext);
    }

    #[test]
    fn test_cipher_length_is_exact() {
        let key = SymKey::generate_random().unwrap();
        for len in [0usize, 1, 15, 16, 17, 31, 32, 33, 100, 1024] {
            let plain = vec![0x5Au8; len];
            let cipher = key.encrypt(&plain).unwrap();
            assert_eq!(cipher.len(), SymKey::cipher_length(len), "plain length {}", len);
        }
    }

    #[test]
    fn test_cipher_length_values() {
        assert_eq!(SymKey::cipher_length(0), 32);
        assert_eq!(SymKey::cipher_length(15), 32);
        assert_eq!(SymKey::cipher_length(16), 48);
        assert_eq!(SymKey::cipher_length(17), 48);
    }

    #[test]
    fn test_random_iv_per_call() {
        let key = SymKey::generate_random().unwrap();
        let a = key.encrypt(b"same plaintext").unwrap();
        let b = key.encrypt(b"same plaintext").unwrap();

        assert_ne!(a[..AES_BLOCK_SIZE], b[..AES_BLOCK_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails_or_differs() {
        let key = SymKey::from_bytes(&[1u8; AES_KEY_LEN]).unwrap();
        let other = SymKey::from_bytes(&[2u8; AES_KEY_LEN]).unwrap();
        let plaintext = b"a secret window title";

        let cipher = key.encrypt(plaintext).unwrap();
        // Without a MAC a wrong key can occasionally produce valid padding,
        // but it never yields the original plaintext.
        match other.decrypt(&cipher) {
            Err(err) => assert!(err.is_decryption()),
            Ok(garbage) => assert_ne!(garbage, plaintext),
        }
    }

    #[test]
    fn test_truncated_input_rejected() {
        let key = SymKey::generate_random().unwrap();
        let cipher = key.encrypt(b"hello").unwrap();

        assert!(key.decrypt(&cipher[..AES_BLOCK_SIZE]).unwrap_err().is_decryption());
        assert!(key.decrypt(&cipher[..cipher.len() - 1]).unwrap_err().is_decryption());
        assert!(key.decrypt(&[]).unwrap_err().is_decryption());
    }

    #[test]
    fn test_from_password_deterministic() {
        let salt = [9u8; 32];
        let a = SymKey::from_password_with_iterations("hunter22", &salt, FAST_ITERATIONS).unwrap();
        let b = SymKey::from_password_with_iterations("hunter22", &salt, FAST_ITERATIONS).unwrap();
        let c = SymKey::from_password_with_iterations("hunter23", &salt, FAST_ITERATIONS).unwrap();

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(SymKey::from_bytes(&[0u8; 15]).is_err());
        assert!(SymKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = SymKey::from_bytes(&[0xABu8; AES_KEY_LEN]).unwrap();
        let debug_output = format!("{:?}", key);

        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains(&hex::encode([0xABu8; 4])));
    }
}
