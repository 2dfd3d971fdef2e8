//! AES-256-GCM with a random 96-bit nonce carried in front of the ciphertext.
//!
//! Message layout: `nonce (12) || ciphertext || tag (16)`.
use openssl::{
    hash::MessageDigest,
    pkcs5::pbkdf2_hmac,
    rand::rand_bytes,
    symm::{decrypt_aead, encrypt_aead, Cipher},
};
use tracing::debug;

use crate::error::{Error, Result};

pub const AES_KEY_LEN: usize = 32;
pub const AES_NONCE_LEN: usize = 12;
pub const AES_TAG_LEN: usize = 16;
/// Iteration count used by the `foil` tool for password keys. Low; kept so existing
/// password-encrypted files still open.
pub const PBKDF2_ITERATIONS: usize = 64;

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() != AES_KEY_LEN {
        return Err(Error::InvalidAesKeyLength(key.len()));
    }
    Ok(())
}

/// Encrypts and authenticates `plaintext` under `key`.
///
/// # Arguments
///
/// * `key`       - A 32-byte key.
/// * `plaintext` - The data to encrypt.
/// * `aad`       - Additional data that is authenticated but not encrypted.
///
/// # Returns
///
/// * If successful, `nonce || ciphertext || tag` with a fresh random nonce.
pub fn encrypt(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    check_key(key)?;
    let mut nonce = [0u8; AES_NONCE_LEN];
    rand_bytes(&mut nonce)?;
    let mut tag = [0u8; AES_TAG_LEN];
    let ciphertext = encrypt_aead(
        Cipher::aes_256_gcm(),
        key,
        Some(&nonce[..]),
        aad,
        plaintext,
        &mut tag,
    )?;
    debug!(len = plaintext.len(), "AES-GCM encryption completed");

    Ok([&nonce[..], &ciphertext, &tag[..]].concat())
}

/// Checks and decrypts a message produced by [`encrypt`].
///
/// Fails with `DecryptionFailed` when the message is truncated or does not authenticate.
pub fn decrypt(key: &[u8], message: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    check_key(key)?;
    if message.len() < AES_NONCE_LEN + AES_TAG_LEN {
        return Err(Error::DecryptionFailed);
    }
    let (nonce, rest) = message.split_at(AES_NONCE_LEN);
    let (ciphertext, tag) = rest.split_at(rest.len() - AES_TAG_LEN);
    let plaintext = decrypt_aead(Cipher::aes_256_gcm(), key, Some(nonce), aad, ciphertext, tag)
        .map_err(|_| Error::DecryptionFailed)?;
    debug!(len = plaintext.len(), "AES-GCM decryption completed");

    Ok(plaintext)
}

/// Derives a 32-byte key from a password with PBKDF2-HMAC-SHA256.
pub fn key_from_password(password: &[u8], salt: &[u8], iterations: usize) -> Result<Vec<u8>> {
    let mut key = vec![0u8; AES_KEY_LEN];
    pbkdf2_hmac(password, salt, iterations, MessageDigest::sha256(), &mut key)?;
    Ok(key)
}

/// A fresh random 32-byte key.
pub fn random_key() -> Result<Vec<u8>> {
    let mut key = vec![0u8; AES_KEY_LEN];
    rand_bytes(&mut key)?;
    Ok(key)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = random_key().unwrap();
        let message = encrypt(&key, b"attack at dawn", b"header").unwrap();
        assert_eq!(message.len(), AES_NONCE_LEN + 14 + AES_TAG_LEN);
        assert_eq!(decrypt(&key, &message, b"header").unwrap(), b"attack at dawn");
    }

    #[test]
    fn test_nonce_is_fresh() {
        let key = random_key().unwrap();
        let first = encrypt(&key, b"data", b"").unwrap();
        let second = encrypt(&key, b"data", b"").unwrap();
        assert_ne!(first[..AES_NONCE_LEN], second[..AES_NONCE_LEN]);
    }

    #[test]
    fn test_decrypt_rejects_tampering() {
        let key = random_key().unwrap();
        let message = encrypt(&key, b"attack at dawn", b"header").unwrap();

        assert!(matches!(
            decrypt(&key, &message, b"other"),
            Err(Error::DecryptionFailed)
        ));
        let mut tampered = message.clone();
        tampered[AES_NONCE_LEN] ^= 0x01;
        assert!(matches!(
            decrypt(&key, &tampered, b"header"),
            Err(Error::DecryptionFailed)
        ));
        assert!(matches!(
            decrypt(&key, &message[..20], b"header"),
            Err(Error::DecryptionFailed)
        ));
        let other_key = random_key().unwrap();
        assert!(matches!(
            decrypt(&other_key, &message, b"header"),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn test_key_length() {
        assert!(matches!(
            encrypt(&[0; 16], b"data", b""),
            Err(Error::InvalidAesKeyLength(16))
        ));
        assert!(matches!(
            decrypt(&[0; 33], &[0; 40], b""),
            Err(Error::InvalidAesKeyLength(33))
        ));
    }

    /// RFC 7914 section 11, first PBKDF2-HMAC-SHA256 vector
    #[test]
    fn test_key_from_password() {
        let key = key_from_password(b"passwd", b"salt", 1).unwrap();
        assert_eq!(
            hex::encode(key),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
        let a = key_from_password(b"password", b"", PBKDF2_ITERATIONS).unwrap();
        let b = key_from_password(b"password", b"", PBKDF2_ITERATIONS).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), AES_KEY_LEN);
    }
}
