use aes::{Aes128, Aes192, Aes256};
use anyhow::{Result, anyhow, bail, ensure};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit};
use zeroize::Zeroizing;

use crate::config::AES_BLOCK_SIZE;
use crate::crypto::CipherBuilder;
use crate::types::CipherMode;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    fn from_len(len: usize) -> Result<Self> {
        match len {
            16 => Ok(Self::Aes128),
            24 => Ok(Self::Aes192),
            32 => Ok(Self::Aes256),
            _ => bail!("invalid AES key length: {len} bytes"),
        }
    }
}

/// AES in CBC mode with PKCS#7 padding.
///
/// The key length picks AES-128, AES-192 or AES-256. The IV must be exactly
/// one block.
#[derive(Clone, Copy, Debug, Default)]
pub struct AesCbc;

impl CipherBuilder for AesCbc {
    type Context = CipherContext;

    fn build(&self, key: &[u8], iv: &[u8], mode: CipherMode) -> Result<CipherContext> {
        let key_size = KeySize::from_len(key.len())?;
        let iv: [u8; AES_BLOCK_SIZE] = iv.try_into().map_err(|_| anyhow!("invalid IV length: expected {AES_BLOCK_SIZE} bytes, got {}", iv.len()))?;

        Ok(CipherContext { mode, key_size, key: Zeroizing::new(key.to_vec()), iv })
    }

    fn transformation(&self) -> &'static str {
        "AES/CBC/PKCS5Padding"
    }
}

/// An initialized AES-CBC cipher.
///
/// Every call to [`CipherContext::finish`] starts from the IV the context
/// was built with, so the same input always yields the same output.
pub struct CipherContext {
    mode: CipherMode,
    key_size: KeySize,
    key: Zeroizing<Vec<u8>>,
    iv: [u8; AES_BLOCK_SIZE],
}

impl CipherContext {
    pub const fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn key_bits(&self) -> usize {
        self.key.len() * 8
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub const fn block_size(&self) -> usize {
        AES_BLOCK_SIZE
    }

    /// Size of the output [`CipherContext::finish`] produces for `input_len`
    /// bytes. For decryption this is an upper bound.
    pub const fn output_len(&self, input_len: usize) -> usize {
        if self.mode.is_encrypting() { (input_len / AES_BLOCK_SIZE + 1) * AES_BLOCK_SIZE } else { input_len }
    }

    /// Runs the whole input through the cipher in the context's direction.
    pub fn finish(&self, data: &[u8]) -> Result<Vec<u8>> {
        if self.mode.is_encrypting() { self.encrypt(data) } else { self.decrypt(data) }
    }

    /// Encrypts key material. Only valid in [`CipherMode::Wrap`].
    pub fn wrap(&self, key: &[u8]) -> Result<Vec<u8>> {
        ensure!(self.mode == CipherMode::Wrap, "cipher is in {} mode, not Wrap", self.mode);
        ensure!(!key.is_empty(), "key to wrap cannot be empty");
        self.encrypt(key)
    }

    /// Decrypts key material. Only valid in [`CipherMode::Unwrap`].
    pub fn unwrap(&self, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        ensure!(self.mode == CipherMode::Unwrap, "cipher is in {} mode, not Unwrap", self.mode);
        self.decrypt(wrapped).map(Zeroizing::new)
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let (key, iv) = (self.key.as_slice(), self.iv.as_slice());

        Ok(match self.key_size {
            KeySize::Aes128 => Aes128CbcEnc::new_from_slices(key, iv).map_err(invalid_length)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeySize::Aes192 => Aes192CbcEnc::new_from_slices(key, iv).map_err(invalid_length)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeySize::Aes256 => Aes256CbcEnc::new_from_slices(key, iv).map_err(invalid_length)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        })
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        ensure!(
            !ciphertext.is_empty() && ciphertext.len() % AES_BLOCK_SIZE == 0,
            "ciphertext length {} is not a positive multiple of {AES_BLOCK_SIZE}",
            ciphertext.len()
        );

        let (key, iv) = (self.key.as_slice(), self.iv.as_slice());
        let plaintext = match self.key_size {
            KeySize::Aes128 => Aes128CbcDec::new_from_slices(key, iv).map_err(invalid_length)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeySize::Aes192 => Aes192CbcDec::new_from_slices(key, iv).map_err(invalid_length)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeySize::Aes256 => Aes256CbcDec::new_from_slices(key, iv).map_err(invalid_length)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };

        plaintext.map_err(|_| anyhow!("bad padding"))
    }
}

impl std::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherContext").field("mode", &self.mode).field("key_bits", &self.key_bits()).field("key", &"[REDACTED]").finish_non_exhaustive()
    }
}

fn invalid_length(e: InvalidLength) -> anyhow::Error {
    anyhow!("invalid key or IV length: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(mode: CipherMode) -> CipherContext {
        AesCbc.build(&[0x42u8; 32], &[0x24u8; AES_BLOCK_SIZE], mode).unwrap()
    }

    // NIST SP 800-38A, F.2.5 CBC-AES256.Encrypt, first block.
    #[test]
    fn test_known_answer_aes256() {
        let key = hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4").unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let cipher = AesCbc.build(&key, &iv, CipherMode::Encrypt).unwrap();
        let ciphertext = cipher.finish(&plaintext).unwrap();

        assert_eq!(ciphertext.len(), 32);
        assert_eq!(hex::encode(&ciphertext[..16]), "f58c4c04d6e5f1ba779eabfb5f7bfbd6");
    }

    #[test]
    fn test_encrypt_decrypt() {
        let plaintext = b"Hello, World!";
        let ciphertext = context(CipherMode::Encrypt).finish(plaintext).unwrap();
        let decrypted = context(CipherMode::Decrypt).finish(&ciphertext).unwrap();

        assert_eq!(ciphertext.len(), AES_BLOCK_SIZE);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_empty_is_one_block() {
        let cipher = context(CipherMode::Encrypt);
        let ciphertext = cipher.finish(b"").unwrap();

        assert_eq!(ciphertext.len(), cipher.output_len(0));
        assert_eq!(context(CipherMode::Decrypt).finish(&ciphertext).unwrap(), b"");
    }

    #[test]
    fn test_output_len_matches() {
        let cipher = context(CipherMode::Encrypt);
        for len in [1usize, 15, 16, 17, 100] {
            assert_eq!(cipher.finish(&vec![7u8; len]).unwrap().len(), cipher.output_len(len));
        }
    }

    #[test]
    fn test_wrap_unwrap() {
        let key = [0x11u8; 32];
        let wrapped = context(CipherMode::Wrap).wrap(&key).unwrap();
        let unwrapped = context(CipherMode::Unwrap).unwrap(&wrapped).unwrap();

        assert_eq!(unwrapped.as_slice(), key);
    }

    #[test]
    fn test_wrap_requires_wrap_mode() {
        assert!(context(CipherMode::Encrypt).wrap(&[1u8; 16]).is_err());
        assert!(context(CipherMode::Decrypt).unwrap(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_decrypt_rejects_partial_block() {
        assert!(context(CipherMode::Decrypt).finish(&[]).is_err());
        assert!(context(CipherMode::Decrypt).finish(&[0u8; AES_BLOCK_SIZE - 1]).is_err());
    }

    #[test]
    fn test_decrypt_wrong_key_fails_or_differs() {
        let ciphertext = context(CipherMode::Encrypt).finish(b"attack at dawn").unwrap();
        let other = AesCbc.build(&[0x43u8; 32], &[0x24u8; AES_BLOCK_SIZE], CipherMode::Decrypt).unwrap();

        if let Ok(plaintext) = other.finish(&ciphertext) {
            assert_ne!(plaintext, b"attack at dawn");
        }
    }

    #[test]
    fn test_key_sizes() {
        for (len, bits) in [(16usize, 128usize), (24, 192), (32, 256)] {
            let cipher = AesCbc.build(&vec![1u8; len], &[0u8; AES_BLOCK_SIZE], CipherMode::Encrypt).unwrap();
            assert_eq!(cipher.key_bits(), bits);
        }
        assert!(AesCbc.build(&[1u8; 20], &[0u8; AES_BLOCK_SIZE], CipherMode::Encrypt).is_err());
    }

    #[test]
    fn test_rejects_non_block_iv() {
        assert!(AesCbc.build(&[1u8; 32], &[0u8; 8], CipherMode::Encrypt).is_err());
        assert!(AesCbc.build(&[1u8; 32], &[0u8; 32], CipherMode::Encrypt).is_err());
    }
}
