//! # Key Derivation with PBKDF2
//!
//! Turns a password and salt into raw key bytes with PBKDF2 (RFC 8018).
//! The pseudorandom function is a named choice: HMAC-SHA1 is the fixed
//! policy of the password cipher factory, HMAC-SHA256 and HMAC-SHA512 are
//! available as upgrades. Derivation is pure and deterministic; the same
//! inputs always produce the same key.
//!
//! Salts and IVs that the factory generates on demand come from
//! [`random_bytes`], which reads the operating system CSPRNG.

use anyhow::{Result, anyhow, ensure};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

/// Pseudorandom function driving PBKDF2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Prf {
    #[default]
    HmacSha1,
    HmacSha256,
    HmacSha512,
}

impl Prf {
    /// Conventional algorithm name, e.g. `PBKDF2WithHmacSHA1`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::HmacSha1 => "PBKDF2WithHmacSHA1",
            Self::HmacSha256 => "PBKDF2WithHmacSHA256",
            Self::HmacSha512 => "PBKDF2WithHmacSHA512",
        }
    }
}

/// Derives `key_bits / 8` bytes of key material.
///
/// # Errors
///
/// Returns an error if the iteration count is zero, the key length is not
/// a positive whole number of bytes, or the salt is empty.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32, key_bits: u32, prf: Prf) -> Result<Zeroizing<Vec<u8>>> {
    ensure!(iterations > 0, "iteration count must be positive");
    ensure!(key_bits > 0 && key_bits % 8 == 0, "key length must be a positive multiple of 8 bits, got {key_bits}");
    ensure!(!salt.is_empty(), "salt cannot be empty");

    let mut key = Zeroizing::new(vec![0u8; (key_bits / 8) as usize]);
    match prf {
        Prf::HmacSha1 => pbkdf2_hmac::<Sha1>(password, salt, iterations, key.as_mut_slice()),
        Prf::HmacSha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut_slice()),
        Prf::HmacSha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, key.as_mut_slice()),
    }

    Ok(key)
}

/// Returns `len` bytes from the operating system CSPRNG.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    getrandom::fill(&mut bytes).map_err(|e| anyhow!("rng failed: {e}"))?;
    Ok(bytes)
}
