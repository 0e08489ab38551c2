//! Global Configuration Constants
//!
//! Cipher policy and settings layout parameters used throughout pbcipher.
//! The constants describe the fixed policy of [`PasswordCipherFactory`];
//! [`KdfParams`] carries the subset of it that a caller may reconfigure.
//!
//! [`PasswordCipherFactory`]: crate::factory::PasswordCipherFactory

use anyhow::{Result, ensure};

use crate::crypto::Prf;

/// Descriptive name reported by the password cipher factory.
pub const FACTORY_NAME: &str = "AES Password PBKDF2";

// === Key Derivation Parameters ===

/// PBKDF2 iteration count.
///
/// Every build of a cipher pays for this many PRF rounds, so the value is
/// a compromise between brute-force cost and the latency of `cipher()`.
pub const KDF_ITERATIONS: u32 = 2000;

/// Length of the derived key in bits (AES-256).
pub const KEY_BITS: u32 = 256;

/// Size of a lazily generated salt in bytes.
pub const SALT_DEFAULT_SIZE: usize = 32;

/// Size of a lazily generated initialization vector in bytes.
///
/// Matches the AES block size, which is the only IV length CBC accepts.
pub const IV_DEFAULT_SIZE: usize = 16;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

// === Settings Layout ===
// Flag byte, then password (u32 length), salt (u8 length), IV (u8 length).

/// Largest salt or IV that fits behind a single-byte length prefix.
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;

/// Size of the flags byte that opens every settings blob.
pub const FLAGS_SIZE: usize = 1;

/// Size of the big-endian password length prefix.
pub const PASSWORD_LEN_SIZE: usize = 4;

/// Size of the salt and IV length prefixes.
pub const FIELD_LEN_SIZE: usize = 1;

/// Flag bit: password field present (full export only).
pub const FLAG_PASSWORD: u8 = 0x01;

/// Flag bit: salt field present.
pub const FLAG_SALT: u8 = 0x02;

/// Flag bit: IV field present.
pub const FLAG_IV: u8 = 0x04;

/// Key derivation policy for a factory.
///
/// The default is the fixed policy: PBKDF2 with HMAC-SHA1, 2000 iterations
/// and a 256-bit key. Swapping the PRF keeps the iteration and length
/// contract unless the caller changes those too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
    key_bits: u32,
    prf: Prf,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { iterations: KDF_ITERATIONS, key_bits: KEY_BITS, prf: Prf::default() }
    }
}

impl KdfParams {
    pub fn new(iterations: u32, key_bits: u32, prf: Prf) -> Result<Self> {
        let params = Self { iterations, key_bits, prf };
        params.validate()?;
        Ok(params)
    }

    #[must_use]
    pub const fn with_prf(self, prf: Prf) -> Self {
        Self { prf, ..self }
    }

    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    pub const fn key_bits(&self) -> u32 {
        self.key_bits
    }

    pub const fn prf(&self) -> Prf {
        self.prf
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.iterations >= 1, "iteration count must be at least 1");
        ensure!(self.key_bits > 0, "key length must be positive");
        ensure!(self.key_bits % 8 == 0, "key length must be a whole number of bytes, got {} bits", self.key_bits);
        Ok(())
    }
}
