//! # Cryptographic Primitives
//!
//! The leaves of the cipher factory:
//! - [`derive_key`]: PBKDF2 key derivation with a selectable [`Prf`]
//! - [`random_bytes`]: OS randomness for lazily generated salts and IVs
//! - [`CipherBuilder`]: the boundary to the block cipher implementation,
//!   with [`AesCbc`] as the fixed AES-CBC/PKCS#7 transform

use anyhow::Result;

mod aes_cbc;
mod derive;

pub use aes_cbc::{AesCbc, CipherContext};
pub use derive::{Prf, derive_key, random_bytes};

use crate::types::CipherMode;

/// Builds a ready-to-use cipher context from derived key bytes.
///
/// Implementations wrap a platform cipher. Any rejection of the key, IV or
/// mode by the underlying primitive is returned as an error; a returned
/// context is always usable.
pub trait CipherBuilder {
    /// The initialized cipher handed back to callers.
    type Context;

    /// Initializes a cipher for `mode` with `key` and `iv`.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive rejects the key length, IV length
    /// or mode.
    fn build(&self, key: &[u8], iv: &[u8], mode: CipherMode) -> Result<Self::Context>;

    /// Transformation string in `algorithm/mode/padding` form.
    fn transformation(&self) -> &'static str;
}
