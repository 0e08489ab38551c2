//! pbcipher - password-based cipher factories with portable settings.
//!
//! A [`PasswordCipherFactory`] turns a password into initialized AES-CBC
//! ciphers:
//! - PBKDF2-HMAC-SHA1, 2000 iterations, for a 256-bit key
//! - 32-byte salt and 16-byte IV, generated once on first use when unset
//! - PKCS#7 padding
//!
//! The factory's password, salt and IV can be exported as a compact settings
//! blob (optionally without the password) and imported into another factory
//! to rebuild the same cipher.
//!
//! ```no_run
//! use pbcipher::{CipherFactory, CipherMode, PasswordCipherFactory};
//!
//! # fn main() -> pbcipher::Result<()> {
//! let factory = PasswordCipherFactory::new("correct horse")?;
//! let cipher = factory.cipher(CipherMode::Encrypt)?;
//!
//! let restored = PasswordCipherFactory::new("placeholder")?;
//! restored.import_settings(&factory.settings())?;
//! # let _ = cipher;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod digest;
pub mod error;
pub mod factory;
pub mod secret;
pub mod settings;
pub mod types;

pub use config::KdfParams;
pub use crypto::{AesCbc, CipherBuilder, CipherContext, Prf};
pub use digest::{DigestAlgorithm, DigestProvider, compare_digest_reader, compare_digests};
pub use error::{CipherError, Result};
pub use factory::{CipherConfig, CipherFactory, PasswordCipherFactory};
pub use secret::{Secret, SecretBytes};
pub use types::{CipherMode, LazyBytes};
