//! # Cipher Factories
//!
//! A cipher factory turns a password plus salt and IV into an initialized
//! cipher, and can export its attributes as a settings blob so another
//! factory rebuilds the same cipher later.
//!
//! [`PasswordCipherFactory`] is the password-based implementation:
//!
//! 1. Copy the key material out of [`CipherConfig`], generating any unset
//!    salt or IV on the way
//! 2. Derive the key with PBKDF2 ([`KdfParams`])
//! 3. Hand key, IV and mode to the [`CipherBuilder`]
//!
//! All methods take `&self`; the factory is `Send + Sync` and can be shared
//! across threads behind an `Arc`.

use std::time::Instant;

use tracing::{debug, warn};

use crate::config::{FACTORY_NAME, IV_DEFAULT_SIZE, KdfParams, SALT_DEFAULT_SIZE};
use crate::crypto::{AesCbc, CipherBuilder, derive_key};
use crate::error::{CipherError, Result};
use crate::settings::Deserializer;
use crate::types::CipherMode;

mod attributes;

pub use attributes::{CipherConfig, KeyMaterial};

/// Produces initialized ciphers and round-trips its own configuration.
pub trait CipherFactory {
    /// The initialized cipher returned by [`CipherFactory::cipher`].
    type Cipher;

    /// Builds a cipher for `mode` from the current attributes.
    ///
    /// # Errors
    ///
    /// [`CipherError::Derivation`] if key derivation or random generation
    /// fails, [`CipherError::Build`] if the cipher rejects the key or IV.
    fn cipher(&self, mode: CipherMode) -> Result<Self::Cipher>;

    /// Human-readable factory name.
    fn name(&self) -> &str;

    /// Returns `true` if an attribute setter ran since the last call, and
    /// resets the flag.
    fn attributes_modified(&self) -> bool;

    /// Full settings blob, password included.
    fn settings(&self) -> Vec<u8>;

    fn settings_len(&self) -> usize;

    /// Settings blob without the password.
    fn settings_redacted(&self) -> Vec<u8>;

    fn settings_redacted_len(&self) -> usize;

    /// Replaces every attribute present in `data`. On error nothing changes.
    ///
    /// # Errors
    ///
    /// [`CipherError::MalformedSettings`] if `data` is empty, truncated, or
    /// declares a field of length zero.
    fn import_settings(&self, data: &[u8]) -> Result<()>;
}

/// Password-based cipher factory: PBKDF2 key derivation feeding a
/// [`CipherBuilder`], AES-CBC by default.
#[derive(Debug)]
pub struct PasswordCipherFactory<B: CipherBuilder = AesCbc> {
    config: CipherConfig,
    params: KdfParams,
    builder: B,
}

impl PasswordCipherFactory {
    /// Creates a factory whose salt and IV are generated on the first
    /// [`CipherFactory::cipher`] call.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `password` is empty.
    pub fn new(password: &str) -> Result<Self> {
        Self::with_material(password, None, None)
    }

    /// Creates a factory with explicit salt and IV. `None` or empty values
    /// are generated on demand.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `password` is empty or the salt or
    /// IV is longer than 255 bytes.
    pub fn with_material(password: &str, salt: Option<&[u8]>, iv: Option<&[u8]>) -> Result<Self> {
        let config = CipherConfig::new(password, salt, iv)?;
        Ok(Self { config, params: KdfParams::default(), builder: AesCbc })
    }
}

impl<B: CipherBuilder> PasswordCipherFactory<B> {
    /// Replaces the cipher implementation, keeping attributes and KDF policy.
    pub fn with_builder<T: CipherBuilder>(self, builder: T) -> PasswordCipherFactory<T> {
        PasswordCipherFactory { config: self.config, params: self.params, builder }
    }

    /// Replaces the key derivation policy.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `params` fails validation.
    pub fn with_params(self, params: KdfParams) -> Result<Self> {
        params.validate().map_err(|e| CipherError::InvalidArgument(format!("{e:#}")))?;
        Ok(Self { params, ..self })
    }

    pub const fn config(&self) -> &CipherConfig {
        &self.config
    }

    pub const fn kdf_params(&self) -> &KdfParams {
        &self.params
    }

    pub const fn builder(&self) -> &B {
        &self.builder
    }

    /// See [`CipherConfig::set_password`].
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `password` is empty.
    pub fn set_password(&self, password: &str) -> Result<()> {
        self.config.set_password(password)
    }

    /// See [`CipherConfig::set_salt`].
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `salt` is longer than 255 bytes.
    pub fn set_salt(&self, salt: Option<&[u8]>) -> Result<()> {
        self.config.set_salt(salt)
    }

    /// See [`CipherConfig::set_iv`].
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `iv` is longer than 255 bytes.
    pub fn set_iv(&self, iv: Option<&[u8]>) -> Result<()> {
        self.config.set_iv(iv)
    }
}

impl<B: CipherBuilder> CipherFactory for PasswordCipherFactory<B> {
    type Cipher = B::Context;

    fn cipher(&self, mode: CipherMode) -> Result<B::Context> {
        let material = self.config.key_material(SALT_DEFAULT_SIZE, IV_DEFAULT_SIZE).map_err(CipherError::derivation)?;

        let start = Instant::now();
        let key = derive_key(material.password.expose_secret(), &material.salt, self.params.iterations(), self.params.key_bits(), self.params.prf())
            .map_err(CipherError::derivation)?;
        debug!(prf = self.params.prf().name(), iterations = self.params.iterations(), key_bits = self.params.key_bits(), elapsed = ?start.elapsed(), "derived key");

        let cipher = self.builder.build(&key, &material.iv, mode).map_err(CipherError::build)?;
        debug!(%mode, transformation = self.builder.transformation(), "cipher ready");

        Ok(cipher)
    }

    fn name(&self) -> &str {
        FACTORY_NAME
    }

    fn attributes_modified(&self) -> bool {
        self.config.check_and_clear_modified()
    }

    fn settings(&self) -> Vec<u8> {
        self.config.export(true)
    }

    fn settings_len(&self) -> usize {
        self.config.export_len(true)
    }

    fn settings_redacted(&self) -> Vec<u8> {
        self.config.export(false)
    }

    fn settings_redacted_len(&self) -> usize {
        self.config.export_len(false)
    }

    fn import_settings(&self, data: &[u8]) -> Result<()> {
        let settings = Deserializer::new(data).deserialize().map_err(|e| {
            warn!(len = data.len(), error = %format!("{e:#}"), "rejected settings");
            CipherError::malformed(&e)
        })?;

        debug!(password = settings.password.is_some(), salt = settings.salt.is_some(), iv = settings.iv.is_some(), "importing settings");
        self.config.import(settings);
        Ok(())
    }
}

impl<B: CipherBuilder + Clone> Clone for PasswordCipherFactory<B> {
    fn clone(&self) -> Self {
        Self { config: self.config.clone(), params: self.params, builder: self.builder.clone() }
    }
}
