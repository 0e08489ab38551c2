//! Mutable cipher attributes shared by every operation of a factory.
//!
//! Password, password cache, salt and IV live behind one mutex per
//! [`CipherConfig`], so an export never sees half of an update and two
//! setters never interleave. The modified flag sits outside the lock as an
//! atomic that setters raise while still holding it.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result as AnyResult;
use parking_lot::Mutex;
use tracing::debug;

use crate::crypto::random_bytes;
use crate::error::{CipherError, Result};
use crate::secret::{Secret, SecretBytes};
use crate::settings::{SerializeParams, Serializer, Settings};
use crate::types::LazyBytes;

struct ConfigState {
    password: Secret,

    /// UTF-8 bytes of `password`, filled on demand and dropped whenever the
    /// password changes.
    password_cache: Option<SecretBytes>,

    salt: LazyBytes,

    iv: LazyBytes,
}

impl ConfigState {
    fn password_bytes(&mut self) -> &SecretBytes {
        self.password_cache.get_or_insert_with(|| self.password.to_bytes())
    }

    fn serialize_params(&mut self, include_password: bool) -> SerializeParams<'_> {
        if include_password {
            self.password_bytes();
        }

        let params = SerializeParams {
            password: self.password_cache.as_ref().map(SecretBytes::expose_secret),
            salt: self.salt.as_slice(),
            iv: self.iv.as_slice(),
        };

        if include_password { params } else { params.redacted() }
    }
}

/// Everything needed to derive a key and build a cipher, copied out of the
/// config so the slow derivation runs without holding the lock.
pub struct KeyMaterial {
    pub password: SecretBytes,
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
}

/// Password, salt and IV of a password cipher factory.
pub struct CipherConfig {
    state: Mutex<ConfigState>,
    modified: AtomicBool,
    export_salt: AtomicBool,
    export_iv: AtomicBool,
}

impl CipherConfig {
    /// Creates a config. `None` or empty salt/IV are generated on the first
    /// cipher build. The modified flag starts cleared.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if the password is empty or the salt
    /// or IV is longer than 255 bytes.
    pub fn new(password: &str, salt: Option<&[u8]>, iv: Option<&[u8]>) -> Result<Self> {
        ensure_password(password)?;
        let state = ConfigState { password: Secret::new(password), password_cache: None, salt: lazy_field("salt", salt)?, iv: lazy_field("initializationVector", iv)? };

        Ok(Self { state: Mutex::new(state), modified: AtomicBool::new(false), export_salt: AtomicBool::new(false), export_iv: AtomicBool::new(false) })
    }

    /// Replaces the password and drops the cached password bytes.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `password` is empty.
    pub fn set_password(&self, password: &str) -> Result<()> {
        ensure_password(password)?;

        let mut state = self.state.lock();
        state.password = Secret::new(password);
        state.password_cache = None;
        self.modified.store(true, Ordering::Release);
        Ok(())
    }

    /// Replaces the salt; `None` or empty means generate on demand.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `salt` is longer than 255 bytes.
    pub fn set_salt(&self, salt: Option<&[u8]>) -> Result<()> {
        let salt = lazy_field("salt", salt)?;

        let mut state = self.state.lock();
        state.salt = salt;
        self.modified.store(true, Ordering::Release);
        Ok(())
    }

    /// Replaces the IV; `None` or empty means generate on demand.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidArgument`] if `iv` is longer than 255 bytes.
    pub fn set_iv(&self, iv: Option<&[u8]>) -> Result<()> {
        let iv = lazy_field("initializationVector", iv)?;

        let mut state = self.state.lock();
        state.iv = iv;
        self.modified.store(true, Ordering::Release);
        Ok(())
    }

    /// Returns whether any setter ran since the last call, and clears the
    /// flag in the same atomic step.
    pub fn check_and_clear_modified(&self) -> bool {
        self.modified.swap(false, Ordering::AcqRel)
    }

    pub fn password(&self) -> Secret {
        Secret::new(self.state.lock().password.expose_secret())
    }

    pub fn salt(&self) -> Option<Vec<u8>> {
        self.state.lock().salt.as_slice().map(<[u8]>::to_vec)
    }

    pub fn iv(&self) -> Option<Vec<u8>> {
        self.state.lock().iv.as_slice().map(<[u8]>::to_vec)
    }

    /// Hint for callers deciding whether to publish the salt. The codec
    /// ignores it.
    pub fn set_export_salt(&self, export: bool) {
        self.export_salt.store(export, Ordering::Relaxed);
    }

    pub fn exports_salt(&self) -> bool {
        self.export_salt.load(Ordering::Relaxed)
    }

    /// Hint for callers deciding whether to publish the IV. The codec
    /// ignores it.
    pub fn set_export_iv(&self, export: bool) {
        self.export_iv.store(export, Ordering::Relaxed);
    }

    pub fn exports_iv(&self) -> bool {
        self.export_iv.load(Ordering::Relaxed)
    }

    /// Encodes the config; the password is included only when
    /// `include_password` is set.
    pub fn export(&self, include_password: bool) -> Vec<u8> {
        let mut state = self.state.lock();
        let params = state.serialize_params(include_password);
        debug!(password = params.password.is_some(), salt = params.salt.map(<[u8]>::len), iv = params.iv.map(<[u8]>::len), "exporting settings");
        Serializer::serialize(&params)
    }

    /// Size of [`CipherConfig::export`] with the same argument.
    pub fn export_len(&self, include_password: bool) -> usize {
        self.state.lock().serialize_params(include_password).encoded_len()
    }

    /// Applies every field present in `settings` in one locked step. Absent
    /// fields keep their current value. The modified flag is not raised.
    pub fn import(&self, settings: Settings) {
        let mut state = self.state.lock();

        if let Some(password) = settings.password {
            state.password = password;
            state.password_cache = None;
        }

        if let Some(salt) = settings.salt {
            state.salt = LazyBytes::Set(salt);
        }

        if let Some(iv) = settings.iv {
            state.iv = LazyBytes::Set(iv);
        }
    }

    /// Fills an unset salt or IV with fresh random bytes and returns a copy
    /// of the key material. Generated values persist in the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system RNG fails.
    pub fn key_material(&self, salt_len: usize, iv_len: usize) -> AnyResult<KeyMaterial> {
        let mut state = self.state.lock();

        let generated_salt = !state.salt.is_set();
        let salt = state.salt.get_or_generate(salt_len, random_bytes)?.to_vec();
        if generated_salt {
            debug!(len = salt.len(), "generated salt");
        }

        let generated_iv = !state.iv.is_set();
        let iv = state.iv.get_or_generate(iv_len, random_bytes)?.to_vec();
        if generated_iv {
            debug!(len = iv.len(), "generated initialization vector");
        }

        let password = SecretBytes::new(state.password_bytes().expose_secret());
        Ok(KeyMaterial { password, salt, iv })
    }
}

impl Clone for CipherConfig {
    /// Copies the current attributes into a config with its own lock and a
    /// cleared modified flag.
    fn clone(&self) -> Self {
        let state = self.state.lock();
        let copy = ConfigState { password: Secret::new(state.password.expose_secret()), password_cache: None, salt: state.salt.clone(), iv: state.iv.clone() };

        Self { state: Mutex::new(copy), modified: AtomicBool::new(false), export_salt: AtomicBool::new(self.exports_salt()), export_iv: AtomicBool::new(self.exports_iv()) }
    }
}

impl std::fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CipherConfig")
            .field("password", &state.password)
            .field("salt", &state.salt)
            .field("iv", &state.iv)
            .field("export_salt", &self.exports_salt())
            .field("export_iv", &self.exports_iv())
            .finish_non_exhaustive()
    }
}

fn ensure_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(CipherError::InvalidArgument("password is empty".into()));
    }
    Ok(())
}

fn lazy_field(name: &str, bytes: Option<&[u8]>) -> Result<LazyBytes> {
    LazyBytes::new(bytes).map_err(|e| CipherError::InvalidArgument(format!("{name} is invalid: {e}")))
}
