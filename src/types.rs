//! Common type definitions for pbcipher.
//!
//! - [`CipherMode`]: the operation a built cipher context performs
//! - [`LazyBytes`]: a salt or IV that is either set or generated on first use

use std::fmt::{Display, Formatter};

use anyhow::{Result, bail, ensure};

use crate::config::MAX_FIELD_LEN;

/// Operation mode requested from a cipher factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CipherMode {
    /// Encrypt arbitrary data.
    Encrypt,

    /// Decrypt data produced in [`CipherMode::Encrypt`].
    Decrypt,

    /// Encrypt key material for storage.
    Wrap,

    /// Recover key material produced in [`CipherMode::Wrap`].
    Unwrap,
}

impl CipherMode {
    /// Array containing all modes for iteration.
    pub const ALL: &'static [Self] = &[Self::Encrypt, Self::Decrypt, Self::Wrap, Self::Unwrap];

    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypt",
            Self::Decrypt => "Decrypt",
            Self::Wrap => "Wrap",
            Self::Unwrap => "Unwrap",
        }
    }

    /// Returns `true` for the modes that run the block cipher forwards.
    #[inline]
    pub const fn is_encrypting(self) -> bool {
        matches!(self, Self::Encrypt | Self::Wrap)
    }
}

impl Display for CipherMode {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A salt or IV slot.
///
/// `Unset` means "generate on demand": the factory fills it with random
/// bytes the first time a cipher is built, and the generated value then
/// stays until it is explicitly overwritten. A set value is 1 to 255 bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LazyBytes {
    #[default]
    Unset,
    Set(Vec<u8>),
}

impl LazyBytes {
    /// Builds a slot from caller input. `None` and an empty slice both
    /// leave the slot unset.
    pub fn new(bytes: Option<&[u8]>) -> Result<Self> {
        match bytes {
            None | Some([]) => Ok(Self::Unset),
            Some(bytes) => {
                ensure!(bytes.len() <= MAX_FIELD_LEN, "{} bytes is larger than {MAX_FIELD_LEN}", bytes.len());
                Ok(Self::Set(bytes.to_vec()))
            }
        }
    }

    pub fn as_slice(&self) -> Option<&[u8]> {
        match self {
            Self::Unset => None,
            Self::Set(bytes) => Some(bytes),
        }
    }

    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Returns the stored bytes, filling the slot with `generate(len)` first
    /// if it is unset.
    pub fn get_or_generate<F>(&mut self, len: usize, generate: F) -> Result<&[u8]>
    where
        F: FnOnce(usize) -> Result<Vec<u8>>,
    {
        if let Self::Unset = self {
            let bytes = generate(len)?;
            ensure!(!bytes.is_empty() && bytes.len() <= MAX_FIELD_LEN, "generated {} bytes, expected 1 to {MAX_FIELD_LEN}", bytes.len());
            *self = Self::Set(bytes);
        }

        match self {
            Self::Set(bytes) => Ok(bytes),
            Self::Unset => bail!("slot is unset"),
        }
    }
}
