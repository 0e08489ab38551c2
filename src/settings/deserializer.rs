//! Settings deserialization.
//!
//! Reads a settings blob front to back, driven by the flags byte:
//!
//! 1. Read the flags byte (an empty blob is rejected)
//! 2. If the password bit is set, read a big-endian `u32` length and that
//!    many bytes of UTF-8
//! 3. If the salt bit is set, read a `u8` length and that many bytes
//! 4. If the IV bit is set, read a `u8` length and that many bytes
//!
//! A present field with a declared length of zero is malformed. Reserved
//! flag bits and bytes after the last field are ignored. Nothing is
//! returned unless the whole blob decodes, so a caller never sees a
//! partially parsed result.

use anyhow::{Context, Result, ensure};
use tracing::trace;

use crate::config::PASSWORD_LEN_SIZE;
use crate::secret::Secret;
use crate::settings::{Flags, Settings};

/// Cursor over a settings blob.
pub struct Deserializer<'a> {
    /// The full input.
    data: &'a [u8],

    /// Offset of the next unread byte.
    pos: usize,
}

impl<'a> Deserializer<'a> {
    #[inline]
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decodes the blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, ends inside a field, declares
    /// an empty field, or carries a password that is not valid UTF-8.
    pub fn deserialize(mut self) -> Result<Settings> {
        ensure!(!self.data.is_empty(), "no data");

        let flags = Flags::from_bits(self.read_u8().context("flags")?);
        if flags.reserved() != 0 {
            trace!(reserved = flags.reserved(), "ignoring reserved settings flags");
        }

        let mut settings = Settings::default();

        if flags.has_password() {
            settings.password = Some(self.read_password()?);
        }

        if flags.has_salt() {
            settings.salt = Some(self.read_short_field("salt")?.to_vec());
        }

        if flags.has_iv() {
            settings.iv = Some(self.read_short_field("initialization vector")?.to_vec());
        }

        if self.remaining() > 0 {
            trace!(trailing = self.remaining(), "ignoring bytes after settings fields");
        }

        Ok(settings)
    }

    fn read_password(&mut self) -> Result<Secret> {
        let length = self.read_u32_be().context("password length")?;
        ensure!(length >= 1, "password length less than 1");

        let bytes = self.take(length as usize).context("password")?;
        let password = std::str::from_utf8(bytes).context("password is not valid UTF-8")?;

        Ok(Secret::new(password))
    }

    /// Reads a field behind a one-byte length prefix.
    fn read_short_field(&mut self, name: &'static str) -> Result<&'a [u8]> {
        let length = self.read_u8().with_context(|| format!("{name} length"))?;
        ensure!(length >= 1, "{name} length less than 1");

        self.take(usize::from(length)).context(name)
    }

    #[inline]
    const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        ensure!(self.remaining() >= len, "truncated: need {len} bytes, got {}", self.remaining());

        let data = self.data;
        let bytes = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        let bytes: [u8; PASSWORD_LEN_SIZE] = self.take(PASSWORD_LEN_SIZE)?.try_into().context("length conversion")?;
        Ok(u32::from_be_bytes(bytes))
    }
}
