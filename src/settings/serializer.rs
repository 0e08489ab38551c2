use crate::config::{FIELD_LEN_SIZE, FLAG_IV, FLAG_PASSWORD, FLAG_SALT, FLAGS_SIZE, MAX_FIELD_LEN, PASSWORD_LEN_SIZE};
use crate::settings::Flags;

/// Borrowed view of the fields to encode. `None` fields are omitted.
#[derive(Clone, Copy, Default)]
pub struct SerializeParams<'a> {
    pub password: Option<&'a [u8]>,

    pub salt: Option<&'a [u8]>,

    pub iv: Option<&'a [u8]>,
}

impl SerializeParams<'_> {
    /// The same view without the password, for redacted export.
    #[must_use]
    pub const fn redacted(self) -> Self {
        Self { password: None, ..self }
    }

    pub const fn flags(&self) -> Flags {
        Flags::from_bits(0).with(FLAG_PASSWORD, self.password.is_some()).with(FLAG_SALT, self.salt.is_some()).with(FLAG_IV, self.iv.is_some())
    }

    /// Exact size of the encoded blob.
    pub fn encoded_len(&self) -> usize {
        FLAGS_SIZE
            + self.password.map_or(0, |password| PASSWORD_LEN_SIZE + password.len())
            + self.salt.map_or(0, |salt| FIELD_LEN_SIZE + salt.len())
            + self.iv.map_or(0, |iv| FIELD_LEN_SIZE + iv.len())
    }
}

/// Writes settings blobs.
pub struct Serializer;

impl Serializer {
    /// Encodes `params` into a new buffer of exactly
    /// [`SerializeParams::encoded_len`] bytes.
    ///
    /// Salt and IV must be at most 255 bytes and the password at most
    /// `u32::MAX` bytes; the config setters enforce both.
    pub fn serialize(params: &SerializeParams<'_>) -> Vec<u8> {
        let mut out = Vec::with_capacity(params.encoded_len());

        out.push(params.flags().bits());

        if let Some(password) = params.password {
            Self::write_password(&mut out, password);
        }

        if let Some(salt) = params.salt {
            Self::write_short_field(&mut out, salt);
        }

        if let Some(iv) = params.iv {
            Self::write_short_field(&mut out, iv);
        }

        debug_assert_eq!(out.len(), params.encoded_len());
        out
    }

    #[inline]
    fn write_password(out: &mut Vec<u8>, password: &[u8]) {
        debug_assert!(u32::try_from(password.len()).is_ok());
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(password.len() as u32).to_be_bytes());
        out.extend_from_slice(password);
    }

    #[inline]
    fn write_short_field(out: &mut Vec<u8>, field: &[u8]) {
        debug_assert!(field.len() <= MAX_FIELD_LEN);
        #[allow(clippy::cast_possible_truncation)]
        out.push(field.len() as u8);
        out.extend_from_slice(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_layout() {
        let params = SerializeParams { password: Some(b"pw"), salt: Some(&[0xAA, 0xBB]), iv: Some(&[0xCC]) };
        let bytes = Serializer::serialize(&params);

        assert_eq!(bytes, vec![0x07, 0x00, 0x00, 0x00, 0x02, b'p', b'w', 0x02, 0xAA, 0xBB, 0x01, 0xCC]);
        assert_eq!(bytes.len(), params.encoded_len());
    }

    #[test]
    fn test_redacted_layout() {
        let params = SerializeParams { password: Some(b"secret"), salt: Some(&[1, 2, 3]), iv: None }.redacted();
        let bytes = Serializer::serialize(&params);

        assert_eq!(bytes, vec![0x02, 0x03, 1, 2, 3]);
        assert_eq!(bytes.len(), params.encoded_len());
    }

    #[test]
    fn test_empty_params() {
        let params = SerializeParams::default();
        assert_eq!(Serializer::serialize(&params), vec![0x00]);
        assert_eq!(params.encoded_len(), 1);
    }

    #[test]
    fn test_password_length_big_endian() {
        let password = vec![b'x'; 0x0102];
        let params = SerializeParams { password: Some(&password), ..SerializeParams::default() };
        let bytes = Serializer::serialize(&params);

        assert_eq!(&bytes[..5], &[0x01, 0x00, 0x00, 0x01, 0x02]);
        assert_eq!(bytes.len(), 1 + 4 + 0x0102);
    }

    #[test]
    fn test_max_short_field() {
        let salt = [0x5Au8; MAX_FIELD_LEN];
        let params = SerializeParams { salt: Some(&salt), ..SerializeParams::default() };
        let bytes = Serializer::serialize(&params);

        assert_eq!(bytes[1], 0xFF);
        assert_eq!(bytes.len(), 2 + MAX_FIELD_LEN);
    }
}
