//! Settings wire format.
//!
//! A settings blob records the password, salt and IV of a cipher factory so
//! the cipher can be rebuilt later:
//!
//! ```text
//! [flags: u8]
//! [password length: u32 BE][password: UTF-8]   if flags & 0x01
//! [salt length: u8][salt]                       if flags & 0x02
//! [IV length: u8][IV]                           if flags & 0x04
//! ```
//!
//! The redacted form never carries the password field or its flag.
//! Unknown flag bits are ignored on decode.

use crate::config::{FLAG_IV, FLAG_PASSWORD, FLAG_SALT};
use crate::secret::Secret;

pub mod deserializer;
pub mod serializer;

pub use deserializer::Deserializer;
pub use serializer::{SerializeParams, Serializer};

/// The flags byte that opens every settings blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn with(self, bit: u8, present: bool) -> Self {
        if present { Self(self.0 | bit) } else { Self(self.0 & !bit) }
    }

    pub const fn has_password(self) -> bool {
        self.0 & FLAG_PASSWORD != 0
    }

    pub const fn has_salt(self) -> bool {
        self.0 & FLAG_SALT != 0
    }

    pub const fn has_iv(self) -> bool {
        self.0 & FLAG_IV != 0
    }

    /// Bits outside the three defined fields.
    pub const fn reserved(self) -> u8 {
        self.0 & !(FLAG_PASSWORD | FLAG_SALT | FLAG_IV)
    }
}

/// Fields recovered from a settings blob. Absent fields are `None`.
#[derive(Debug, Default)]
pub struct Settings {
    pub password: Option<Secret>,
    pub salt: Option<Vec<u8>>,
    pub iv: Option<Vec<u8>>,
}
