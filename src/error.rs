//! Error type surfaced by the cipher factory.

use thiserror::Error;

/// Boxed source error carried by the derivation and build variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`CipherConfig`](crate::factory::CipherConfig) setters and
/// by the [`CipherFactory`](crate::factory::CipherFactory) contract.
#[derive(Debug, Error)]
pub enum CipherError {
    /// An empty password or an oversized salt/IV was supplied to a setter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Settings input was empty, truncated, or declared an empty field.
    #[error("malformed settings: {0}")]
    MalformedSettings(String),

    /// The key-derivation primitive rejected its parameters or randomness
    /// was unavailable.
    #[error("key derivation failed: {0}")]
    Derivation(#[source] BoxError),

    /// The cipher primitive rejected the key, IV or mode.
    #[error("cipher construction failed: {0}")]
    Build(#[source] BoxError),
}

impl CipherError {
    pub(crate) fn derivation(error: anyhow::Error) -> Self {
        Self::Derivation(error.into())
    }

    pub(crate) fn build(error: anyhow::Error) -> Self {
        Self::Build(error.into())
    }

    pub(crate) fn malformed(error: &anyhow::Error) -> Self {
        Self::MalformedSettings(format!("{error:#}"))
    }
}

pub type Result<T, E = CipherError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use anyhow::{Context, anyhow};

    use super::*;

    #[test]
    fn test_derivation_keeps_source() {
        let inner: anyhow::Result<()> = Err(anyhow!("salt cannot be empty"));
        let error = CipherError::derivation(inner.context("pbkdf2").unwrap_err());

        assert!(matches!(error, CipherError::Derivation(_)));
        assert!(error.source().is_some());
        assert!(error.to_string().starts_with("key derivation failed"));
    }

    #[test]
    fn test_malformed_includes_context_chain() {
        let inner: anyhow::Result<()> = Err(anyhow!("need 4 bytes, got 1"));
        let error = CipherError::malformed(&inner.context("password length").unwrap_err());

        assert_eq!(error.to_string(), "malformed settings: password length: need 4 bytes, got 1");
    }
}
