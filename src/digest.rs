//! Message digests and digest comparison.
//!
//! [`DigestProvider`] hashes byte slices or readers with a chosen
//! [`DigestAlgorithm`]. Each call starts from a fresh hasher, so a provider
//! can be shared between threads and its outputs never interfere.
//!
//! [`compare_digests`] and [`compare_digest_reader`] check digests in
//! constant time, so a mismatch position does not leak through timing.

use std::io::{ErrorKind, Read};

use anyhow::{Context, Result};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Read buffer size for [`DigestProvider::digest_reader`].
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Hash functions a [`DigestProvider`] can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha512,
    Blake3,
}

impl DigestAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
            Self::Blake3 => "BLAKE3",
        }
    }

    /// Digest length in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 | Self::Blake3 => 32,
            Self::Sha512 => 64,
        }
    }
}

enum Hasher {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(hasher) => hasher.update(data),
            Self::Sha256(hasher) => hasher.update(data),
            Self::Sha512(hasher) => hasher.update(data),
            Self::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha1(hasher) => hasher.finalize().to_vec(),
            Self::Sha256(hasher) => hasher.finalize().to_vec(),
            Self::Sha512(hasher) => hasher.finalize().to_vec(),
            Self::Blake3(hasher) => hasher.finalize().as_bytes().to_vec(),
        }
    }
}

/// Computes digests with a fixed algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestProvider {
    algorithm: DigestAlgorithm,
}

impl DigestProvider {
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    pub const fn sha1() -> Self {
        Self::new(DigestAlgorithm::Sha1)
    }

    pub const fn sha256() -> Self {
        Self::new(DigestAlgorithm::Sha256)
    }

    pub const fn sha512() -> Self {
        Self::new(DigestAlgorithm::Sha512)
    }

    pub const fn blake3() -> Self {
        Self::new(DigestAlgorithm::Blake3)
    }

    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub const fn output_len(&self) -> usize {
        self.algorithm.output_len()
    }

    pub fn digest_of(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Hasher::new(self.algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// Lowercase hex form of [`DigestProvider::digest_of`].
    pub fn digest_hex(&self, data: &[u8]) -> String {
        hex::encode(self.digest_of(data))
    }

    /// Hashes everything the reader yields until EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the underlying source fails.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> Result<Vec<u8>> {
        let mut hasher = Hasher::new(self.algorithm);
        let mut buffer = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("failed to read data for hashing"),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }
}

/// Constant-time equality of two digests. Digests of different lengths
/// never match.
pub fn compare_digests(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Reads `expected.len()` bytes from `reader` and compares them with
/// `expected` in constant time.
///
/// Returns `false` when `expected` is empty or the reader ends early.
///
/// # Errors
///
/// Returns an error if reading fails for any reason other than EOF.
pub fn compare_digest_reader<R: Read>(mut reader: R, expected: &[u8]) -> Result<bool> {
    if expected.is_empty() {
        return Ok(false);
    }

    let mut actual = vec![0u8; expected.len()];
    match reader.read_exact(&mut actual) {
        Ok(()) => Ok(compare_digests(&actual, expected)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e).context("failed to read digest"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(DigestProvider::sha1().digest_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(DigestProvider::sha256().digest_hex(b"abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(
            DigestProvider::sha512().digest_hex(b"abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
        assert_eq!(DigestProvider::blake3().digest_hex(b""), "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262");
    }

    #[test]
    fn test_output_len() {
        for algorithm in [DigestAlgorithm::Sha1, DigestAlgorithm::Sha256, DigestAlgorithm::Sha512, DigestAlgorithm::Blake3] {
            let provider = DigestProvider::new(algorithm);
            assert_eq!(provider.digest_of(b"data").len(), provider.output_len());
        }
    }

    #[test]
    fn test_digest_independent_calls() {
        let provider = DigestProvider::sha256();
        let first = provider.digest_of(b"same data");
        let _ = provider.digest_of(b"other data");
        assert_eq!(provider.digest_of(b"same data"), first);
    }

    #[test]
    fn test_reader_matches_slice() {
        let data = vec![0xA5u8; READ_CHUNK_SIZE * 2 + 17];
        let provider = DigestProvider::blake3();

        assert_eq!(provider.digest_reader(data.as_slice()).unwrap(), provider.digest_of(&data));
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(DigestProvider::sha512().algorithm().name(), "SHA-512");
        assert_eq!(DigestProvider::sha1().algorithm().name(), "SHA-1");
        assert_eq!(DigestProvider::blake3().algorithm(), DigestAlgorithm::Blake3);
    }

    #[test]
    fn test_compare_digests() {
        let digest = DigestProvider::sha1().digest_of(b"payload");
        let mut corrupted = digest.clone();
        corrupted[0] ^= 0x01;

        assert!(compare_digests(&digest, &digest));
        assert!(!compare_digests(&digest, &corrupted));
        assert!(!compare_digests(&digest, &digest[..10]));
        assert!(compare_digests(&[], &[]));
    }

    #[test]
    fn test_compare_digest_reader() {
        let digest = DigestProvider::sha256().digest_of(b"payload");
        let mut stream = digest.clone();
        stream.extend_from_slice(b"trailing data");

        assert!(compare_digest_reader(stream.as_slice(), &digest).unwrap());
        assert!(!compare_digest_reader(&digest[..8], &digest).unwrap());
        assert!(!compare_digest_reader(digest.as_slice(), &[]).unwrap());
    }
}
