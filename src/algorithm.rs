//! Hash algorithms
//!
//! Every digest (file content and directory descriptor) is produced by a fresh
//! [`StreamHasher`] obtained from a [`HasherFactory`]. Built-in algorithms are
//! resolved by name through [`Algorithm`]; callers can also supply their own
//! factory, including a plain closure.

use crate::error::{DirhashError, Result};
use digest::DynDigest;
use std::fmt;
use std::str::FromStr;

/// Streaming hasher: feed bytes, then consume it for the lowercase hex digest.
pub trait StreamHasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize_hex(self: Box<Self>) -> String;
}

/// Creates independent hasher instances. Shared across hashing workers, so it
/// must be `Send + Sync`; the hashers it creates are never shared.
pub trait HasherFactory: Send + Sync {
    fn create(&self) -> Box<dyn StreamHasher>;
}

impl<F> HasherFactory for F
where
    F: Fn() -> Box<dyn StreamHasher> + Send + Sync,
{
    fn create(&self) -> Box<dyn StreamHasher> {
        self()
    }
}

/// Built-in algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Blake3,
}

impl Algorithm {
    /// Algorithms that are always available
    pub const GUARANTEED: [Algorithm; 6] = [
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ];

    pub const ALL: [Algorithm; 7] = [
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
        Algorithm::Blake3,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
            Algorithm::Blake3 => "blake3",
        }
    }

    /// Hash a complete byte slice in one go.
    pub fn digest_hex(&self, data: &[u8]) -> String {
        let mut hasher = self.create();
        hasher.update(data);
        hasher.finalize_hex()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = DirhashError;

    /// Case-insensitive; `-` and `_` are ignored so `SHA-256` parses as `sha256`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Algorithm::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| DirhashError::UnknownAlgorithm(s.to_string()))
    }
}

impl HasherFactory for Algorithm {
    fn create(&self) -> Box<dyn StreamHasher> {
        match self {
            Algorithm::Md5 => DigestHasher::boxed(md5::Md5::default()),
            Algorithm::Sha1 => DigestHasher::boxed(sha1::Sha1::default()),
            Algorithm::Sha224 => DigestHasher::boxed(sha2::Sha224::default()),
            Algorithm::Sha256 => DigestHasher::boxed(sha2::Sha256::default()),
            Algorithm::Sha384 => DigestHasher::boxed(sha2::Sha384::default()),
            Algorithm::Sha512 => DigestHasher::boxed(sha2::Sha512::default()),
            Algorithm::Blake3 => Box::new(Blake3Hasher(blake3::Hasher::new())),
        }
    }
}

/// Names of the algorithms guaranteed on every platform
pub fn algorithms_guaranteed() -> Vec<&'static str> {
    Algorithm::GUARANTEED.iter().map(Algorithm::name).collect()
}

/// Names of every built-in algorithm
pub fn algorithms_available() -> Vec<&'static str> {
    Algorithm::ALL.iter().map(Algorithm::name).collect()
}

/// Adapter over the RustCrypto `digest` family
struct DigestHasher(Box<dyn DynDigest + Send>);

impl DigestHasher {
    fn boxed<D: DynDigest + Send + 'static>(inner: D) -> Box<dyn StreamHasher> {
        Box::new(DigestHasher(Box::new(inner)))
    }
}

impl StreamHasher for DigestHasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        let DigestHasher(inner) = *self;
        hex::encode(inner.finalize())
    }
}

struct Blake3Hasher(blake3::Hasher);

impl StreamHasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        self.0.finalize().to_hex().to_string()
    }
}
