//! core::fingerprint
//!
//! Deterministic content digests.
//!
//! A fingerprint is the SHA-256 of a file's byte content, hex-encoded.
//! It is the only thing a commit records about a file: the engine never
//! stores the bytes themselves, so two files with equal content are
//! indistinguishable in history (and a checkout cannot reconstruct
//! them).

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Errors from digest validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

/// A hex-encoded SHA-256 content digest.
///
/// # Example
///
/// ```
/// use strata::core::fingerprint::{fingerprint, Digest};
///
/// let digest = fingerprint(b"hi");
/// assert_eq!(digest.as_str().len(), 64);
///
/// // Deterministic: identical content, identical digest
/// assert_eq!(digest, fingerprint(b"hi"));
/// assert_ne!(digest, fingerprint(b"ho"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Create a digest from an existing hex string.
    ///
    /// Normalized to lowercase. Used when reading previously recorded
    /// hashes; fresh digests come from [`fingerprint`].
    ///
    /// # Errors
    ///
    /// Returns `DigestError::InvalidDigest` if the string is not 64
    /// hex characters.
    pub fn new(hex: impl Into<String>) -> Result<Self, DigestError> {
        let hex = hex.into().to_ascii_lowercase();
        if hex.len() != 64 {
            return Err(DigestError::InvalidDigest(format!(
                "expected 64 hex characters, got {}",
                hex.len()
            )));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidDigest(
                "digest must be hexadecimal".into(),
            ));
        }
        Ok(Self(hex))
    }

    /// Get the digest as a hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = DigestError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint a byte sequence.
///
/// Pure and deterministic: identical bytes always produce the identical
/// digest. No error conditions.
pub fn fingerprint(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest(hex::encode(hasher.finalize()))
}
