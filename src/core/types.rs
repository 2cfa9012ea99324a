//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`VersionId`] - Fixed-width random hex identifier for a version
//! - [`BranchName`] - Validated branch name
//! - [`RepoKey`] - Registry key for a (user, logical path) pair
//! - [`EpochSeconds`] - Second-granular wall-clock timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs - in
//! particular, no identifier stored in the pipe-delimited registry
//! file may contain the `|` delimiter.
//!
//! # Examples
//!
//! ```
//! use strata::core::types::{BranchName, RepoKey, VersionId};
//!
//! // Valid constructions
//! let branch = BranchName::new("feature").unwrap();
//! let id = VersionId::new("abc123def4567890").unwrap();
//! let key = RepoKey::new("alice", "projects/web").unwrap();
//! assert_eq!(key.as_str(), "alice/projects/web");
//!
//! // Invalid constructions fail at creation time
//! assert!(BranchName::new("bad|name").is_err());
//! assert!(VersionId::new("not-hex").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version id: {0}")]
    InvalidVersionId(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid repository key: {0}")]
    InvalidRepoKey(String),
}

/// A version identifier: 16 lowercase hex characters.
///
/// Ids are minted from 8 random bytes at commit time and are never
/// reused. They carry no ordering or content information.
///
/// # Example
///
/// ```
/// use strata::core::types::VersionId;
///
/// let id = VersionId::new("ABC123DEF4567890").unwrap();
/// assert_eq!(id.as_str(), "abc123def4567890");
///
/// let fresh = VersionId::generate();
/// assert_eq!(fresh.as_str().len(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionId(String);

impl VersionId {
    /// Number of hex characters in an id (8 random bytes).
    pub const LEN: usize = 16;

    /// Create a validated version id.
    ///
    /// The id is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidVersionId` if the string is not
    /// exactly 16 hex characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_ascii_lowercase();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Mint a fresh random id.
    ///
    /// Ids come from a non-cryptographic random source; callers that
    /// insert into a version graph must check for collisions against
    /// the existing map (see `Engine::commit`).
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::random();
        Self(hex::encode(bytes))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.len() != Self::LEN {
            return Err(TypeError::InvalidVersionId(format!(
                "expected {} hex characters, got {}",
                Self::LEN,
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidVersionId(
                "version id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VersionId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<VersionId> for String {
    fn from(id: VersionId) -> Self {
        id.0
    }
}

impl AsRef<str> for VersionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated branch name.
///
/// Branch names must be non-empty and must not contain the registry
/// store's `|` delimiter or ASCII control characters. Anything else
/// goes: the original design accepts free-form names like `main`,
/// `feature-1`, or `wip/refactor`.
///
/// # Example
///
/// ```
/// use strata::core::types::BranchName;
///
/// let name = BranchName::new("feature-1").unwrap();
/// assert_eq!(name.as_str(), "feature-1");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has|pipe").is_err());
/// assert!(BranchName::new("has\nnewline").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name is empty or
    /// contains `|` or control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// The default branch every repository starts with.
    pub fn main() -> Self {
        Self("main".to_string())
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }
        if name.contains('|') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain '|'".into(),
            ));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain control characters".into(),
            ));
        }
        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry key for one repository: `"{username}/{path}"`.
///
/// The logical path may be empty (the user's root directory), in which
/// case the key is `"{username}/"`. Neither component may contain `|`
/// or control characters - the registry store is pipe-delimited with
/// no escaping, so the delimiter is excluded at the type level rather
/// than escaped at the serialization level.
///
/// # Example
///
/// ```
/// use strata::core::types::RepoKey;
///
/// let key = RepoKey::new("alice", "proj").unwrap();
/// assert_eq!(key.as_str(), "alice/proj");
/// assert_eq!(key.username(), "alice");
/// assert_eq!(key.path(), "proj");
///
/// let root = RepoKey::new("alice", "").unwrap();
/// assert_eq!(root.as_str(), "alice/");
/// assert_eq!(root.path(), "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoKey(String);

impl RepoKey {
    /// Build a key from a username and logical path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepoKey` if the username is empty or
    /// contains `/`, or if either component contains `|` or control
    /// characters.
    pub fn new(username: &str, path: &str) -> Result<Self, TypeError> {
        if username.is_empty() {
            return Err(TypeError::InvalidRepoKey("username cannot be empty".into()));
        }
        if username.contains('/') {
            return Err(TypeError::InvalidRepoKey(
                "username cannot contain '/'".into(),
            ));
        }
        for component in [username, path] {
            if component.contains('|') {
                return Err(TypeError::InvalidRepoKey(
                    "key components cannot contain '|'".into(),
                ));
            }
            if component.chars().any(|c| c.is_ascii_control()) {
                return Err(TypeError::InvalidRepoKey(
                    "key components cannot contain control characters".into(),
                ));
            }
        }
        Ok(Self(format!("{}/{}", username, path)))
    }

    /// Parse a key that was previously written to the registry store.
    pub fn parse(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        let Some((username, path)) = key.split_once('/') else {
            return Err(TypeError::InvalidRepoKey(
                "key must contain a '/' separator".into(),
            ));
        };
        Self::new(username, path)
    }

    /// The username component.
    pub fn username(&self) -> &str {
        // Construction guarantees a separator
        self.0.split_once('/').map(|(u, _)| u).unwrap_or(&self.0)
    }

    /// The logical path component (may be empty).
    pub fn path(&self) -> &str {
        self.0.split_once('/').map(|(_, p)| p).unwrap_or("")
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoKey {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<RepoKey> for String {
    fn from(key: RepoKey) -> Self {
        key.0
    }
}

impl AsRef<str> for RepoKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock seconds since the Unix epoch.
///
/// Commit timestamps are second-granular on the wire, so the engine
/// keeps them as plain integers rather than full datetimes. Ties
/// between versions committed within the same second are expected and
/// broken elsewhere (see `Repository::history`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EpochSeconds(i64);

impl EpochSeconds {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    /// Build from a raw second count.
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// The raw second count.
    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EpochSeconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
