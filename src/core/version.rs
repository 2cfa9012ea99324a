//! core::version
//!
//! The immutable commit record.
//!
//! A [`Version`] snapshots the fingerprints of every file present under
//! a repository's logical path at commit time, plus free-text metadata.
//! Versions link to their parent by id, forming a rooted tree (each
//! version has at most one parent). Once inserted into a repository
//! they are never mutated or removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fingerprint::Digest;
use super::types::{EpochSeconds, VersionId};

/// Message recorded on every repository's root version.
pub const ROOT_MESSAGE: &str = "Initial commit";

/// An immutable commit record.
///
/// `changed_files` lists every non-directory file present at commit
/// time - it is not a diff against the parent. `file_hashes` maps those
/// same names to their content fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Opaque unique identifier, minted at creation.
    pub id: VersionId,
    /// Free-text commit message.
    pub message: String,
    /// Free-text author, supplied by the caller.
    pub author: String,
    /// Wall-clock seconds since epoch at creation.
    pub timestamp: EpochSeconds,
    /// Parent version id, or `None` for the repository's root.
    pub parent_id: Option<VersionId>,
    /// File name to content fingerprint at commit time.
    pub file_hashes: BTreeMap<String, Digest>,
    /// File names considered part of this commit.
    pub changed_files: Vec<String>,
}

impl Version {
    /// Build the root version created by `init`.
    ///
    /// Root versions have no parent, no file data, and the fixed
    /// message [`ROOT_MESSAGE`].
    pub fn root(id: VersionId, author: impl Into<String>) -> Self {
        Self {
            id,
            message: ROOT_MESSAGE.to_string(),
            author: author.into(),
            timestamp: EpochSeconds::now(),
            parent_id: None,
            file_hashes: BTreeMap::new(),
            changed_files: Vec::new(),
        }
    }

    /// Build a commit extending `parent`, stamped with the current time.
    pub fn commit(
        id: VersionId,
        author: impl Into<String>,
        message: impl Into<String>,
        parent: VersionId,
        file_hashes: BTreeMap<String, Digest>,
        changed_files: Vec<String>,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            author: author.into(),
            timestamp: EpochSeconds::now(),
            parent_id: Some(parent),
            file_hashes,
            changed_files,
        }
    }

    /// Whether this is a repository's root version.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fingerprint::fingerprint;

    fn id(s: &str) -> VersionId {
        VersionId::new(s).unwrap()
    }

    #[test]
    fn root_has_no_parent_and_no_files() {
        let root = Version::root(id("aaaaaaaaaaaaaaaa"), "alice");
        assert!(root.is_root());
        assert_eq!(root.message, ROOT_MESSAGE);
        assert!(root.file_hashes.is_empty());
        assert!(root.changed_files.is_empty());
    }

    #[test]
    fn commit_links_to_parent() {
        let mut hashes = BTreeMap::new();
        hashes.insert("a.txt".to_string(), fingerprint(b"hi"));

        let v = Version::commit(
            id("bbbbbbbbbbbbbbbb"),
            "alice",
            "add file",
            id("aaaaaaaaaaaaaaaa"),
            hashes,
            vec!["a.txt".to_string()],
        );

        assert!(!v.is_root());
        assert_eq!(v.parent_id, Some(id("aaaaaaaaaaaaaaaa")));
        assert_eq!(v.changed_files, vec!["a.txt".to_string()]);
    }

    #[test]
    fn wire_shape_matches_route_layer() {
        // The route layer serializes versions straight into its history
        // payload; these field names are load-bearing.
        let v = Version::commit(
            id("bbbbbbbbbbbbbbbb"),
            "alice",
            "add file",
            id("aaaaaaaaaaaaaaaa"),
            BTreeMap::new(),
            vec![],
        );
        let json = serde_json::to_value(&v).unwrap();
        for field in [
            "id",
            "message",
            "author",
            "timestamp",
            "parent_id",
            "file_hashes",
            "changed_files",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert!(json["timestamp"].is_i64());
        assert_eq!(json["id"], "bbbbbbbbbbbbbbbb");
    }
}
