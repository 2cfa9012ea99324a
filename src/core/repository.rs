//! core::repository
//!
//! The per-(user, path) versioned state: an append-only version graph
//! plus a table of named branch pointers.
//!
//! # Invariants
//!
//! - `head_version == branches[current_branch]` after every mutating
//!   operation except a checkout to a non-tip version
//! - `branches[current_branch]` is a key of `versions` whenever the
//!   graph is populated
//! - Versions are append-only: inserted once, never mutated or removed
//!
//! A repository reloaded from the registry store is *not* populated:
//! only its scalar fields survive, so `versions` and `branches` are
//! empty and `head_version` dangles (see `store`).
//! [`Repository::verify`] is therefore scoped to populated
//! repositories.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{BranchName, VersionId};
use super::version::Version;

/// Errors from repository invariant verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("head {head} does not match active branch {branch} at {tip}")]
    HeadBranchMismatch {
        head: VersionId,
        branch: BranchName,
        tip: VersionId,
    },

    #[error("active branch does not exist: {0}")]
    CurrentBranchMissing(BranchName),

    #[error("branch {branch} points at unknown version {target}")]
    DanglingBranch {
        branch: BranchName,
        target: VersionId,
    },

    #[error("version {id} has unknown parent {parent}")]
    DanglingParent { id: VersionId, parent: VersionId },
}

/// The versioned state for one (user, logical path) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Display name (the logical path, or `"root"` for the empty path).
    pub name: String,
    /// The logical path this repository tracks.
    pub path: String,
    /// Name of the active branch.
    pub current_branch: BranchName,
    /// The version graph: id to immutable record.
    pub versions: BTreeMap<VersionId, Version>,
    /// Branch name to the version id it currently references.
    pub branches: BTreeMap<BranchName, VersionId>,
    /// The version the working state is checked out to.
    pub head_version: VersionId,
}

impl Repository {
    /// Create a repository around its root version, with a `main`
    /// branch pointing at it.
    pub fn create(path: impl Into<String>, root: Version) -> Self {
        let path = path.into();
        let name = if path.is_empty() {
            "root".to_string()
        } else {
            path.clone()
        };
        let head = root.id.clone();
        let mut versions = BTreeMap::new();
        versions.insert(root.id.clone(), root);
        let mut branches = BTreeMap::new();
        branches.insert(BranchName::main(), head.clone());
        Self {
            name,
            path,
            current_branch: BranchName::main(),
            versions,
            branches,
            head_version: head,
        }
    }

    /// Rebuild a repository from a persisted record.
    ///
    /// Only the scalar fields are stored on disk, so the version graph
    /// and branch table come back empty and `head_version` references
    /// an id that is no longer present. Documented persistence gap.
    pub fn from_record(
        name: impl Into<String>,
        path: impl Into<String>,
        current_branch: BranchName,
        head_version: VersionId,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            current_branch,
            versions: BTreeMap::new(),
            branches: BTreeMap::new(),
            head_version,
        }
    }

    /// The id the active branch currently points at, if the branch
    /// table has it.
    pub fn current_tip(&self) -> Option<&VersionId> {
        self.branches.get(&self.current_branch)
    }

    /// Every version, ordered newest first.
    ///
    /// Timestamps are second-granular, so ties are common; they are
    /// broken by version id descending to keep the order deterministic.
    /// Callers should rely only on "timestamp descending". The listing
    /// comes from the whole graph, not a parent walk, so versions left
    /// behind by a checkout-then-commit still appear.
    pub fn history(&self) -> Vec<&Version> {
        let mut all: Vec<&Version> = self.versions.values().collect();
        all.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        all
    }

    /// Check the structural invariants of a populated repository.
    ///
    /// Returns every violation found. An empty (reloaded) repository
    /// passes vacuously. Never mutates; deterministic.
    pub fn verify(&self) -> Result<(), Vec<VerifyError>> {
        if self.versions.is_empty() {
            return Ok(());
        }

        let mut errors = Vec::new();

        for (branch, target) in &self.branches {
            if !self.versions.contains_key(target) {
                errors.push(VerifyError::DanglingBranch {
                    branch: branch.clone(),
                    target: target.clone(),
                });
            }
        }

        match self.branches.get(&self.current_branch) {
            None => errors.push(VerifyError::CurrentBranchMissing(
                self.current_branch.clone(),
            )),
            Some(tip) if *tip != self.head_version => {
                // Legal only transiently, after a checkout away from the tip
                errors.push(VerifyError::HeadBranchMismatch {
                    head: self.head_version.clone(),
                    branch: self.current_branch.clone(),
                    tip: tip.clone(),
                });
            }
            Some(_) => {}
        }

        for version in self.versions.values() {
            if let Some(parent) = &version.parent_id {
                if !self.versions.contains_key(parent) {
                    errors.push(VerifyError::DanglingParent {
                        id: version.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::VersionId;

    fn id(s: &str) -> VersionId {
        VersionId::new(s).unwrap()
    }

    fn repo_with_root() -> Repository {
        Repository::create("proj", Version::root(id("aaaaaaaaaaaaaaaa"), "alice"))
    }

    #[test]
    fn create_wires_main_branch_and_head() {
        let repo = repo_with_root();
        assert_eq!(repo.name, "proj");
        assert_eq!(repo.current_branch, BranchName::main());
        assert_eq!(repo.head_version, id("aaaaaaaaaaaaaaaa"));
        assert_eq!(repo.current_tip(), Some(&id("aaaaaaaaaaaaaaaa")));
        assert!(repo.verify().is_ok());
    }

    #[test]
    fn empty_path_displays_as_root() {
        let repo = Repository::create("", Version::root(id("aaaaaaaaaaaaaaaa"), "alice"));
        assert_eq!(repo.name, "root");
        assert_eq!(repo.path, "");
    }

    #[test]
    fn from_record_is_unpopulated() {
        let repo = Repository::from_record(
            "proj",
            "proj",
            BranchName::main(),
            id("aaaaaaaaaaaaaaaa"),
        );
        assert!(repo.versions.is_empty());
        assert!(repo.branches.is_empty());
        // Vacuously valid: verify is scoped to populated repositories
        assert!(repo.verify().is_ok());
    }

    #[test]
    fn history_orders_by_timestamp_then_id_descending() {
        let mut repo = repo_with_root();

        // Two versions within the same second: id breaks the tie
        let root_ts = repo.versions[&id("aaaaaaaaaaaaaaaa")].timestamp;
        for vid in ["cccccccccccccccc", "bbbbbbbbbbbbbbbb"] {
            let mut v = Version::root(id(vid), "alice");
            v.timestamp = root_ts;
            v.parent_id = Some(id("aaaaaaaaaaaaaaaa"));
            repo.versions.insert(v.id.clone(), v);
        }

        let ordered: Vec<&str> = repo.history().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(
            ordered,
            vec!["cccccccccccccccc", "bbbbbbbbbbbbbbbb", "aaaaaaaaaaaaaaaa"]
        );
    }

    #[test]
    fn verify_reports_dangling_branch() {
        let mut repo = repo_with_root();
        repo.branches.insert(
            BranchName::new("feature").unwrap(),
            id("ffffffffffffffff"),
        );

        let errors = repo.verify().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::DanglingBranch { .. })));
    }

    #[test]
    fn verify_reports_head_branch_divergence() {
        let mut repo = repo_with_root();
        let mut v = Version::root(id("bbbbbbbbbbbbbbbb"), "alice");
        v.parent_id = Some(id("aaaaaaaaaaaaaaaa"));
        repo.versions.insert(v.id.clone(), v);

        // Checkout moved the head without touching the branch table
        repo.head_version = id("bbbbbbbbbbbbbbbb");

        let errors = repo.verify().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::HeadBranchMismatch { .. })));
    }

    #[test]
    fn verify_reports_dangling_parent() {
        let mut repo = repo_with_root();
        let mut v = Version::root(id("bbbbbbbbbbbbbbbb"), "alice");
        v.parent_id = Some(id("ffffffffffffffff"));
        repo.versions.insert(v.id.clone(), v);
        repo.branches
            .insert(BranchName::main(), id("bbbbbbbbbbbbbbbb"));
        repo.head_version = id("bbbbbbbbbbbbbbbb");

        let errors = repo.verify().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::DanglingParent { .. })));
    }
}
