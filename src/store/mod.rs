//! store
//!
//! Flat-file persistence for the repository registry.
//!
//! # Format
//!
//! One pipe-delimited record per repository, one repository per line:
//!
//! ```text
//! repo_key|name|path|current_branch|head_version
//! ```
//!
//! There is no escaping; the `|` delimiter is instead excluded from
//! every stored component at the type layer (`RepoKey` and
//! `BranchName` refuse it, and `name`/`path` derive from the key).
//!
//! # Persistence gap
//!
//! Only the five scalar fields are stored. The version graph and the
//! branch table are **not** serialized, so after a reload every
//! repository has empty `versions` and `branches` maps and a
//! `head_version` that references an id no longer present. This is a
//! known limitation, pinned by `tests/persistence_integration.rs`;
//! extending the format is a deliberate future decision, not something
//! to patch silently.
//!
//! # Durability
//!
//! Saves take an exclusive OS-level file lock (via `fs2`), rewrite the
//! whole file, and fsync before returning. The lock guards against a
//! second process; in-process callers are single-threaded.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::repository::Repository;
use crate::core::types::{BranchName, RepoKey, TypeError, VersionId};

/// Field delimiter of the record format.
pub const FIELD_DELIMITER: char = '|';

/// Number of fields per record.
const FIELD_COUNT: usize = 5;

/// Errors from registry persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure reading or writing the store file.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A line that does not parse as a record.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A stored identifier failed validation on reload.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// The registry's on-disk home.
///
/// # Example
///
/// ```
/// use strata::store::RegistryStore;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = RegistryStore::new(dir.path().join("repositories.txt"));
///
/// // A missing file is an empty registry, not an error
/// assert!(store.load().unwrap().is_empty());
/// ```
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Create a store handle for the given file path.
    ///
    /// Nothing is touched on disk until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every repository record.
    ///
    /// A missing file yields an empty registry. Blank lines are
    /// skipped; a line with the wrong field count is a
    /// [`StoreError::MalformedRecord`].
    pub fn load(&self) -> Result<HashMap<RepoKey, Repository>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let mut file = OpenOptions::new().read(true).open(&self.path)?;
        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content);
        FileExt::unlock(&file)?;
        read?;

        let mut repositories = HashMap::new();
        for (index, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
            if fields.len() != FIELD_COUNT {
                return Err(StoreError::MalformedRecord {
                    line: index + 1,
                    reason: format!("expected {} fields, got {}", FIELD_COUNT, fields.len()),
                });
            }

            let key = RepoKey::parse(fields[0])?;
            let current_branch = BranchName::new(fields[3])?;
            let head_version = VersionId::new(fields[4])?;
            repositories.insert(
                key,
                Repository::from_record(fields[1], fields[2], current_branch, head_version),
            );
        }

        Ok(repositories)
    }

    /// Write every repository record, replacing the file's contents.
    ///
    /// Records are sorted by key so the file is byte-stable for a
    /// given registry state. Holds an exclusive lock for the duration
    /// and fsyncs before returning.
    pub fn save(&self, repositories: &HashMap<RepoKey, Repository>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut records: Vec<(&RepoKey, &Repository)> = repositories.iter().collect();
        records.sort_by(|a, b| a.0.cmp(b.0));

        let mut content = String::new();
        for (key, repo) in records {
            content.push_str(key.as_str());
            content.push(FIELD_DELIMITER);
            content.push_str(&repo.name);
            content.push(FIELD_DELIMITER);
            content.push_str(&repo.path);
            content.push(FIELD_DELIMITER);
            content.push_str(repo.current_branch.as_str());
            content.push(FIELD_DELIMITER);
            content.push_str(repo.head_version.as_str());
            content.push('\n');
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        let result = (|| -> Result<(), std::io::Error> {
            file.set_len(0)?;
            let mut file = &file;
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })();
        FileExt::unlock(&file)?;
        result?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::Version;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RegistryStore {
        RegistryStore::new(dir.path().join("repositories.txt"))
    }

    fn sample_registry() -> HashMap<RepoKey, Repository> {
        let mut repositories = HashMap::new();
        let root = Version::root(VersionId::new("aaaaaaaaaaaaaaaa").unwrap(), "alice");
        repositories.insert(
            RepoKey::new("alice", "proj").unwrap(),
            Repository::create("proj", root),
        );
        repositories
    }

    #[test]
    fn missing_file_is_empty_registry() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn record_layout_is_pipe_delimited() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&sample_registry()).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            content,
            "alice/proj|proj|proj|main|aaaaaaaaaaaaaaaa\n"
        );
    }

    #[test]
    fn save_is_deterministic_across_key_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut repositories = sample_registry();
        let root = Version::root(VersionId::new("bbbbbbbbbbbbbbbb").unwrap(), "bob");
        repositories.insert(
            RepoKey::new("bob", "notes").unwrap(),
            Repository::create("notes", root),
        );

        store.save(&repositories).unwrap();
        let first = fs::read_to_string(store.path()).unwrap();
        store.save(&repositories).unwrap();
        let second = fs::read_to_string(store.path()).unwrap();

        assert_eq!(first, second);
        // Sorted by key
        let lines: Vec<&str> = first.lines().collect();
        assert!(lines[0].starts_with("alice/"));
        assert!(lines[1].starts_with("bob/"));
    }

    #[test]
    fn reload_restores_scalars_only() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&sample_registry()).unwrap();

        let reloaded = store.load().unwrap();
        let key = RepoKey::new("alice", "proj").unwrap();
        let repo = &reloaded[&key];

        assert_eq!(repo.name, "proj");
        assert_eq!(repo.path, "proj");
        assert_eq!(repo.current_branch, BranchName::main());
        assert_eq!(
            repo.head_version,
            VersionId::new("aaaaaaaaaaaaaaaa").unwrap()
        );
        // The gap: graph and branch table are not serialized
        assert!(repo.versions.is_empty());
        assert!(repo.branches.is_empty());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "alice/proj|proj|proj|main|aaaaaaaaaaaaaaaa\n\n",
        )
        .unwrap();

        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "alice/proj|proj|main\n").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(
            err,
            StoreError::MalformedRecord { line: 1, .. }
        ));
    }

    #[test]
    fn corrupt_head_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "alice/proj|proj|proj|main|not-hex\n").unwrap();

        assert!(matches!(store.load().unwrap_err(), StoreError::Type(_)));
    }

    #[test]
    fn empty_path_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut repositories = HashMap::new();
        let root = Version::root(VersionId::new("cccccccccccccccc").unwrap(), "alice");
        repositories.insert(
            RepoKey::new("alice", "").unwrap(),
            Repository::create("", root),
        );
        store.save(&repositories).unwrap();

        let reloaded = store.load().unwrap();
        let repo = &reloaded[&RepoKey::new("alice", "").unwrap()];
        assert_eq!(repo.name, "root");
        assert_eq!(repo.path, "");
    }
}
