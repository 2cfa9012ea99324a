//! engine
//!
//! The repository registry and every operation that reads or mutates
//! it.
//!
//! # Architecture
//!
//! [`Engine`] is the process-wide registry: an explicit, owned map from
//! [`RepoKey`] to [`Repository`], loaded from the [`store`] at
//! construction and written back after every mutation. There is no
//! hidden global; the server holds one `Engine` and threads it through
//! each request.
//!
//! # State machine
//!
//! A repository's observable state is the triple
//! `(current_branch, head_version, branches)`:
//!
//! - `commit` moves `head_version` and `branches[current_branch]` together
//! - `checkout` moves `head_version` only
//! - `create_branch` adds a `branches` key only
//! - `switch_branch` moves `current_branch` and `head_version` together
//!
//! All operations validate before the first mutation, so a typed
//! failure leaves the registry observably unchanged. The engine runs
//! on a single request thread; there is no internal locking (the store
//! file lock guards against other processes, not in-process races).
//!
//! A store failure is reported after the in-memory mutation has been
//! applied; the next successful mutation rewrites the whole file.
//!
//! [`store`]: crate::store

pub mod files;

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::core::fingerprint::fingerprint;
use crate::core::repository::Repository;
use crate::core::types::{BranchName, RepoKey, TypeError, VersionId};
use crate::core::version::Version;
use crate::store::{RegistryStore, StoreError};

use files::{FileEntry, FileSource, ListFilesError};

/// Errors from engine operations.
///
/// Each variant names the thing that was missing or already present;
/// none are retried internally and none are fatal to the process.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `init` on a key that is already registered.
    #[error("repository already exists: {0}")]
    RepositoryAlreadyExists(RepoKey),

    /// Any operation addressing an unregistered key.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepoKey),

    /// Checkout to an id absent from the version graph.
    #[error("version not found: {0}")]
    VersionNotFound(VersionId),

    /// `create_branch` with a name already in the branch table.
    #[error("branch already exists: {0}")]
    BranchAlreadyExists(BranchName),

    /// `switch_branch` to a name absent from the branch table.
    #[error("branch not found: {0}")]
    BranchNotFound(BranchName),

    /// A caller-supplied identifier failed validation.
    #[error(transparent)]
    Invalid(#[from] TypeError),

    /// The file-enumeration collaborator failed.
    #[error(transparent)]
    FileSource(#[from] ListFilesError),

    /// Persisting the registry failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The process-wide repository registry.
///
/// # Example
///
/// ```
/// use strata::engine::files::FileEntry;
/// use strata::engine::Engine;
/// use strata::store::RegistryStore;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = RegistryStore::new(dir.path().join("repositories.txt"));
/// let mut engine = Engine::open(store).unwrap();
///
/// engine.init("alice", "proj").unwrap();
/// let files = [FileEntry::file("a.txt", b"hi".to_vec())];
/// let id = engine.commit("alice", "proj", "alice", "add file", &files).unwrap();
///
/// let repo = engine.lookup("alice", "proj").unwrap();
/// assert_eq!(repo.head_version, id);
/// ```
pub struct Engine {
    repositories: HashMap<RepoKey, Repository>,
    store: RegistryStore,
}

impl Engine {
    /// Open the registry, loading whatever the store holds.
    ///
    /// Repositories come back unpopulated (scalar fields only); see
    /// the store module for the persistence gap.
    pub fn open(store: RegistryStore) -> Result<Self, StoreError> {
        let repositories = store.load()?;
        Ok(Self {
            repositories,
            store,
        })
    }

    /// Create a repository for `(username, path)`.
    ///
    /// Creates the root version and a `main` branch pointing at it,
    /// then persists the registry.
    ///
    /// # Errors
    ///
    /// - [`EngineError::RepositoryAlreadyExists`] if the key is registered
    /// - [`EngineError::Invalid`] if the key components are malformed
    pub fn init(&mut self, username: &str, path: &str) -> Result<(), EngineError> {
        let key = RepoKey::new(username, path)?;
        if self.repositories.contains_key(&key) {
            return Err(EngineError::RepositoryAlreadyExists(key));
        }

        let root = Version::root(VersionId::generate(), username);
        self.repositories
            .insert(key, Repository::create(path, root));
        self.persist()?;
        Ok(())
    }

    /// Read-only lookup.
    ///
    /// Absence is not an error at this layer; callers that need one
    /// treat `None` as "repository not found". A malformed key also
    /// yields `None` - nothing could be registered under it.
    pub fn lookup(&self, username: &str, path: &str) -> Option<&Repository> {
        let key = RepoKey::new(username, path).ok()?;
        self.repositories.get(&key)
    }

    /// Record a commit from the current file listing.
    ///
    /// Every non-directory entry is fingerprinted and listed in
    /// `changed_files` - the engine does not diff against the parent.
    /// The new version's parent is the pre-commit head; the active
    /// branch and the head advance to it together. Only fingerprints
    /// are recorded, never content.
    ///
    /// Returns the new version's id.
    ///
    /// # Errors
    ///
    /// [`EngineError::RepositoryNotFound`] if the key is unregistered.
    pub fn commit(
        &mut self,
        username: &str,
        path: &str,
        author: &str,
        message: &str,
        files: &[FileEntry],
    ) -> Result<VersionId, EngineError> {
        let key = RepoKey::new(username, path)?;
        let repo = self
            .repositories
            .get_mut(&key)
            .ok_or(EngineError::RepositoryNotFound(key))?;

        let mut file_hashes = BTreeMap::new();
        let mut changed_files = Vec::new();
        for entry in files {
            if entry.is_directory {
                continue;
            }
            file_hashes.insert(entry.name.clone(), fingerprint(&entry.content));
            changed_files.push(entry.name.clone());
        }

        // Collision check instead of trusting randomness
        let id = loop {
            let candidate = VersionId::generate();
            if !repo.versions.contains_key(&candidate) {
                break candidate;
            }
        };

        let version = Version::commit(
            id.clone(),
            author,
            message,
            repo.head_version.clone(),
            file_hashes,
            changed_files,
        );
        repo.versions.insert(id.clone(), version);
        repo.branches
            .insert(repo.current_branch.clone(), id.clone());
        repo.head_version = id.clone();

        self.persist()?;
        Ok(id)
    }

    /// Commit by pulling the listing through the collaborator seam.
    pub fn commit_from<S: FileSource>(
        &mut self,
        username: &str,
        path: &str,
        author: &str,
        message: &str,
        source: &S,
    ) -> Result<VersionId, EngineError> {
        let files = source.list_files(username, path)?;
        self.commit(username, path, author, message, &files)
    }

    /// Move the head to an existing version.
    ///
    /// Moves `head_version` only: the active branch and its recorded
    /// pointer are untouched, so head and branch tip can diverge until
    /// the next commit or branch switch. No file content is restored -
    /// history is pointer-only.
    ///
    /// # Errors
    ///
    /// - [`EngineError::RepositoryNotFound`] if the key is unregistered
    /// - [`EngineError::VersionNotFound`] if the id is absent
    /// - [`EngineError::Invalid`] if the id is malformed
    pub fn checkout(
        &mut self,
        username: &str,
        path: &str,
        version_id: &str,
    ) -> Result<(), EngineError> {
        let key = RepoKey::new(username, path)?;
        let id = VersionId::new(version_id)?;
        let repo = self
            .repositories
            .get_mut(&key)
            .ok_or(EngineError::RepositoryNotFound(key))?;

        if !repo.versions.contains_key(&id) {
            return Err(EngineError::VersionNotFound(id));
        }
        repo.head_version = id;

        self.persist()?;
        Ok(())
    }

    /// Create a branch pointing at the current head.
    ///
    /// The new pointer snapshots `head_version` - which, after a
    /// checkout, is not necessarily the tip of the active branch.
    ///
    /// # Errors
    ///
    /// - [`EngineError::RepositoryNotFound`] if the key is unregistered
    /// - [`EngineError::BranchAlreadyExists`] if the name is taken
    /// - [`EngineError::Invalid`] if the name is malformed
    pub fn create_branch(
        &mut self,
        username: &str,
        path: &str,
        name: &str,
    ) -> Result<(), EngineError> {
        let key = RepoKey::new(username, path)?;
        let name = BranchName::new(name)?;
        let repo = self
            .repositories
            .get_mut(&key)
            .ok_or(EngineError::RepositoryNotFound(key))?;

        if repo.branches.contains_key(&name) {
            return Err(EngineError::BranchAlreadyExists(name));
        }
        let head = repo.head_version.clone();
        repo.branches.insert(name, head);

        self.persist()?;
        Ok(())
    }

    /// Make a branch active and move the head to its pointer.
    ///
    /// # Errors
    ///
    /// - [`EngineError::RepositoryNotFound`] if the key is unregistered
    /// - [`EngineError::BranchNotFound`] if the name is absent
    /// - [`EngineError::Invalid`] if the name is malformed
    pub fn switch_branch(
        &mut self,
        username: &str,
        path: &str,
        name: &str,
    ) -> Result<(), EngineError> {
        let key = RepoKey::new(username, path)?;
        let name = BranchName::new(name)?;
        let repo = self
            .repositories
            .get_mut(&key)
            .ok_or(EngineError::RepositoryNotFound(key))?;

        let Some(target) = repo.branches.get(&name) else {
            return Err(EngineError::BranchNotFound(name));
        };
        repo.head_version = target.clone();
        repo.current_branch = name;

        self.persist()?;
        Ok(())
    }

    /// Every version of a repository, newest first.
    ///
    /// An empty list - not an error - when the repository is missing.
    /// Ordering is timestamp descending with ties broken by id; see
    /// `Repository::history`.
    pub fn history(&self, username: &str, path: &str) -> Vec<&Version> {
        match self.lookup(username, path) {
            Some(repo) => repo.history(),
            None => Vec::new(),
        }
    }

    /// Iterate over every registered repository.
    pub fn repositories(&self) -> impl Iterator<Item = (&RepoKey, &Repository)> {
        self.repositories.iter()
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.store.save(&self.repositories)
    }
}
