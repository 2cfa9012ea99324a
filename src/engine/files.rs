//! engine::files
//!
//! The file-enumeration seam.
//!
//! The engine never reads the filesystem itself. At commit time the
//! surrounding server hands it the current listing under a logical
//! path, either directly as a slice of [`FileEntry`] values or through
//! the [`FileSource`] trait. This is the **single doorway** between
//! the engine and the storage collaborator: no other module sees file
//! content.

use thiserror::Error;

/// Failure to enumerate the files under a logical path.
///
/// Produced by [`FileSource`] implementations; the engine propagates
/// it unchanged without retrying.
#[derive(Debug, Error)]
#[error("file listing failed for {username}/{path}: {reason}")]
pub struct ListFilesError {
    /// The user whose files were requested.
    pub username: String,
    /// The logical path that was listed.
    pub path: String,
    /// Collaborator-supplied failure description.
    pub reason: String,
}

impl ListFilesError {
    /// Build a listing error.
    pub fn new(
        username: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// One entry in a logical-path listing at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File or directory name.
    pub name: String,
    /// Byte content; empty for directories.
    pub content: Vec<u8>,
    /// Directories are skipped by commit.
    pub is_directory: bool,
}

impl FileEntry {
    /// A regular file with content.
    pub fn file(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            is_directory: false,
        }
    }

    /// A directory entry (carried in listings, ignored by commit).
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Vec::new(),
            is_directory: true,
        }
    }
}

/// The storage collaborator that enumerates current files.
///
/// Implemented outside the engine by whatever owns user filesystems.
/// Only consulted at commit time.
pub trait FileSource {
    /// List everything currently stored under `path` for `username`,
    /// directories included.
    fn list_files(&self, username: &str, path: &str) -> Result<Vec<FileEntry>, ListFilesError>;
}
