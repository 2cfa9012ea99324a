//! core
//!
//! Core domain types for the versioning engine.
//!
//! # Modules
//!
//! - [`types`] - Strong types: VersionId, BranchName, RepoKey, EpochSeconds
//! - [`fingerprint`] - Deterministic content digests
//! - [`version`] - The immutable commit record
//! - [`repository`] - Version graph, branch table, and invariant checks
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Records are plain serde-serializable data
//! - All verification is deterministic

pub mod fingerprint;
pub mod repository;
pub mod types;
pub mod version;
