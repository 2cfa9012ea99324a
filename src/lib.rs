//! Strata - a per-user, per-path file versioning engine
//!
//! Strata is the versioning core of a browser-accessible file workbench:
//! a simplified commit/branch model that snapshots file-content
//! fingerprints over time. Each (user, logical path) pair owns one
//! repository with an append-only version graph and a table of named
//! branch pointers.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`core`] - Domain types: identifiers, fingerprints, versions, repositories
//! - [`engine`] - The repository registry and all mutating/query operations
//! - [`store`] - Flat-file persistence for the registry
//!
//! The HTTP layer, session handling, and raw filesystem access live in
//! the surrounding server, not here. The engine consumes file listings
//! through the [`engine::files::FileSource`] seam and exposes typed
//! results; wire encoding belongs to the caller.
//!
//! # Correctness Invariants
//!
//! 1. Versions are append-only: once recorded, never mutated or removed
//! 2. After every commit or branch switch, the head equals the active
//!    branch's pointer
//! 3. A failed operation leaves the registry observably unchanged
//! 4. Commits record content fingerprints only - history is a pointer
//!    graph, not a blob store

pub mod core;
pub mod engine;
pub mod store;
