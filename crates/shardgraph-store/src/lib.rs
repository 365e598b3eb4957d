// shardgraph-store/src/lib.rs
// ============================================================================
// Module: Shardgraph Store Library
// Description: Public API surface for the file-backed Database implementation.
// Purpose: Give shardgraph-core a concrete, durable Database without the
//          core crate ever depending on a filesystem.
// Dependencies: shardgraph-core, cap-std
// ============================================================================

//! ## Overview
//! [`file_database::FileDatabase`] is the only type this crate exports: a
//! directory-rooted, content-addressed store for spilled evaluation
//! results, built on `cap-std`'s capability-based filesystem APIs so a
//! configured root directory cannot be escaped by a crafted digest.

pub mod file_database;

pub use file_database::FileDatabase;
