// shardgraph-core/src/interfaces.rs
// ============================================================================
// Module: Interfaces
// Description: The storage contract the evaluator depends on.
// Purpose: Let the evaluation core persist and reload spilled results
//          without depending on any concrete storage backend.
// Dependencies: crate::hashing::HashDigest, crate::model::Payload
// ============================================================================

//! ## Overview
//! `shardgraph-core` never talks to a filesystem, a database engine, or a
//! network service directly: it depends only on the [`Database`] trait.
//! `shardgraph-store` provides the concrete, file-backed implementation;
//! tests use a simple in-memory one. [`DatabaseHandle`] wraps any
//! `Database` in an open/close RAII scope so callers cannot forget to
//! release it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::ops::Deref;
use std::ops::DerefMut;

use thiserror::Error;

use crate::hashing::HashDigest;
use crate::model::Payload;

// ============================================================================
// SECTION: Database
// ============================================================================

/// A content-addressed store for spilled evaluation results.
///
/// Implementations are free to choose their own on-disk or in-memory
/// layout; the evaluator only ever addresses entries by [`HashDigest`].
pub trait Database: fmt::Debug {
    /// Opens (or creates) the underlying storage, making it ready for
    /// `save`/`load`/`delete` calls.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseAccessError`] if the backend
    /// cannot be opened.
    fn open(&mut self) -> Result<(), DatabaseError>;

    /// Releases any resources acquired by `open`. Implementations should
    /// tolerate being called on an already-closed store.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseAccessError`] if releasing
    /// resources fails.
    fn close(&mut self) -> Result<(), DatabaseError>;

    /// Persists `payload` under `key`, overwriting any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseAccessError`] if the write fails.
    fn save(&mut self, key: &HashDigest, payload: &Payload) -> Result<(), DatabaseError>;

    /// Loads the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DataNotFound`] if no entry exists for
    /// `key`, or [`DatabaseError::DatabaseAccessError`] if the read fails.
    fn load(&mut self, key: &HashDigest) -> Result<Payload, DatabaseError>;

    /// Removes the entry stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseAccessError`] if the removal
    /// fails.
    fn delete(&mut self, key: &HashDigest) -> Result<(), DatabaseError>;

    /// Returns whether an entry exists for `key`, without loading it.
    fn contains(&self, key: &HashDigest) -> bool;
}

/// Errors raised by a [`Database`] implementation.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No entry exists for the requested key.
    #[error("no stored entry for key {0}")]
    DataNotFound(HashDigest),
    /// The backend failed to complete the requested operation.
    #[error("database access failed: {0}")]
    DatabaseAccessError(String),
}

// ============================================================================
// SECTION: DatabaseHandle
// ============================================================================

/// An RAII scope around a [`Database`]: `open`s on construction, `close`s on
/// drop, regardless of how the scope is left.
#[derive(Debug)]
pub struct DatabaseHandle<'a, D: Database> {
    /// The database this handle has opened and will close.
    database: &'a mut D,
}

impl<'a, D: Database> DatabaseHandle<'a, D> {
    /// Opens `database` and returns a scope that will close it on drop.
    ///
    /// # Errors
    ///
    /// Propagates [`DatabaseError`] from `database.open()`.
    pub fn acquire(database: &'a mut D) -> Result<Self, DatabaseError> {
        database.open()?;
        Ok(Self { database })
    }
}

impl<D: Database> Deref for DatabaseHandle<'_, D> {
    type Target = D;

    fn deref(&self) -> &Self::Target {
        self.database
    }
}

impl<D: Database> DerefMut for DatabaseHandle<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.database
    }
}

impl<D: Database> Drop for DatabaseHandle<'_, D> {
    fn drop(&mut self) {
        let _ = self.database.close();
    }
}
