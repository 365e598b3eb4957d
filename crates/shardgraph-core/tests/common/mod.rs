// shardgraph-core/tests/common/mod.rs
//! Shared test doubles and helpers for the integration test scenarios.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only helpers favor clarity over production error handling."
)]

use std::collections::HashMap;

use shardgraph_core::Database;
use shardgraph_core::hashing::HashDigest;
use shardgraph_core::model::Payload;
use shardgraph_core::DatabaseError;

/// An in-memory `Database` double, standing in for a real store across these
/// scenario tests.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    entries: HashMap<HashDigest, Payload>,
}

impl MemoryDatabase {
    /// Returns the number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Database for MemoryDatabase {
    fn open(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn save(&mut self, key: &HashDigest, payload: &Payload) -> Result<(), DatabaseError> {
        self.entries.insert(key.clone(), payload.clone());
        Ok(())
    }

    fn load(&mut self, key: &HashDigest) -> Result<Payload, DatabaseError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| DatabaseError::DataNotFound(key.clone()))
    }

    fn delete(&mut self, key: &HashDigest) -> Result<(), DatabaseError> {
        self.entries.remove(key);
        Ok(())
    }

    fn contains(&self, key: &HashDigest) -> bool {
        self.entries.contains_key(key)
    }
}
