// shardgraph-core/src/tempspill.rs
// ============================================================================
// Module: Temp Spill
// Description: Per-DataNode scratch persistence backed by a temp file.
// Purpose: Give the complex evaluation algorithm somewhere cheap and
//          automatically-cleaned-up to put a result's serialized bytes
//          while deciding whether it is worth promoting to the real
//          Database, without growing the evaluator's own memory footprint.
// Dependencies: tempfile, serde_json, crate::model::Payload
// ============================================================================

//! ## Overview
//! A [`TempSpill`] wraps one [`tempfile::NamedTempFile`]: the evaluator
//! writes a [`crate::model::Payload`] to it exactly once, on first
//! [`TempSpill::store`], and the file is removed as soon as the `TempSpill`
//! (and therefore the underlying `NamedTempFile`) is dropped. This is
//! distinct from `shardgraph-store`'s [`crate::interfaces::Database`]: a
//! temp spill is scratch space for one evaluation run, not a durable,
//! content-addressed store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::model::Payload;

// ============================================================================
// SECTION: TempSpill
// ============================================================================

/// Scratch, single-write, single-reload persistence for one evaluation
/// result.
#[derive(Debug)]
pub struct TempSpill {
    /// Backing temp file; `None` until the first [`Self::store`].
    file: Option<NamedTempFile>,
}

impl TempSpill {
    /// Builds an empty spill slot with no backing file yet.
    #[must_use]
    pub const fn empty() -> Self {
        Self { file: None }
    }

    /// Whether a value has been written to this slot.
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        self.file.is_some()
    }

    /// Serializes `payload` to a fresh temp file, replacing any previous
    /// contents.
    ///
    /// # Errors
    ///
    /// Returns [`TempSpillError`] if a temp file cannot be created or
    /// written.
    pub fn store(&mut self, payload: &Payload) -> Result<(), TempSpillError> {
        let mut file = NamedTempFile::new().map_err(TempSpillError::Io)?;
        let bytes = serde_json::to_vec(payload).map_err(TempSpillError::Serialize)?;
        file.write_all(&bytes).map_err(TempSpillError::Io)?;
        file.flush().map_err(TempSpillError::Io)?;
        self.file = Some(file);
        Ok(())
    }

    /// Reads back the previously stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`TempSpillError::NotStored`] if [`Self::store`] was never
    /// called, or [`TempSpillError`] if the file cannot be read.
    pub fn load(&mut self) -> Result<Payload, TempSpillError> {
        let file = self.file.as_mut().ok_or(TempSpillError::NotStored)?;
        file.as_file_mut()
            .seek(SeekFrom::Start(0))
            .map_err(TempSpillError::Io)?;
        let mut bytes = Vec::new();
        file.as_file_mut()
            .read_to_end(&mut bytes)
            .map_err(TempSpillError::Io)?;
        serde_json::from_slice(&bytes).map_err(TempSpillError::Deserialize)
    }

    /// Discards the backing file, if any.
    pub fn clear(&mut self) {
        self.file = None;
    }
}

impl Default for TempSpill {
    fn default() -> Self {
        Self::empty()
    }
}

/// Errors raised while writing to or reading from a [`TempSpill`].
#[derive(Debug, Error)]
pub enum TempSpillError {
    /// No value has been stored yet.
    #[error("no value has been spilled to this slot yet")]
    NotStored,
    /// The backing temp file could not be created, written, or read.
    #[error("temp spill i/o failed: {0}")]
    Io(std::io::Error),
    /// The payload could not be serialized for spilling.
    #[error("failed to serialize payload for spilling: {0}")]
    Serialize(serde_json::Error),
    /// The spilled bytes could not be deserialized back into a payload.
    #[error("failed to deserialize spilled payload: {0}")]
    Deserialize(serde_json::Error),
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only assertions favor clarity over production error handling."
    )]

    use super::*;

    #[test]
    fn store_then_load_round_trips() {
        let mut spill = TempSpill::empty();
        spill.store(&Payload::Int(9)).expect("store");
        assert_eq!(spill.load().expect("load"), Payload::Int(9));
    }

    #[test]
    fn load_before_store_errors() {
        let mut spill = TempSpill::empty();
        assert!(matches!(spill.load(), Err(TempSpillError::NotStored)));
    }

    #[test]
    fn clear_forgets_stored_value() {
        let mut spill = TempSpill::empty();
        spill.store(&Payload::Bool(true)).expect("store");
        spill.clear();
        assert!(!spill.is_stored());
    }
}
