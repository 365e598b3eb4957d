// shardgraph-core/src/eval/data_node.rs
// ============================================================================
// Module: Data Node
// Description: The four-state lifecycle of one activation's result.
// Purpose: Track whether an activation's data is known to be absent, sits
//          in memory, has been spilled to disk, or has not been looked at
//          yet, and fire the one callback registered for each legal
//          transition.
// Dependencies: crate::model::{Payload, TriggerSlot}
// ============================================================================

//! ## Overview
//! Every activation owns exactly one [`DataNode`]. It starts `Unknown`; a
//! failed or successful [`DataNode::try_load`] moves it to `NoData` or
//! `Memory`; `NoData` becomes `Memory` via [`DataNode::evaluate`]; `Memory`
//! becomes `Disk` via [`DataNode::store`] (dropping the in-memory payload);
//! `Disk` becomes `Memory` again via [`DataNode::load`]. These five edges
//! are the only legal transitions — every other combination is a
//! programming error in the caller, reported as [`DataNodeError`].
//!
//! Each transition may have at most one callback of type `Trig` registered
//! for it ahead of time; firing the transition hands that callback back to
//! the caller (if one was registered) so the wider evaluation state can act
//! on it — `DataNode` itself has no notion of what a callback does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::model::Payload;
use crate::model::TriggerSlot;

// ============================================================================
// SECTION: DataNodeState
// ============================================================================

/// The lifecycle state of one activation's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataNodeState {
    /// Neither evaluated nor looked up in storage yet.
    Unknown,
    /// Looked up in storage and confirmed absent.
    NoData,
    /// The result is held in memory.
    Memory,
    /// The result has been spilled to storage and is not in memory.
    Disk,
}

/// Errors raised by an illegal [`DataNode`] transition attempt.
#[derive(Debug, Error)]
pub enum DataNodeError {
    /// The attempted transition is not legal from the node's current state.
    #[error("cannot {attempted} a data node in state {from:?}")]
    IllegalTransition {
        /// The state the node was actually in.
        from: DataNodeState,
        /// The name of the transition that was attempted.
        attempted: &'static str,
    },
}

// ============================================================================
// SECTION: DataNode
// ============================================================================

/// One activation's result, through its four-state lifecycle.
#[derive(Debug)]
pub struct DataNode<Trig> {
    /// Current lifecycle state.
    state: DataNodeState,
    /// The in-memory payload, present only while `state` is `Memory`.
    payload: Option<Payload>,
    /// Fires when `try_load` finds existing data.
    on_load_hit: TriggerSlot<Trig>,
    /// Fires when `try_load` finds no existing data.
    on_load_miss: TriggerSlot<Trig>,
    /// Fires when `evaluate` produces a fresh result.
    on_evaluate: TriggerSlot<Trig>,
    /// Fires when `store` spills the result to disk.
    on_store: TriggerSlot<Trig>,
    /// Fires when `load` reloads a spilled result into memory.
    on_reload: TriggerSlot<Trig>,
}

impl<Trig> DataNode<Trig> {
    /// Builds a fresh node in the `Unknown` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DataNodeState::Unknown,
            payload: None,
            on_load_hit: TriggerSlot::empty(),
            on_load_miss: TriggerSlot::empty(),
            on_evaluate: TriggerSlot::empty(),
            on_store: TriggerSlot::empty(),
            on_reload: TriggerSlot::empty(),
        }
    }

    /// Returns the node's current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> DataNodeState {
        self.state
    }

    /// Returns the in-memory payload, if `state` is `Memory`.
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Returns the `on_load_hit` trigger slot.
    #[must_use]
    pub fn on_load_hit_mut(&mut self) -> &mut TriggerSlot<Trig> {
        &mut self.on_load_hit
    }

    /// Returns the `on_load_miss` trigger slot.
    #[must_use]
    pub fn on_load_miss_mut(&mut self) -> &mut TriggerSlot<Trig> {
        &mut self.on_load_miss
    }

    /// Returns the `on_evaluate` trigger slot.
    #[must_use]
    pub fn on_evaluate_mut(&mut self) -> &mut TriggerSlot<Trig> {
        &mut self.on_evaluate
    }

    /// Returns the `on_store` trigger slot.
    #[must_use]
    pub fn on_store_mut(&mut self) -> &mut TriggerSlot<Trig> {
        &mut self.on_store
    }

    /// Returns the `on_reload` trigger slot.
    #[must_use]
    pub fn on_reload_mut(&mut self) -> &mut TriggerSlot<Trig> {
        &mut self.on_reload
    }

    /// Records the outcome of a storage lookup performed while `state` is
    /// `Unknown`.
    ///
    /// # Errors
    ///
    /// Returns [`DataNodeError::IllegalTransition`] if `state` is not
    /// `Unknown`.
    pub fn try_load(&mut self, found: Option<Payload>) -> Result<Option<Trig>, DataNodeError> {
        if self.state != DataNodeState::Unknown {
            return Err(DataNodeError::IllegalTransition {
                from: self.state,
                attempted: "try_load",
            });
        }
        match found {
            Some(payload) => {
                self.payload = Some(payload);
                self.state = DataNodeState::Memory;
                Ok(self.on_load_hit.clear().ok())
            }
            None => {
                self.state = DataNodeState::NoData;
                Ok(self.on_load_miss.clear().ok())
            }
        }
    }

    /// Records a freshly computed result for a node in the `NoData` state.
    ///
    /// # Errors
    ///
    /// Returns [`DataNodeError::IllegalTransition`] if `state` is not
    /// `NoData`.
    pub fn evaluate(&mut self, payload: Payload) -> Result<Option<Trig>, DataNodeError> {
        if self.state != DataNodeState::NoData {
            return Err(DataNodeError::IllegalTransition {
                from: self.state,
                attempted: "evaluate",
            });
        }
        self.payload = Some(payload);
        self.state = DataNodeState::Memory;
        Ok(self.on_evaluate.clear().ok())
    }

    /// Spills the in-memory result to disk, dropping the in-memory copy.
    ///
    /// # Errors
    ///
    /// Returns [`DataNodeError::IllegalTransition`] if `state` is not
    /// `Memory`.
    pub fn store(&mut self) -> Result<Option<Trig>, DataNodeError> {
        if self.state != DataNodeState::Memory {
            return Err(DataNodeError::IllegalTransition {
                from: self.state,
                attempted: "store",
            });
        }
        self.payload = None;
        self.state = DataNodeState::Disk;
        Ok(self.on_store.clear().ok())
    }

    /// Reloads a spilled result back into memory.
    ///
    /// # Errors
    ///
    /// Returns [`DataNodeError::IllegalTransition`] if `state` is not
    /// `Disk`.
    pub fn load(&mut self, payload: Payload) -> Result<Option<Trig>, DataNodeError> {
        if self.state != DataNodeState::Disk {
            return Err(DataNodeError::IllegalTransition {
                from: self.state,
                attempted: "load",
            });
        }
        self.payload = Some(payload);
        self.state = DataNodeState::Memory;
        Ok(self.on_reload.clear().ok())
    }
}

impl<Trig> Default for DataNode<Trig> {
    fn default() -> Self {
        Self::new()
    }
}
