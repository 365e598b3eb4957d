// shardgraph-core/src/model/errors.rs
// ============================================================================
// Module: Model Errors
// Description: Error taxonomy for the symbolic object / graph construction
//              layer.
// Purpose: Give every construction-time failure a distinct, matchable kind.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Errors raised while building or substituting symbolic objects, argument
//! sets, and activation graphs.

use thiserror::Error;

use crate::model::Symbol;

/// Errors raised while constructing or substituting symbolic structures and
/// graph activations.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// A substitution pair named the same "from" [`Symbol`] more than once.
    #[error("symbol {0} appears more than once as a substitution source")]
    DuplicateSubstitutionSource(Symbol),
    /// An argument referenced a [`Symbol`] that is neither a graph input
    /// nor the output symbol of an activation already in the same graph.
    #[error("symbol {0} is not a known input or activation of this graph")]
    ForeignSymbol(Symbol),
    /// A wrapped argument payload could not be used as a hashable key.
    #[error("argument payload is not hashable: {0}")]
    NotHashable(String),
    /// The bound arguments did not match the plugin's signature.
    #[error("arguments do not match signature: {0}")]
    SignatureMismatch(String),
    /// `attach_graph` was called with a `realizations` slice whose length
    /// did not match the number of inputs of the attached graph.
    #[error("expected {expected} realizations for attached graph inputs, got {actual}")]
    RealizationCountMismatch {
        /// Number of inputs the attached graph declares.
        expected: usize,
        /// Number of realizations actually supplied.
        actual: usize,
    },
    /// `ActivationGraph::seal` was called on a graph with a nonzero input
    /// count.
    #[error("cannot seal a graph with {0} unfilled input(s)")]
    UnsealedInputs(usize),
}

/// Materialization was attempted while a [`Symbol`] remained unbound.
#[derive(Debug, Error)]
#[error("symbol {0} has no binding and cannot be materialized")]
pub struct UnboundSymbolError(pub Symbol);

/// Errors raised by trigger-slot mutation on graphs and activations.
#[derive(Debug, Error)]
pub enum TriggerSlotError {
    /// Attempted to set a trigger slot that already holds a trigger.
    #[error("trigger slot already holds a trigger; clear it before reassigning")]
    AlreadyPresent,
    /// Attempted to clear a trigger slot that holds no trigger.
    #[error("trigger slot is empty; nothing to clear")]
    Absent,
}
