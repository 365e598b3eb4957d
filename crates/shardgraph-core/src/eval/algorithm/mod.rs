// shardgraph-core/src/eval/algorithm/mod.rs
// ============================================================================
// Module: Evaluation Algorithms
// Description: Pluggable strategies for driving an activation's dependency
//              closure to a computed, in-memory result.
// Purpose: Separate "what order do we visit nodes in, and do we spill under
//          memory pressure" from the rest of the evaluation state machine.
// Dependencies: crate::eval::state::EvaluationState
// ============================================================================

//! ## Overview
//! An [`EvaluationAlgorithm`] walks an activation's dependency closure and
//! ensures every node along the way reaches the `Memory` state, in whatever
//! order and with whatever disk-spilling policy it implements.
//! [`complex::ComplexAlgorithm`] is the default: it spills least-recently-touched
//! results to disk once the process crosses a configured soft memory
//! budget. [`topological::TopologicalAlgorithm`] is a simpler, no-spill
//! alternative useful for small graphs or tests.

pub mod complex;
pub mod topological;

use crate::eval::state::EvaluationState;
use crate::eval::state::EvaluatorError;
use crate::interfaces::Database;
use crate::model::ActivationId;

/// A strategy for bringing one activation's dependency closure to a
/// computed, in-memory result.
pub trait EvaluationAlgorithm<D: Database> {
    /// Ensures `id`'s result (and every dependency it transitively needs)
    /// is computed and currently held in memory.
    ///
    /// # Errors
    ///
    /// Propagates any [`EvaluatorError`] raised while loading, evaluating,
    /// storing, or reloading a node.
    fn ensure_evaluated(
        &mut self,
        state: &mut EvaluationState<D>,
        id: ActivationId,
    ) -> Result<(), EvaluatorError>;
}
