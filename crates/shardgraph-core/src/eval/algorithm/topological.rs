// shardgraph-core/src/eval/algorithm/topological.rs
// ============================================================================
// Module: Topological Algorithm
// Description: No-spill evaluation strategy: visit dependencies before
//              dependents and never move a result to disk on purpose.
// Purpose: A simple, easy-to-reason-about alternative to the memory-aware
//          complex algorithm, useful for small graphs, deterministic tests,
//          and any run where the caller already knows the whole graph fits
//          comfortably in memory.
// Dependencies: crate::eval::state::EvaluationState
// ============================================================================

//! ## Overview
//! [`TopologicalAlgorithm`] ensures an activation's result is available by
//! recursively ensuring every dependency is available first, then loading
//! or evaluating the activation itself. It never calls
//! [`EvaluationState::store`], so a node it has touched only ever leaves
//! the `Memory` state if some other part of the system (a trigger, or the
//! complex algorithm on a later objective) spills it.

use std::collections::HashSet;

use crate::eval::algorithm::EvaluationAlgorithm;
use crate::eval::data_node::DataNodeState;
use crate::eval::state::EvaluationState;
use crate::eval::state::EvaluatorError;
use crate::interfaces::Database;
use crate::model::ActivationId;

/// Depth-first, no-spill evaluation strategy.
#[derive(Debug, Default)]
pub struct TopologicalAlgorithm {
    /// Activations already brought to `Memory` or `Disk` during this
    /// algorithm's lifetime, to avoid revisiting siblings sharing a
    /// dependency.
    settled: HashSet<ActivationId>,
}

impl TopologicalAlgorithm {
    /// Builds a fresh algorithm instance with no visited activations yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursively ensures `id` and its dependencies reach `Memory`.
    fn visit<D: Database>(
        &mut self,
        state: &mut EvaluationState<D>,
        id: ActivationId,
    ) -> Result<(), EvaluatorError> {
        if self.settled.contains(&id) && state.state_of(id) == DataNodeState::Memory {
            return Ok(());
        }

        let dependencies = state
            .graph()
            .activation(id)
            .ok_or(EvaluatorError::UnknownActivation(id))?
            .dependencies()
            .to_vec();
        for dependency in dependencies {
            self.visit(state, dependency)?;
        }

        if state.state_of(id) == DataNodeState::Unknown {
            state.try_load(id)?;
        }
        match state.state_of(id) {
            DataNodeState::NoData => state.evaluate_activation(id)?,
            DataNodeState::Disk => state.reload(id)?,
            DataNodeState::Memory | DataNodeState::Unknown => {}
        }

        self.settled.insert(id);
        Ok(())
    }
}

impl<D: Database> EvaluationAlgorithm<D> for TopologicalAlgorithm {
    fn ensure_evaluated(
        &mut self,
        state: &mut EvaluationState<D>,
        id: ActivationId,
    ) -> Result<(), EvaluatorError> {
        self.visit(state, id)
    }
}
