// shardgraph-core/src/eval/algorithm/complex.rs
// ============================================================================
// Module: Complex Algorithm
// Description: Memory-budget-aware evaluation strategy with least-recently-
//              touched spilling.
// Purpose: Let the evaluator work through graphs whose fully-materialized
//          intermediate results would not otherwise fit in memory, by
//          spilling the least recently touched in-memory result to disk
//          whenever process memory crosses a configured soft limit.
// Dependencies: crate::eval::state::EvaluationState, crate::memory
// ============================================================================

//! ## Overview
//! Ported from the reference evaluator's memory-aware algorithm: a
//! depth-first `_process` walk that only ever evaluates a node once every
//! dependency is in memory, tracks which nodes are currently
//! `_necessary` (on the active recursion path — never spillable while
//! they're needed right now) versus merely resident, and after every fresh
//! evaluation checks `_too_much_memory`; if so, `_save_memory` spills
//! entries off the head of a swap order (oldest-touched first), skipping
//! anything still necessary, until usage drops back under budget or
//! nothing spillable remains. `_leave_only_last_occurrence` keeps the swap
//! order free of stale duplicate entries for nodes touched more than once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use crate::eval::algorithm::EvaluationAlgorithm;
use crate::eval::data_node::DataNodeState;
use crate::eval::state::EvaluationState;
use crate::eval::state::EvaluatorError;
use crate::interfaces::Database;
use crate::model::ActivationId;

// ============================================================================
// SECTION: ComplexAlgorithm
// ============================================================================

/// Depth-first evaluation strategy that spills to disk under memory
/// pressure.
#[derive(Debug)]
pub struct ComplexAlgorithm {
    /// Soft virtual-memory budget, in bytes; crossing it triggers spilling.
    memory_limit_bytes: u64,
    /// Activations on the currently active recursion path(s): never
    /// spillable while `_process` still needs them.
    necessary: HashSet<ActivationId>,
    /// Activations whose node has already reached a terminal state
    /// (`Memory` or `Disk`) for this algorithm's lifetime.
    processed: HashSet<ActivationId>,
    /// In-memory activations ordered from least to most recently touched;
    /// `_save_memory` spills from the front.
    swap_order: Vec<ActivationId>,
}

impl ComplexAlgorithm {
    /// Builds a new algorithm that spills once process virtual memory
    /// crosses `memory_limit_bytes`.
    #[must_use]
    pub fn new(memory_limit_bytes: u64) -> Self {
        Self {
            memory_limit_bytes,
            necessary: HashSet::new(),
            processed: HashSet::new(),
            swap_order: Vec::new(),
        }
    }

    /// Depth-first worker: ensures `id` reaches `Memory`, recursing into
    /// dependencies first and updating bookkeeping along the way.
    fn process<D: Database>(
        &mut self,
        state: &mut EvaluationState<D>,
        id: ActivationId,
    ) -> Result<(), EvaluatorError> {
        if self.processed.contains(&id) {
            if state.state_of(id) == DataNodeState::Disk {
                state.reload(id)?;
                self.touch(id);
            }
            return Ok(());
        }

        self.necessary.insert(id);

        let dependencies = state
            .graph()
            .activation(id)
            .ok_or(EvaluatorError::UnknownActivation(id))?
            .dependencies()
            .to_vec();
        for dependency in dependencies {
            self.process(state, dependency)?;
        }

        if state.state_of(id) == DataNodeState::Unknown {
            state.try_load(id)?;
        }
        if state.state_of(id) == DataNodeState::NoData {
            state.evaluate_activation(id)?;
        }
        self.touch(id);
        self.processed.insert(id);
        self.necessary.remove(&id);

        self.save_memory_if_needed(state)?;
        Ok(())
    }

    /// Moves `id` to the back of the swap order (most recently touched),
    /// removing any earlier occurrence first.
    fn touch(&mut self, id: ActivationId) {
        self.swap_order.retain(|existing| *existing != id);
        self.swap_order.push(id);
        self.leave_only_last_occurrence();
    }

    /// Drops duplicate entries from `swap_order`, keeping only each
    /// activation's last (most recent) position. [`Self::touch`] already
    /// maintains this invariant incrementally; this pass exists as a
    /// cheap, defensive normalization callable independent of `touch`.
    fn leave_only_last_occurrence(&mut self) {
        let mut seen = HashSet::new();
        let mut deduped = Vec::with_capacity(self.swap_order.len());
        for id in self.swap_order.iter().rev() {
            if seen.insert(*id) {
                deduped.push(*id);
            }
        }
        deduped.reverse();
        self.swap_order = deduped;
    }

    /// Returns whether process memory usage has crossed the configured
    /// budget.
    fn too_much_memory<D: Database>(
        &self,
        state: &EvaluationState<D>,
    ) -> Result<bool, EvaluatorError> {
        Ok(state.used_virtual_memory()? > self.memory_limit_bytes)
    }

    /// Spills least-recently-touched, non-necessary entries one at a time
    /// until usage drops back under budget or nothing spillable remains.
    fn save_memory_if_needed<D: Database>(
        &mut self,
        state: &mut EvaluationState<D>,
    ) -> Result<(), EvaluatorError> {
        while self.too_much_memory(state)? {
            let Some(position) = self
                .swap_order
                .iter()
                .position(|id| !self.necessary.contains(id) && state.state_of(*id) == DataNodeState::Memory)
            else {
                break;
            };
            let id = self.swap_order.remove(position);
            state.store(id)?;
        }
        Ok(())
    }
}

impl<D: Database> EvaluationAlgorithm<D> for ComplexAlgorithm {
    fn ensure_evaluated(
        &mut self,
        state: &mut EvaluationState<D>,
        id: ActivationId,
    ) -> Result<(), EvaluatorError> {
        self.process(state, id)
    }
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
    fn leave_only_last_occurrence_keeps_most_recent_position() {
        let mut algorithm = ComplexAlgorithm::new(u64::MAX);
        let a = crate::model::ActivationId::from_index(0);
        let b = crate::model::ActivationId::from_index(1);
        algorithm.swap_order = vec![a, b, a];
        algorithm.leave_only_last_occurrence();
        assert_eq!(algorithm.swap_order, vec![b, a]);
    }

    #[test]
    fn touch_moves_existing_entry_to_back() {
        let mut algorithm = ComplexAlgorithm::new(u64::MAX);
        let a = crate::model::ActivationId::from_index(0);
        let b = crate::model::ActivationId::from_index(1);
        algorithm.touch(a);
        algorithm.touch(b);
        algorithm.touch(a);
        assert_eq!(algorithm.swap_order, vec![b, a]);
    }
}
