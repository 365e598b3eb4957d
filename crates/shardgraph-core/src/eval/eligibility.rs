// shardgraph-core/src/eval/eligibility.rs
// ============================================================================
// Module: Eligibility Detector
// Description: Decides whether an activation's trigger_on_descendants may
//              fire yet.
// Purpose: A trigger_on_descendants must not fire while some descendant of
//          its activation still carries a trigger of its own — firing early
//          could let that descendant's own trigger (which might still
//          rewrite the graph) see a graph already mutated out from under
//          it. This module answers "has every descendant settled?".
// Dependencies: crate::model::{ActivationGraph/SealedActivationGraph,
//               ActivationId}
// ============================================================================

//! ## Overview
//! Ported from the breadth-first eligibility check of the original
//! evaluator: starting from an activation, walk forward over every
//! activation that (transitively) depends on it. If any of those
//! descendants still holds a `trigger_on_result` or `trigger_on_descendants`,
//! the starting activation's own `trigger_on_descendants` is not yet
//! eligible to fire.
//!
//! [`ActivationEligibilityDetector`] answers that question for one
//! activation at a time and is what [`crate::eval::state::EvaluationState`]
//! rebuilds and queries on every cascade step. [`EligibilityDetector`] is the
//! graph-level counterpart: it keeps one [`ActivationEligibilityDetector`]
//! per currently-tracked activation (every activation that owns a
//! `trigger_on_descendants`) and answers "which of the activations I'm
//! tracking are eligible right now" without the caller needing to rebuild
//! and re-scan from scratch after every single trigger invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::collections::VecDeque;

use crate::model::ActivationId;
use crate::model::SealedActivationGraph;

// ============================================================================
// SECTION: ActivationEligibilityDetector
// ============================================================================

/// Computes descendant-trigger eligibility over a sealed graph's dependency
/// edges.
///
/// Dependency edges on [`SealedActivationGraph`] point from a dependent
/// activation to the activations it depends on; this detector needs the
/// reverse (successor) view, which it builds once and reuses for every
/// query.
#[derive(Debug)]
pub struct ActivationEligibilityDetector {
    /// `successors[i]` lists the activations that directly depend on
    /// activation `i`.
    successors: Vec<Vec<ActivationId>>,
}

impl ActivationEligibilityDetector {
    /// Builds a detector over `graph`'s current dependency edges.
    ///
    /// The detector is a snapshot: activations added to `graph` after
    /// construction are not reflected. Evaluation adds activations only via
    /// trigger callbacks, which always run between eligibility checks, so
    /// callers should rebuild the detector after any graph mutation.
    #[must_use]
    pub fn build<Trig>(graph: &SealedActivationGraph<Trig>) -> Self {
        let mut successors = vec![Vec::new(); graph.len()];
        for activation in graph.activations() {
            for dependency in activation.dependencies() {
                successors[dependency.index()].push(activation.id());
            }
        }
        Self { successors }
    }

    /// Returns whether `activation`'s `trigger_on_descendants` is eligible
    /// to fire: true exactly when no (transitive) descendant of
    /// `activation` carries a pending `trigger_on_result` or
    /// `trigger_on_descendants`.
    #[must_use]
    pub fn is_eligible<Trig>(
        &self,
        graph: &SealedActivationGraph<Trig>,
        activation: ActivationId,
    ) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(activation);
        visited.insert(activation);

        while let Some(current) = queue.pop_front() {
            for &successor in self.successors.get(current.index()).into_iter().flatten() {
                if !visited.insert(successor) {
                    continue;
                }
                let Some(node) = graph.activation(successor) else {
                    continue;
                };
                if node.trigger_on_result().is_present() || node.trigger_on_descendants().is_present()
                {
                    return false;
                }
                queue.push_back(successor);
            }
        }
        true
    }
}

// ============================================================================
// SECTION: EligibilityDetector
// ============================================================================

/// Graph-level view over every activation currently tracked for
/// `trigger_on_descendants` eligibility.
///
/// Tracks exactly the activations that own a `trigger_on_descendants` at the
/// time of the last [`Self::update`] (or [`Self::build`]); once one fires,
/// [`Self::update`] drops it from the tracked set.
#[derive(Debug)]
pub struct EligibilityDetector {
    /// Per-activation successor-edge detector, shared across every tracked
    /// activation since it only depends on the graph's dependency edges.
    detector: ActivationEligibilityDetector,
    /// Activations currently being tracked for descendant-trigger
    /// eligibility: every activation that owns a `trigger_on_descendants`.
    tracked: HashSet<ActivationId>,
}

impl EligibilityDetector {
    /// Builds a detector tracking every activation in `graph` that
    /// currently owns a `trigger_on_descendants`.
    #[must_use]
    pub fn build<Trig>(graph: &SealedActivationGraph<Trig>) -> Self {
        let tracked = graph
            .activations()
            .filter(|activation| activation.trigger_on_descendants().is_present())
            .map(crate::model::Activation::id)
            .collect();
        Self {
            detector: ActivationEligibilityDetector::build(graph),
            tracked,
        }
    }

    /// Returns the activations currently tracked for eligibility.
    #[must_use]
    pub const fn tracked_activations(&self) -> &HashSet<ActivationId> {
        &self.tracked
    }

    /// Returns every tracked activation whose `trigger_on_descendants` is
    /// eligible to fire right now.
    #[must_use]
    pub fn eligible_activations<Trig>(&self, graph: &SealedActivationGraph<Trig>) -> Vec<ActivationId> {
        self.tracked
            .iter()
            .copied()
            .filter(|id| self.detector.is_eligible(graph, *id))
            .collect()
    }

    /// Rebuilds the successor-edge detector against `graph`'s current
    /// dependency edges, drops `invoked_activation` from the tracked set
    /// (its `trigger_on_descendants` has just fired and been cleared), and
    /// starts tracking every activation in `new_activations` that owns a
    /// `trigger_on_descendants` — covering both a trigger that reinstalls
    /// its own slot and one that adds a fresh descendant carrying one.
    pub fn update<Trig>(
        &mut self,
        graph: &SealedActivationGraph<Trig>,
        invoked_activation: ActivationId,
        new_activations: impl IntoIterator<Item = ActivationId>,
    ) {
        self.detector = ActivationEligibilityDetector::build(graph);
        self.tracked.remove(&invoked_activation);
        if let Some(activation) = graph.activation(invoked_activation)
            && activation.trigger_on_descendants().is_present()
        {
            self.tracked.insert(invoked_activation);
        }
        for id in new_activations {
            if let Some(activation) = graph.activation(id)
                && activation.trigger_on_descendants().is_present()
            {
                self.tracked.insert(id);
            }
        }
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
    use crate::model::ActivationGraph;
    use crate::model::Parameter;
    use crate::model::PluginId;
    use crate::model::Signature;
    use crate::model::SymbolicObject;
    use std::collections::BTreeMap;

    fn chain_graph() -> SealedActivationGraph<&'static str> {
        let mut graph: ActivationGraph<&'static str> = ActivationGraph::new();
        let signature = Signature::new(vec![Parameter::required("v")]);
        let (_, root_symbol) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &signature,
                vec![SymbolicObject::Value(1.into())],
                BTreeMap::new(),
            )
            .expect("root");
        let identity = Signature::new(vec![Parameter::required("v")]);
        graph
            .add_activation(
                PluginId::new("identity", "1"),
                &identity,
                vec![SymbolicObject::Symbol(root_symbol)],
                BTreeMap::new(),
            )
            .expect("child");
        graph.seal().expect("seal")
    }

    #[test]
    fn eligible_when_no_descendant_has_a_trigger() {
        let graph = chain_graph();
        let detector = ActivationEligibilityDetector::build(&graph);
        assert!(detector.is_eligible(&graph, ActivationId::from_index(0)));
    }

    #[test]
    fn ineligible_when_a_descendant_carries_a_trigger() {
        let mut graph = chain_graph();
        let detector = ActivationEligibilityDetector::build(&graph);
        let child = ActivationId::from_index(1);
        graph
            .activation_mut(child)
            .expect("child")
            .trigger_on_result_mut()
            .set("fire")
            .expect("set");
        assert!(!detector.is_eligible(&graph, ActivationId::from_index(0)));
    }

    #[test]
    fn leaf_with_no_descendants_is_always_eligible() {
        let graph = chain_graph();
        let detector = ActivationEligibilityDetector::build(&graph);
        assert!(detector.is_eligible(&graph, ActivationId::from_index(1)));
    }
}
