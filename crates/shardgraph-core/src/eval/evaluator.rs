// shardgraph-core/src/eval/evaluator.rs
// ============================================================================
// Module: Evaluator
// Description: The public entry point tying graph, algorithm, and state
//              together into one `evaluate` call.
// Purpose: Give callers a single function: hand over a sealed graph, the
//          plugins it invokes, a database, a memory budget, and the set of
//          activations you actually want answers for, and get back their
//          materialized results.
// Dependencies: crate::eval::{state, algorithm}, crate::interfaces::Database,
//               crate::memory::MemoryInfo, crate::model::*
// ============================================================================

//! ## Overview
//! [`evaluate`] drives every *childless* activation (the terminal nodes
//! nothing else in the graph depends on) to a `Memory` result, in dependency
//! order, using the supplied [`EvaluationAlgorithm`], draining the trigger
//! cascade once per round. A fired trigger may splice in new activations —
//! including new childless ones — so the childless set is recomputed after
//! every round and driving continues until a round adds nothing further.
//! The returned [`EvaluationReport`] carries every childless activation's
//! materialized [`Payload`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::eval::algorithm::EvaluationAlgorithm;
use crate::eval::state::EvaluationState;
use crate::eval::state::EvaluatorError;
use crate::interfaces::Database;
use crate::memory::MemoryInfo;
use crate::model::ActivationId;
use crate::model::Payload;
use crate::model::Plugin;
use crate::model::PluginId;
use crate::model::SealedActivationGraph;

// ============================================================================
// SECTION: EvaluationReport
// ============================================================================

/// The materialized outcome of one [`evaluate`] call.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Each requested top-level activation's materialized result.
    results: HashMap<ActivationId, Payload>,
}

impl EvaluationReport {
    /// Returns the materialized result for `id`, if it was a childless
    /// activation when evaluation completed.
    #[must_use]
    pub fn get(&self, id: ActivationId) -> Option<&Payload> {
        self.results.get(&id)
    }

    /// Iterates over every childless activation and its materialized
    /// result.
    pub fn iter(&self) -> impl Iterator<Item = (ActivationId, &Payload)> {
        self.results.iter().map(|(id, payload)| (*id, payload))
    }
}

// ============================================================================
// SECTION: evaluate
// ============================================================================

/// Evaluates `graph` to completion and returns every childless
/// activation's materialized result.
///
/// Drives, in dependency order via `algorithm`, every activation nothing
/// else depends on, then drains the trigger cascade for a full round
/// before recomputing the childless set: a fired trigger may splice in new
/// activations, possibly creating new childless nodes or giving a
/// previously childless one a dependent. Driving repeats until a round
/// adds no new activation to the graph.
///
/// # Errors
///
/// Propagates any [`EvaluatorError`] raised while loading, evaluating,
/// storing, or reloading a node, while running a fired trigger, or while
/// opening the database.
pub fn evaluate<D, A>(
    graph: SealedActivationGraph<crate::eval::state::Trigger<D>>,
    plugins: HashMap<PluginId, Arc<dyn Plugin>>,
    database: D,
    memory_info: Box<dyn MemoryInfo>,
    mut algorithm: A,
) -> Result<EvaluationReport, EvaluatorError>
where
    D: Database,
    A: EvaluationAlgorithm<D>,
{
    let mut state = EvaluationState::new(graph, plugins, database, memory_info)?;

    let mut driven: HashSet<ActivationId> = HashSet::new();
    loop {
        let before = state.graph().len();

        let mut terminals: Vec<ActivationId> = state
            .graph()
            .childless_activations()
            .into_iter()
            .filter(|id| !driven.contains(id))
            .collect();
        terminals.sort_unstable();
        for id in terminals {
            algorithm.ensure_evaluated(&mut state, id)?;
            driven.insert(id);
        }
        state.drain_objectives()?;

        if state.graph().len() == before {
            break;
        }
    }

    let mut results = HashMap::new();
    for id in state.graph().childless_activations() {
        algorithm.ensure_evaluated(&mut state, id)?;
        if let Some(payload) = state.memory_value(id) {
            results.insert(id, payload.clone());
        }
        state.mark_result(id);
    }

    Ok(EvaluationReport { results })
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
    use crate::eval::algorithm::topological::TopologicalAlgorithm;
    use crate::interfaces::DatabaseError;
    use crate::memory::FixedMemoryInfo;
    use crate::model::ArgumentError;
    use crate::model::BoundArguments;
    use crate::model::Parameter;
    use crate::model::PluginInvokeError;
    use crate::model::Signature;
    use crate::model::SymbolicObject;
    use crate::model::ActivationGraph;
    use std::collections::BTreeMap;

    #[derive(Debug)]
    struct ConstantPlugin;

    impl Plugin for ConstantPlugin {
        fn id(&self) -> PluginId {
            PluginId::new("const", "1")
        }

        fn signature(&self) -> Signature {
            Signature::new(vec![Parameter::required("v")])
        }

        fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
            arguments
                .by_parameter
                .iter()
                .find(|(name, _)| name == "v")
                .map(|(_, value)| value.clone())
                .ok_or_else(|| PluginInvokeError::InvalidArgument("missing v".to_owned()))
        }
    }

    #[derive(Debug)]
    struct IdentityPlugin;

    impl Plugin for IdentityPlugin {
        fn id(&self) -> PluginId {
            PluginId::new("identity", "1")
        }

        fn signature(&self) -> Signature {
            Signature::new(vec![Parameter::required("v")])
        }

        fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
            arguments
                .by_parameter
                .iter()
                .find(|(name, _)| name == "v")
                .map(|(_, value)| value.clone())
                .ok_or_else(|| PluginInvokeError::InvalidArgument("missing v".to_owned()))
        }
    }

    #[derive(Debug, Default)]
    struct NullDatabase;

    impl Database for NullDatabase {
        fn open(&mut self) -> Result<(), DatabaseError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), DatabaseError> {
            Ok(())
        }

        fn save(
            &mut self,
            _key: &crate::hashing::HashDigest,
            _payload: &Payload,
        ) -> Result<(), DatabaseError> {
            Ok(())
        }

        fn load(&mut self, key: &crate::hashing::HashDigest) -> Result<Payload, DatabaseError> {
            Err(DatabaseError::DataNotFound(key.clone()))
        }

        fn delete(&mut self, _key: &crate::hashing::HashDigest) -> Result<(), DatabaseError> {
            Ok(())
        }

        fn contains(&self, _key: &crate::hashing::HashDigest) -> bool {
            false
        }
    }

    fn plugin_registry() -> HashMap<PluginId, Arc<dyn Plugin>> {
        let mut plugins: HashMap<PluginId, Arc<dyn Plugin>> = HashMap::new();
        plugins.insert(PluginId::new("const", "1"), Arc::new(ConstantPlugin));
        plugins.insert(PluginId::new("identity", "1"), Arc::new(IdentityPlugin));
        plugins
    }

    #[test]
    fn evaluate_simple_chain_returns_materialized_result() -> Result<(), Box<dyn std::error::Error>> {
        let mut graph: ActivationGraph<crate::eval::state::Trigger<NullDatabase>> =
            ActivationGraph::new();
        let const_signature = Signature::new(vec![Parameter::required("v")]);
        let (_, root_symbol) = graph.add_activation(
            PluginId::new("const", "1"),
            &const_signature,
            vec![SymbolicObject::Value(41.into())],
            BTreeMap::new(),
        )?;
        let identity_signature = Signature::new(vec![Parameter::required("v")]);
        let (leaf_id, _) = graph.add_activation(
            PluginId::new("identity", "1"),
            &identity_signature,
            vec![SymbolicObject::Symbol(root_symbol)],
            BTreeMap::new(),
        )?;
        let sealed = graph.seal()?;

        let report = evaluate(
            sealed,
            plugin_registry(),
            NullDatabase,
            Box::new(FixedMemoryInfo::new(0)),
            TopologicalAlgorithm::new(),
        )?;

        assert_eq!(report.get(leaf_id), Some(&Payload::Int(41)));
        Ok(())
    }

    #[test]
    fn evaluate_diamond_shares_common_dependency() -> Result<(), Box<dyn std::error::Error>> {
        let mut graph: ActivationGraph<crate::eval::state::Trigger<NullDatabase>> =
            ActivationGraph::new();
        let const_signature = Signature::new(vec![Parameter::required("v")]);
        let (_, root_symbol) = graph.add_activation(
            PluginId::new("const", "1"),
            &const_signature,
            vec![SymbolicObject::Value(7.into())],
            BTreeMap::new(),
        )?;
        let identity_signature = Signature::new(vec![Parameter::required("v")]);
        let (left_id, left_symbol) = graph.add_activation(
            PluginId::new("identity", "1"),
            &identity_signature,
            vec![SymbolicObject::Symbol(root_symbol)],
            BTreeMap::new(),
        )?;
        let (right_id, _) = graph.add_activation(
            PluginId::new("identity", "1"),
            &identity_signature,
            vec![SymbolicObject::Symbol(root_symbol)],
            BTreeMap::new(),
        )?;
        assert_eq!(left_id, right_id, "identical invocations dedup to one activation");
        let _ = left_symbol;

        let sealed = graph.seal()?;

        let report = evaluate(
            sealed,
            plugin_registry(),
            NullDatabase,
            Box::new(FixedMemoryInfo::new(0)),
            TopologicalAlgorithm::new(),
        )?;

        assert_eq!(report.get(left_id), Some(&Payload::Int(7)));
        Ok(())
    }

    #[test]
    fn evaluation_report_iterates_every_requested_result() -> Result<(), Box<dyn std::error::Error>> {
        let mut graph: ActivationGraph<crate::eval::state::Trigger<NullDatabase>> =
            ActivationGraph::new();
        let const_signature = Signature::new(vec![Parameter::required("v")]);
        let (first_id, _) = graph.add_activation(
            PluginId::new("const", "1"),
            &const_signature,
            vec![SymbolicObject::Value(1.into())],
            BTreeMap::new(),
        )?;
        let (second_id, _) = graph.add_activation(
            PluginId::new("const", "1"),
            &const_signature,
            vec![SymbolicObject::Value(2.into())],
            BTreeMap::new(),
        )?;
        let sealed = graph.seal()?;

        let report = evaluate(
            sealed,
            plugin_registry(),
            NullDatabase,
            Box::new(FixedMemoryInfo::new(0)),
            TopologicalAlgorithm::new(),
        )?;

        assert_eq!(report.iter().count(), 2);
        let _ = (first_id, second_id);
        Ok(())
    }

    #[test]
    fn argument_error_propagates_from_graph_construction() {
        let mut graph: ActivationGraph<crate::eval::state::Trigger<NullDatabase>> =
            ActivationGraph::new();
        let signature = Signature::new(vec![Parameter::required("v")]);
        let stray = crate::model::Symbol::fresh();
        let err = graph
            .add_activation(
                PluginId::new("identity", "1"),
                &signature,
                vec![SymbolicObject::Symbol(stray)],
                BTreeMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ArgumentError::ForeignSymbol(_)));
    }
}
