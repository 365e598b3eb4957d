// shardgraph-core/tests/scenario_simple_tree.rs
//! Evaluates a small, non-trivial arithmetic tree end to end through the
//! public `evaluate` entry point, using the real arithmetic plugins.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions favor clarity over production error handling."
)]

mod common;

use std::collections::BTreeMap;

use shardgraph_core::ActivationGraph;
use shardgraph_core::Payload;
use shardgraph_core::SymbolicObject;
use shardgraph_core::TopologicalAlgorithm;
use shardgraph_core::evaluate;
use shardgraph_core::memory::FixedMemoryInfo;
use shardgraph_plugins::PluginRegistry;

use common::MemoryDatabase;

/// `(2 + 3) * 4 == 20`
#[test]
fn evaluates_add_then_mul() {
    let registry = PluginRegistry::with_arithmetic_plugins();
    let mut graph = ActivationGraph::new();

    let add_signature = registry
        .plugin(&shardgraph_core::PluginId::new("add", "1"))
        .expect("add plugin registered")
        .signature();
    let (add_id, add_symbol) = graph
        .add_activation(
            shardgraph_core::PluginId::new("add", "1"),
            &add_signature,
            vec![
                SymbolicObject::value(Payload::Int(2)),
                SymbolicObject::value(Payload::Int(3)),
            ],
            BTreeMap::new(),
        )
        .expect("add activation accepted");

    let mul_signature = registry
        .plugin(&shardgraph_core::PluginId::new("mul", "1"))
        .expect("mul plugin registered")
        .signature();
    let (mul_id, _mul_symbol) = graph
        .add_activation(
            shardgraph_core::PluginId::new("mul", "1"),
            &mul_signature,
            vec![SymbolicObject::Symbol(add_symbol), SymbolicObject::value(Payload::Int(4))],
            BTreeMap::new(),
        )
        .expect("mul activation accepted");

    assert_eq!(graph.activation(add_id).expect("exists").dependencies().len(), 0);
    let sealed = graph.seal().expect("no unrealized inputs");

    let report = evaluate(
        sealed,
        registry.into_map(),
        MemoryDatabase::default(),
        Box::new(FixedMemoryInfo::new(0)),
        TopologicalAlgorithm::new(),
    )
    .expect("evaluation succeeds");

    assert_eq!(report.get(mul_id), Some(&Payload::Int(20)));
}
