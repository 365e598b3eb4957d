// shardgraph-core/tests/scenario_diamond.rs
//! A diamond-shaped dependency graph: two branches share one base
//! activation, and a final node combines both branches. Exercises
//! deduplication (the base activation is added once and referenced twice)
//! and level computation.

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
use shardgraph_core::PluginId;
use shardgraph_core::SymbolicObject;
use shardgraph_core::TopologicalAlgorithm;
use shardgraph_core::evaluate;
use shardgraph_core::memory::FixedMemoryInfo;
use shardgraph_plugins::PluginRegistry;

use common::MemoryDatabase;

/// `base = 3 + 4 = 7`, `left = base * 2 = 14`, `right = base * 3 = 21`,
/// `top = left + right = 35`. `base` must be shared, not recomputed.
#[test]
fn diamond_shares_base_activation() {
    let registry = PluginRegistry::with_arithmetic_plugins();
    let add_id = PluginId::new("add", "1");
    let mul_id = PluginId::new("mul", "1");
    let add_signature = registry.plugin(&add_id).expect("registered").signature();
    let mul_signature = registry.plugin(&mul_id).expect("registered").signature();

    let mut graph = ActivationGraph::new();

    let (base_activation, base_symbol) = graph
        .add_activation(
            add_id.clone(),
            &add_signature,
            vec![SymbolicObject::value(Payload::Int(3)), SymbolicObject::value(Payload::Int(4))],
            BTreeMap::new(),
        )
        .expect("base accepted");

    let (left_activation, left_symbol) = graph
        .add_activation(
            mul_id.clone(),
            &mul_signature,
            vec![SymbolicObject::Symbol(base_symbol), SymbolicObject::value(Payload::Int(2))],
            BTreeMap::new(),
        )
        .expect("left accepted");

    let (right_activation, right_symbol) = graph
        .add_activation(
            mul_id.clone(),
            &mul_signature,
            vec![SymbolicObject::Symbol(base_symbol), SymbolicObject::value(Payload::Int(3))],
            BTreeMap::new(),
        )
        .expect("right accepted");

    // Re-adding an identical invocation of `base` must dedup to the same id.
    let (redundant_activation, _redundant_symbol) = graph
        .add_activation(
            add_id,
            &add_signature,
            vec![SymbolicObject::value(Payload::Int(3)), SymbolicObject::value(Payload::Int(4))],
            BTreeMap::new(),
        )
        .expect("redundant add dedups");
    assert_eq!(redundant_activation, base_activation);

    let (top_activation, _top_symbol) = graph
        .add_activation(
            PluginId::new("add", "1"),
            &add_signature,
            vec![SymbolicObject::Symbol(left_symbol), SymbolicObject::Symbol(right_symbol)],
            BTreeMap::new(),
        )
        .expect("top accepted");

    let sealed = graph.seal().expect("no unrealized inputs");
    let levels = sealed.levels();
    assert_eq!(levels[base_activation.index()], 0);
    assert_eq!(levels[left_activation.index()], 1);
    assert_eq!(levels[right_activation.index()], 1);
    assert_eq!(levels[top_activation.index()], 2);

    let report = evaluate(
        sealed,
        registry.into_map(),
        MemoryDatabase::default(),
        Box::new(FixedMemoryInfo::new(0)),
        TopologicalAlgorithm::new(),
    )
    .expect("evaluation succeeds");

    assert_eq!(report.get(top_activation), Some(&Payload::Int(35)));
}
