// shardgraph-core/tests/property_tests.rs
// ============================================================================
// Module: Graph Construction Property Tests
// Description: Property tests for activation deduplication and dependency
//              level computation across arbitrary graph shapes.
// Purpose: Detect panics and invariant violations across a wide range of
//          chain lengths and argument values.
// ============================================================================

//! Property-based tests for [`shardgraph_core::ActivationGraph`].

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::collections::BTreeMap;

use proptest::prelude::*;
use shardgraph_core::ActivationGraph;
use shardgraph_core::Payload;
use shardgraph_core::PluginId;
use shardgraph_core::SymbolicObject;
use shardgraph_core::TopologicalAlgorithm;
use shardgraph_core::evaluate;
use shardgraph_core::memory::FixedMemoryInfo;
use shardgraph_core::model::Parameter;
use shardgraph_core::model::Signature;
use shardgraph_plugins::PluginRegistry;

use common::MemoryDatabase;

fn identity_signature() -> Signature {
    Signature::new(vec![Parameter::required("v")])
}

proptest! {
    #[test]
    fn add_activation_is_idempotent_for_any_int_payload(value in any::<i64>()) {
        let mut graph = ActivationGraph::new();
        let signature = identity_signature();
        let (first_id, _) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &signature,
                vec![SymbolicObject::value(Payload::Int(value))],
                BTreeMap::new(),
            )
            .expect("first add accepted");
        let (second_id, _) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &signature,
                vec![SymbolicObject::value(Payload::Int(value))],
                BTreeMap::new(),
            )
            .expect("second add accepted");
        prop_assert_eq!(first_id, second_id);
        prop_assert_eq!(graph.len(), 1);
    }

    #[test]
    fn distinct_int_payloads_never_collapse_to_one_activation(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(a != b);
        let mut graph = ActivationGraph::new();
        let signature = identity_signature();
        let (first_id, _) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &signature,
                vec![SymbolicObject::value(Payload::Int(a))],
                BTreeMap::new(),
            )
            .expect("first add accepted");
        let (second_id, _) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &signature,
                vec![SymbolicObject::value(Payload::Int(b))],
                BTreeMap::new(),
            )
            .expect("second add accepted");
        prop_assert_ne!(first_id, second_id);
    }

    #[test]
    fn dependency_chain_levels_increase_by_exactly_one(length in 1_usize..20) {
        let mut graph = ActivationGraph::new();
        let signature = identity_signature();
        let mut ids = Vec::with_capacity(length);

        let (first_id, first_symbol) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &signature,
                vec![SymbolicObject::value(Payload::Int(0))],
                BTreeMap::new(),
            )
            .expect("root accepted");
        ids.push(first_id);
        let mut previous_symbol = first_symbol;

        for _ in 1..length {
            let (id, symbol) = graph
                .add_activation(
                    PluginId::new("identity", "1"),
                    &signature,
                    vec![SymbolicObject::Symbol(previous_symbol)],
                    BTreeMap::new(),
                )
                .expect("link accepted");
            ids.push(id);
            previous_symbol = symbol;
        }

        let sealed = graph.seal().expect("no unrealized inputs");
        let levels = sealed.levels();
        for (position, id) in ids.iter().enumerate() {
            prop_assert_eq!(levels[id.index()], position);
        }
    }

    #[test]
    fn arithmetic_tree_evaluates_to_the_same_value_as_plain_rust_arithmetic(
        a in -1_000_i64..1_000,
        b in -1_000_i64..1_000,
        c in -1_000_i64..1_000,
    ) {
        let registry = PluginRegistry::with_arithmetic_plugins();
        let add_id = PluginId::new("add", "1");
        let mul_id = PluginId::new("mul", "1");
        let add_signature = registry.plugin(&add_id).expect("registered").signature();
        let mul_signature = registry.plugin(&mul_id).expect("registered").signature();

        let mut graph = ActivationGraph::new();
        let (_sum_id, sum_symbol) = graph
            .add_activation(
                add_id,
                &add_signature,
                vec![SymbolicObject::value(Payload::Int(a)), SymbolicObject::value(Payload::Int(b))],
                BTreeMap::new(),
            )
            .expect("sum accepted");
        let (product_id, _) = graph
            .add_activation(
                mul_id,
                &mul_signature,
                vec![SymbolicObject::Symbol(sum_symbol), SymbolicObject::value(Payload::Int(c))],
                BTreeMap::new(),
            )
            .expect("product accepted");

        let sealed = graph.seal().expect("no unrealized inputs");

        let report = evaluate(
            sealed,
            registry.into_map(),
            MemoryDatabase::default(),
            Box::new(FixedMemoryInfo::new(0)),
            TopologicalAlgorithm::new(),
        )
        .expect("evaluation succeeds");

        let expected = a.checked_add(b).and_then(|sum| sum.checked_mul(c));
        if let Some(expected) = expected {
            prop_assert_eq!(report.get(product_id), Some(&Payload::Int(expected)));
        }
    }
}
