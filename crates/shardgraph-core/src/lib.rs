// shardgraph-core/src/lib.rs
// ============================================================================
// Module: Shardgraph Core Library
// Description: Public API surface for the Shardgraph evaluator core.
// Purpose: Expose the activation graph, evaluation state machine, and the
//          evaluation algorithms that drive it to completion.
// Dependencies: crate::{model, eval, interfaces, hashing, memory, tempspill}
// ============================================================================

//! ## Overview
//! Shardgraph core evaluates a user-declared, dynamically extensible
//! computation graph. Each node ("activation") is a pure plugin invocation
//! over previously-computed results; the evaluator deduplicates identical
//! computations by a content-addressed identity, persists and reloads
//! results through a content-addressed [`interfaces::Database`], spills
//! cold results to disk under a soft memory budget, and expands the graph
//! on the fly via user-supplied trigger callbacks.
//!
//! This crate is backend-agnostic: it depends only on the [`model::Plugin`]
//! and [`interfaces::Database`] trait contracts, never on a concrete plugin
//! registry or storage backend. See `shardgraph-plugins` and
//! `shardgraph-store` for those.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod eval;
pub mod hashing;
pub mod interfaces;
pub mod memory;
pub mod model;
pub mod tempspill;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use eval::ComplexAlgorithm;
pub use eval::EvaluationAlgorithm;
pub use eval::EvaluationReport;
pub use eval::EvaluationState;
pub use eval::EvaluatorError;
pub use eval::TopologicalAlgorithm;
pub use eval::evaluate;
pub use interfaces::Database;
pub use interfaces::DatabaseError;
pub use memory::MemoryInfo;
pub use memory::MemoryInfoError;
pub use model::ActivationGraph;
pub use model::ActivationId;
pub use model::ArgumentError;
pub use model::Payload;
pub use model::Plugin;
pub use model::PluginId;
pub use model::PluginInvokeError;
pub use model::SealedActivationGraph;
pub use model::Signature;
pub use model::Symbol;
pub use model::SymbolicArgumentSet;
pub use model::SymbolicObject;
pub use model::UnboundSymbolError;
