// shardgraph-core/src/model/payload.rs
// ============================================================================
// Module: Payload
// Description: Concrete plugin-domain value type shared by every layer.
// Purpose: Give symbolic objects, argument sets, and plugin results a single
//          concrete, hashable, serializable value representation.
// Dependencies: ordered-float, serde
// ============================================================================

//! ## Overview
//! [`Payload`] is the concrete, closed plugin-domain value every layer of
//! this crate shares: a structurally-recursive value, total over
//! `Eq`/`Hash`/`Ord` so it can stand in as a `SymbolicObject::Dict` key or a
//! database key component without extra bounds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Payload
// ============================================================================

/// A concrete plugin-domain value.
///
/// Cloning a `Payload` performs a real, independent value copy of the whole
/// tree; there is no interior sharing inside the enum itself. Sharing
/// across multiple occurrences of one [`crate::model::Symbol`] during
/// materialization is implemented at the binding-map level, not here (see
/// [`crate::model::SymbolicObject::get_value`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Absence of a value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit float, totally ordered via [`OrderedFloat`].
    Float(OrderedFloat<f64>),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered list of payloads.
    List(Vec<Payload>),
    /// Map keyed by payload, ordered for determinism.
    Map(BTreeMap<Payload, Payload>),
}

impl Payload {
    /// Convenience constructor for [`Payload::Float`].
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::Float(OrderedFloat(value))
    }

    /// Returns the payload as an `i64`, if it is an [`Payload::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the payload as an `f64`, widening [`Payload::Int`] when
    /// necessary.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "widening an i64 to f64 for numeric plugin arithmetic is accepted lossy behavior"
    )]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(value.into_inner()),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Returns the payload as a string slice, if it is [`Payload::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
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
    fn float_round_trips_through_ordered_float() {
        let payload = Payload::float(1.5);
        assert_eq!(payload.as_f64(), Some(1.5));
    }

    #[test]
    fn int_widens_to_f64() {
        assert_eq!(Payload::Int(4).as_f64(), Some(4.0));
    }

    #[test]
    fn equal_payloads_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Payload::from("a"));
        assert!(set.contains(&Payload::from("a")));
    }
}
