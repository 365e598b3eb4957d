// shardgraph-plugins/src/arithmetic.rs
// ============================================================================
// Module: Arithmetic Plugins
// Description: Example pure plugins over numeric payloads.
// Purpose: Give tests and the CLI demo a small, deterministic plugin set
//          without depending on any external computation.
// Dependencies: shardgraph-core
// ============================================================================

//! ## Overview
//! Each plugin here mirrors one operator: [`ConstPlugin`] returns its single
//! argument unchanged, [`AddPlugin`]/[`SubPlugin`]/[`MulPlugin`]/[`DivPlugin`]
//! are the four binary arithmetic operators, [`PowPlugin`] raises a base to
//! an exponent, [`MaxPlugin`]/[`MinPlugin`] reduce a variadic argument list,
//! and [`DivisorsPlugin`] lists every divisor of a positive integer in
//! ascending order.
//!
//! Every operator promotes to [`Payload::Float`] unless both operands are
//! [`Payload::Int`], matching the dynamically-typed arithmetic the example
//! graphs in this crate's tests build against.

// ============================================================================
// SECTION: Imports
// ============================================================================

use shardgraph_core::Payload;
use shardgraph_core::Plugin;
use shardgraph_core::PluginId;
use shardgraph_core::PluginInvokeError;
use shardgraph_core::model::BoundArguments;
use shardgraph_core::model::Parameter;
use shardgraph_core::model::ParameterKind;
use shardgraph_core::model::Signature;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the bound value for `name`, in first-binding order.
fn argument<'a>(
    arguments: &'a BoundArguments<Payload>,
    name: &str,
) -> Result<&'a Payload, PluginInvokeError> {
    arguments
        .by_parameter
        .iter()
        .find(|(parameter_name, _)| parameter_name == name)
        .map(|(_, value)| value)
        .ok_or_else(|| PluginInvokeError::InvalidArgument(format!("missing argument '{name}'")))
}

/// Applies `int_op` when both operands are [`Payload::Int`], otherwise
/// widens both to `f64` and applies `float_op`.
fn numeric_binary_op(
    a: &Payload,
    b: &Payload,
    int_op: impl FnOnce(i64, i64) -> Option<i64>,
    float_op: impl FnOnce(f64, f64) -> f64,
) -> Result<Payload, PluginInvokeError> {
    if let (Payload::Int(a), Payload::Int(b)) = (a, b) {
        return int_op(*a, *b)
            .map(Payload::Int)
            .ok_or_else(|| PluginInvokeError::Failed("integer operation overflowed".to_owned()));
    }
    let (a, b) = (numeric(a)?, numeric(b)?);
    Ok(Payload::float(float_op(a, b)))
}

/// Widens a payload to `f64`, rejecting non-numeric payloads.
fn numeric(payload: &Payload) -> Result<f64, PluginInvokeError> {
    payload
        .as_f64()
        .ok_or_else(|| PluginInvokeError::InvalidArgument("expected a numeric argument".to_owned()))
}

// ============================================================================
// SECTION: ConstPlugin
// ============================================================================

/// Returns its single argument unchanged.
#[derive(Debug, Default)]
pub struct ConstPlugin;

impl Plugin for ConstPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("const", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("a")])
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        Ok(argument(arguments, "a")?.clone())
    }
}

// ============================================================================
// SECTION: Binary operators
// ============================================================================

/// Adds two numeric payloads.
#[derive(Debug, Default)]
pub struct AddPlugin;

impl Plugin for AddPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("add", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("a"), Parameter::required("b")])
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        numeric_binary_op(
            argument(arguments, "a")?,
            argument(arguments, "b")?,
            i64::checked_add,
            |a, b| a + b,
        )
    }
}

/// Subtracts `b` from `a`.
#[derive(Debug, Default)]
pub struct SubPlugin;

impl Plugin for SubPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("sub", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("a"), Parameter::required("b")])
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        numeric_binary_op(
            argument(arguments, "a")?,
            argument(arguments, "b")?,
            i64::checked_sub,
            |a, b| a - b,
        )
    }
}

/// Multiplies two numeric payloads.
#[derive(Debug, Default)]
pub struct MulPlugin;

impl Plugin for MulPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("mul", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("a"), Parameter::required("b")])
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        numeric_binary_op(
            argument(arguments, "a")?,
            argument(arguments, "b")?,
            i64::checked_mul,
            |a, b| a * b,
        )
    }
}

/// Divides `a` by `b`. Integer division is only exact when `b` divides `a`
/// evenly; otherwise the result is a `Float`.
#[derive(Debug, Default)]
pub struct DivPlugin;

impl Plugin for DivPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("div", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("a"), Parameter::required("b")])
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        let (a, b) = (argument(arguments, "a")?, argument(arguments, "b")?);
        if let (Payload::Int(a), Payload::Int(b)) = (a, b) {
            if *b == 0 {
                return Err(PluginInvokeError::Failed("division by zero".to_owned()));
            }
            if a % b == 0 {
                return Ok(Payload::Int(a / b));
            }
            return Ok(Payload::float(*a as f64 / *b as f64));
        }
        let (a, b) = (numeric(a)?, numeric(b)?);
        if b == 0.0 {
            return Err(PluginInvokeError::Failed("division by zero".to_owned()));
        }
        Ok(Payload::float(a / b))
    }
}

/// Raises `base` to the power `exponent`, defaulting `base` to `2`.
#[derive(Debug, Default)]
pub struct PowPlugin;

impl Plugin for PowPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("pow", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![
            Parameter::required("exponent"),
            Parameter::with_default("base", ParameterKind::PositionalOrKeyword),
        ])
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        let exponent = numeric(argument(arguments, "exponent")?)?;
        let base = arguments
            .by_parameter
            .iter()
            .find(|(name, _)| name == "base")
            .map(|(_, value)| numeric(value))
            .transpose()?
            .unwrap_or(2.0);
        if let (Some(base_int), Some(exponent_int)) = (
            argument(arguments, "base").ok().and_then(|v| v.as_int()),
            argument(arguments, "exponent")?.as_int(),
        ) {
            if let Ok(exponent_u32) = u32::try_from(exponent_int) {
                if let Some(result) = base_int.checked_pow(exponent_u32) {
                    return Ok(Payload::Int(result));
                }
            }
        }
        Ok(Payload::float(base.powf(exponent)))
    }
}

// ============================================================================
// SECTION: Variadic reducers
// ============================================================================

/// Returns the largest of its arguments.
#[derive(Debug, Default)]
pub struct MaxPlugin;

impl Plugin for MaxPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("max", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("first")]).with_var_positional()
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        reduce_variadic(arguments, |best, candidate| candidate > best)
    }
}

/// Returns the smallest of its arguments.
#[derive(Debug, Default)]
pub struct MinPlugin;

impl Plugin for MinPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("min", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("first")]).with_var_positional()
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        reduce_variadic(arguments, |best, candidate| candidate < best)
    }
}

/// Folds `first` plus every `*args` entry, replacing the running value
/// whenever `should_replace` returns `true` for the numeric comparison.
fn reduce_variadic(
    arguments: &BoundArguments<Payload>,
    should_replace: impl Fn(f64, f64) -> bool,
) -> Result<Payload, PluginInvokeError> {
    let mut best = argument(arguments, "first")?.clone();
    let mut best_numeric = numeric(&best)?;
    for candidate in &arguments.extra_positional {
        let candidate_numeric = numeric(candidate)?;
        if should_replace(best_numeric, candidate_numeric) {
            best = candidate.clone();
            best_numeric = candidate_numeric;
        }
    }
    Ok(best)
}

// ============================================================================
// SECTION: DivisorsPlugin
// ============================================================================

/// Lists every positive divisor of `n`, in ascending order.
#[derive(Debug, Default)]
pub struct DivisorsPlugin;

impl Plugin for DivisorsPlugin {
    fn id(&self) -> PluginId {
        PluginId::new("divisors", "1")
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Parameter::required("n")])
    }

    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError> {
        let n = argument(arguments, "n")?
            .as_int()
            .ok_or_else(|| PluginInvokeError::InvalidArgument("n must be an integer".to_owned()))?;
        if n <= 0 {
            return Err(PluginInvokeError::InvalidArgument(
                "n must be a positive integer".to_owned(),
            ));
        }
        let divisors = (1..=n).filter(|candidate| n % candidate == 0).map(Payload::Int).collect();
        Ok(Payload::List(divisors))
    }
}
