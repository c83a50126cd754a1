//! Numeric constraints: predicates and clamps over attribute values.

use serde_json::Value as Json;

use crate::error::{EvalResult, ParseResult};
use crate::rules::context::{Builder, ParseContext};
use crate::rules::value::Value;
use crate::scenario::{EventContext, Scenario};
use crate::schema;

/// A stateless numeric constraint.
///
/// The shape is inferred from which bound fields the author wrote:
/// `exactly` alone, `min` and/or `max`, or nothing at all. Bounds are
/// Values and are re-evaluated on every check, so dynamic bounds (attribute
/// reads, randomness) always see current state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ValueConstraint {
    /// No constraint: always met, never changes a value.
    Empty,
    /// Met only by exactly the bound; constrains everything to the bound.
    Equal(Value),
    /// A lower bound.
    AtLeast(Value),
    /// An upper bound.
    AtMost(Value),
    /// A lower and an upper bound.
    InRange {
        /// The lower bound.
        min: Value,
        /// The upper bound.
        max: Value,
    },
}

impl ValueConstraint {
    /// Build a constraint from its JSON object form.
    pub(crate) fn build(
        builder: &mut Builder,
        cx: &ParseContext<'_>,
        json: &Json,
    ) -> ParseResult<Self> {
        let obj = schema::object(cx, json)?;
        schema::forbid_unknown(cx, obj, &["exactly", "min", "max"])?;

        let exactly = obj.get("exactly");
        let min = obj.get("min");
        let max = obj.get("max");
        if exactly.is_some() && (min.is_some() || max.is_some()) {
            return Err(cx.invalid("`exactly` cannot be combined with `min` or `max`"));
        }

        if let Some(bound) = exactly {
            let bound = Value::build(builder, &cx.field("exactly"), bound)?;
            return Ok(ValueConstraint::Equal(bound));
        }
        let min = min
            .map(|v| Value::build(builder, &cx.field("min"), v))
            .transpose()?;
        let max = max
            .map(|v| Value::build(builder, &cx.field("max"), v))
            .transpose()?;
        Ok(match (min, max) {
            (Some(min), Some(max)) => ValueConstraint::InRange { min, max },
            (Some(min), None) => ValueConstraint::AtLeast(min),
            (None, Some(max)) => ValueConstraint::AtMost(max),
            (None, None) => ValueConstraint::Empty,
        })
    }

    /// Whether `value` meets the constraint.
    // Equality is exact by contract: constrained writes store the bound
    // itself, so a later check against the same bound compares identical
    // bit patterns.
    #[allow(clippy::float_cmp)]
    pub(crate) fn check(
        &self,
        world: &mut Scenario,
        ctx: &EventContext,
        value: f64,
    ) -> EvalResult<bool> {
        Ok(match self {
            ValueConstraint::Empty => true,
            ValueConstraint::Equal(bound) => value == bound.evaluate(world, ctx)?,
            ValueConstraint::AtLeast(min) => value >= min.evaluate(world, ctx)?,
            ValueConstraint::AtMost(max) => value <= max.evaluate(world, ctx)?,
            ValueConstraint::InRange { min, max } => {
                value >= min.evaluate(world, ctx)? && value <= max.evaluate(world, ctx)?
            }
        })
    }

    /// The nearest value meeting the constraint.
    ///
    /// With inverted dynamic bounds the lower bound wins; `f64::clamp`
    /// would panic there.
    pub(crate) fn constrain(
        &self,
        world: &mut Scenario,
        ctx: &EventContext,
        value: f64,
    ) -> EvalResult<f64> {
        Ok(match self {
            ValueConstraint::Empty => value,
            ValueConstraint::Equal(bound) => bound.evaluate(world, ctx)?,
            ValueConstraint::AtLeast(min) => {
                let min = min.evaluate(world, ctx)?;
                if value < min { min } else { value }
            }
            ValueConstraint::AtMost(max) => {
                let max = max.evaluate(world, ctx)?;
                if value > max { max } else { value }
            }
            ValueConstraint::InRange { min, max } => {
                let min = min.evaluate(world, ctx)?;
                let max = max.evaluate(world, ctx)?;
                if value < min {
                    min
                } else if value > max {
                    max
                } else {
                    value
                }
            }
        })
    }
}
