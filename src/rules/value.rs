//! Numeric expression trees.

use serde_json::Value as Json;

use crate::error::{EvalResult, ParseErrorKind, ParseResult};
use crate::rules::context::{Builder, ParseContext};
use crate::rules::reference::AttributeRef;
use crate::scenario::{EventContext, Scenario};
use crate::schema;

/// A compiled numeric expression.
///
/// Values are immutable trees built once at load time. Evaluation is pure
/// except for `Random`, which draws from the scenario's seeded generator.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    /// A literal.
    Fixed(f64),
    /// A uniform random draw.
    Random(Box<Random>),
    /// The sum of at least two sub-values.
    Sum(Vec<Value>),
    /// The product of at least two sub-values.
    Product(Vec<Value>),
    /// A value rounded to the nearest multiple of a step.
    Rounded {
        /// The value to round.
        value: Box<Value>,
        /// The step; re-evaluated on every call, so it may be dynamic.
        step: Box<Value>,
    },
    /// A read through an attribute reference.
    Attribute(AttributeRef),
}

/// The parameters of one random draw.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Random {
    /// Inclusive lower bound.
    min: Value,
    /// Upper bound; exclusive unless a step makes it reachable.
    max: Value,
    /// Optional step restricting draws to `min + k * step`.
    step: Option<Value>,
    /// Roll-table slot when the draw is generated once and memoized.
    roll: Option<usize>,
}

impl Value {
    /// Build a value from its JSON form: a bare number or a tagged object.
    pub(crate) fn build(
        builder: &mut Builder,
        cx: &ParseContext<'_>,
        json: &Json,
    ) -> ParseResult<Self> {
        if let Some(n) = json.as_f64() {
            return Ok(Value::Fixed(n));
        }
        let Some(obj) = json.as_object() else {
            return Err(cx.error(ParseErrorKind::Shape {
                expected: "a number or a value object",
                found: schema::describe(json).to_owned(),
            }));
        };
        let kind = schema::string(&cx.field("type"), schema::required(cx, obj, "type")?)?;
        match kind {
            "random" => {
                schema::forbid_unknown(cx, obj, &["type", "min", "max", "step", "generateOnce"])?;
                let min = Value::build(builder, &cx.field("min"), schema::required(cx, obj, "min")?)?;
                let max = Value::build(builder, &cx.field("max"), schema::required(cx, obj, "max")?)?;
                let step = obj
                    .get("step")
                    .map(|s| Value::build(builder, &cx.field("step"), s))
                    .transpose()?;
                let once = obj
                    .get("generateOnce")
                    .map(|o| schema::boolean(&cx.field("generateOnce"), o))
                    .transpose()?
                    .unwrap_or(false);
                let roll = once.then(|| builder.alloc_roll());
                Ok(Value::Random(Box::new(Random {
                    min,
                    max,
                    step,
                    roll,
                })))
            }
            "sum" | "product" => {
                schema::forbid_unknown(cx, obj, &["type", "values"])?;
                let values_cx = cx.field("values");
                let values = schema::array(&values_cx, schema::required(cx, obj, "values")?)?;
                if values.len() < 2 {
                    return Err(values_cx.invalid(format!("`{kind}` needs at least 2 values")));
                }
                let mut built = Vec::with_capacity(values.len());
                for (i, v) in values.iter().enumerate() {
                    built.push(Value::build(builder, &values_cx.index(i), v)?);
                }
                if kind == "sum" {
                    Ok(Value::Sum(built))
                } else {
                    Ok(Value::Product(built))
                }
            }
            "round" => {
                schema::forbid_unknown(cx, obj, &["type", "value", "step"])?;
                let value =
                    Value::build(builder, &cx.field("value"), schema::required(cx, obj, "value")?)?;
                let step =
                    Value::build(builder, &cx.field("step"), schema::required(cx, obj, "step")?)?;
                Ok(Value::Rounded {
                    value: Box::new(value),
                    step: Box::new(step),
                })
            }
            "attributeReference" => {
                schema::forbid_unknown(cx, obj, &["type", "attribute"])?;
                let attribute_cx = cx.field("attribute");
                let text =
                    schema::string(&attribute_cx, schema::required(cx, obj, "attribute")?)?;
                Ok(Value::Attribute(AttributeRef::build(&attribute_cx, text)?))
            }
            other => Err(cx
                .field("type")
                .invalid(format!("unknown value type '{other}'"))),
        }
    }

    /// Evaluate the expression to a number.
    pub(crate) fn evaluate(&self, world: &mut Scenario, ctx: &EventContext) -> EvalResult<f64> {
        match self {
            Value::Fixed(n) => Ok(*n),
            Value::Random(random) => random.draw(world, ctx),
            Value::Sum(values) => {
                let mut total = 0.0;
                for value in values {
                    total += value.evaluate(world, ctx)?;
                }
                Ok(total)
            }
            Value::Product(values) => {
                let mut total = 1.0;
                for value in values {
                    total *= value.evaluate(world, ctx)?;
                }
                Ok(total)
            }
            Value::Rounded { value, step } => {
                let value = value.evaluate(world, ctx)?;
                let step = step.evaluate(world, ctx)?;
                Ok((value / step).round() * step)
            }
            Value::Attribute(reference) => reference.read(world, ctx),
        }
    }
}

impl Random {
    fn draw(&self, world: &mut Scenario, ctx: &EventContext) -> EvalResult<f64> {
        if let Some(slot) = self.roll
            && let Some(memoized) = world.roll(slot)
        {
            return Ok(memoized);
        }
        let min = self.min.evaluate(world, ctx)?;
        let max = self.max.evaluate(world, ctx)?;
        let drawn = match &self.step {
            None => {
                let r = world.rng_unit();
                min + r * (max - min)
            }
            Some(step) => {
                let step = step.evaluate(world, ctx)?;
                let r = world.rng_unit();
                (r * ((max - min) / step + 1.0)).floor() * step + min
            }
        };
        if let Some(slot) = self.roll {
            world.set_roll(slot, drawn);
        }
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::EventContext;

    fn build(json: &Json) -> Value {
        let mut builder = Builder::default();
        Value::build(&mut builder, &ParseContext::testing(), json).unwrap()
    }

    fn eval(value: &Value) -> f64 {
        let mut world = Scenario::testing();
        value.evaluate(&mut world, &EventContext::ambient()).unwrap()
    }

    #[test]
    fn test_literal() {
        assert_eq!(eval(&build(&serde_json::json!(42))), 42.0);
        assert_eq!(eval(&build(&serde_json::json!(-1.5))), -1.5);
    }

    #[test]
    fn test_sum_and_product_fold() {
        let sum = build(&serde_json::json!({"type": "sum", "values": [2, 3, 4]}));
        assert_eq!(eval(&sum), 9.0);
        let product = build(&serde_json::json!({"type": "product", "values": [2, 3, 4]}));
        assert_eq!(eval(&product), 24.0);
    }

    #[test]
    fn test_sum_arity() {
        let mut builder = Builder::default();
        let err = Value::build(
            &mut builder,
            &ParseContext::testing(),
            &serde_json::json!({"type": "sum", "values": [2]}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 2 values"));
    }

    #[test]
    fn test_round_to_step() {
        let down = build(&serde_json::json!({"type": "round", "value": 7, "step": 5}));
        assert_eq!(eval(&down), 5.0);
        let up = build(&serde_json::json!({"type": "round", "value": 8, "step": 5}));
        assert_eq!(eval(&up), 10.0);
    }

    #[test]
    fn test_nesting() {
        // (2 + 4) * 5, rounded to the nearest 4, is 32.
        let value = build(&serde_json::json!({
            "type": "round",
            "value": {"type": "product", "values": [{"type": "sum", "values": [2, 4]}, 5]},
            "step": 4,
        }));
        assert_eq!(eval(&value), 32.0);
    }

    #[test]
    fn test_random_stays_in_bounds() {
        let value = build(&serde_json::json!({"type": "random", "min": 3, "max": 9}));
        let mut world = Scenario::testing();
        let ctx = EventContext::ambient();
        for _ in 0..200 {
            let drawn = value.evaluate(&mut world, &ctx).unwrap();
            assert!((3.0..9.0).contains(&drawn), "out of range: {drawn}");
        }
    }

    #[test]
    fn test_random_step_lattice() {
        let value = build(&serde_json::json!({
            "type": "random", "min": 0, "max": 10, "step": 2.5,
        }));
        let mut world = Scenario::testing();
        let ctx = EventContext::ambient();
        for _ in 0..200 {
            let drawn = value.evaluate(&mut world, &ctx).unwrap();
            assert!(
                [0.0, 2.5, 5.0, 7.5, 10.0].contains(&drawn),
                "off lattice: {drawn}"
            );
        }
    }

    #[test]
    fn test_generate_once_memoizes() {
        let value = build(&serde_json::json!({
            "type": "random", "min": 0, "max": 1000, "generateOnce": true,
        }));
        let mut world = Scenario::testing();
        let ctx = EventContext::ambient();
        let first = value.evaluate(&mut world, &ctx).unwrap();
        let second = value.evaluate(&mut world, &ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_attribute_read() {
        let mut world = Scenario::testing();
        let id = world.testing_attribute(12.5);
        let value = Value::Attribute(AttributeRef::Local(id));
        assert_eq!(
            value.evaluate(&mut world, &EventContext::ambient()).unwrap(),
            12.5
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut builder = Builder::default();
        let err = Value::build(
            &mut builder,
            &ParseContext::testing(),
            &serde_json::json!({"type": "average", "values": [1, 2]}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown value type 'average'"));
    }
}
