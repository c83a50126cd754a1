//! Boolean condition trees with per-node inversion.

use serde_json::Value as Json;

use crate::error::{EvalResult, ParseErrorKind, ParseResult};
use crate::rules::constraint::ValueConstraint;
use crate::rules::context::{Builder, ParseContext};
use crate::rules::value::Value;
use crate::scenario::{EventContext, Scenario};
use crate::schema;

fn apply_inversion(inverted: bool, result: bool) -> bool {
    if inverted { !result } else { result }
}

/// A compiled boolean condition.
///
/// Every composite node carries its own `inverted` flag, applied to that
/// node's result only. `Fixed` cannot be inverted; an inverted constant
/// would read as the opposite of what it says.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    /// A constant.
    Fixed {
        /// The result to return.
        result: bool,
    },
    /// True when every sub-condition is true; short-circuits on false.
    All {
        /// Invert this node's result.
        inverted: bool,
        /// The sub-conditions, checked left to right.
        conditions: Vec<Condition>,
    },
    /// True when any sub-condition is true; short-circuits on true.
    Any {
        /// Invert this node's result.
        inverted: bool,
        /// The sub-conditions, checked left to right.
        conditions: Vec<Condition>,
    },
    /// Counts true sub-conditions and checks the count against a constraint.
    Count {
        /// Invert this node's result.
        inverted: bool,
        /// The sub-conditions; all are checked, no short-circuit.
        conditions: Vec<Condition>,
        /// The constraint the count of true results must meet.
        count: ValueConstraint,
    },
    /// Evaluates a value and checks it against a constraint.
    ValueMeets {
        /// Invert this node's result.
        inverted: bool,
        /// The value to evaluate.
        value: Value,
        /// The constraint to check it against.
        constraint: ValueConstraint,
    },
}

impl Condition {
    /// The always-true condition, written `{}` by authors.
    pub(crate) const fn always() -> Self {
        Condition::Fixed { result: true }
    }

    /// Build a condition from its JSON form.
    pub(crate) fn build(
        builder: &mut Builder,
        cx: &ParseContext<'_>,
        json: &Json,
    ) -> ParseResult<Self> {
        let Some(obj) = json.as_object() else {
            return Err(cx.error(ParseErrorKind::Shape {
                expected: "a condition object",
                found: schema::describe(json).to_owned(),
            }));
        };
        if obj.is_empty() {
            return Ok(Condition::always());
        }
        let kind = schema::string(&cx.field("type"), schema::required(cx, obj, "type")?)?;
        let inverted = obj
            .get("inverted")
            .map(|i| schema::boolean(&cx.field("inverted"), i))
            .transpose()?
            .unwrap_or(false);
        match kind {
            "fixed" => {
                if obj.contains_key("inverted") {
                    return Err(cx.invalid("`fixed` conditions cannot be inverted"));
                }
                schema::forbid_unknown(cx, obj, &["type", "result"])?;
                let result =
                    schema::boolean(&cx.field("result"), schema::required(cx, obj, "result")?)?;
                Ok(Condition::Fixed { result })
            }
            "all" | "any" => {
                schema::forbid_unknown(cx, obj, &["type", "conditions", "inverted"])?;
                let conditions = Self::build_list(builder, cx, obj, kind)?;
                if kind == "all" {
                    Ok(Condition::All {
                        inverted,
                        conditions,
                    })
                } else {
                    Ok(Condition::Any {
                        inverted,
                        conditions,
                    })
                }
            }
            "some" => {
                schema::forbid_unknown(cx, obj, &["type", "conditions", "count", "inverted"])?;
                let conditions = Self::build_list(builder, cx, obj, kind)?;
                let count = ValueConstraint::build(
                    builder,
                    &cx.field("count"),
                    schema::required(cx, obj, "count")?,
                )?;
                Ok(Condition::Count {
                    inverted,
                    conditions,
                    count,
                })
            }
            "valueMeetsConstraint" => {
                schema::forbid_unknown(cx, obj, &["type", "value", "constraint", "inverted"])?;
                let value =
                    Value::build(builder, &cx.field("value"), schema::required(cx, obj, "value")?)?;
                let constraint = ValueConstraint::build(
                    builder,
                    &cx.field("constraint"),
                    schema::required(cx, obj, "constraint")?,
                )?;
                Ok(Condition::ValueMeets {
                    inverted,
                    value,
                    constraint,
                })
            }
            other => Err(cx
                .field("type")
                .invalid(format!("unknown condition type '{other}'"))),
        }
    }

    fn build_list(
        builder: &mut Builder,
        cx: &ParseContext<'_>,
        obj: &serde_json::Map<String, Json>,
        kind: &str,
    ) -> ParseResult<Vec<Condition>> {
        let list_cx = cx.field("conditions");
        let list = schema::array(&list_cx, schema::required(cx, obj, "conditions")?)?;
        if list.is_empty() {
            return Err(list_cx.invalid(format!("`{kind}` needs at least 1 condition")));
        }
        let mut built = Vec::with_capacity(list.len());
        for (i, condition) in list.iter().enumerate() {
            built.push(Condition::build(builder, &list_cx.index(i), condition)?);
        }
        Ok(built)
    }

    /// Check the condition against the current world and event.
    pub(crate) fn check(&self, world: &mut Scenario, ctx: &EventContext) -> EvalResult<bool> {
        match self {
            Condition::Fixed { result } => Ok(*result),
            Condition::All {
                inverted,
                conditions,
            } => {
                for condition in conditions {
                    if !condition.check(world, ctx)? {
                        return Ok(apply_inversion(*inverted, false));
                    }
                }
                Ok(apply_inversion(*inverted, true))
            }
            Condition::Any {
                inverted,
                conditions,
            } => {
                for condition in conditions {
                    if condition.check(world, ctx)? {
                        return Ok(apply_inversion(*inverted, true));
                    }
                }
                Ok(apply_inversion(*inverted, false))
            }
            Condition::Count {
                inverted,
                conditions,
                count,
            } => {
                let mut met = 0u32;
                for condition in conditions {
                    if condition.check(world, ctx)? {
                        met += 1;
                    }
                }
                let result = count.check(world, ctx, f64::from(met))?;
                Ok(apply_inversion(*inverted, result))
            }
            Condition::ValueMeets {
                inverted,
                value,
                constraint,
            } => {
                let evaluated = value.evaluate(world, ctx)?;
                let result = constraint.check(world, ctx, evaluated)?;
                Ok(apply_inversion(*inverted, result))
            }
        }
    }
}
