//! The rule-expression graph compiled out of scenario documents.
//!
//! Rules are built from four closed families:
//! - Values: numeric expression trees (literals, randomness, arithmetic,
//!   attribute reads)
//! - Value constraints: predicates and clamps over numbers
//! - Conditions: boolean trees with per-node inversion
//! - Actions: condition-gated effects on the scenario
//!
//! Construction is driven by an immutable [`ParseContext`] plus a mutable
//! [`Builder`] holding the arenas under construction; evaluation runs
//! against a live `Scenario` and an event context.

mod action;
mod condition;
mod constraint;
mod context;
mod reference;
mod value;

pub use action::{Directive, MessageDisplay, MessageTarget};
pub use reference::Level;

pub(crate) use action::{Action, run_all};
pub(crate) use constraint::ValueConstraint;
pub(crate) use context::{Builder, ParseContext, Scope};
#[cfg(test)]
pub(crate) use value::Value;
