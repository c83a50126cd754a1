// Allow unwrap and exact float comparisons in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::float_cmp))]
//! Armada: a declarative rule engine for grid-based naval strategy games.
//!
//! Scenarios are authored as a tree of JSON documents and compiled into a
//! typed rule graph:
//! - Deterministic evaluation from a seedable random stream
//! - Path-cited errors for every malformed document
//! - A bounded trigger loop, so authored rule cascades cannot hang the host
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │       Host game (triggers)          │
//! ├─────────────────────────────────────┤
//! │  Scenario state + attribute cells   │
//! ├─────────────────────────────────────┤
//! │  Rule graph (values, constraints,   │
//! │      conditions, actions)           │
//! └─────────────────────────────────────┘
//! ```
//!
//! The host compiles a [`ScenarioPackage`] once, then drives the
//! [`scenario::Scenario`] by firing events and writing attributes; rules run
//! synchronously and their effects come back as [`Directive`]s.

pub mod board;
pub mod error;
pub mod package;
pub mod pattern;
pub mod rules;
pub mod scenario;

mod schema;

pub use error::{EvalError, PackageError, ParseError};

// Re-export the compile entry points at the crate root for convenience
pub use package::ScenarioPackage;
pub use rules::{Directive, Level};
pub use scenario::{CompileOptions, Scenario, Trigger, compile};
