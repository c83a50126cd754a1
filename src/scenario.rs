//! Compiled scenarios: the object hierarchy, events and the trigger loop.
//!
//! A scenario is compiled once from a [`crate::package::ScenarioPackage`]
//! and then driven by its host: external facts arrive as event triggers or
//! attribute writes, rules run synchronously to completion, and the
//! resulting instructions are drained as directives.

mod attributes;
mod build;
mod event;
mod registry;
mod state;

pub use attributes::AttributeId;
pub use build::{CompileOptions, compile};
pub use event::{EventInfo, Trigger, event_info, events};
pub use registry::ForeignRegistry;
pub use state::{Ability, Player, Scenario, Ship, ShipId, Team};

pub(crate) use attributes::{Attributes, Listener};
pub(crate) use event::{EvalState, EventContext};
