//! Attribute references and the textual reference grammar.
//!
//! References are written `<scope>:<level>.<name>`, e.g. `local:ship.hull`
//! or `foreign:team.score`. The reserved `@` prefix marks engine-provided
//! event built-ins (`local:event.@damage`); author-defined attribute names
//! never carry it. Local references bind to a concrete cell at build time;
//! foreign and event references are resolved against the live event context
//! at evaluation time.

use std::fmt;

use crate::error::{EvalResult, ParseErrorKind, ParseResult};
use crate::rules::context::ParseContext;
use crate::scenario::{AttributeId, EvalState, EventContext, Scenario};

/// A level of the scenario object hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// The scenario root.
    Scenario,
    /// A team.
    Team,
    /// A player within a team.
    Player,
    /// A ship within a player's fleet.
    Ship,
    /// An ability carried by a ship.
    Ability,
    /// The event context itself.
    Event,
}

impl Level {
    /// Parse a level keyword as it appears in reference strings.
    #[must_use]
    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "scenario" => Some(Level::Scenario),
            "team" => Some(Level::Team),
            "player" => Some(Level::Player),
            "ship" => Some(Level::Ship),
            "ability" => Some(Level::Ability),
            "event" => Some(Level::Event),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Scenario => "scenario",
            Level::Team => "team",
            Level::Player => "player",
            Level::Ship => "ship",
            Level::Ability => "ability",
            Level::Event => "event",
        };
        f.write_str(name)
    }
}

/// A readable reference to one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttributeRef {
    /// Bound at build time to one cell.
    Local(AttributeId),
    /// Resolved at evaluation time against the event's foreign object.
    Foreign {
        /// The hierarchy level the event supplies the object for.
        level: Level,
        /// The registry-declared attribute name.
        name: String,
    },
    /// An event built-in, read from the live event context.
    Builtin {
        /// The built-in name, including its `@` prefix.
        name: String,
    },
}

/// A writable reference: like [`AttributeRef`] minus read-only built-ins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TargetRef {
    /// Bound at build time to one cell.
    Local(AttributeId),
    /// Resolved at evaluation time against the event's foreign object.
    Foreign {
        /// The hierarchy level the event supplies the object for.
        level: Level,
        /// The registry-declared attribute name.
        name: String,
    },
}

/// Split and charset-check a reference string.
fn dissect<'t>(cx: &ParseContext<'_>, text: &'t str) -> ParseResult<(&'t str, Level, &'t str)> {
    let bad = |detail: &'static str| {
        cx.error(ParseErrorKind::BadReference {
            reference: text.to_owned(),
            detail,
        })
    };

    let Some((scope, rest)) = text.split_once(':') else {
        return Err(bad("expected a 'local:' or 'foreign:' prefix"));
    };
    if scope != "local" && scope != "foreign" {
        return Err(bad("the scope must be 'local' or 'foreign'"));
    }
    let Some((keyword, name)) = rest.split_once('.') else {
        return Err(bad("expected '<level>.<attribute>' after the scope"));
    };
    let Some(level) = Level::from_keyword(keyword) else {
        return Err(bad("unknown hierarchy level"));
    };
    let bare = name.strip_prefix('@').unwrap_or(name);
    if bare.is_empty()
        || !bare
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(bad(
            "attribute names use letters, digits, '_' and '-' only",
        ));
    }
    Ok((scope, level, name))
}

/// Common resolution for readable and writable references.
///
/// Returns `Ok(Err(builtin_name))` for a valid event built-in so the two
/// public builders can accept or reject it.
fn resolve<'t>(
    cx: &ParseContext<'_>,
    text: &'t str,
) -> ParseResult<Result<TargetRef, &'t str>> {
    let (scope, level, name) = dissect(cx, text)?;
    let bad = |detail: &'static str| {
        cx.error(ParseErrorKind::BadReference {
            reference: text.to_owned(),
            detail,
        })
    };

    if level == Level::Event {
        if scope == "foreign" {
            return Err(bad("event attributes are always local"));
        }
        if !name.starts_with('@') {
            return Err(bad("event built-ins carry the '@' prefix"));
        }
        let event = cx.event();
        if event.is_empty() {
            return Err(cx.error(ParseErrorKind::BuiltinOutsideEvent {
                name: name.to_owned(),
            }));
        }
        if !event.declares_builtin(name) {
            return Err(cx.error(ParseErrorKind::UnknownBuiltin {
                name: name.to_owned(),
                event: event.name().to_owned(),
            }));
        }
        return Ok(Err(name));
    }

    if name.starts_with('@') {
        return Err(bad("the '@' prefix is reserved for event built-ins"));
    }

    if scope == "local" {
        if !cx.has_scope(level) {
            return Err(cx.error(ParseErrorKind::NoScope { level }));
        }
        let Some(id) = cx.resolve(level, name) else {
            return Err(cx.error(ParseErrorKind::UnknownAttribute {
                level,
                name: name.to_owned(),
            }));
        };
        return Ok(Ok(TargetRef::Local(id)));
    }

    match level {
        Level::Scenario => Err(bad("the scenario is never foreign; use 'local:scenario'")),
        Level::Ability => Err(bad("abilities have no foreign attribute contract")),
        Level::Team | Level::Player | Level::Ship => {
            let event = cx.event();
            if event.is_empty() {
                return Err(cx.error(ParseErrorKind::ForeignOutsideEvent { level }));
            }
            if !event.declares_foreign(level) {
                return Err(cx.error(ParseErrorKind::ForeignUnreachable {
                    level,
                    event: event.name().to_owned(),
                }));
            }
            if !cx.registry().contains(level, name) {
                return Err(cx.error(ParseErrorKind::ForeignUndeclared {
                    level,
                    name: name.to_owned(),
                }));
            }
            Ok(Ok(TargetRef::Foreign {
                level,
                name: name.to_owned(),
            }))
        }
        Level::Event => unreachable!("handled above"),
    }
}

impl AttributeRef {
    /// Build a readable reference from its textual form.
    pub(crate) fn build(cx: &ParseContext<'_>, text: &str) -> ParseResult<Self> {
        match resolve(cx, text)? {
            Ok(TargetRef::Local(id)) => Ok(AttributeRef::Local(id)),
            Ok(TargetRef::Foreign { level, name }) => Ok(AttributeRef::Foreign { level, name }),
            Err(builtin) => Ok(AttributeRef::Builtin {
                name: builtin.to_owned(),
            }),
        }
    }

    /// Read the referenced attribute's current value.
    pub(crate) fn read(&self, world: &Scenario, ctx: &EventContext) -> EvalResult<f64> {
        match self {
            AttributeRef::Local(id) => Ok(world.cell_value(*id)),
            AttributeRef::Foreign { level, name } => {
                let id = world.foreign_cell(ctx, *level, name)?;
                Ok(world.cell_value(id))
            }
            AttributeRef::Builtin { name } => ctx.builtin(name),
        }
    }
}

impl TargetRef {
    /// Build a writable reference from its textual form.
    ///
    /// Event built-ins are rejected here: they are engine-supplied facts
    /// about the event, not scenario state.
    pub(crate) fn build(cx: &ParseContext<'_>, text: &str) -> ParseResult<Self> {
        match resolve(cx, text)? {
            Ok(target) => Ok(target),
            Err(_) => Err(cx.error(ParseErrorKind::BadReference {
                reference: text.to_owned(),
                detail: "event built-ins are read-only",
            })),
        }
    }

    /// Write a value through the reference, running the full set path.
    pub(crate) fn write(
        &self,
        world: &mut Scenario,
        ctx: &EventContext,
        eval: &mut EvalState,
        value: f64,
    ) -> EvalResult<()> {
        match self {
            TargetRef::Local(id) => world.write_attribute(*id, ctx, eval, value),
            TargetRef::Foreign { level, name } => {
                let id = world.foreign_cell(ctx, *level, name)?;
                world.write_attribute(id, ctx, eval, value)
            }
        }
    }
}
