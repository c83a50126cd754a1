//! Error types for scenario loading and evaluation.

use std::fmt;
use std::path::PathBuf;

use crate::board::Coord;
use crate::rules::Level;
use crate::scenario::{AttributeId, ShipId};

/// A fatal error raised while compiling a scenario package.
///
/// Every parse error is annotated with the document it was found in and the
/// JSON path to the offending fragment. Errors are annotated at the point of
/// creation, so a failure inside a referenced document names that document,
/// not the one that referenced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    document: String,
    path: String,
    kind: ParseErrorKind,
}

impl ParseError {
    /// Creates an error located at `path` within `document`.
    #[must_use]
    pub fn new(document: impl Into<String>, path: impl Into<String>, kind: ParseErrorKind) -> Self {
        ParseError {
            document: document.into(),
            path: path.into(),
            kind,
        }
    }

    /// The document the error was found in, e.g. `ships/cruiser.json`.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The JSON path to the offending fragment, empty at document root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "An error occurred whilst parsing '{}'", self.document)?;
        if !self.path.is_empty() {
            write!(f, ": {}", self.path)?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for ParseError {}

/// The specific failure behind a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The document text is not valid JSON.
    Json {
        /// The underlying syntax error.
        message: String,
    },
    /// A fragment has the wrong JSON shape.
    Shape {
        /// What the schema expects here.
        expected: &'static str,
        /// What was actually found.
        found: String,
    },
    /// A required field is absent.
    MissingField {
        /// The field name.
        field: &'static str,
    },
    /// A field the schema does not define.
    UnknownField {
        /// The offending field name.
        field: String,
    },
    /// A structural rule violation not covered by a more specific kind.
    Invalid {
        /// Description of the violated rule.
        message: String,
    },
    /// A referenced document is missing from the package.
    MissingDocument {
        /// The expected document name, e.g. `players/alice.json`.
        name: String,
    },
    /// An attribute reference string does not match the reference grammar.
    BadReference {
        /// The reference text as written.
        reference: String,
        /// Why it was rejected.
        detail: &'static str,
    },
    /// A `local:` reference names a hierarchy level with no object in scope.
    NoScope {
        /// The level the reference asked for.
        level: Level,
    },
    /// A `local:` reference names an attribute the scoped object lacks.
    UnknownAttribute {
        /// The level that was searched.
        level: Level,
        /// The attribute name.
        name: String,
    },
    /// A `foreign:` reference outside any event's rules.
    ForeignOutsideEvent {
        /// The referenced level.
        level: Level,
    },
    /// An event built-in referenced outside any event's rules.
    BuiltinOutsideEvent {
        /// The built-in name as written.
        name: String,
    },
    /// A `foreign:` reference names a level the current event cannot supply.
    ForeignUnreachable {
        /// The unreachable level.
        level: Level,
        /// The event whose rules are being parsed.
        event: String,
    },
    /// A `foreign:` reference names an attribute absent from the registry.
    ForeignUndeclared {
        /// The referenced level.
        level: Level,
        /// The attribute name.
        name: String,
    },
    /// An object omits an attribute the foreign registry requires.
    RegistryMissing {
        /// The object's hierarchy level.
        level: Level,
        /// The required attribute name.
        name: String,
    },
    /// An event reference names a built-in the event does not carry.
    UnknownBuiltin {
        /// The built-in name, including its `@` prefix.
        name: String,
        /// The event whose rules are being parsed.
        event: String,
    },
    /// An event name the engine does not define.
    UnknownEvent {
        /// The event name as written.
        name: String,
    },
    /// A tile action names a location the event does not declare.
    UnknownLocation {
        /// The location name.
        name: String,
        /// The event whose rules are being parsed.
        event: String,
    },
    /// A tile action names a tile type absent from the board palette.
    UnknownTile {
        /// The tile type name.
        name: String,
    },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::Json { message } => write!(f, "invalid JSON: {message}"),
            ParseErrorKind::Shape { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseErrorKind::MissingField { field } => {
                write!(f, "missing required field `{field}`")
            }
            ParseErrorKind::UnknownField { field } => write!(f, "unknown field `{field}`"),
            ParseErrorKind::Invalid { message } => write!(f, "{message}"),
            ParseErrorKind::MissingDocument { name } => {
                write!(f, "referenced document '{name}' is not in the package")
            }
            ParseErrorKind::BadReference { reference, detail } => {
                write!(f, "malformed attribute reference '{reference}': {detail}")
            }
            ParseErrorKind::NoScope { level } => write!(f, "no {level} is in scope here"),
            ParseErrorKind::ForeignOutsideEvent { level } => {
                write!(f, "foreign {level} attributes are not available in this context")
            }
            ParseErrorKind::BuiltinOutsideEvent { name } => {
                write!(f, "event built-in '{name}' is not available in this context")
            }
            ParseErrorKind::UnknownAttribute { level, name } => {
                write!(f, "no attribute named '{name}' in the {level} scope")
            }
            ParseErrorKind::ForeignUnreachable { level, event } => {
                write!(
                    f,
                    "foreign {level} attributes are not reachable from event '{event}'"
                )
            }
            ParseErrorKind::ForeignUndeclared { level, name } => {
                write!(f, "'{name}' is not a registered foreign {level} attribute")
            }
            ParseErrorKind::RegistryMissing { level, name } => {
                write!(f, "every {level} must declare the foreign attribute '{name}'")
            }
            ParseErrorKind::UnknownBuiltin { name, event } => {
                write!(f, "event '{event}' has no built-in named '{name}'")
            }
            ParseErrorKind::UnknownEvent { name } => write!(f, "unknown event '{name}'"),
            ParseErrorKind::UnknownLocation { name, event } => {
                write!(f, "event '{event}' has no location named '{name}'")
            }
            ParseErrorKind::UnknownTile { name } => {
                write!(f, "no tile type named '{name}' in the board palette")
            }
        }
    }
}

/// A fatal error raised while evaluating compiled rules.
///
/// Evaluation errors abort the rest of the current cascade. Attribute writes
/// and directives committed before the failure stand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The cascade visited more actions than the configured ceiling allows.
    BudgetExceeded {
        /// The ceiling that was exceeded.
        limit: u32,
    },
    /// An effect the engine deliberately does not implement yet.
    Unimplemented {
        /// The effect name, e.g. `win`.
        effect: &'static str,
    },
    /// A trigger named an event the engine does not define.
    UnknownEvent {
        /// The event name as supplied.
        name: String,
    },
    /// The event declares a foreign kind the trigger did not supply.
    MissingForeign {
        /// The missing level.
        level: Level,
    },
    /// The trigger supplied a foreign kind the event does not declare.
    UnexpectedForeign {
        /// The surplus level.
        level: Level,
    },
    /// An explicitly supplied foreign object contradicts the owner of a
    /// more specific one.
    ForeignMismatch {
        /// The contradicting level.
        level: Level,
    },
    /// A team index outside the scenario.
    InvalidTeam {
        /// The supplied index.
        index: usize,
    },
    /// A player index outside its team.
    InvalidPlayer {
        /// The team index.
        team: usize,
        /// The supplied player index.
        index: usize,
    },
    /// A ship id that was never allocated.
    InvalidShip {
        /// The supplied id.
        id: ShipId,
    },
    /// An attribute id that was never allocated.
    InvalidAttribute {
        /// The supplied id.
        id: AttributeId,
    },
    /// A foreign object that does not carry a registry attribute it should.
    MissingForeignAttribute {
        /// The attribute's level.
        level: Level,
        /// The attribute's name.
        name: String,
    },
    /// An ability index outside its ship.
    InvalidAbility {
        /// The owning ship.
        ship: ShipId,
        /// The supplied ability index.
        index: usize,
    },
    /// The event declares a built-in the trigger did not supply.
    MissingBuiltin {
        /// The built-in name.
        name: String,
    },
    /// The trigger supplied a built-in the event does not declare.
    UnexpectedBuiltin {
        /// The surplus built-in name.
        name: String,
    },
    /// The event declares a location the trigger did not supply.
    MissingLocation {
        /// The location name.
        name: String,
    },
    /// The trigger supplied a location the event does not declare.
    UnexpectedLocation {
        /// The surplus location name.
        name: String,
    },
    /// A location coordinate outside the board.
    OutOfBounds {
        /// The offending coordinate.
        coord: Coord,
    },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::BudgetExceeded { limit } => {
                write!(f, "action budget of {limit} exceeded")
            }
            EvalError::Unimplemented { effect } => {
                write!(f, "the {effect} effect is not implemented")
            }
            EvalError::UnknownEvent { name } => write!(f, "unknown event '{name}'"),
            EvalError::MissingForeign { level } => {
                write!(f, "event requires a {level} but none was supplied")
            }
            EvalError::UnexpectedForeign { level } => {
                write!(f, "event does not carry a {level}")
            }
            EvalError::ForeignMismatch { level } => {
                write!(f, "supplied {level} does not own the more specific object")
            }
            EvalError::InvalidTeam { index } => write!(f, "no team at index {index}"),
            EvalError::InvalidPlayer { team, index } => {
                write!(f, "no player at index {index} in team {team}")
            }
            EvalError::InvalidShip { id } => write!(f, "no ship {id}"),
            EvalError::InvalidAttribute { id } => write!(f, "no attribute {id}"),
            EvalError::MissingForeignAttribute { level, name } => {
                write!(f, "the {level} does not carry foreign attribute '{name}'")
            }
            EvalError::InvalidAbility { ship, index } => {
                write!(f, "ship {ship} has no ability at index {index}")
            }
            EvalError::MissingBuiltin { name } => {
                write!(f, "event requires built-in '{name}'")
            }
            EvalError::UnexpectedBuiltin { name } => {
                write!(f, "event has no built-in '{name}'")
            }
            EvalError::MissingLocation { name } => {
                write!(f, "event requires location '{name}'")
            }
            EvalError::UnexpectedLocation { name } => {
                write!(f, "event has no location '{name}'")
            }
            EvalError::OutOfBounds { coord } => {
                write!(f, "coordinate {coord} is outside the board")
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// An I/O failure while loading a scenario package from disk.
#[derive(Debug)]
pub struct PackageError {
    path: PathBuf,
    source: std::io::Error,
}

impl PackageError {
    pub(crate) fn new(path: PathBuf, source: std::io::Error) -> Self {
        PackageError { path, source }
    }

    /// The path that could not be read.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for PackageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Result type for scenario compilation.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for rule evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
