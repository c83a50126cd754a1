//! The compile-time environment threaded through every rule builder.
//!
//! [`ParseContext`] is immutable per call: extending the diagnostic path or
//! layering a scope returns a new context and leaves the caller's untouched,
//! so the environment unwinds automatically on every return path. The
//! mutable side of compilation (the arenas being filled in) travels
//! separately as [`Builder`].

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::board::Board;
use crate::error::{ParseError, ParseErrorKind};
use crate::rules::reference::Level;
use crate::scenario::{AttributeId, Attributes, EventInfo, ForeignRegistry, Listener, Ship, ShipId};

/// A name-to-cell map for one hierarchy level.
pub(crate) type Scope = Rc<BTreeMap<String, AttributeId>>;

/// The local attribute scopes currently layered, one slot per level.
#[derive(Debug, Clone, Default)]
struct Scopes {
    scenario: Option<Scope>,
    team: Option<Scope>,
    player: Option<Scope>,
    ship: Option<Scope>,
    ability: Option<Scope>,
}

impl Scopes {
    fn get(&self, level: Level) -> Option<&Scope> {
        match level {
            Level::Scenario => self.scenario.as_ref(),
            Level::Team => self.team.as_ref(),
            Level::Player => self.player.as_ref(),
            Level::Ship => self.ship.as_ref(),
            Level::Ability => self.ability.as_ref(),
            Level::Event => None,
        }
    }

    fn set(&mut self, level: Level, scope: Scope) {
        match level {
            Level::Scenario => self.scenario = Some(scope),
            Level::Team => self.team = Some(scope),
            Level::Player => self.player = Some(scope),
            Level::Ship => self.ship = Some(scope),
            Level::Ability => self.ability = Some(scope),
            Level::Event => {}
        }
    }
}

/// The immutable parsing environment for one JSON fragment.
#[derive(Debug, Clone)]
pub(crate) struct ParseContext<'a> {
    document: &'a str,
    path: String,
    scopes: Scopes,
    event: &'a EventInfo,
    registry: &'a ForeignRegistry,
    board: Option<&'a Board>,
    team: Option<usize>,
    player: Option<(usize, usize)>,
    ship: Option<ShipId>,
}

impl<'a> ParseContext<'a> {
    /// A root context for `document`, outside any event, with no scopes.
    pub(crate) fn new(document: &'a str, registry: &'a ForeignRegistry) -> Self {
        Self {
            document,
            path: String::new(),
            scopes: Scopes::default(),
            event: EventInfo::empty(),
            registry,
            board: None,
            team: None,
            player: None,
            ship: None,
        }
    }

    /// The document this context points into.
    #[allow(dead_code)]
    pub(crate) fn document(&self) -> &str {
        self.document
    }

    /// A context rebased into a referenced document.
    ///
    /// The path restarts at the new document's root; scopes, the event and
    /// the board carry over, so errors inside the referenced document name
    /// that document.
    pub(crate) fn for_document(&self, document: &'a str) -> Self {
        let mut cx = self.clone();
        cx.document = document;
        cx.path = String::new();
        cx
    }

    /// A context whose path descends into an object field.
    pub(crate) fn field(&self, name: &str) -> Self {
        let mut cx = self.clone();
        if cx.path.is_empty() {
            cx.path.push_str(name);
        } else {
            cx.path.push('.');
            cx.path.push_str(name);
        }
        cx
    }

    /// A context whose path descends into an array element.
    pub(crate) fn index(&self, i: usize) -> Self {
        let mut cx = self.clone();
        cx.path.push('[');
        cx.path.push_str(&i.to_string());
        cx.path.push(']');
        cx
    }

    /// An error located at this context's document and path.
    pub(crate) fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.document, &self.path, kind)
    }

    /// Shorthand for an [`ParseErrorKind::Invalid`] error here.
    pub(crate) fn invalid(&self, message: impl Into<String>) -> ParseError {
        self.error(ParseErrorKind::Invalid {
            message: message.into(),
        })
    }

    /// A context with a local attribute scope layered for one level.
    ///
    /// Other levels' scopes are preserved; an existing scope at the same
    /// level is shadowed for the subtree parsed under the new context.
    pub(crate) fn with_scope(&self, level: Level, scope: Scope) -> Self {
        let mut cx = self.clone();
        cx.scopes.set(level, scope);
        cx
    }

    /// A context parsing rules that belong to the given event.
    pub(crate) fn with_event(&self, event: &'a EventInfo) -> Self {
        let mut cx = self.clone();
        cx.event = event;
        cx
    }

    /// The event whose rules are being parsed; empty outside events.
    pub(crate) fn event(&self) -> &'a EventInfo {
        self.event
    }

    /// The scenario's foreign attribute registry.
    pub(crate) fn registry(&self) -> &'a ForeignRegistry {
        self.registry
    }

    /// A context carrying the built board, for tile name validation.
    pub(crate) fn with_board(&self, board: &'a Board) -> Self {
        let mut cx = self.clone();
        cx.board = Some(board);
        cx
    }

    /// The board, once built.
    pub(crate) fn board(&self) -> Option<&'a Board> {
        self.board
    }

    /// A context inside the team at `index`.
    pub(crate) fn with_team(&self, index: usize) -> Self {
        let mut cx = self.clone();
        cx.team = Some(index);
        cx
    }

    /// A context inside player `index` of the enclosing team.
    pub(crate) fn with_player(&self, team: usize, index: usize) -> Self {
        let mut cx = self.clone();
        cx.team = Some(team);
        cx.player = Some((team, index));
        cx
    }

    /// A context inside the ship with the given forward handle.
    ///
    /// The handle is allocated before the ship document is parsed, so rules
    /// inside the ship can capture a stable reference to their owner.
    pub(crate) fn with_ship(&self, id: ShipId) -> Self {
        let mut cx = self.clone();
        cx.ship = Some(id);
        cx
    }

    /// The enclosing team index, if any.
    pub(crate) fn team(&self) -> Option<usize> {
        self.team
    }

    /// The enclosing `(team, player)` indices, if any.
    pub(crate) fn player(&self) -> Option<(usize, usize)> {
        self.player
    }

    /// The enclosing ship handle, if any.
    pub(crate) fn ship(&self) -> Option<ShipId> {
        self.ship
    }

    /// Resolve a local attribute name against the scope for `level`.
    pub(crate) fn resolve(&self, level: Level, name: &str) -> Option<AttributeId> {
        self.scopes.get(level).and_then(|scope| scope.get(name)).copied()
    }

    /// Whether any scope is layered for `level`.
    pub(crate) fn has_scope(&self, level: Level) -> bool {
        self.scopes.get(level).is_some()
    }

    /// A root context for unit tests.
    #[cfg(test)]
    pub(crate) fn testing() -> ParseContext<'static> {
        ParseContext::new("test.json", Box::leak(Box::default()))
    }
}

/// The mutable compile-state: arenas filled while documents are parsed.
#[derive(Debug, Default)]
pub(crate) struct Builder {
    /// Every attribute cell in the scenario.
    pub(crate) attributes: Attributes,
    /// Every attribute listener, referenced by cells by index.
    pub(crate) listeners: Vec<Listener>,
    /// Ship slots; `None` marks a handle allocated but not yet finished.
    pub(crate) ships: Vec<Option<Ship>>,
    /// Roll-table slots allocated for generate-once random values.
    pub(crate) rolls: usize,
}

impl Builder {
    /// Allocate a roll-table slot for a generate-once random value.
    pub(crate) fn alloc_roll(&mut self) -> usize {
        let slot = self.rolls;
        self.rolls += 1;
        slot
    }

    /// Allocate a ship handle ahead of parsing the ship's body.
    pub(crate) fn alloc_ship(&mut self) -> ShipId {
        self.ships.push(None);
        ShipId::new(self.ships.len() - 1)
    }

    /// Fill a previously allocated ship slot.
    pub(crate) fn finish_ship(&mut self, id: ShipId, ship: Ship) {
        self.ships[id.index()] = Some(ship);
    }
}
