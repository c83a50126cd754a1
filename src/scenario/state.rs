//! The live scenario: the object hierarchy, attribute state and triggers.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rand::Rng;
use rand::rngs::SmallRng;

use crate::board::{Board, Coord, TileId};
use crate::error::{EvalError, EvalResult};
use crate::pattern::Pattern;
use crate::rules::{Action, Directive, Level, Scope, run_all};
use crate::scenario::attributes::{AttributeId, Attributes, Listener};
use crate::scenario::event::{EvalState, EventContext, Trigger, event_info};
use crate::scenario::registry::ForeignRegistry;

/// A handle to one ship in the scenario's ship arena.
///
/// Handles stay valid after the ship is destroyed; the arena entry is kept
/// so late event handlers can still read the wreck's attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShipId(usize);

impl ShipId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index of this ship within the scenario's ship arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An ability instance carried by one ship.
#[derive(Debug, Clone)]
pub struct Ability {
    name: String,
    scope: Scope,
    pattern: Option<Pattern>,
    actions: Rc<[Action]>,
}

impl Ability {
    pub(crate) fn new(
        name: String,
        scope: Scope,
        pattern: Option<Pattern>,
        actions: Rc<[Action]>,
    ) -> Self {
        Self {
            name,
            scope,
            pattern,
            actions,
        }
    }

    /// The ability's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The targeting pattern, if the ability has one.
    #[must_use]
    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// The ability's named attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeId)> {
        self.scope.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub(crate) fn actions(&self) -> Rc<[Action]> {
        Rc::clone(&self.actions)
    }
}

/// A ship instance: a pattern of cells with attributes and abilities.
#[derive(Debug, Clone)]
pub struct Ship {
    name: String,
    scope: Scope,
    pattern: Pattern,
    owner: (usize, usize),
    destroyed: bool,
    abilities: Vec<Ability>,
}

impl Ship {
    pub(crate) fn new(
        name: String,
        scope: Scope,
        pattern: Pattern,
        owner: (usize, usize),
        abilities: Vec<Ability>,
    ) -> Self {
        Self {
            name,
            scope,
            pattern,
            owner,
            destroyed: false,
            abilities,
        }
    }

    /// The ship's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ship's cell pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The owning team and player, by index.
    #[must_use]
    pub const fn owner(&self) -> (usize, usize) {
        self.owner
    }

    /// Whether a rule has destroyed this ship.
    #[must_use]
    pub const fn destroyed(&self) -> bool {
        self.destroyed
    }

    /// The ship's abilities, in declaration order.
    #[must_use]
    pub fn abilities(&self) -> &[Ability] {
        &self.abilities
    }

    /// The ship's named attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeId)> {
        self.scope.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// A player: a named roster of ships with attributes.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    scope: Scope,
    ships: Vec<ShipId>,
}

impl Player {
    pub(crate) fn new(name: String, scope: Scope, ships: Vec<ShipId>) -> Self {
        Self { name, scope, ships }
    }

    /// The player's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The player's surviving ships, in declaration order.
    #[must_use]
    pub fn ships(&self) -> &[ShipId] {
        &self.ships
    }

    /// The player's named attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeId)> {
        self.scope.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// A team of players.
#[derive(Debug, Clone)]
pub struct Team {
    name: String,
    scope: Scope,
    players: Vec<Player>,
}

impl Team {
    pub(crate) fn new(name: String, scope: Scope, players: Vec<Player>) -> Self {
        Self {
            name,
            scope,
            players,
        }
    }

    /// The team's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The team's players, in declaration order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The team's named attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeId)> {
        self.scope.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// Everything a compiled scenario consists of.
pub(crate) struct ScenarioParts {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) board: Board,
    pub(crate) registry: ForeignRegistry,
    pub(crate) scope: Scope,
    pub(crate) teams: Vec<Team>,
    pub(crate) ships: Vec<Ship>,
    pub(crate) attributes: Attributes,
    pub(crate) listeners: Vec<Listener>,
    pub(crate) events: BTreeMap<String, Rc<[Action]>>,
    pub(crate) rolls: usize,
    pub(crate) budget: u32,
    pub(crate) rng: SmallRng,
}

/// A compiled, runnable scenario.
///
/// The scenario owns the whole rule graph and all mutable state. Rules run
/// synchronously on the caller's thread; the host observes effects through
/// attribute reads and by draining [`Scenario::take_directives`] after each
/// trigger.
pub struct Scenario {
    name: String,
    description: Option<String>,
    board: Board,
    registry: ForeignRegistry,
    scope: Scope,
    teams: Vec<Team>,
    ships: Vec<Ship>,
    attributes: Attributes,
    listeners: Vec<Listener>,
    events: BTreeMap<String, Rc<[Action]>>,
    rolls: Vec<Option<f64>>,
    rng: SmallRng,
    budget: u32,
    directives: Vec<Directive>,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("teams", &self.teams.len())
            .field("ships", &self.ships.len())
            .field("attributes", &self.attributes.len())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    pub(crate) fn assemble(parts: ScenarioParts) -> Self {
        Scenario {
            name: parts.name,
            description: parts.description,
            board: parts.board,
            registry: parts.registry,
            scope: parts.scope,
            teams: parts.teams,
            ships: parts.ships,
            attributes: parts.attributes,
            listeners: parts.listeners,
            events: parts.events,
            rolls: vec![None; parts.rolls],
            rng: parts.rng,
            budget: parts.budget,
            directives: Vec::new(),
        }
    }

    /// The scenario's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scenario's description, if one was declared.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The foreign-attribute contract the scenario was compiled under.
    #[must_use]
    pub fn registry(&self) -> &ForeignRegistry {
        &self.registry
    }

    /// The teams, in declaration order.
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// One team by index.
    #[must_use]
    pub fn team(&self, index: usize) -> Option<&Team> {
        self.teams.get(index)
    }

    /// One ship by handle.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(id.index())
    }

    /// Every ship in the arena, destroyed ones included.
    pub fn ships(&self) -> impl Iterator<Item = (ShipId, &Ship)> {
        self.ships
            .iter()
            .enumerate()
            .map(|(index, ship)| (ShipId::new(index), ship))
    }

    /// The scenario's own named attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeId)> {
        self.scope.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// The events with registered handlers and their action counts.
    pub fn event_handlers(&self) -> impl Iterator<Item = (&str, usize)> {
        self.events
            .iter()
            .map(|(name, actions)| (name.as_str(), actions.len()))
    }

    /// The action ceiling one trigger may spend.
    #[must_use]
    pub const fn action_budget(&self) -> u32 {
        self.budget
    }

    /// The current value of an attribute cell.
    #[must_use]
    pub fn attribute_value(&self, id: AttributeId) -> Option<f64> {
        self.attributes.value(id)
    }

    /// Write an attribute from outside any event.
    ///
    /// Runs the full write path under a fresh budget: constraints fold the
    /// value, then listeners dispatch and may cascade further actions.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidAttribute`] for a stale handle, or any
    /// error raised by listener actions the write cascades into.
    pub fn set_attribute(&mut self, id: AttributeId, value: f64) -> EvalResult<()> {
        if self.attributes.get(id).is_none() {
            return Err(EvalError::InvalidAttribute { id });
        }
        let ctx = EventContext::ambient();
        let mut eval = EvalState::new(self.budget);
        self.write_attribute(id, &ctx, &mut eval, value)
    }

    /// Fire one event and run its registered handlers.
    ///
    /// Returns how many actions the cascade visited. Effects committed
    /// before an error stand.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownEvent`] for a name outside the event
    /// catalogue, a seal error when the trigger does not carry exactly what
    /// the event declares, or any error the handlers raise while running.
    pub fn trigger_event(&mut self, name: &str, trigger: Trigger) -> EvalResult<u32> {
        let Some(info) = event_info(name) else {
            return Err(EvalError::UnknownEvent {
                name: name.to_owned(),
            });
        };
        let ctx = EventContext::seal(self, info, trigger)?;
        let mut eval = EvalState::new(self.budget);
        if let Some(actions) = self.events.get(name) {
            let actions = Rc::clone(actions);
            run_all(&actions, self, &ctx, &mut eval)?;
        }
        Ok(eval.executed())
    }

    /// Use a ship's ability: its own actions run first, then any
    /// `abilityUsed` handlers, all under one budget.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidAbility`] when the ship or ability index
    /// is unknown, [`EvalError::ForeignMismatch`] when the trigger names a
    /// different ship or ability, a seal error for a malformed trigger, or
    /// any error the actions raise while running.
    pub fn trigger_ability(
        &mut self,
        ship: ShipId,
        ability: usize,
        trigger: Trigger,
    ) -> EvalResult<u32> {
        let mut trigger = trigger;
        if let Some(explicit) = trigger.ship_slot()
            && explicit != ship
        {
            return Err(EvalError::ForeignMismatch { level: Level::Ship });
        }
        trigger.set_ship(ship);
        if let Some(explicit) = trigger.ability_slot()
            && explicit != ability
        {
            return Err(EvalError::ForeignMismatch {
                level: Level::Ability,
            });
        }
        trigger.set_ability(ability);

        let Some(info) = event_info("abilityUsed") else {
            return Err(EvalError::UnknownEvent {
                name: "abilityUsed".to_owned(),
            });
        };
        let ctx = EventContext::seal(self, info, trigger)?;
        let mut eval = EvalState::new(self.budget);

        let own = self
            .ship(ship)
            .and_then(|s| s.abilities.get(ability))
            .ok_or(EvalError::InvalidAbility {
                ship,
                index: ability,
            })?
            .actions();
        run_all(&own, self, &ctx, &mut eval)?;
        if let Some(handlers) = self.events.get("abilityUsed") {
            let handlers = Rc::clone(handlers);
            run_all(&handlers, self, &ctx, &mut eval)?;
        }
        Ok(eval.executed())
    }

    /// Drain the directives accumulated since the last drain.
    #[must_use]
    pub fn take_directives(&mut self) -> Vec<Directive> {
        std::mem::take(&mut self.directives)
    }

    pub(crate) fn push_directive(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// The stored value of a cell; compile-minted handles are always valid.
    pub(crate) fn cell_value(&self, id: AttributeId) -> f64 {
        self.attributes.value(id).unwrap_or_default()
    }

    /// Resolve a foreign attribute against the event's objects.
    pub(crate) fn foreign_cell(
        &self,
        ctx: &EventContext,
        level: Level,
        name: &str,
    ) -> EvalResult<AttributeId> {
        let scope = match level {
            Level::Team => {
                let index = ctx.foreign_team()?;
                &self
                    .team(index)
                    .ok_or(EvalError::InvalidTeam { index })?
                    .scope
            }
            Level::Player => {
                let (team, index) = ctx.foreign_player()?;
                &self
                    .team(team)
                    .and_then(|t| t.players.get(index))
                    .ok_or(EvalError::InvalidPlayer { team, index })?
                    .scope
            }
            Level::Ship => {
                let id = ctx.foreign_ship()?;
                &self.ship(id).ok_or(EvalError::InvalidShip { id })?.scope
            }
            Level::Scenario | Level::Ability | Level::Event => {
                return Err(EvalError::UnexpectedForeign { level });
            }
        };
        scope
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::MissingForeignAttribute {
                level,
                name: name.to_owned(),
            })
    }

    /// The full attribute write path.
    ///
    /// Readonly cells swallow the write. Otherwise the value folds through
    /// the cell's constraints in declared order, is stored, and every
    /// listener is notified with the stored value whether or not it changed.
    pub(crate) fn write_attribute(
        &mut self,
        id: AttributeId,
        ctx: &EventContext,
        eval: &mut EvalState,
        value: f64,
    ) -> EvalResult<()> {
        let (readonly, constraints) = match self.attributes.get(id) {
            Some(cell) => (cell.readonly(), cell.constraints()),
            None => return Err(EvalError::InvalidAttribute { id }),
        };
        if readonly {
            return Ok(());
        }
        let mut constrained = value;
        for constraint in constraints.iter() {
            constrained = constraint.constrain(self, ctx, constrained)?;
        }

        let listener_ids = match self.attributes.get_mut(id) {
            Some(cell) => {
                cell.set_raw(constrained);
                cell.listeners().to_vec()
            }
            None => Vec::new(),
        };

        for listener in listener_ids {
            let Some(entry) = self.listeners.get(listener.index()) else {
                continue;
            };
            let constraint = entry.constraint();
            let meets = constraint.check(self, ctx, constrained)?;
            let fired = self
                .listeners
                .get_mut(listener.index())
                .is_some_and(|l| l.note(meets));
            if fired {
                let actions = match self.listeners.get(listener.index()) {
                    Some(l) => l.actions(),
                    None => continue,
                };
                run_all(&actions, self, ctx, eval)?;
            }
        }
        Ok(())
    }

    /// Mark a ship destroyed and strip it from its owner's roster.
    ///
    /// Destroying an already-destroyed ship is a no-op.
    pub(crate) fn destroy_ship(&mut self, id: ShipId) -> EvalResult<()> {
        let Some(ship) = self.ships.get_mut(id.index()) else {
            return Err(EvalError::InvalidShip { id });
        };
        if ship.destroyed {
            return Ok(());
        }
        ship.destroyed = true;
        let (team, player) = ship.owner;
        if let Some(team) = self.teams.get_mut(team)
            && let Some(player) = team.players.get_mut(player)
        {
            player.ships.retain(|s| *s != id);
        }
        self.directives.push(Directive::ShipDestroyed { ship: id });
        Ok(())
    }

    pub(crate) fn set_tiles(&mut self, coords: &[Coord], tile: TileId) {
        self.board.set_all(coords, tile);
    }

    pub(crate) fn replace_tiles(&mut self, coords: &[Coord], tiles: &[TileId]) {
        self.board.fill_cycle(coords, tiles);
    }

    /// One uniform draw in `[0, 1)`.
    pub(crate) fn rng_unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    /// A memoized generate-once roll, if one is stored.
    pub(crate) fn roll(&self, slot: usize) -> Option<f64> {
        self.rolls.get(slot).copied().flatten()
    }

    pub(crate) fn set_roll(&mut self, slot: usize, value: f64) {
        if slot >= self.rolls.len() {
            self.rolls.resize(slot + 1, None);
        }
        self.rolls[slot] = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use serde_json::json;

    use super::*;
    use crate::rules::{Builder, ParseContext, Value, ValueConstraint};
    use crate::scenario::attributes::{Attribute, ListenerId, TriggerPolicy};

    impl Scenario {
        pub(crate) fn testing() -> Self {
            Scenario {
                name: "testing".to_owned(),
                description: None,
                board: Board::new(
                    1,
                    1,
                    vec!['~'],
                    vec!["water".to_owned()],
                    vec![TileId::new(0)],
                )
                .unwrap(),
                registry: ForeignRegistry::default(),
                scope: Scope::default(),
                teams: Vec::new(),
                ships: Vec::new(),
                attributes: Attributes::default(),
                listeners: Vec::new(),
                events: BTreeMap::new(),
                rolls: Vec::new(),
                rng: SmallRng::seed_from_u64(0),
                budget: 1000,
                directives: Vec::new(),
            }
        }

        pub(crate) fn testing_attribute(&mut self, value: f64) -> AttributeId {
            self.attributes.alloc(Attribute::new(value, false))
        }
    }

    fn advance_turn_action() -> Action {
        let mut builder = Builder::default();
        Action::build(
            &mut builder,
            &ParseContext::testing(),
            &json!({"type": "advanceTurn"}),
        )
        .unwrap()
    }

    #[test]
    fn test_readonly_cells_swallow_writes() {
        let mut world = Scenario::testing();
        let id = world.attributes.alloc(Attribute::new(3.0, true));
        world.set_attribute(id, 99.0).unwrap();
        assert_eq!(world.attribute_value(id), Some(3.0));
    }

    #[test]
    fn test_constraints_fold_in_declared_order() {
        let mut world = Scenario::testing();
        let id = world.testing_attribute(0.0);
        let constraints: Rc<[ValueConstraint]> = Rc::from([
            ValueConstraint::AtLeast(Value::Fixed(10.0)),
            ValueConstraint::AtMost(Value::Fixed(5.0)),
        ]);
        world
            .attributes
            .get_mut(id)
            .unwrap()
            .set_constraints(constraints);
        world.set_attribute(id, 7.0).unwrap();
        // 7 -> at least 10 -> 10 -> at most 5 -> 5.
        assert_eq!(world.attribute_value(id), Some(5.0));
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut world = Scenario::testing();
        let err = world.set_attribute(AttributeId::new(42), 1.0).unwrap_err();
        assert_eq!(
            err,
            EvalError::InvalidAttribute {
                id: AttributeId::new(42),
            }
        );
    }

    #[test]
    fn test_listener_policies_through_write_path() {
        let mut world = Scenario::testing();
        let id = world.testing_attribute(0.0);
        world.listeners.push(Listener::new(
            0,
            Rc::new(ValueConstraint::AtLeast(Value::Fixed(5.0))),
            TriggerPolicy::Every,
            Rc::from([advance_turn_action()]),
        ));
        world
            .attributes
            .get_mut(id)
            .unwrap()
            .attach_listener(ListenerId::new(0));

        world.set_attribute(id, 7.0).unwrap();
        assert_eq!(world.take_directives(), vec![Directive::AdvanceTurn]);
        // The same value again still notifies: dispatch is per write.
        world.set_attribute(id, 7.0).unwrap();
        assert_eq!(world.take_directives(), vec![Directive::AdvanceTurn]);
        world.set_attribute(id, 3.0).unwrap();
        assert!(world.take_directives().is_empty());
    }

    #[test]
    fn test_once_listener_fires_a_single_time() {
        let mut world = Scenario::testing();
        let id = world.testing_attribute(0.0);
        world.listeners.push(Listener::new(
            0,
            Rc::new(ValueConstraint::AtLeast(Value::Fixed(5.0))),
            TriggerPolicy::Once,
            Rc::from([advance_turn_action()]),
        ));
        world
            .attributes
            .get_mut(id)
            .unwrap()
            .attach_listener(ListenerId::new(0));

        world.set_attribute(id, 9.0).unwrap();
        world.set_attribute(id, 9.0).unwrap();
        assert_eq!(world.take_directives(), vec![Directive::AdvanceTurn]);
    }

    #[test]
    fn test_self_cascade_hits_the_ceiling() {
        let mut world = Scenario::testing();
        world.budget = 10;
        let id = world.testing_attribute(0.0);
        let mut names = BTreeMap::new();
        names.insert("fuse".to_owned(), id);
        let cx = ParseContext::testing().with_scope(Level::Scenario, Rc::new(names));
        let mut builder = Builder::default();
        let rewrite = Action::build(
            &mut builder,
            &cx,
            &json!({
                "type": "setAttribute",
                "attribute": "local:scenario.fuse",
                "value": {"type": "sum", "values": [
                    {"type": "attributeReference", "attribute": "local:scenario.fuse"},
                    1,
                ]},
            }),
        )
        .unwrap();
        world.listeners.push(Listener::new(
            0,
            Rc::new(ValueConstraint::Empty),
            TriggerPolicy::Every,
            Rc::from([rewrite]),
        ));
        world
            .attributes
            .get_mut(id)
            .unwrap()
            .attach_listener(ListenerId::new(0));

        let err = world.set_attribute(id, 1.0).unwrap_err();
        assert_eq!(err, EvalError::BudgetExceeded { limit: 10 });
        // Ten rewrites committed before the breaker tripped.
        assert_eq!(world.attribute_value(id), Some(11.0));
    }

    #[test]
    fn test_destroy_ship_is_idempotent() {
        let mut world = Scenario::testing();
        let scope = Scope::default();
        world.teams.push(Team::new(
            "reds".to_owned(),
            Rc::clone(&scope),
            vec![Player::new(
                "ada".to_owned(),
                Rc::clone(&scope),
                vec![ShipId::new(0)],
            )],
        ));
        world.ships.push(Ship::new(
            "sloop".to_owned(),
            scope,
            Pattern::from_rows((0, 0), &[vec![1]]).unwrap(),
            (0, 0),
            Vec::new(),
        ));

        world.destroy_ship(ShipId::new(0)).unwrap();
        assert!(world.ship(ShipId::new(0)).unwrap().destroyed());
        assert!(world.teams[0].players()[0].ships().is_empty());
        world.destroy_ship(ShipId::new(0)).unwrap();
        assert_eq!(
            world.take_directives(),
            vec![Directive::ShipDestroyed {
                ship: ShipId::new(0),
            }]
        );

        let err = world.destroy_ship(ShipId::new(9)).unwrap_err();
        assert_eq!(
            err,
            EvalError::InvalidShip {
                id: ShipId::new(9),
            }
        );
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let mut world = Scenario::testing();
        let err = world
            .trigger_event("shipSunk", Trigger::new())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownEvent {
                name: "shipSunk".to_owned(),
            }
        );
    }

    #[test]
    fn test_game_start_with_no_handlers_visits_nothing() {
        let mut world = Scenario::testing();
        assert_eq!(world.trigger_event("gameStart", Trigger::new()).unwrap(), 0);
        // Declared kinds are validated even with no handlers registered.
        let err = world
            .trigger_event("gameStart", Trigger::new().team(0))
            .unwrap_err();
        assert_eq!(err, EvalError::UnexpectedForeign { level: Level::Team });
    }
}
