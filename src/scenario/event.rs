//! The event catalogue and the per-trigger evaluation environment.

use std::collections::BTreeMap;

use crate::board::Coord;
use crate::error::{EvalError, EvalResult};
use crate::rules::Level;
use crate::scenario::{Scenario, ShipId};

/// The static shape of one event kind: which foreign objects reach it,
/// which built-in numbers it carries and which location sets it names.
#[derive(Debug, Clone, Copy)]
pub struct EventInfo {
    name: &'static str,
    foreign: &'static [Level],
    builtins: &'static [&'static str],
    locations: &'static [&'static str],
}

const EMPTY: EventInfo = EventInfo {
    name: "",
    foreign: &[],
    builtins: &[],
    locations: &[],
};

/// Every event kind the engine defines.
static CATALOGUE: &[EventInfo] = &[
    EventInfo {
        name: "gameStart",
        foreign: &[],
        builtins: &[],
        locations: &[],
    },
    EventInfo {
        name: "turnStart",
        foreign: &[Level::Team, Level::Player],
        builtins: &["@turn"],
        locations: &[],
    },
    EventInfo {
        name: "shipPlaced",
        foreign: &[Level::Team, Level::Player, Level::Ship],
        builtins: &[],
        locations: &["footprint"],
    },
    EventInfo {
        name: "shipHit",
        foreign: &[Level::Team, Level::Player, Level::Ship],
        builtins: &["@damage"],
        locations: &["impact"],
    },
    EventInfo {
        name: "shipDestroyed",
        foreign: &[Level::Team, Level::Player, Level::Ship],
        builtins: &["@damage"],
        locations: &["footprint"],
    },
    EventInfo {
        name: "shotMissed",
        foreign: &[Level::Team, Level::Player],
        builtins: &[],
        locations: &["impact"],
    },
    EventInfo {
        name: "abilityUsed",
        foreign: &[Level::Team, Level::Player, Level::Ship, Level::Ability],
        builtins: &["@targetX", "@targetY"],
        locations: &["target"],
    },
];

/// Look up an event kind by name.
#[must_use]
pub fn event_info(name: &str) -> Option<&'static EventInfo> {
    CATALOGUE.iter().find(|info| info.name == name)
}

/// All event kinds, in catalogue order.
pub fn events() -> impl Iterator<Item = &'static EventInfo> {
    CATALOGUE.iter()
}

/// The event kind ability action lists are parsed under.
pub(crate) fn ability_event() -> &'static EventInfo {
    event_info("abilityUsed").unwrap_or_else(EventInfo::empty)
}

impl EventInfo {
    /// The sentinel used when no event is in flight.
    pub(crate) const fn empty() -> &'static EventInfo {
        &EMPTY
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// The event's name, e.g. `shipHit`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The foreign object kinds a trigger for this event carries.
    #[must_use]
    pub const fn foreign_kinds(&self) -> &'static [Level] {
        self.foreign
    }

    /// The built-in names this event carries, `@`-prefixed.
    #[must_use]
    pub const fn builtins(&self) -> &'static [&'static str] {
        self.builtins
    }

    /// The location-set names this event carries.
    #[must_use]
    pub const fn locations(&self) -> &'static [&'static str] {
        self.locations
    }

    pub(crate) fn declares_foreign(&self, level: Level) -> bool {
        self.foreign.contains(&level)
    }

    pub(crate) fn declares_builtin(&self, name: &str) -> bool {
        self.builtins.contains(&name)
    }

    pub(crate) fn declares_location(&self, name: &str) -> bool {
        self.locations.contains(&name)
    }
}

/// The payload a host supplies when triggering an event.
///
/// Only the most specific foreign object needs to be given; owners are
/// inferred from it. Explicit values that contradict an inferred owner are
/// rejected when the trigger is sealed.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    team: Option<usize>,
    player: Option<usize>,
    ship: Option<ShipId>,
    ability: Option<usize>,
    builtins: BTreeMap<String, f64>,
    locations: BTreeMap<String, Vec<Coord>>,
}

impl Trigger {
    /// An empty trigger.
    #[must_use]
    pub fn new() -> Self {
        Trigger::default()
    }

    /// The foreign team, by index.
    #[must_use]
    pub fn team(mut self, index: usize) -> Self {
        self.team = Some(index);
        self
    }

    /// The foreign player, by index within its team.
    #[must_use]
    pub fn player(mut self, index: usize) -> Self {
        self.player = Some(index);
        self
    }

    /// The foreign ship.
    #[must_use]
    pub fn ship(mut self, id: ShipId) -> Self {
        self.ship = Some(id);
        self
    }

    /// The foreign ability, by index within its ship.
    #[must_use]
    pub fn ability(mut self, index: usize) -> Self {
        self.ability = Some(index);
        self
    }

    /// A built-in value, named with its `@` prefix.
    #[must_use]
    pub fn builtin(mut self, name: impl Into<String>, value: f64) -> Self {
        self.builtins.insert(name.into(), value);
        self
    }

    /// A location set; may be empty.
    #[must_use]
    pub fn location(mut self, name: impl Into<String>, coords: Vec<Coord>) -> Self {
        self.locations.insert(name.into(), coords);
        self
    }

    pub(crate) fn ship_slot(&self) -> Option<ShipId> {
        self.ship
    }

    pub(crate) fn ability_slot(&self) -> Option<usize> {
        self.ability
    }

    pub(crate) fn set_ship(&mut self, id: ShipId) {
        self.ship = Some(id);
    }

    pub(crate) fn set_ability(&mut self, index: usize) {
        self.ability = Some(index);
    }
}

/// The sealed, validated environment one cascade evaluates under.
#[derive(Debug, Clone)]
pub(crate) struct EventContext {
    team: Option<usize>,
    player: Option<(usize, usize)>,
    ship: Option<ShipId>,
    builtins: BTreeMap<String, f64>,
    locations: BTreeMap<String, Vec<Coord>>,
}

impl EventContext {
    /// The empty context used outside any event, e.g. for external
    /// attribute writes.
    pub(crate) fn ambient() -> Self {
        EventContext {
            team: None,
            player: None,
            ship: None,
            builtins: BTreeMap::new(),
            locations: BTreeMap::new(),
        }
    }

    /// Validate a trigger against an event kind and the world.
    ///
    /// Owner inference runs ability → ship → player → team; explicit values
    /// must agree with inferred ones. The declared foreign kinds, built-ins
    /// and locations must each be supplied exactly, and every location
    /// coordinate must be on the board.
    pub(crate) fn seal(
        world: &Scenario,
        info: &EventInfo,
        trigger: Trigger,
    ) -> EvalResult<Self> {
        let Trigger {
            team,
            player,
            ship,
            ability,
            builtins,
            locations,
        } = trigger;

        if ability.is_some() && ship.is_none() {
            return Err(EvalError::MissingForeign { level: Level::Ship });
        }

        let mut resolved_team = team;
        let mut resolved_player = player;
        if let Some(id) = ship {
            let carrier = world.ship(id).ok_or(EvalError::InvalidShip { id })?;
            let (owner_team, owner_player) = carrier.owner();
            if let Some(t) = resolved_team
                && t != owner_team
            {
                return Err(EvalError::ForeignMismatch { level: Level::Team });
            }
            if let Some(p) = resolved_player
                && p != owner_player
            {
                return Err(EvalError::ForeignMismatch {
                    level: Level::Player,
                });
            }
            resolved_team = Some(owner_team);
            resolved_player = Some(owner_player);
            if let Some(index) = ability
                && index >= carrier.abilities().len()
            {
                return Err(EvalError::InvalidAbility { ship: id, index });
            }
        }

        if resolved_player.is_some() && resolved_team.is_none() {
            return Err(EvalError::MissingForeign { level: Level::Team });
        }
        if let Some(t) = resolved_team {
            let members = world
                .team(t)
                .ok_or(EvalError::InvalidTeam { index: t })?
                .players();
            if let Some(p) = resolved_player
                && p >= members.len()
            {
                return Err(EvalError::InvalidPlayer { team: t, index: p });
            }
        }

        let supplied = [
            (Level::Team, resolved_team.is_some()),
            (Level::Player, resolved_player.is_some()),
            (Level::Ship, ship.is_some()),
            (Level::Ability, ability.is_some()),
        ];
        for (level, present) in supplied {
            let declared = info.declares_foreign(level);
            if declared && !present {
                return Err(EvalError::MissingForeign { level });
            }
            if !declared && present {
                return Err(EvalError::UnexpectedForeign { level });
            }
        }

        for name in info.builtins() {
            if !builtins.contains_key(*name) {
                return Err(EvalError::MissingBuiltin {
                    name: (*name).to_owned(),
                });
            }
        }
        for name in builtins.keys() {
            if !info.declares_builtin(name) {
                return Err(EvalError::UnexpectedBuiltin { name: name.clone() });
            }
        }

        for name in info.locations() {
            if !locations.contains_key(*name) {
                return Err(EvalError::MissingLocation {
                    name: (*name).to_owned(),
                });
            }
        }
        for (name, coords) in &locations {
            if !info.declares_location(name) {
                return Err(EvalError::UnexpectedLocation { name: name.clone() });
            }
            for coord in coords {
                if !world.board().in_bounds(*coord) {
                    return Err(EvalError::OutOfBounds { coord: *coord });
                }
            }
        }

        Ok(EventContext {
            team: resolved_team,
            player: match (resolved_team, resolved_player) {
                (Some(t), Some(p)) => Some((t, p)),
                _ => None,
            },
            ship,
            builtins,
            locations,
        })
    }

    pub(crate) fn foreign_team(&self) -> EvalResult<usize> {
        self.team
            .ok_or(EvalError::MissingForeign { level: Level::Team })
    }

    pub(crate) fn foreign_player(&self) -> EvalResult<(usize, usize)> {
        self.player.ok_or(EvalError::MissingForeign {
            level: Level::Player,
        })
    }

    pub(crate) fn foreign_ship(&self) -> EvalResult<ShipId> {
        self.ship
            .ok_or(EvalError::MissingForeign { level: Level::Ship })
    }

    pub(crate) fn builtin(&self, name: &str) -> EvalResult<f64> {
        self.builtins
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::MissingBuiltin {
                name: name.to_owned(),
            })
    }

    pub(crate) fn location(&self, name: &str) -> EvalResult<&[Coord]> {
        self.locations
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| EvalError::MissingLocation {
                name: name.to_owned(),
            })
    }
}

/// The mutable evaluation state one cascade shares: the action budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvalState {
    limit: u32,
    executed: u32,
}

impl EvalState {
    pub(crate) const fn new(limit: u32) -> Self {
        EvalState { limit, executed: 0 }
    }

    /// Charge one visited action against the budget.
    pub(crate) fn note_action(&mut self) -> EvalResult<()> {
        if self.executed >= self.limit {
            return Err(EvalError::BudgetExceeded { limit: self.limit });
        }
        self.executed += 1;
        Ok(())
    }

    /// How many actions this cascade has visited.
    pub(crate) const fn executed(&self) -> u32 {
        self.executed
    }
}
