//! End-to-end tests: compile full packages and drive them through events,
//! ability uses and external attribute writes.
//!
//! Run with: cargo test --release scenario_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use armada::board::Coord;
use armada::rules::{MessageDisplay, MessageTarget};
use armada::scenario::{AttributeId, ShipId};
use armada::{
    CompileOptions, Directive, EvalError, Level, Scenario, ScenarioPackage, Trigger, compile,
};

const BOARD: &str = r##"{
    "width": 6,
    "height": 4,
    "palette": {"~": "water", "#": "rock", "*": "debris"},
    "rows": ["~~~~~~", "~~##~~", "~~~~~~", "~~~~~~"]
}"##;

const FOREIGN: &str = r#"{"team": ["hits"], "ship": ["hull"]}"#;

const RED_TEAM: &str = r#"{"name": "Red", "attributes": {"hits": 0}, "players": ["alice"]}"#;
const BLUE_TEAM: &str = r#"{"name": "Blue", "attributes": {"hits": 0}, "players": ["bob"]}"#;
const ALICE: &str = r#"{"name": "Alice", "ships": ["sloop"]}"#;
const BOB: &str = r#"{"name": "Bob", "ships": ["sloop"]}"#;

const SLOOP: &str = r#"{
    "name": "Sloop",
    "pattern": {"center": [0, 0], "rows": [[1, 1]]},
    "attributes": {"hull": 4}
}"#;

/// The main fixture: a hit subtracts `@damage` from the hull, counts the hit
/// against the owning team, and scraps the ship once the hull is depleted.
const CONVOY: &str = r#"{
    "name": "Convoy Run",
    "description": "Escort the convoy past the reef.",
    "attributes": {"turn": 0},
    "teams": ["red", "blue"],
    "events": {
        "turnStart": [
            {
                "type": "setAttribute",
                "attribute": "local:scenario.turn",
                "value": {"type": "attributeReference", "attribute": "local:event.@turn"}
            }
        ],
        "shipHit": [
            {
                "type": "setAttribute",
                "attribute": "foreign:ship.hull",
                "value": {"type": "sum", "values": [
                    {"type": "attributeReference", "attribute": "foreign:ship.hull"},
                    {"type": "product", "values": [
                        -1,
                        {"type": "attributeReference", "attribute": "local:event.@damage"}
                    ]}
                ]}
            },
            {
                "type": "setAttribute",
                "attribute": "foreign:team.hits",
                "value": {"type": "sum", "values": [
                    {"type": "attributeReference", "attribute": "foreign:team.hits"},
                    1
                ]},
                "priority": 5
            },
            {
                "type": "destroyShip",
                "ship": "foreign",
                "priority": 10,
                "condition": {
                    "type": "valueMeetsConstraint",
                    "value": {"type": "attributeReference", "attribute": "foreign:ship.hull"},
                    "constraint": {"max": 0}
                }
            }
        ]
    }
}"#;

fn base_package() -> ScenarioPackage {
    let mut package = ScenarioPackage::new();
    package.insert("board.json", BOARD);
    package.insert("foreign-attributes.json", FOREIGN);
    package.insert("teams/red.json", RED_TEAM);
    package.insert("teams/blue.json", BLUE_TEAM);
    package.insert("players/alice.json", ALICE);
    package.insert("players/bob.json", BOB);
    package.insert("ships/sloop.json", SLOOP);
    package
}

fn convoy() -> ScenarioPackage {
    fleet_scenario(CONVOY)
}

/// The base fleet with a different `scenario.json` on top.
fn fleet_scenario(scenario: &str) -> ScenarioPackage {
    let mut package = base_package();
    package.insert("scenario.json", scenario);
    package
}

fn seeded(budget: u32) -> CompileOptions {
    CompileOptions {
        action_budget: budget,
        seed: Some(11),
    }
}

fn compiled(package: &ScenarioPackage) -> Scenario {
    compile(package, seeded(200)).unwrap()
}

fn attribute(scenario: &Scenario, name: &str) -> AttributeId {
    scenario
        .attributes()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| id)
        .unwrap()
}

fn value_of(scenario: &Scenario, name: &str) -> f64 {
    scenario.attribute_value(attribute(scenario, name)).unwrap()
}

fn team_value(scenario: &Scenario, team: usize, name: &str) -> f64 {
    let (_, id) = scenario.teams()[team]
        .attributes()
        .find(|(n, _)| *n == name)
        .unwrap();
    scenario.attribute_value(id).unwrap()
}

/// The first ship owned by the given team.
fn fleet_ship(scenario: &Scenario, team: usize) -> ShipId {
    scenario
        .ships()
        .find(|(_, ship)| ship.owner().0 == team)
        .map(|(id, _)| id)
        .unwrap()
}

fn hull_of(scenario: &Scenario, id: ShipId) -> f64 {
    let ship = scenario.ship(id).unwrap();
    let (_, hull) = ship.attributes().find(|(n, _)| *n == "hull").unwrap();
    scenario.attribute_value(hull).unwrap()
}

fn hit(scenario: &mut Scenario, id: ShipId, damage: f64) -> Result<u32, EvalError> {
    scenario.trigger_event(
        "shipHit",
        Trigger::new()
            .ship(id)
            .builtin("@damage", damage)
            .location("impact", vec![Coord::new(2, 1)]),
    )
}

#[test]
fn test_convoy_compiles() {
    let scenario = compiled(&convoy());
    assert_eq!(scenario.name(), "Convoy Run");
    assert_eq!(
        scenario.description(),
        Some("Escort the convoy past the reef.")
    );
    assert_eq!(scenario.board().width(), 6);
    assert_eq!(scenario.board().height(), 4);
    assert!(scenario.registry().contains(Level::Ship, "hull"));
    assert!(scenario.registry().contains(Level::Team, "hits"));
    assert_eq!(scenario.teams().len(), 2);
    assert_eq!(scenario.teams()[0].name(), "Red");
    assert_eq!(scenario.teams()[1].players()[0].name(), "Bob");
    assert_eq!(scenario.ships().count(), 2);
    let handlers: Vec<_> = scenario.event_handlers().collect();
    assert!(handlers.contains(&("shipHit", 3)));
    assert!(handlers.contains(&("turnStart", 1)));
    assert_eq!(scenario.action_budget(), 200);
}

#[test]
fn test_ship_hit_damages_and_scores() {
    let mut scenario = compiled(&convoy());
    let raider = fleet_ship(&scenario, 0);
    let visited = hit(&mut scenario, raider, 3.0).unwrap();
    // All three handlers are visited; the destroy condition does not hold.
    assert_eq!(visited, 3);
    assert_eq!(hull_of(&scenario, raider), 1.0);
    assert_eq!(team_value(&scenario, 0, "hits"), 1.0);
    assert_eq!(team_value(&scenario, 1, "hits"), 0.0);
    assert!(scenario.take_directives().is_empty());
}

#[test]
fn test_turn_start_updates_turn() {
    let mut scenario = compiled(&convoy());
    let visited = scenario
        .trigger_event(
            "turnStart",
            Trigger::new().team(1).player(0).builtin("@turn", 7.0),
        )
        .unwrap();
    assert_eq!(visited, 1);
    assert_eq!(value_of(&scenario, "turn"), 7.0);
}

#[test]
fn test_trigger_must_match_event_shape() {
    let mut scenario = compiled(&convoy());

    let err = scenario
        .trigger_event("turnStart", Trigger::new())
        .unwrap_err();
    assert_eq!(err, EvalError::MissingForeign { level: Level::Team });

    let err = scenario
        .trigger_event("turnStart", Trigger::new().team(0).player(0))
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::MissingBuiltin {
            name: "@turn".to_owned(),
        }
    );

    let err = scenario
        .trigger_event(
            "turnStart",
            Trigger::new()
                .team(0)
                .player(0)
                .builtin("@turn", 1.0)
                .builtin("@wind", 2.0),
        )
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::UnexpectedBuiltin {
            name: "@wind".to_owned(),
        }
    );

    let err = scenario
        .trigger_event("gameStart", Trigger::new().team(0))
        .unwrap_err();
    assert_eq!(err, EvalError::UnexpectedForeign { level: Level::Team });

    let err = scenario
        .trigger_event("highTide", Trigger::new())
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::UnknownEvent {
            name: "highTide".to_owned(),
        }
    );

    // A well-formed trigger for an unhandled event is a quiet no-op.
    assert_eq!(
        scenario.trigger_event("gameStart", Trigger::new()).unwrap(),
        0
    );
}

#[test]
fn test_owner_inference_and_mismatch() {
    let mut scenario = compiled(&convoy());
    let intruder = fleet_ship(&scenario, 1);

    let err = scenario
        .trigger_event(
            "shipHit",
            Trigger::new()
                .ship(intruder)
                .team(0)
                .builtin("@damage", 1.0)
                .location("impact", vec![Coord::new(2, 1)]),
        )
        .unwrap_err();
    assert_eq!(err, EvalError::ForeignMismatch { level: Level::Team });

    // A bare ship is enough; its owners are inferred.
    hit(&mut scenario, intruder, 1.0).unwrap();
    assert_eq!(team_value(&scenario, 1, "hits"), 1.0);
}

#[test]
fn test_depleted_hull_destroys_ship() {
    let mut scenario = compiled(&convoy());
    let target = fleet_ship(&scenario, 1);

    hit(&mut scenario, target, 2.0).unwrap();
    assert!(!scenario.ship(target).unwrap().destroyed());
    assert!(scenario.take_directives().is_empty());

    hit(&mut scenario, target, 2.0).unwrap();
    assert!(scenario.ship(target).unwrap().destroyed());
    assert_eq!(
        scenario.take_directives(),
        vec![Directive::ShipDestroyed { ship: target }]
    );
    // The roster no longer lists the wreck.
    assert!(scenario.teams()[1].players()[0].ships().is_empty());

    // Further hits still run their actions; re-destroying is a no-op.
    assert_eq!(hit(&mut scenario, target, 1.0).unwrap(), 3);
    assert_eq!(hull_of(&scenario, target), -1.0);
    assert!(scenario.take_directives().is_empty());
}

#[test]
fn test_out_of_bounds_impact_rejected() {
    let mut scenario = compiled(&convoy());
    let raider = fleet_ship(&scenario, 0);
    let err = scenario
        .trigger_event(
            "shipHit",
            Trigger::new()
                .ship(raider)
                .builtin("@damage", 1.0)
                .location("impact", vec![Coord::new(9, 9)]),
        )
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::OutOfBounds {
            coord: Coord::new(9, 9),
        }
    );
    // Sealing failed, so no handler ran.
    assert_eq!(hull_of(&scenario, raider), 4.0);
}

const WATCHTOWER: &str = r#"{
    "name": "Watchtower",
    "attributes": {
        "alarm": {
            "value": 0,
            "listeners": [
                {
                    "trigger": "once",
                    "constraint": {"min": 5},
                    "actions": [{
                        "type": "setAttribute",
                        "attribute": "local:scenario.flares",
                        "value": {"type": "sum", "values": [
                            {"type": "attributeReference", "attribute": "local:scenario.flares"},
                            1
                        ]}
                    }]
                },
                {
                    "trigger": "every",
                    "constraint": {"min": 5},
                    "actions": [{
                        "type": "setAttribute",
                        "attribute": "local:scenario.sirens",
                        "value": {"type": "sum", "values": [
                            {"type": "attributeReference", "attribute": "local:scenario.sirens"},
                            1
                        ]}
                    }]
                },
                {
                    "trigger": "intermittent",
                    "constraint": {"min": 5},
                    "actions": [{
                        "type": "setAttribute",
                        "attribute": "local:scenario.drills",
                        "value": {"type": "sum", "values": [
                            {"type": "attributeReference", "attribute": "local:scenario.drills"},
                            1
                        ]}
                    }]
                }
            ]
        },
        "flares": 0,
        "sirens": 0,
        "drills": 0
    },
    "teams": ["red", "blue"]
}"#;

#[test]
fn test_listener_policies_across_writes() {
    let mut scenario = compiled(&fleet_scenario(WATCHTOWER));
    let alarm = attribute(&scenario, "alarm");

    scenario.set_attribute(alarm, 6.0).unwrap();
    assert_eq!(value_of(&scenario, "flares"), 1.0);
    assert_eq!(value_of(&scenario, "sirens"), 1.0);
    assert_eq!(value_of(&scenario, "drills"), 1.0);

    // Still met: only `every` fires again.
    scenario.set_attribute(alarm, 7.0).unwrap();
    assert_eq!(value_of(&scenario, "flares"), 1.0);
    assert_eq!(value_of(&scenario, "sirens"), 2.0);
    assert_eq!(value_of(&scenario, "drills"), 1.0);

    // Unmet: nothing fires, but `intermittent` re-arms.
    scenario.set_attribute(alarm, 2.0).unwrap();
    assert_eq!(value_of(&scenario, "sirens"), 2.0);

    scenario.set_attribute(alarm, 9.0).unwrap();
    assert_eq!(value_of(&scenario, "flares"), 1.0);
    assert_eq!(value_of(&scenario, "sirens"), 3.0);
    assert_eq!(value_of(&scenario, "drills"), 2.0);
}

const SIGNAL: &str = r#"{
    "name": "Signal",
    "attributes": {
        "flag": {
            "value": 0,
            "listeners": [
                {
                    "trigger": "every",
                    "priority": 10,
                    "constraint": {},
                    "actions": [{
                        "type": "setAttribute",
                        "attribute": "local:scenario.log",
                        "value": {"type": "product", "values": [
                            {"type": "attributeReference", "attribute": "local:scenario.log"},
                            10
                        ]}
                    }]
                },
                {
                    "trigger": "every",
                    "priority": -5,
                    "constraint": {},
                    "actions": [{
                        "type": "setAttribute",
                        "attribute": "local:scenario.log",
                        "value": {"type": "sum", "values": [
                            {"type": "attributeReference", "attribute": "local:scenario.log"},
                            1
                        ]}
                    }]
                }
            ]
        },
        "log": 0
    },
    "teams": ["red", "blue"]
}"#;

#[test]
fn test_listeners_dispatch_in_priority_order() {
    let mut scenario = compiled(&fleet_scenario(SIGNAL));
    let flag = attribute(&scenario, "flag");
    scenario.set_attribute(flag, 1.0).unwrap();
    // Priority -5 increments first, then priority 10 multiplies: (0 + 1) * 10.
    assert_eq!(value_of(&scenario, "log"), 10.0);
}

const TANKER: &str = r#"{
    "name": "Tanker",
    "attributes": {
        "fuel": {"value": 10, "constraints": [{"min": 0, "max": 10}]},
        "boost": {"value": 99, "constraints": [{"max": 5}]},
        "depth": {"value": 30, "readonly": true}
    },
    "teams": ["red", "blue"]
}"#;

#[test]
fn test_constraints_fold_writes() {
    let mut scenario = compiled(&fleet_scenario(TANKER));

    // Initial values are stored as written, bounds or not.
    assert_eq!(value_of(&scenario, "boost"), 99.0);

    let fuel = attribute(&scenario, "fuel");
    scenario.set_attribute(fuel, 15.0).unwrap();
    assert_eq!(value_of(&scenario, "fuel"), 10.0);
    scenario.set_attribute(fuel, -3.0).unwrap();
    assert_eq!(value_of(&scenario, "fuel"), 0.0);
    scenario.set_attribute(fuel, 7.0).unwrap();
    assert_eq!(value_of(&scenario, "fuel"), 7.0);

    let boost = attribute(&scenario, "boost");
    scenario.set_attribute(boost, 7.0).unwrap();
    assert_eq!(value_of(&scenario, "boost"), 5.0);
}

#[test]
fn test_readonly_swallows_external_writes() {
    let mut scenario = compiled(&fleet_scenario(TANKER));
    let depth = attribute(&scenario, "depth");
    scenario.set_attribute(depth, 0.0).unwrap();
    assert_eq!(value_of(&scenario, "depth"), 30.0);
}

const ECHO: &str = r#"{
    "name": "Echo",
    "attributes": {
        "ping": {
            "value": 0,
            "listeners": [{
                "trigger": "every",
                "constraint": {"min": 1},
                "actions": [{
                    "type": "setAttribute",
                    "attribute": "local:scenario.ping",
                    "value": {"type": "sum", "values": [
                        {"type": "attributeReference", "attribute": "local:scenario.ping"},
                        1
                    ]}
                }]
            }]
        }
    },
    "teams": ["red", "blue"]
}"#;

#[test]
fn test_budget_stops_self_feeding_listener() {
    let options = CompileOptions {
        action_budget: 50,
        seed: Some(3),
    };
    let mut scenario = compile(&fleet_scenario(ECHO), options).unwrap();
    let ping = attribute(&scenario, "ping");
    let err = scenario.set_attribute(ping, 1.0).unwrap_err();
    assert_eq!(err, EvalError::BudgetExceeded { limit: 50 });
    // The external write plus one increment per visited action stand.
    assert_eq!(value_of(&scenario, "ping"), 51.0);
}

const LAST_STAND: &str = r#"{
    "name": "Last Stand",
    "attributes": {"resolve": 0},
    "teams": ["red", "blue"],
    "events": {
        "gameStart": [
            {"type": "setAttribute", "attribute": "local:scenario.resolve", "value": 1},
            {"type": "win", "priority": 1},
            {"type": "lose", "priority": 2}
        ]
    }
}"#;

const ROUT: &str = r#"{
    "name": "Rout",
    "teams": ["red", "blue"],
    "events": {"gameStart": [{"type": "lose"}]}
}"#;

#[test]
fn test_win_and_lose_are_unimplemented() {
    let mut scenario = compiled(&fleet_scenario(LAST_STAND));
    let err = scenario
        .trigger_event("gameStart", Trigger::new())
        .unwrap_err();
    assert_eq!(err, EvalError::Unimplemented { effect: "win" });
    // Effects committed before the failure stand.
    assert_eq!(value_of(&scenario, "resolve"), 1.0);

    let mut scenario = compiled(&fleet_scenario(ROUT));
    let err = scenario
        .trigger_event("gameStart", Trigger::new())
        .unwrap_err();
    assert_eq!(err, EvalError::Unimplemented { effect: "lose" });
}

const PATROL: &str = r#"{
    "name": "Patrol",
    "attributes": {"stage": 0},
    "teams": ["red", "blue"],
    "events": {
        "abilityUsed": [{
            "type": "setAttribute",
            "attribute": "local:scenario.stage",
            "value": {"type": "product", "values": [
                {"type": "attributeReference", "attribute": "local:scenario.stage"},
                10
            ]}
        }]
    }
}"#;

const GUNBOAT: &str = r#"{
    "name": "Gunboat",
    "pattern": {"center": [0, 0], "rows": [[1]]},
    "attributes": {"hull": 3},
    "abilities": ["volley"]
}"#;

const VOLLEY: &str = r#"{
    "name": "Volley",
    "attributes": {"shots": 2},
    "actions": [{
        "type": "setAttribute",
        "attribute": "local:scenario.stage",
        "value": {"type": "sum", "values": [
            {"type": "attributeReference", "attribute": "local:scenario.stage"},
            {"type": "attributeReference", "attribute": "local:ability.shots"}
        ]}
    }]
}"#;

fn patrol_package() -> ScenarioPackage {
    let mut package = fleet_scenario(PATROL);
    package.insert("players/alice.json", r#"{"name": "Alice", "ships": ["gunboat"]}"#);
    package.insert("ships/gunboat.json", GUNBOAT);
    package.insert("abilities/volley.json", VOLLEY);
    package
}

fn volley_trigger() -> Trigger {
    Trigger::new()
        .builtin("@targetX", 4.0)
        .builtin("@targetY", 2.0)
        .location("target", vec![Coord::new(4, 2)])
}

#[test]
fn test_ability_runs_own_actions_before_handlers() {
    let mut scenario = compiled(&patrol_package());
    let gunboat = fleet_ship(&scenario, 0);
    let visited = scenario
        .trigger_ability(gunboat, 0, volley_trigger())
        .unwrap();
    assert_eq!(visited, 2);
    // The ability adds its shots first, then the handler multiplies:
    // (0 + 2) * 10.
    assert_eq!(value_of(&scenario, "stage"), 20.0);
}

#[test]
fn test_ability_index_and_mismatch_rejected() {
    let mut scenario = compiled(&patrol_package());
    let gunboat = fleet_ship(&scenario, 0);

    let err = scenario
        .trigger_ability(gunboat, 3, volley_trigger())
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::InvalidAbility {
            ship: gunboat,
            index: 3,
        }
    );

    let err = scenario
        .trigger_ability(gunboat, 0, volley_trigger().ability(1))
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::ForeignMismatch {
            level: Level::Ability,
        }
    );

    let stranger = fleet_ship(&scenario, 1);
    let err = scenario
        .trigger_ability(gunboat, 0, volley_trigger().ship(stranger))
        .unwrap_err();
    assert_eq!(err, EvalError::ForeignMismatch { level: Level::Ship });
}

const BOMBARD: &str = r#"{
    "name": "Bombard",
    "teams": ["red", "blue"],
    "events": {
        "shipHit": [{"type": "setTile", "location": "impact", "tile": "debris"}],
        "shotMissed": [{"type": "replaceTile", "location": "impact", "tiles": ["rock", "debris"]}]
    }
}"#;

#[test]
fn test_tile_actions_rewrite_board() {
    let mut scenario = compiled(&fleet_scenario(BOMBARD));
    let target = fleet_ship(&scenario, 0);

    scenario
        .trigger_event(
            "shipHit",
            Trigger::new()
                .ship(target)
                .builtin("@damage", 1.0)
                .location("impact", vec![Coord::new(0, 0), Coord::new(5, 3)]),
        )
        .unwrap();
    let board = scenario.board();
    let debris = board.tile_id("debris").unwrap();
    assert_eq!(board.get(Coord::new(0, 0)), Some(debris));
    assert_eq!(board.get(Coord::new(5, 3)), Some(debris));
    // Untouched water stays water.
    assert_eq!(
        board.tile_name(board.get(Coord::new(1, 0)).unwrap()),
        Some("water")
    );

    scenario
        .trigger_event(
            "shotMissed",
            Trigger::new().team(1).player(0).location(
                "impact",
                vec![Coord::new(0, 3), Coord::new(1, 3), Coord::new(2, 3)],
            ),
        )
        .unwrap();
    let board = scenario.board();
    let rock = board.tile_id("rock").unwrap();
    let debris = board.tile_id("debris").unwrap();
    assert_eq!(board.get(Coord::new(0, 3)), Some(rock));
    assert_eq!(board.get(Coord::new(1, 3)), Some(debris));
    assert_eq!(board.get(Coord::new(2, 3)), Some(rock));
}

const HERALD: &str = r#"{
    "name": "Herald",
    "teams": ["red", "blue"],
    "events": {
        "shipHit": [
            {"type": "displayMessage", "display": "banner", "target": "foreign:player",
             "message": "Brace for impact!"},
            {"type": "displayMessage", "display": "chat", "target": "foreign:team",
             "message": "We are taking fire.", "priority": 1},
            {"type": "advanceTurn", "priority": 2}
        ]
    }
}"#;

#[test]
fn test_directives_resolve_targets_in_order() {
    let mut scenario = compiled(&fleet_scenario(HERALD));
    let target = fleet_ship(&scenario, 1);
    let visited = scenario
        .trigger_event(
            "shipHit",
            Trigger::new()
                .ship(target)
                .builtin("@damage", 1.0)
                .location("impact", vec![Coord::new(3, 0)]),
        )
        .unwrap();
    assert_eq!(visited, 3);
    assert_eq!(
        scenario.take_directives(),
        vec![
            Directive::Message {
                display: MessageDisplay::Banner,
                target: MessageTarget::Player { team: 1, player: 0 },
                text: "Brace for impact!".to_owned(),
                priority: 0,
            },
            Directive::Message {
                display: MessageDisplay::Chat,
                target: MessageTarget::Team(1),
                text: "We are taking fire.".to_owned(),
                priority: 1,
            },
            Directive::AdvanceTurn,
        ]
    );
    // Draining leaves the outbox empty.
    assert!(scenario.take_directives().is_empty());
}

const DRILLS: &str = r#"{
    "name": "Drills",
    "attributes": {"ran": 0},
    "teams": ["red", "blue"],
    "events": {
        "gameStart": [
            {"type": "setAttribute", "attribute": "local:scenario.ran", "value": 1,
             "condition": {"type": "fixed", "result": false}},
            {"type": "setAttribute", "attribute": "local:scenario.ran",
             "value": {"type": "sum", "values": [
                 {"type": "attributeReference", "attribute": "local:scenario.ran"},
                 2
             ]},
             "condition": {"type": "valueMeetsConstraint", "value": 3, "constraint": {"min": 2}}},
            {"type": "setAttribute", "attribute": "local:scenario.ran", "value": 99,
             "condition": {"type": "all", "inverted": true,
                           "conditions": [{"type": "fixed", "result": true}]}}
        ]
    }
}"#;

#[test]
fn test_gated_actions_still_charge_budget() {
    let mut scenario = compiled(&fleet_scenario(DRILLS));
    let visited = scenario.trigger_event("gameStart", Trigger::new()).unwrap();
    // Every action is visited and charged; only the middle one runs.
    assert_eq!(visited, 3);
    assert_eq!(value_of(&scenario, "ran"), 2.0);
}

const WEATHER: &str = r#"{
    "name": "Weather",
    "attributes": {"wind": 0},
    "teams": ["red", "blue"],
    "events": {
        "gameStart": [{
            "type": "setAttribute",
            "attribute": "local:scenario.wind",
            "value": {"type": "random", "min": 0, "max": 100}
        }]
    }
}"#;

#[test]
fn test_fixed_seed_reproduces_draws() {
    let package = fleet_scenario(WEATHER);
    let options = CompileOptions {
        action_budget: 200,
        seed: Some(99),
    };
    let mut first = compile(&package, options).unwrap();
    let mut second = compile(&package, options).unwrap();
    first.trigger_event("gameStart", Trigger::new()).unwrap();
    second.trigger_event("gameStart", Trigger::new()).unwrap();
    let wind = value_of(&first, "wind");
    assert_eq!(wind, value_of(&second, "wind"));
    assert!((0.0..100.0).contains(&wind));
}

const OMEN: &str = r#"{
    "name": "Omen",
    "attributes": {"portent": 0},
    "teams": ["red", "blue"],
    "events": {
        "gameStart": [{
            "type": "setAttribute",
            "attribute": "local:scenario.portent",
            "value": {"type": "random", "min": 0, "max": 1000, "generateOnce": true}
        }]
    }
}"#;

#[test]
fn test_generate_once_survives_retriggers() {
    let mut scenario = compiled(&fleet_scenario(OMEN));
    scenario.trigger_event("gameStart", Trigger::new()).unwrap();
    let first = value_of(&scenario, "portent");

    // Clobber the cell, then re-trigger: the memoized roll comes back.
    let portent = attribute(&scenario, "portent");
    scenario.set_attribute(portent, -1.0).unwrap();
    scenario.trigger_event("gameStart", Trigger::new()).unwrap();
    assert_eq!(value_of(&scenario, "portent"), first);
}
