#![no_main]

//! Evaluation fuzzer: arbitrary command sequences against a compiled scenario.
//!
//! Every trigger and write must either apply or return a structured
//! evaluation error; the engine must never panic, and effects committed
//! before a failed step must leave the scenario usable for the next one.

use arbitrary::Arbitrary;
use armada::board::Coord;
use armada::scenario::{AttributeId, ShipId};
use armada::{CompileOptions, Scenario, ScenarioPackage, Trigger, compile};
use libfuzzer_sys::fuzz_target;

const SCENARIO: &str = r#"{
    "name": "Skirmish",
    "attributes": {
        "turn": 0,
        "alert": {
            "value": 0,
            "constraints": [{"min": 0, "max": 100}],
            "listeners": [{
                "trigger": "every",
                "constraint": {"min": 50},
                "actions": [{
                    "type": "setAttribute",
                    "attribute": "local:scenario.turn",
                    "value": {"type": "sum", "values": [
                        {"type": "attributeReference", "attribute": "local:scenario.turn"},
                        1
                    ]}
                }]
            }]
        }
    },
    "teams": ["red", "blue"],
    "events": {
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
                "type": "destroyShip",
                "ship": "foreign",
                "priority": 1,
                "condition": {
                    "type": "valueMeetsConstraint",
                    "value": {"type": "attributeReference", "attribute": "foreign:ship.hull"},
                    "constraint": {"max": 0}
                }
            }
        ],
        "turnStart": [{
            "type": "setAttribute",
            "attribute": "local:scenario.turn",
            "value": {"type": "attributeReference", "attribute": "local:event.@turn"}
        }]
    }
}"#;

const BOARD: &str = r#"{
    "width": 8,
    "height": 8,
    "palette": {"~": "water", "#": "rock"},
    "rows": ["~~~~~~~~", "~~~~~~~~", "~~~##~~~", "~~~~~~~~",
             "~~~~~~~~", "~~~~~~~~", "~~~~~~~~", "~~~~~~~~"]
}"#;

const FOREIGN: &str = r#"{"ship": ["hull"]}"#;
const RED: &str = r#"{"name": "Red", "players": ["alice"]}"#;
const BLUE: &str = r#"{"name": "Blue", "players": ["bob"]}"#;
const ALICE: &str = r#"{"name": "Alice", "ships": ["sloop"]}"#;
const BOB: &str = r#"{"name": "Bob", "ships": ["gunboat"]}"#;

const SLOOP: &str = r#"{
    "name": "Sloop",
    "pattern": {"center": [0, 0], "rows": [[1, 1]]},
    "attributes": {"hull": 4}
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
        "attribute": "local:scenario.turn",
        "value": {"type": "attributeReference", "attribute": "local:ability.shots"}
    }]
}"#;

const EVENTS: [&str; 8] = [
    "gameStart",
    "turnStart",
    "shipPlaced",
    "shipHit",
    "shipDestroyed",
    "shotMissed",
    "abilityUsed",
    "noSuchEvent",
];

const BUILTINS: [&str; 5] = ["@damage", "@turn", "@targetX", "@targetY", "@bogus"];
const LOCATIONS: [&str; 4] = ["impact", "footprint", "target", "nowhere"];

/// A fuzzer-generated step. Field values index into the fixture's events,
/// ships and attributes; the low bits of `slots` choose which trigger slots
/// to fill, so both well-formed and malformed payloads are exercised.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzStep {
    Event {
        name: u8,
        slots: u8,
        team: u8,
        player: u8,
        ship: u8,
        builtin: u8,
        payload: f64,
        location: u8,
        x: u8,
        y: u8,
    },
    Ability {
        ship: u8,
        index: u8,
        x: u8,
        y: u8,
    },
    Write {
        attribute: u8,
        value: f64,
    },
}

#[derive(Arbitrary, Debug)]
struct TriggerInput {
    seed: u64,
    steps: Vec<FuzzStep>,
}

fn compiled(seed: u64) -> Scenario {
    let mut package = ScenarioPackage::new();
    package.insert("scenario.json", SCENARIO);
    package.insert("board.json", BOARD);
    package.insert("foreign-attributes.json", FOREIGN);
    package.insert("teams/red.json", RED);
    package.insert("teams/blue.json", BLUE);
    package.insert("players/alice.json", ALICE);
    package.insert("players/bob.json", BOB);
    package.insert("ships/sloop.json", SLOOP);
    package.insert("ships/gunboat.json", GUNBOAT);
    package.insert("abilities/volley.json", VOLLEY);
    let options = CompileOptions {
        action_budget: 200,
        seed: Some(seed),
    };
    compile(&package, options).expect("fixture compiles")
}

fn pick<T: Copy>(items: &[T], index: u8) -> T {
    items[index as usize % items.len()]
}

fuzz_target!(|input: TriggerInput| {
    let steps: Vec<_> = input.steps.into_iter().take(50).collect();
    let mut scenario = compiled(input.seed);
    let ships: Vec<ShipId> = scenario.ships().map(|(id, _)| id).collect();
    let attributes: Vec<AttributeId> = scenario.attributes().map(|(_, id)| id).collect();

    for step in steps {
        match step {
            FuzzStep::Event {
                name,
                slots,
                team,
                player,
                ship,
                builtin,
                payload,
                location,
                x,
                y,
            } => {
                let mut trigger = Trigger::new();
                if slots & 1 != 0 {
                    trigger = trigger.team(team as usize % 3);
                }
                if slots & 2 != 0 {
                    trigger = trigger.player(player as usize % 2);
                }
                if slots & 4 != 0 {
                    trigger = trigger.ship(pick(&ships, ship));
                }
                if slots & 8 != 0 {
                    trigger = trigger.builtin(pick(&BUILTINS, builtin), payload);
                }
                if slots & 16 != 0 {
                    let coord = Coord::new(u16::from(x), u16::from(y));
                    trigger = trigger.location(pick(&LOCATIONS, location), vec![coord]);
                }
                let _ = scenario.trigger_event(pick(&EVENTS, name), trigger);
            }
            FuzzStep::Ability { ship, index, x, y } => {
                let trigger = Trigger::new()
                    .builtin("@targetX", f64::from(x))
                    .builtin("@targetY", f64::from(y))
                    .location("target", vec![Coord::new(u16::from(x) % 8, u16::from(y) % 8)]);
                let _ = scenario.trigger_ability(
                    pick(&ships, ship),
                    index as usize % 3,
                    trigger,
                );
            }
            FuzzStep::Write { attribute, value } => {
                let _ = scenario.set_attribute(pick(&attributes, attribute), value);
            }
        }

        // The outbox drains no matter how the step went.
        let _ = scenario.take_directives();
    }

    // The scenario stays internally consistent after arbitrary abuse.
    assert_eq!(scenario.ships().count(), ships.len());
    for id in ships {
        assert!(scenario.ship(id).is_some());
    }
});
