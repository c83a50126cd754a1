#![no_main]

//! Compiler fuzzer: arbitrary text in place of each package document.
//!
//! Compilation must either succeed or return a structured parse error;
//! it must never panic, whatever the documents contain.

use armada::{CompileOptions, ScenarioPackage, compile};
use libfuzzer_sys::fuzz_target;

const SCENARIO: &str = r#"{
    "name": "Skirmish",
    "attributes": {"turn": 0},
    "teams": ["red"],
    "events": {
        "shipHit": [{
            "type": "setAttribute",
            "attribute": "foreign:ship.hull",
            "value": {"type": "sum", "values": [
                {"type": "attributeReference", "attribute": "foreign:ship.hull"},
                {"type": "attributeReference", "attribute": "local:event.@damage"}
            ]}
        }]
    }
}"#;

const BOARD: &str = r#"{
    "width": 4,
    "height": 4,
    "palette": {"~": "water"},
    "rows": ["~~~~", "~~~~", "~~~~", "~~~~"]
}"#;

const FOREIGN: &str = r#"{"ship": ["hull"]}"#;
const RED: &str = r#"{"name": "Red", "players": ["alice"]}"#;
const ALICE: &str = r#"{"name": "Alice", "ships": ["sloop"]}"#;

const SLOOP: &str = r#"{
    "name": "Sloop",
    "pattern": {"center": [0, 0], "rows": [[1]]},
    "attributes": {"hull": 2}
}"#;

/// The slot each fuzz case overwrites with arbitrary text.
const SLOTS: [&str; 6] = [
    "scenario.json",
    "board.json",
    "foreign-attributes.json",
    "teams/red.json",
    "players/alice.json",
    "ships/sloop.json",
];

fn valid_package() -> ScenarioPackage {
    let mut package = ScenarioPackage::new();
    package.insert("scenario.json", SCENARIO);
    package.insert("board.json", BOARD);
    package.insert("foreign-attributes.json", FOREIGN);
    package.insert("teams/red.json", RED);
    package.insert("players/alice.json", ALICE);
    package.insert("ships/sloop.json", SLOOP);
    package
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let options = CompileOptions {
        action_budget: 100,
        seed: Some(0),
    };

    // Swap the arbitrary text into each document slot in turn, leaving the
    // rest of the package well-formed.
    for slot in SLOTS {
        let mut package = valid_package();
        package.insert(slot, text);
        let _ = compile(&package, options);
    }
});
