//! Output formatting utilities for CLI.

use armada::rules::MessageTarget;
use armada::scenario::{AttributeId, Scenario, Ship};
use armada::{Directive, Level};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// JSON-serializable validation report.
#[derive(Debug, Serialize)]
pub(super) struct JsonValidation {
    /// Packages that compiled.
    pub(super) valid: usize,
    /// Packages that failed.
    pub(super) invalid: usize,
    /// Per-package results.
    pub(super) packages: Vec<JsonPackageReport>,
}

/// JSON-serializable per-package validation result.
#[derive(Debug, Serialize)]
pub(super) struct JsonPackageReport {
    /// Package directory as given on the command line.
    path: String,
    /// Whether the package compiled.
    ok: bool,
    /// The failure message, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl JsonValidation {
    /// Build a report from per-package check outcomes.
    pub(super) fn from_reports(reports: &[(PathBuf, Result<(), String>)]) -> Self {
        let packages: Vec<JsonPackageReport> = reports
            .iter()
            .map(|(path, outcome)| JsonPackageReport {
                path: path.display().to_string(),
                ok: outcome.is_ok(),
                error: outcome.as_ref().err().cloned(),
            })
            .collect();
        let invalid = packages.iter().filter(|report| !report.ok).count();
        Self {
            valid: packages.len() - invalid,
            invalid,
            packages,
        }
    }
}

/// JSON-serializable compiled scenario.
#[derive(Debug, Serialize)]
pub(super) struct JsonScenario {
    /// Scenario name.
    name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Per-trigger action budget.
    action_budget: u32,
    /// Board dimensions and rendered rows.
    board: JsonBoard,
    /// Foreign attribute contract, by level.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    foreign: BTreeMap<String, Vec<String>>,
    /// Scenario-level attribute values.
    attributes: BTreeMap<String, f64>,
    /// Teams in declaration order.
    teams: Vec<JsonTeam>,
    /// Handled events and their action counts.
    events: BTreeMap<String, usize>,
}

/// JSON-serializable board summary.
#[derive(Debug, Serialize)]
struct JsonBoard {
    /// Columns.
    width: u16,
    /// Rows.
    height: u16,
    /// One string of tile symbols per row.
    rows: Vec<String>,
}

/// JSON-serializable team.
#[derive(Debug, Serialize)]
struct JsonTeam {
    /// Team name.
    name: String,
    /// Team-level attribute values.
    attributes: BTreeMap<String, f64>,
    /// Players in declaration order.
    players: Vec<JsonPlayer>,
}

/// JSON-serializable player.
#[derive(Debug, Serialize)]
struct JsonPlayer {
    /// Player name.
    name: String,
    /// Player-level attribute values.
    attributes: BTreeMap<String, f64>,
    /// The player's fleet.
    ships: Vec<JsonShip>,
}

/// JSON-serializable ship.
#[derive(Debug, Serialize)]
struct JsonShip {
    /// Ship name.
    name: String,
    /// Number of pattern cells.
    cells: usize,
    /// Whether a rule has destroyed it.
    destroyed: bool,
    /// Ship-level attribute values.
    attributes: BTreeMap<String, f64>,
    /// Abilities in declaration order.
    abilities: Vec<JsonAbility>,
}

/// JSON-serializable ability.
#[derive(Debug, Serialize)]
struct JsonAbility {
    /// Ability name.
    name: String,
    /// Number of pattern cells, when the ability has a pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    cells: Option<usize>,
    /// Ability-level attribute values.
    attributes: BTreeMap<String, f64>,
}

impl JsonScenario {
    /// Capture a compiled scenario's structure and current values.
    pub(super) fn from_scenario(scenario: &Scenario) -> Self {
        let board = scenario.board();
        Self {
            name: scenario.name().to_owned(),
            description: scenario.description().map(str::to_owned),
            action_budget: scenario.action_budget(),
            board: JsonBoard {
                width: board.width(),
                height: board.height(),
                rows: board.render_rows(),
            },
            foreign: registry_map(scenario),
            attributes: attribute_map(scenario.attributes(), scenario),
            teams: scenario
                .teams()
                .iter()
                .enumerate()
                .map(|(team_index, team)| JsonTeam {
                    name: team.name().to_owned(),
                    attributes: attribute_map(team.attributes(), scenario),
                    players: team
                        .players()
                        .iter()
                        .enumerate()
                        .map(|(player_index, player)| JsonPlayer {
                            name: player.name().to_owned(),
                            attributes: attribute_map(player.attributes(), scenario),
                            // The arena keeps destroyed ships; rosters drop them.
                            ships: scenario
                                .ships()
                                .filter(|(_, ship)| ship.owner() == (team_index, player_index))
                                .map(|(_, ship)| JsonShip::from_ship(ship, scenario))
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
            events: scenario
                .event_handlers()
                .map(|(name, count)| (name.to_owned(), count))
                .collect(),
        }
    }
}

impl JsonShip {
    fn from_ship(ship: &Ship, scenario: &Scenario) -> Self {
        Self {
            name: ship.name().to_owned(),
            cells: ship.pattern().len(),
            destroyed: ship.destroyed(),
            attributes: attribute_map(ship.attributes(), scenario),
            abilities: ship
                .abilities()
                .iter()
                .map(|ability| JsonAbility {
                    name: ability.name().to_owned(),
                    cells: ability.pattern().map(armada::pattern::Pattern::len),
                    attributes: attribute_map(ability.attributes(), scenario),
                })
                .collect(),
        }
    }
}

/// Format a compiled scenario as human-readable text.
pub(super) fn format_scenario(scenario: &Scenario) -> String {
    let mut output = String::new();

    output.push_str(&format!("Scenario: {}\n", scenario.name()));
    if let Some(description) = scenario.description() {
        output.push_str(&format!("  {description}\n"));
    }
    output.push_str(&format!("Action budget: {}\n", scenario.action_budget()));

    let board = scenario.board();
    output.push('\n');
    output.push_str(&format!("Board ({} x {}):\n", board.width(), board.height()));
    for row in board.render_rows() {
        output.push_str(&format!("  {row}\n"));
    }

    let registry = scenario.registry();
    if !registry.is_empty() {
        output.push('\n');
        output.push_str("Foreign attributes:\n");
        for level in [Level::Team, Level::Player, Level::Ship] {
            let names: Vec<&str> = registry.names(level).collect();
            if !names.is_empty() {
                output.push_str(&format!("  {level}: {}\n", names.join(", ")));
            }
        }
    }

    if scenario.attributes().next().is_some() {
        output.push('\n');
        output.push_str("Attributes:\n");
        push_attributes(&mut output, "  ", scenario.attributes(), scenario);
    }

    output.push('\n');
    output.push_str("Teams:\n");
    for (team_index, team) in scenario.teams().iter().enumerate() {
        output.push_str(&format!("  [{team_index}] {}\n", team.name()));
        push_attributes(&mut output, "      ", team.attributes(), scenario);
        for (player_index, player) in team.players().iter().enumerate() {
            output.push_str(&format!("    [{player_index}] {}\n", player.name()));
            push_attributes(&mut output, "        ", player.attributes(), scenario);
            // The arena keeps destroyed ships; rosters drop them.
            let fleet = scenario
                .ships()
                .filter(|(_, ship)| ship.owner() == (team_index, player_index));
            for (id, ship) in fleet {
                let wrecked = if ship.destroyed() { " [destroyed]" } else { "" };
                output.push_str(&format!(
                    "      {id} {} ({} cells){wrecked}\n",
                    ship.name(),
                    ship.pattern().len()
                ));
                push_attributes(&mut output, "          ", ship.attributes(), scenario);
                for (ability_index, ability) in ship.abilities().iter().enumerate() {
                    output.push_str(&format!(
                        "        ability [{ability_index}] {}\n",
                        ability.name()
                    ));
                    push_attributes(&mut output, "            ", ability.attributes(), scenario);
                }
            }
        }
    }

    let handlers: Vec<(&str, usize)> = scenario.event_handlers().collect();
    if !handlers.is_empty() {
        output.push('\n');
        output.push_str("Events:\n");
        for (name, count) in handlers {
            output.push_str(&format!("  {name}: {count} actions\n"));
        }
    }

    output
}

/// JSON-serializable simulation transcript.
#[derive(Debug, Serialize)]
pub(super) struct JsonSimulation {
    /// The seed the run was compiled with, when fixed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) seed: Option<u64>,
    /// Per-entry outcomes in script order.
    pub(super) steps: Vec<JsonStep>,
    /// The scenario after the last entry.
    pub(super) scenario: JsonScenario,
}

/// JSON-serializable outcome of one script entry.
#[derive(Debug, Serialize)]
pub(super) struct JsonStep {
    /// Zero-based position in the script.
    pub(super) index: usize,
    /// Short description of the entry.
    pub(super) label: String,
    /// Actions visited by the trigger, for event and ability entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) visited: Option<u32>,
    /// The failure message, when the entry failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) error: Option<String>,
    /// Directives the entry produced, already described.
    pub(super) directives: Vec<String>,
}

/// Describe a directive in one line of text.
pub(super) fn describe_directive(directive: &Directive) -> String {
    match directive {
        Directive::AdvanceTurn => "advance turn".to_owned(),
        Directive::Message {
            display,
            target,
            text,
            priority,
        } => {
            let target = match target {
                MessageTarget::Team(team) => format!("team {team}"),
                MessageTarget::Player { team, player } => format!("player {team}.{player}"),
            };
            format!(
                "message [{} to {target}] \"{text}\" (priority {priority})",
                display.keyword()
            )
        }
        Directive::ShipDestroyed { ship } => format!("ship {ship} destroyed"),
    }
}

fn registry_map(scenario: &Scenario) -> BTreeMap<String, Vec<String>> {
    let registry = scenario.registry();
    let mut map = BTreeMap::new();
    for level in [Level::Team, Level::Player, Level::Ship] {
        let names: Vec<String> = registry.names(level).map(str::to_owned).collect();
        if !names.is_empty() {
            map.insert(level.to_string(), names);
        }
    }
    map
}

fn attribute_map<'a>(
    attributes: impl Iterator<Item = (&'a str, AttributeId)>,
    scenario: &Scenario,
) -> BTreeMap<String, f64> {
    attributes
        .map(|(name, id)| {
            (
                name.to_owned(),
                scenario.attribute_value(id).unwrap_or_default(),
            )
        })
        .collect()
}

fn push_attributes<'a>(
    output: &mut String,
    indent: &str,
    attributes: impl Iterator<Item = (&'a str, AttributeId)>,
    scenario: &Scenario,
) {
    for (name, id) in attributes {
        let value = scenario.attribute_value(id).unwrap_or_default();
        output.push_str(&format!("{indent}{name} = {value}\n"));
    }
}
