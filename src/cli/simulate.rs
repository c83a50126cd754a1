//! Scripted simulation command implementation.

use super::output::{JsonScenario, JsonSimulation, JsonStep, describe_directive, format_scenario};
use super::{CliError, OutputFormat};
use armada::board::Coord;
use armada::scenario::{AttributeId, ShipId};
use armada::{CompileOptions, Scenario, ScenarioPackage, Trigger, compile};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One entry of the simulation script.
///
/// Exactly one of `event`, `ability` or `set` picks what the entry does;
/// the remaining fields fill in the trigger or address the written cell.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptEntry {
    /// Event name to fire.
    event: Option<String>,
    /// Ability index to use; requires `ship`.
    ability: Option<usize>,
    /// Attribute name to write, scoped by `team`/`player`/`ship`.
    set: Option<String>,
    /// The value for `set`.
    value: Option<f64>,
    team: Option<usize>,
    player: Option<usize>,
    /// A ship, by position in the scenario's ship list.
    ship: Option<usize>,
    #[serde(default)]
    builtins: BTreeMap<String, f64>,
    #[serde(default)]
    locations: BTreeMap<String, Vec<(u16, u16)>>,
}

impl ScriptEntry {
    fn label(&self) -> String {
        match (&self.event, self.ability, &self.set) {
            (Some(name), _, _) => format!("event {name}"),
            (None, Some(ability), _) => match self.ship {
                Some(ship) => format!("ability {ability} of ship {ship}"),
                None => format!("ability {ability}"),
            },
            (None, None, Some(name)) => format!("set {name}"),
            (None, None, None) => "empty entry".to_owned(),
        }
    }
}

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the package or script cannot be loaded. Step
/// failures are reported per step and do not abort the run: effects
/// committed before a step's error stand, matching the engine.
pub(crate) fn execute(
    package: &Path,
    script: &Path,
    seed: Option<u64>,
    budget: u32,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let package = ScenarioPackage::from_dir(package)?;
    let options = CompileOptions {
        action_budget: budget,
        seed,
    };
    let mut scenario = compile(&package, options)?;

    let text = fs::read_to_string(script)?;
    let entries: Vec<ScriptEntry> = serde_json::from_str(&text)?;

    if !quiet && format == OutputFormat::Text {
        match seed {
            Some(seed) => println!("Simulating '{}' with seed {seed}", scenario.name()),
            None => println!("Simulating '{}'", scenario.name()),
        }
        println!();
    }

    let mut steps = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let step = run_entry(&mut scenario, index, entry);
        if !quiet && format == OutputFormat::Text {
            print_step(&step);
        }
        steps.push(step);
    }

    match format {
        OutputFormat::Text => {
            println!();
            print!("{}", format_scenario(&scenario));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonSimulation {
                seed,
                steps,
                scenario: JsonScenario::from_scenario(&scenario),
            })?;
            println!("{json}");
        }
    }
    Ok(())
}

fn run_entry(scenario: &mut Scenario, index: usize, entry: &ScriptEntry) -> JsonStep {
    let label = entry.label();
    let outcome = apply(scenario, entry);
    // Effects committed before a failure stand, so directives drain either way.
    let directives = scenario
        .take_directives()
        .iter()
        .map(describe_directive)
        .collect();
    match outcome {
        Ok(visited) => JsonStep {
            index,
            label,
            visited,
            error: None,
            directives,
        },
        Err(message) => JsonStep {
            index,
            label,
            visited: None,
            error: Some(message),
            directives,
        },
    }
}

fn apply(scenario: &mut Scenario, entry: &ScriptEntry) -> Result<Option<u32>, String> {
    match (&entry.event, entry.ability, &entry.set) {
        (Some(name), None, None) => {
            let trigger = build_trigger(scenario, entry)?;
            scenario
                .trigger_event(name, trigger)
                .map(Some)
                .map_err(|e| e.to_string())
        }
        (None, Some(ability), None) => {
            let Some(index) = entry.ship else {
                return Err("ability entries need a `ship`".to_owned());
            };
            let ship = resolve_ship(scenario, index)?;
            let trigger = build_trigger(scenario, entry)?;
            scenario
                .trigger_ability(ship, ability, trigger)
                .map(Some)
                .map_err(|e| e.to_string())
        }
        (None, None, Some(name)) => {
            let Some(value) = entry.value else {
                return Err("set entries need a `value`".to_owned());
            };
            let id = resolve_attribute(scenario, entry, name)?;
            scenario
                .set_attribute(id, value)
                .map(|()| None)
                .map_err(|e| e.to_string())
        }
        _ => Err("each entry needs exactly one of `event`, `ability` or `set`".to_owned()),
    }
}

fn build_trigger(scenario: &Scenario, entry: &ScriptEntry) -> Result<Trigger, String> {
    let mut trigger = Trigger::new();
    if let Some(team) = entry.team {
        trigger = trigger.team(team);
    }
    if let Some(player) = entry.player {
        trigger = trigger.player(player);
    }
    if let Some(index) = entry.ship {
        trigger = trigger.ship(resolve_ship(scenario, index)?);
    }
    for (name, value) in &entry.builtins {
        trigger = trigger.builtin(name.as_str(), *value);
    }
    for (name, cells) in &entry.locations {
        let coords = cells.iter().map(|&(x, y)| Coord::new(x, y)).collect();
        trigger = trigger.location(name.as_str(), coords);
    }
    Ok(trigger)
}

fn resolve_ship(scenario: &Scenario, index: usize) -> Result<ShipId, String> {
    scenario
        .ships()
        .nth(index)
        .map(|(id, _)| id)
        .ok_or_else(|| format!("no ship at index {index}"))
}

fn resolve_attribute(
    scenario: &Scenario,
    entry: &ScriptEntry,
    name: &str,
) -> Result<AttributeId, String> {
    if let Some(index) = entry.ship {
        let (_, ship) = scenario
            .ships()
            .nth(index)
            .ok_or_else(|| format!("no ship at index {index}"))?;
        return find(ship.attributes(), name, "ship");
    }
    if let Some(player) = entry.player {
        let Some(team) = entry.team else {
            return Err("player-scoped writes need a `team`".to_owned());
        };
        let found = scenario
            .team(team)
            .and_then(|t| t.players().get(player))
            .ok_or_else(|| format!("no player {player} in team {team}"))?;
        return find(found.attributes(), name, "player");
    }
    if let Some(team) = entry.team {
        let found = scenario
            .team(team)
            .ok_or_else(|| format!("no team {team}"))?;
        return find(found.attributes(), name, "team");
    }
    find(scenario.attributes(), name, "scenario")
}

fn find<'a>(
    mut attributes: impl Iterator<Item = (&'a str, AttributeId)>,
    name: &str,
    level: &str,
) -> Result<AttributeId, String> {
    attributes
        .find(|(n, _)| *n == name)
        .map(|(_, id)| id)
        .ok_or_else(|| format!("no attribute '{name}' on the {level}"))
}

fn print_step(step: &JsonStep) {
    match (&step.error, step.visited) {
        (Some(message), _) => println!("[{}] {}: ERROR: {message}", step.index + 1, step.label),
        (None, Some(visited)) => {
            println!("[{}] {}: {visited} actions visited", step.index + 1, step.label);
        }
        (None, None) => println!("[{}] {}: done", step.index + 1, step.label),
    }
    for directive in &step.directives {
        println!("    -> {directive}");
    }
}
