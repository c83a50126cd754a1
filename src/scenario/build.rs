//! Compiling a document package into a runnable [`Scenario`].
//!
//! Compilation is one recursive descent over the document tree rooted at
//! `scenario.json`. Referenced documents are fetched from the package on
//! demand and parsed under a context rebased with
//! [`ParseContext::for_document`], so an error inside a referenced document
//! names that document. A ship or ability document referenced twice is
//! instantiated twice: every reference gets its own attribute cells.

use std::collections::BTreeMap;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value as Json;

use crate::board::Board;
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::package::ScenarioPackage;
use crate::pattern::Pattern;
use crate::rules::{Action, Builder, Level, ParseContext, Scope, ValueConstraint};
use crate::scenario::attributes::{Attribute, Listener, ListenerId, TriggerPolicy};
use crate::scenario::event::{ability_event, event_info};
use crate::scenario::registry::ForeignRegistry;
use crate::scenario::state::{Ability, Player, Scenario, ScenarioParts, Ship, ShipId, Team};
use crate::schema;

/// Knobs for [`compile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Ceiling on actions visited by one trigger cascade.
    pub action_budget: u32,
    /// Seed for the scenario's random stream; drawn from the OS when `None`.
    pub seed: Option<u64>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            action_budget: 1000,
            seed: None,
        }
    }
}

/// Compile a scenario package into a runnable [`Scenario`].
///
/// `foreign-attributes.json` and `board.json` are parsed first so the
/// registry and tile palette are available everywhere; the rest of the tree
/// is walked from `scenario.json`.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered, located at the document
/// and JSON path it was found at. Nothing is partially compiled: on error
/// the package is untouched and no scenario exists.
pub fn compile(package: &ScenarioPackage, options: CompileOptions) -> ParseResult<Scenario> {
    let registry = match package.entry("foreign-attributes.json") {
        Some((doc, text)) => {
            let json = parse_json(doc, text)?;
            let bootstrap = ForeignRegistry::default();
            ForeignRegistry::build(&ParseContext::new(doc, &bootstrap), &json)?
        }
        None => ForeignRegistry::default(),
    };

    let (doc, text) = package
        .entry("board.json")
        .ok_or_else(|| missing_root("board.json"))?;
    let json = parse_json(doc, text)?;
    let board = Board::build(&ParseContext::new(doc, &registry), &json)?;

    let (doc, text) = package
        .entry("scenario.json")
        .ok_or_else(|| missing_root("scenario.json"))?;
    let json = parse_json(doc, text)?;
    let mut compiler = Compiler {
        package,
        builder: Builder::default(),
    };
    let cx = ParseContext::new(doc, &registry).with_board(&board);
    let parsed = compiler.scenario(&cx, &json)?;

    let Compiler { mut builder, .. } = compiler;
    builder.attributes.sort_all_listeners(&builder.listeners);
    let mut ships = Vec::with_capacity(builder.ships.len());
    for slot in builder.ships {
        let Some(ship) = slot else {
            return Err(missing_root("ships"));
        };
        ships.push(ship);
    }

    Ok(Scenario::assemble(ScenarioParts {
        name: parsed.name,
        description: parsed.description,
        board,
        registry,
        scope: parsed.scope,
        teams: parsed.teams,
        ships,
        attributes: builder.attributes,
        listeners: builder.listeners,
        events: parsed.events,
        rolls: builder.rolls,
        budget: options.action_budget,
        rng: options.seed.map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64),
    }))
}

fn parse_json(document: &str, text: &str) -> ParseResult<Json> {
    serde_json::from_str(text).map_err(|err| {
        ParseError::new(
            document,
            "",
            ParseErrorKind::Json {
                message: err.to_string(),
            },
        )
    })
}

fn missing_root(name: &str) -> ParseError {
    ParseError::new(
        name,
        "",
        ParseErrorKind::MissingDocument {
            name: name.to_owned(),
        },
    )
}

/// What `scenario.json` itself contributes, before the arenas are sealed.
struct ParsedScenario {
    name: String,
    description: Option<String>,
    scope: Scope,
    teams: Vec<Team>,
    events: BTreeMap<String, Rc<[Action]>>,
}

/// The descent state: the package being read and the arenas being filled.
struct Compiler<'a> {
    package: &'a ScenarioPackage,
    builder: Builder,
}

impl<'a> Compiler<'a> {
    /// Fetch and parse a referenced document.
    ///
    /// The returned name is the package's own key, which outlives every
    /// context derived from it.
    fn fetch(&self, cx: &ParseContext<'_>, name: &str) -> ParseResult<(&'a str, Json)> {
        let (key, text) = self.package.entry(name).ok_or_else(|| {
            cx.error(ParseErrorKind::MissingDocument {
                name: name.to_owned(),
            })
        })?;
        Ok((key, parse_json(key, text)?))
    }

    fn scenario(&mut self, cx: &ParseContext<'a>, json: &Json) -> ParseResult<ParsedScenario> {
        let obj = schema::object(cx, json)?;
        schema::forbid_unknown(cx, obj, &["name", "description", "attributes", "teams", "events"])?;

        let name =
            schema::string(&cx.field("name"), schema::required(cx, obj, "name")?)?.to_owned();
        let description = obj
            .get("description")
            .map(|d| schema::string(&cx.field("description"), d))
            .transpose()?
            .map(str::to_owned);

        let scope = self.attribute_map(cx, Level::Scenario, obj.get("attributes"))?;
        let scoped_cx = cx.with_scope(Level::Scenario, Rc::clone(&scope));

        let teams_cx = scoped_cx.field("teams");
        let roster = schema::array(&teams_cx, schema::required(&scoped_cx, obj, "teams")?)?;
        if roster.is_empty() {
            return Err(teams_cx.invalid("a scenario needs at least 1 team"));
        }
        let mut teams = Vec::with_capacity(roster.len());
        for (i, entry) in roster.iter().enumerate() {
            let entry_cx = teams_cx.index(i);
            let reference = schema::string(&entry_cx, entry)?;
            teams.push(self.team(&entry_cx, reference, i)?);
        }

        let mut events = BTreeMap::new();
        if let Some(raw) = obj.get("events") {
            let events_cx = scoped_cx.field("events");
            let map = schema::object(&events_cx, raw)?;
            for (event_name, actions_json) in map {
                let entry_cx = events_cx.field(event_name);
                let Some(info) = event_info(event_name) else {
                    return Err(entry_cx.error(ParseErrorKind::UnknownEvent {
                        name: event_name.clone(),
                    }));
                };
                let handler_cx = entry_cx.with_event(info);
                let actions = Action::build_list(&mut self.builder, &handler_cx, actions_json)?;
                events.insert(event_name.clone(), Rc::from(actions));
            }
        }

        Ok(ParsedScenario {
            name,
            description,
            scope,
            teams,
            events,
        })
    }

    fn team(&mut self, cx: &ParseContext<'a>, reference: &str, index: usize) -> ParseResult<Team> {
        let (doc, json) = self.fetch(cx, &format!("teams/{reference}.json"))?;
        let team_cx = cx.for_document(doc).with_team(index);
        let obj = schema::object(&team_cx, &json)?;
        schema::forbid_unknown(&team_cx, obj, &["name", "attributes", "players"])?;

        let name = schema::string(&team_cx.field("name"), schema::required(&team_cx, obj, "name")?)?
            .to_owned();
        let scope = self.attribute_map(&team_cx, Level::Team, obj.get("attributes"))?;
        team_cx.registry().enforce(&team_cx, Level::Team, &scope)?;
        let scoped_cx = team_cx.with_scope(Level::Team, Rc::clone(&scope));

        let players_cx = scoped_cx.field("players");
        let roster = schema::array(&players_cx, schema::required(&scoped_cx, obj, "players")?)?;
        if roster.is_empty() {
            return Err(players_cx.invalid("a team needs at least 1 player"));
        }
        let mut players = Vec::with_capacity(roster.len());
        for (i, entry) in roster.iter().enumerate() {
            let entry_cx = players_cx.index(i);
            let reference = schema::string(&entry_cx, entry)?;
            players.push(self.player(&entry_cx, reference, index, i)?);
        }

        Ok(Team::new(name, scope, players))
    }

    fn player(
        &mut self,
        cx: &ParseContext<'a>,
        reference: &str,
        team: usize,
        index: usize,
    ) -> ParseResult<Player> {
        let (doc, json) = self.fetch(cx, &format!("players/{reference}.json"))?;
        let player_cx = cx.for_document(doc).with_player(team, index);
        let obj = schema::object(&player_cx, &json)?;
        schema::forbid_unknown(&player_cx, obj, &["name", "attributes", "ships"])?;

        let name = schema::string(
            &player_cx.field("name"),
            schema::required(&player_cx, obj, "name")?,
        )?
        .to_owned();
        let scope = self.attribute_map(&player_cx, Level::Player, obj.get("attributes"))?;
        player_cx
            .registry()
            .enforce(&player_cx, Level::Player, &scope)?;
        let scoped_cx = player_cx.with_scope(Level::Player, Rc::clone(&scope));

        let mut roster = Vec::new();
        if let Some(raw) = obj.get("ships") {
            let ships_cx = scoped_cx.field("ships");
            let list = schema::array(&ships_cx, raw)?;
            for (i, entry) in list.iter().enumerate() {
                let entry_cx = ships_cx.index(i);
                let reference = schema::string(&entry_cx, entry)?;
                // The handle exists before the ship document is parsed, so
                // rules inside it can point back at their own ship.
                let id = self.builder.alloc_ship();
                roster.push(id);
                self.ship(&entry_cx, reference, id, (team, index))?;
            }
        }

        Ok(Player::new(name, scope, roster))
    }

    fn ship(
        &mut self,
        cx: &ParseContext<'a>,
        reference: &str,
        id: ShipId,
        owner: (usize, usize),
    ) -> ParseResult<()> {
        let (doc, json) = self.fetch(cx, &format!("ships/{reference}.json"))?;
        let ship_cx = cx.for_document(doc).with_ship(id);
        let obj = schema::object(&ship_cx, &json)?;
        schema::forbid_unknown(&ship_cx, obj, &["name", "pattern", "attributes", "abilities"])?;

        let name = schema::string(&ship_cx.field("name"), schema::required(&ship_cx, obj, "name")?)?
            .to_owned();
        let pattern = Pattern::build(
            &ship_cx.field("pattern"),
            schema::required(&ship_cx, obj, "pattern")?,
        )?;
        let scope = self.attribute_map(&ship_cx, Level::Ship, obj.get("attributes"))?;
        ship_cx.registry().enforce(&ship_cx, Level::Ship, &scope)?;
        let scoped_cx = ship_cx.with_scope(Level::Ship, Rc::clone(&scope));

        let mut abilities = Vec::new();
        if let Some(raw) = obj.get("abilities") {
            let abilities_cx = scoped_cx.field("abilities");
            let list = schema::array(&abilities_cx, raw)?;
            for (i, entry) in list.iter().enumerate() {
                let entry_cx = abilities_cx.index(i);
                let reference = schema::string(&entry_cx, entry)?;
                abilities.push(self.ability(&entry_cx, reference)?);
            }
        }

        self.builder
            .finish_ship(id, Ship::new(name, scope, pattern, owner, abilities));
        Ok(())
    }

    fn ability(&mut self, cx: &ParseContext<'a>, reference: &str) -> ParseResult<Ability> {
        let (doc, json) = self.fetch(cx, &format!("abilities/{reference}.json"))?;
        let ability_cx = cx.for_document(doc);
        let obj = schema::object(&ability_cx, &json)?;
        schema::forbid_unknown(&ability_cx, obj, &["name", "pattern", "attributes", "actions"])?;

        let name = schema::string(
            &ability_cx.field("name"),
            schema::required(&ability_cx, obj, "name")?,
        )?
        .to_owned();
        let pattern = obj
            .get("pattern")
            .map(|p| Pattern::build(&ability_cx.field("pattern"), p))
            .transpose()?;
        let scope = self.attribute_map(&ability_cx, Level::Ability, obj.get("attributes"))?;
        let scoped_cx = ability_cx.with_scope(Level::Ability, Rc::clone(&scope));

        // Ability actions always run inside an `abilityUsed` event.
        let actions: Rc<[Action]> = match obj.get("actions") {
            Some(raw) => {
                let actions_cx = scoped_cx.field("actions").with_event(ability_event());
                Rc::from(Action::build_list(&mut self.builder, &actions_cx, raw)?)
            }
            None => Rc::from([]),
        };

        Ok(Ability::new(name, scope, pattern, actions))
    }

    /// Parse an `attributes` object into cells plus a name scope.
    ///
    /// Cells are allocated in a first pass over every entry, then
    /// constraints and listeners are parsed in a second pass with the
    /// finished scope layered, so they can reference sibling attributes
    /// regardless of declaration order.
    fn attribute_map(
        &mut self,
        cx: &ParseContext<'a>,
        level: Level,
        raw: Option<&Json>,
    ) -> ParseResult<Scope> {
        let mut scope = BTreeMap::new();
        let Some(raw) = raw else {
            return Ok(Rc::new(scope));
        };
        let attrs_cx = cx.field("attributes");
        let map = schema::object(&attrs_cx, raw)?;

        for (name, body) in map {
            let body_cx = attrs_cx.field(name);
            let (value, readonly) = match body {
                Json::Number(_) => (schema::number(&body_cx, body)?, false),
                Json::Object(fields) => {
                    schema::forbid_unknown(
                        &body_cx,
                        fields,
                        &["value", "readonly", "constraints", "listeners"],
                    )?;
                    let value = schema::number(
                        &body_cx.field("value"),
                        schema::required(&body_cx, fields, "value")?,
                    )?;
                    let readonly = fields
                        .get("readonly")
                        .map(|r| schema::boolean(&body_cx.field("readonly"), r))
                        .transpose()?
                        .unwrap_or(false);
                    (value, readonly)
                }
                other => {
                    return Err(body_cx.error(ParseErrorKind::Shape {
                        expected: "a number or an attribute object",
                        found: schema::describe(other).to_owned(),
                    }));
                }
            };
            let id = self.builder.attributes.alloc(Attribute::new(value, readonly));
            scope.insert(name.clone(), id);
        }

        let scope = Rc::new(scope);
        let scoped_cx = cx.with_scope(level, Rc::clone(&scope)).field("attributes");

        for (name, body) in map {
            let Json::Object(fields) = body else { continue };
            let Some(&id) = scope.get(name.as_str()) else {
                continue;
            };
            let body_cx = scoped_cx.field(name);

            if let Some(raw) = fields.get("constraints") {
                let list_cx = body_cx.field("constraints");
                let list = schema::array(&list_cx, raw)?;
                let mut constraints = Vec::with_capacity(list.len());
                for (i, entry) in list.iter().enumerate() {
                    constraints.push(ValueConstraint::build(
                        &mut self.builder,
                        &list_cx.index(i),
                        entry,
                    )?);
                }
                if let Some(cell) = self.builder.attributes.get_mut(id) {
                    cell.set_constraints(Rc::from(constraints));
                }
            }

            if let Some(raw) = fields.get("listeners") {
                let list_cx = body_cx.field("listeners");
                let list = schema::array(&list_cx, raw)?;
                for (i, entry) in list.iter().enumerate() {
                    let listener_id = self.listener(&list_cx.index(i), entry)?;
                    if let Some(cell) = self.builder.attributes.get_mut(id) {
                        cell.attach_listener(listener_id);
                    }
                }
            }
        }

        Ok(scope)
    }

    fn listener(&mut self, cx: &ParseContext<'_>, json: &Json) -> ParseResult<ListenerId> {
        let obj = schema::object(cx, json)?;
        schema::forbid_unknown(cx, obj, &["trigger", "priority", "constraint", "actions"])?;

        let trigger_cx = cx.field("trigger");
        let keyword = schema::string(&trigger_cx, schema::required(cx, obj, "trigger")?)?;
        let Some(policy) = TriggerPolicy::from_keyword(keyword) else {
            return Err(trigger_cx.invalid(format!("unknown listener trigger '{keyword}'")));
        };
        let priority = obj
            .get("priority")
            .map(|p| schema::integer(&cx.field("priority"), p))
            .transpose()?
            .unwrap_or(0);
        let constraint = ValueConstraint::build(
            &mut self.builder,
            &cx.field("constraint"),
            schema::required(cx, obj, "constraint")?,
        )?;
        let actions = Action::build_list(
            &mut self.builder,
            &cx.field("actions"),
            schema::required(cx, obj, "actions")?,
        )?;

        let id = ListenerId::new(self.builder.listeners.len());
        self.builder.listeners.push(Listener::new(
            priority,
            Rc::new(constraint),
            policy,
            Rc::from(actions),
        ));
        Ok(id)
    }
}
