//! Condition-gated actions and the directives they emit.

use serde_json::Value as Json;

use crate::board::TileId;
use crate::error::{EvalError, EvalResult, ParseErrorKind, ParseResult};
use crate::rules::condition::Condition;
use crate::rules::context::{Builder, ParseContext};
use crate::rules::reference::{Level, TargetRef};
use crate::rules::value::Value;
use crate::scenario::{EvalState, EventContext, Scenario, ShipId};
use crate::schema;

/// Where a message should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDisplay {
    /// The scrolling chat log.
    Chat,
    /// A transient banner over the board.
    Banner,
    /// The system notification area.
    System,
}

impl MessageDisplay {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "chat" => Some(MessageDisplay::Chat),
            "banner" => Some(MessageDisplay::Banner),
            "system" => Some(MessageDisplay::System),
            _ => None,
        }
    }

    /// The keyword this display type is written as.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            MessageDisplay::Chat => "chat",
            MessageDisplay::Banner => "banner",
            MessageDisplay::System => "system",
        }
    }
}

/// Who a message is addressed to, resolved to concrete indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    /// Every player of one team.
    Team(usize),
    /// A single player.
    Player {
        /// The owning team's index.
        team: usize,
        /// The player's index within the team.
        player: usize,
    },
}

/// An instruction to the embedding game, produced by executed actions.
///
/// The engine never acts on these itself; the host drains them through
/// [`Scenario::take_directives`] after each trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// End the current turn.
    AdvanceTurn,
    /// Show a message to a team or player.
    Message {
        /// Where to show it.
        display: MessageDisplay,
        /// Who to show it to.
        target: MessageTarget,
        /// The message text.
        text: String,
        /// Delivery priority, taken from the emitting action.
        priority: i64,
    },
    /// A ship was destroyed by a rule.
    ShipDestroyed {
        /// The destroyed ship.
        ship: ShipId,
    },
}

/// Which ship a `destroyShip` action aims at.
#[derive(Debug, Clone, PartialEq)]
enum ShipSelector {
    /// The ship the action was declared under, captured at build time.
    Own(ShipId),
    /// The ship carried by the triggering event.
    Foreign,
}

/// A message target before event resolution.
#[derive(Debug, Clone, PartialEq)]
enum MessageSelector {
    Team(usize),
    Player { team: usize, player: usize },
    ForeignTeam,
    ForeignPlayer,
}

/// What an action does once its condition holds.
#[derive(Debug, Clone, PartialEq)]
enum EffectKind {
    SetAttribute {
        target: TargetRef,
        value: Value,
    },
    AdvanceTurn,
    Win,
    Lose,
    DestroyShip(ShipSelector),
    DisplayMessage {
        display: MessageDisplay,
        target: MessageSelector,
        message: String,
    },
    SetTile {
        location: String,
        tile: TileId,
    },
    ReplaceTile {
        location: String,
        tiles: Vec<TileId>,
    },
}

/// A compiled action: a gate condition, a priority and an effect.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Action {
    condition: Condition,
    priority: i64,
    effect: EffectKind,
}

fn foreign_object_allowed(cx: &ParseContext<'_>, level: Level) -> ParseResult<()> {
    let event = cx.event();
    if event.is_empty() {
        return Err(cx.error(ParseErrorKind::ForeignOutsideEvent { level }));
    }
    if !event.declares_foreign(level) {
        return Err(cx.error(ParseErrorKind::ForeignUnreachable {
            level,
            event: event.name().to_owned(),
        }));
    }
    Ok(())
}

fn location_name(cx: &ParseContext<'_>, raw: &Json) -> ParseResult<String> {
    let name = schema::string(&cx.field("location"), raw)?;
    let event = cx.event();
    if event.is_empty() {
        return Err(cx.invalid("tile actions need an enclosing event that declares locations"));
    }
    if !event.declares_location(name) {
        return Err(cx.error(ParseErrorKind::UnknownLocation {
            name: name.to_owned(),
            event: event.name().to_owned(),
        }));
    }
    Ok(name.to_owned())
}

fn tile_by_name(cx: &ParseContext<'_>, raw: &Json) -> ParseResult<TileId> {
    let name = schema::string(cx, raw)?;
    let Some(board) = cx.board() else {
        return Err(cx.invalid("no board is available to resolve tile names against"));
    };
    board.tile_id(name).ok_or_else(|| {
        cx.error(ParseErrorKind::UnknownTile {
            name: name.to_owned(),
        })
    })
}

impl Action {
    /// Build one action from its JSON form.
    pub(crate) fn build(
        builder: &mut Builder,
        cx: &ParseContext<'_>,
        json: &Json,
    ) -> ParseResult<Self> {
        let obj = schema::object(cx, json)?;
        let kind = schema::string(&cx.field("type"), schema::required(cx, obj, "type")?)?;
        let condition = match obj.get("condition") {
            Some(c) => Condition::build(builder, &cx.field("condition"), c)?,
            None => Condition::always(),
        };
        let priority = obj
            .get("priority")
            .map(|p| schema::integer(&cx.field("priority"), p))
            .transpose()?
            .unwrap_or(0);

        let common = ["type", "condition", "priority"];
        let allowed = |extra: &[&'static str]| -> Vec<&'static str> {
            common.iter().chain(extra).copied().collect()
        };

        let effect = match kind {
            "setAttribute" => {
                schema::forbid_unknown(cx, obj, &allowed(&["attribute", "value"]))?;
                let attribute_cx = cx.field("attribute");
                let text =
                    schema::string(&attribute_cx, schema::required(cx, obj, "attribute")?)?;
                let target = TargetRef::build(&attribute_cx, text)?;
                let value = Value::build(
                    builder,
                    &cx.field("value"),
                    schema::required(cx, obj, "value")?,
                )?;
                EffectKind::SetAttribute { target, value }
            }
            "advanceTurn" => {
                schema::forbid_unknown(cx, obj, &allowed(&[]))?;
                EffectKind::AdvanceTurn
            }
            "win" => {
                schema::forbid_unknown(cx, obj, &allowed(&[]))?;
                EffectKind::Win
            }
            "lose" => {
                schema::forbid_unknown(cx, obj, &allowed(&[]))?;
                EffectKind::Lose
            }
            "destroyShip" => {
                schema::forbid_unknown(cx, obj, &allowed(&["ship"]))?;
                let ship_cx = cx.field("ship");
                let which = schema::string(&ship_cx, schema::required(cx, obj, "ship")?)?;
                let selector = match which {
                    "local" => {
                        let Some(id) = cx.ship() else {
                            return Err(ship_cx.error(ParseErrorKind::NoScope {
                                level: Level::Ship,
                            }));
                        };
                        ShipSelector::Own(id)
                    }
                    "foreign" => {
                        foreign_object_allowed(&ship_cx, Level::Ship)?;
                        ShipSelector::Foreign
                    }
                    other => {
                        return Err(
                            ship_cx.invalid(format!("unknown ship selector '{other}'"))
                        );
                    }
                };
                EffectKind::DestroyShip(selector)
            }
            "displayMessage" => {
                schema::forbid_unknown(cx, obj, &allowed(&["display", "target", "message"]))?;
                let display_cx = cx.field("display");
                let keyword =
                    schema::string(&display_cx, schema::required(cx, obj, "display")?)?;
                let Some(display) = MessageDisplay::from_keyword(keyword) else {
                    return Err(
                        display_cx.invalid(format!("unknown display type '{keyword}'"))
                    );
                };
                let target_cx = cx.field("target");
                let selector =
                    schema::string(&target_cx, schema::required(cx, obj, "target")?)?;
                let target = match selector {
                    "local:team" => {
                        let Some(team) = cx.team() else {
                            return Err(target_cx.error(ParseErrorKind::NoScope {
                                level: Level::Team,
                            }));
                        };
                        MessageSelector::Team(team)
                    }
                    "local:player" => {
                        let Some((team, player)) = cx.player() else {
                            return Err(target_cx.error(ParseErrorKind::NoScope {
                                level: Level::Player,
                            }));
                        };
                        MessageSelector::Player { team, player }
                    }
                    "foreign:team" => {
                        foreign_object_allowed(&target_cx, Level::Team)?;
                        MessageSelector::ForeignTeam
                    }
                    "foreign:player" => {
                        foreign_object_allowed(&target_cx, Level::Player)?;
                        MessageSelector::ForeignPlayer
                    }
                    other => {
                        return Err(
                            target_cx.invalid(format!("unknown message target '{other}'"))
                        );
                    }
                };
                let message = schema::string(
                    &cx.field("message"),
                    schema::required(cx, obj, "message")?,
                )?
                .to_owned();
                EffectKind::DisplayMessage {
                    display,
                    target,
                    message,
                }
            }
            "setTile" => {
                schema::forbid_unknown(cx, obj, &allowed(&["location", "tile"]))?;
                let location = location_name(cx, schema::required(cx, obj, "location")?)?;
                let tile = tile_by_name(&cx.field("tile"), schema::required(cx, obj, "tile")?)?;
                EffectKind::SetTile { location, tile }
            }
            "replaceTile" => {
                schema::forbid_unknown(cx, obj, &allowed(&["location", "tiles"]))?;
                let location = location_name(cx, schema::required(cx, obj, "location")?)?;
                let list_cx = cx.field("tiles");
                let list = schema::array(&list_cx, schema::required(cx, obj, "tiles")?)?;
                if list.is_empty() {
                    return Err(list_cx.invalid("`replaceTile` needs at least 1 tile"));
                }
                let mut tiles = Vec::with_capacity(list.len());
                for (i, tile) in list.iter().enumerate() {
                    tiles.push(tile_by_name(&list_cx.index(i), tile)?);
                }
                EffectKind::ReplaceTile { location, tiles }
            }
            other => {
                return Err(cx
                    .field("type")
                    .invalid(format!("unknown action type '{other}'")));
            }
        };
        Ok(Action {
            condition,
            priority,
            effect,
        })
    }

    /// Build an action list and sort it into execution order.
    ///
    /// The sort is stable, so equal priorities keep declaration order.
    pub(crate) fn build_list(
        builder: &mut Builder,
        cx: &ParseContext<'_>,
        json: &Json,
    ) -> ParseResult<Vec<Self>> {
        let list = schema::array(cx, json)?;
        let mut actions = Vec::with_capacity(list.len());
        for (i, action) in list.iter().enumerate() {
            actions.push(Action::build(builder, &cx.index(i), action)?);
        }
        actions.sort_by_key(|action| action.priority);
        Ok(actions)
    }

    /// Execute the action against the world.
    ///
    /// One unit of budget is charged for the visit before the condition is
    /// checked, so the compiled ceiling bounds total work, not just work
    /// that passed its gate.
    pub(crate) fn execute(
        &self,
        world: &mut Scenario,
        ctx: &EventContext,
        eval: &mut EvalState,
    ) -> EvalResult<()> {
        eval.note_action()?;
        if !self.condition.check(world, ctx)? {
            return Ok(());
        }
        match &self.effect {
            EffectKind::SetAttribute { target, value } => {
                let evaluated = value.evaluate(world, ctx)?;
                target.write(world, ctx, eval, evaluated)
            }
            EffectKind::AdvanceTurn => {
                world.push_directive(Directive::AdvanceTurn);
                Ok(())
            }
            EffectKind::Win => Err(EvalError::Unimplemented { effect: "win" }),
            EffectKind::Lose => Err(EvalError::Unimplemented { effect: "lose" }),
            EffectKind::DestroyShip(selector) => {
                let ship = match selector {
                    ShipSelector::Own(id) => *id,
                    ShipSelector::Foreign => ctx.foreign_ship()?,
                };
                world.destroy_ship(ship)
            }
            EffectKind::DisplayMessage {
                display,
                target,
                message,
            } => {
                let target = match target {
                    MessageSelector::Team(team) => MessageTarget::Team(*team),
                    MessageSelector::Player { team, player } => MessageTarget::Player {
                        team: *team,
                        player: *player,
                    },
                    MessageSelector::ForeignTeam => MessageTarget::Team(ctx.foreign_team()?),
                    MessageSelector::ForeignPlayer => {
                        let (team, player) = ctx.foreign_player()?;
                        MessageTarget::Player { team, player }
                    }
                };
                world.push_directive(Directive::Message {
                    display: *display,
                    target,
                    text: message.clone(),
                    priority: self.priority,
                });
                Ok(())
            }
            EffectKind::SetTile { location, tile } => {
                let coords = ctx.location(location)?.to_vec();
                world.set_tiles(&coords, *tile);
                Ok(())
            }
            EffectKind::ReplaceTile { location, tiles } => {
                let coords = ctx.location(location)?.to_vec();
                world.replace_tiles(&coords, tiles);
                Ok(())
            }
        }
    }
}

/// Run a pre-sorted action list under one shared evaluation state.
pub(crate) fn run_all(
    actions: &[Action],
    world: &mut Scenario,
    ctx: &EventContext,
    eval: &mut EvalState,
) -> EvalResult<()> {
    for action in actions {
        action.execute(world, ctx, eval)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::event_info;

    fn build(cx: &ParseContext<'_>, json: &Json) -> ParseResult<Action> {
        let mut builder = Builder::default();
        Action::build(&mut builder, cx, json)
    }

    #[test]
    fn test_unknown_action_type() {
        let err = build(
            &ParseContext::testing(),
            &serde_json::json!({"type": "teleport"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown action type 'teleport'"));
    }

    #[test]
    fn test_budget_charged_before_condition() {
        let action = build(
            &ParseContext::testing(),
            &serde_json::json!({
                "type": "advanceTurn",
                "condition": {"type": "fixed", "result": false},
            }),
        )
        .unwrap();
        let mut world = Scenario::testing();
        let ctx = EventContext::ambient();
        let mut eval = EvalState::new(1);
        action.execute(&mut world, &ctx, &mut eval).unwrap();
        assert!(world.take_directives().is_empty());
        let err = action.execute(&mut world, &ctx, &mut eval).unwrap_err();
        assert_eq!(err, EvalError::BudgetExceeded { limit: 1 });
    }

    #[test]
    fn test_win_and_lose_are_unimplemented() {
        let mut world = Scenario::testing();
        let ctx = EventContext::ambient();
        for kind in ["win", "lose"] {
            let action = build(
                &ParseContext::testing(),
                &serde_json::json!({"type": kind}),
            )
            .unwrap();
            let mut eval = EvalState::new(10);
            let err = action.execute(&mut world, &ctx, &mut eval).unwrap_err();
            assert_eq!(err, EvalError::Unimplemented { effect: kind });
        }
    }

    #[test]
    fn test_advance_turn_emits_directive() {
        let action = build(
            &ParseContext::testing(),
            &serde_json::json!({"type": "advanceTurn"}),
        )
        .unwrap();
        let mut world = Scenario::testing();
        let mut eval = EvalState::new(10);
        action
            .execute(&mut world, &EventContext::ambient(), &mut eval)
            .unwrap();
        assert_eq!(world.take_directives(), vec![Directive::AdvanceTurn]);
        assert!(world.take_directives().is_empty());
    }

    #[test]
    fn test_display_message_captures_local_player() {
        let cx = ParseContext::testing().with_player(1, 2);
        let action = build(
            &cx,
            &serde_json::json!({
                "type": "displayMessage",
                "display": "banner",
                "target": "local:player",
                "message": "direct hit",
                "priority": 7,
            }),
        )
        .unwrap();
        let mut world = Scenario::testing();
        let mut eval = EvalState::new(10);
        action
            .execute(&mut world, &EventContext::ambient(), &mut eval)
            .unwrap();
        assert_eq!(
            world.take_directives(),
            vec![Directive::Message {
                display: MessageDisplay::Banner,
                target: MessageTarget::Player { team: 1, player: 2 },
                text: "direct hit".to_owned(),
                priority: 7,
            }]
        );
    }

    #[test]
    fn test_local_target_needs_scope() {
        let err = build(
            &ParseContext::testing(),
            &serde_json::json!({
                "type": "displayMessage",
                "display": "chat",
                "target": "local:team",
                "message": "hello",
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no team is in scope"));
    }

    #[test]
    fn test_foreign_target_needs_reachable_event() {
        // gameStart reaches no foreign objects at all.
        let start = event_info("gameStart").unwrap();
        let err = build(
            &ParseContext::testing().with_event(start),
            &serde_json::json!({
                "type": "destroyShip",
                "ship": "foreign",
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not reachable from event 'gameStart'"));
    }

    #[test]
    fn test_tile_actions_resolve_palette_names() {
        let board = crate::board::Board::new(
            2,
            1,
            vec!['~', '#'],
            vec!["water".to_owned(), "rock".to_owned()],
            vec![crate::board::TileId::new(0), crate::board::TileId::new(0)],
        )
        .unwrap();
        let hit = event_info("shipHit").unwrap();
        let cx = ParseContext::testing().with_event(hit).with_board(&board);
        let action = build(
            &cx,
            &serde_json::json!({
                "type": "setTile",
                "location": "impact",
                "tile": "rock",
            }),
        );
        assert!(action.is_ok());
        let err = build(
            &cx,
            &serde_json::json!({
                "type": "setTile",
                "location": "impact",
                "tile": "lava",
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no tile type named 'lava'"));
        let err = build(
            &cx,
            &serde_json::json!({
                "type": "setTile",
                "location": "crater",
                "tile": "rock",
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no location named 'crater'"));
    }

    #[test]
    fn test_build_list_sorts_by_priority_stably() {
        let mut builder = Builder::default();
        let actions = Action::build_list(
            &mut builder,
            &ParseContext::testing(),
            &serde_json::json!([
                {"type": "win", "priority": 5},
                {"type": "advanceTurn"},
                {"type": "lose", "priority": 5},
                {"type": "advanceTurn", "priority": -1},
            ]),
        )
        .unwrap();
        let priorities: Vec<i64> = actions.iter().map(|a| a.priority).collect();
        assert_eq!(priorities, vec![-1, 0, 5, 5]);
        assert_eq!(actions[2].effect, EffectKind::Win);
        assert_eq!(actions[3].effect, EffectKind::Lose);
    }
}
