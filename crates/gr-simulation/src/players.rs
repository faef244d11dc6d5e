use tracing::{debug, warn};

use crate::action::{self, Action};
use crate::actor::Actor;
use crate::combat;
use crate::context::SimContext;
use crate::death;
use crate::error::SimResult;
use crate::interaction;
use crate::movement;
use crate::system::System;

/// Applies queued intents and advances every player one tick, in join order.
#[derive(Debug, Default)]
pub struct PlayerSystem;

impl PlayerSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self
    }
}

impl System for PlayerSystem {
    fn name(&self) -> &str {
        "players"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        for id in ctx.world.player_ids() {
            let Some(mut actor) = ctx.world.take_actor(id) else {
                continue;
            };
            for action in ctx.inbox.take(id) {
                if actor.is_dying() && !matches!(action, Action::ChatMessage { .. }) {
                    debug!(player = %actor.label(), ?action, "ignored while dying");
                    continue;
                }
                if let Err(e) = action::apply(&mut actor, action, ctx) {
                    warn!(player = %actor.label(), error = %e, "intent dropped");
                }
            }
            if let Err(e) = update(&mut actor, ctx) {
                warn!(player = %actor.label(), error = %e, "player update failed");
            }
            ctx.world.restore_actor(actor);
        }
        Ok(())
    }
}

fn update(actor: &mut Actor, ctx: &mut SimContext<'_>) -> SimResult<()> {
    combat::tick_timers(actor, ctx.tick());
    if death::advance_dying(actor, ctx) {
        return Ok(());
    }
    movement::refresh_pursuit(actor, ctx);
    movement::step(actor, ctx);
    if actor.engagement.target_item.is_some() {
        interaction::take_item(actor, ctx)?;
    }
    interaction::resolve_goal(actor, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Goal;
    use crate::testkit::Fixture;
    use gr_core::TilePos;

    fn run(fx: &mut Fixture, ticks: usize) {
        let mut system = PlayerSystem::new();
        for _ in 0..ticks {
            fx.clock.advance();
            system.tick(&mut fx.ctx()).unwrap();
        }
    }

    #[test]
    fn queued_move_walks_the_player() {
        let mut fx = Fixture::open(10, 10);
        let id = fx.insert_player("ada", TilePos::new(0, 0));
        fx.inbox.push(id, Action::PlayerMove { x: 3, y: 0 });
        run(&mut fx, 1);
        assert_eq!(fx.world.actor(id).unwrap().position(), TilePos::new(1, 0));
        assert!(fx.inbox.is_empty());
        run(&mut fx, 5);
        assert_eq!(fx.world.actor(id).unwrap().position(), TilePos::new(3, 0));
    }

    #[test]
    fn bad_intents_are_dropped_without_side_effects() {
        let mut fx = Fixture::open(10, 10);
        let id = fx.insert_player("ada", TilePos::new(0, 0));
        fx.inbox.push(id, Action::DropItem { inventory_index: 40 });
        fx.inbox.push(id, Action::PlayerAttackMove { target: id });
        run(&mut fx, 1);
        let actor = fx.world.actor(id).unwrap();
        assert!(actor.engagement.target.is_none());
        assert!(fx.world.items().is_empty());
    }

    #[test]
    fn player_chases_and_fights() {
        let mut fx = Fixture::open(10, 10);
        let npc = fx.insert_npc(0, TilePos::new(4, 0));
        let id = fx.insert_player("ada", TilePos::new(0, 0));
        fx.inbox.push(id, Action::PlayerAttackMove { target: npc });
        run(&mut fx, 4);
        let actor = fx.world.actor(id).unwrap();
        assert_eq!(actor.position(), TilePos::new(3, 0));
        assert_eq!(actor.engagement.goal, Goal::Attack);
        assert!(fx.world.actor(npc).unwrap().in_combat());
    }

    #[test]
    fn walking_onto_an_item_picks_it_up() {
        let mut fx = Fixture::open(10, 10);
        let item = fx.world.spawn_item(102, 7, TilePos::new(2, 0), None);
        let id = fx.insert_player("ada", TilePos::new(0, 0));
        fx.inbox.push(id, Action::PlayerTakeMove { item });
        run(&mut fx, 2);
        let actor = fx.world.actor(id).unwrap();
        assert_eq!(actor.player_data().unwrap().inventory.count(102), 7);
        assert!(fx.world.item(item).unwrap().is_deleted());
    }
}
