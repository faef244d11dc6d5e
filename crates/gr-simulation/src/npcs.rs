use gr_core::TilePos;
use rand::Rng;
use tracing::{debug, warn};

use crate::actor::Actor;
use crate::combat;
use crate::context::SimContext;
use crate::death;
use crate::error::SimResult;
use crate::interaction;
use crate::movement::{self, Pursuit};
use crate::system::System;

/// Tries per tick to find a free tile to wander to.
const WANDER_TRIES: usize = 8;

/// Runs NPC behaviour: conversations, wandering, leashing and fighting.
#[derive(Debug, Default)]
pub struct NpcSystem;

impl NpcSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self
    }
}

impl System for NpcSystem {
    fn name(&self) -> &str {
        "npcs"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        for id in ctx.world.npc_ids() {
            let Some(mut npc) = ctx.world.take_actor(id) else {
                continue;
            };
            if let Err(e) = update(&mut npc, ctx) {
                warn!(npc = %npc.label(), error = %e, "npc update failed");
            }
            ctx.world.restore_actor(npc);
        }
        Ok(())
    }
}

fn update(npc: &mut Actor, ctx: &mut SimContext<'_>) -> SimResult<()> {
    combat::tick_timers(npc, ctx.tick());
    if death::advance_respawn(npc) || death::advance_dying(npc, ctx) {
        return Ok(());
    }
    if interaction::hold_conversation(npc, ctx) {
        return Ok(());
    }

    if let Some(target) = npc.engagement.target {
        if strayed(npc) {
            debug!(npc = %npc.label(), "left its area, heading home");
            npc.disengage();
            npc.set_destination(npc.spawn());
            movement::step(npc, ctx);
            return Ok(());
        }
        match movement::refresh_pursuit(npc, ctx) {
            Pursuit::InReach => {
                combat::attack(npc, target, ctx)?;
            }
            Pursuit::Chasing => {
                if npc.nav.follow_delay > 0 {
                    npc.nav.follow_delay -= 1;
                } else {
                    movement::step(npc, ctx);
                }
            }
            Pursuit::Lost | Pursuit::NoTarget => {}
        }
        return Ok(());
    }

    if npc.nav.destination.is_none() && ctx.rng.random_bool(ctx.config.wander_chance) {
        if let Some(tile) = wander_tile(npc, ctx) {
            npc.set_destination(tile);
        }
    } else if strayed(npc) {
        npc.set_destination(npc.spawn());
    }
    movement::step(npc, ctx);
    Ok(())
}

fn in_area(npc: &Actor, tile: TilePos) -> bool {
    let range = npc.npc_data().map_or(0, |n| n.wander_range);
    tile.chebyshev(npc.spawn()) <= range
}

/// True when the NPC is heading somewhere outside its wander area.
fn strayed(npc: &Actor) -> bool {
    npc.nav
        .destination
        .is_some_and(|d| d != npc.spawn() && !in_area(npc, d))
}

fn wander_tile(npc: &Actor, ctx: &mut SimContext<'_>) -> Option<TilePos> {
    let range = npc.npc_data().map_or(0, |n| n.wander_range);
    if range <= 0 {
        return None;
    }
    let spawn = npc.spawn();
    for _ in 0..WANDER_TRIES {
        let dx = ctx.rng.random_range(-range..=range);
        let dy = ctx.rng.random_range(-range..=range);
        let tile = spawn.offset(dx, dy);
        if tile != npc.position() && ctx.map.in_bounds(tile) && !ctx.map.is_blocked(tile) {
            return Some(tile);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Goal;
    use crate::testkit::Fixture;

    fn run(fx: &mut Fixture, ticks: usize) {
        let mut system = NpcSystem::new();
        for _ in 0..ticks {
            fx.clock.advance();
            system.tick(&mut fx.ctx()).unwrap();
        }
    }

    #[test]
    fn wandering_stays_in_area() {
        let mut fx = Fixture::open(30, 30);
        fx.config.wander_chance = 1.0;
        let id = fx.insert_npc(0, TilePos::new(15, 15));
        for _ in 0..200 {
            run(&mut fx, 1);
            let npc = fx.world.actor(id).unwrap();
            assert!(npc.position().chebyshev(TilePos::new(15, 15)) <= 3);
        }
    }

    #[test]
    fn no_wandering_without_chance() {
        let mut fx = Fixture::open(30, 30);
        fx.config.wander_chance = 0.0;
        let id = fx.insert_npc(0, TilePos::new(15, 15));
        run(&mut fx, 50);
        assert_eq!(fx.world.actor(id).unwrap().position(), TilePos::new(15, 15));
    }

    #[test]
    fn npc_fights_an_adjacent_target() {
        let mut fx = Fixture::open(10, 10);
        fx.config.wander_chance = 0.0;
        let player = fx.insert_player("ada", TilePos::new(3, 2));
        let id = fx.insert_npc(0, TilePos::new(2, 2));
        fx.world.actor_mut(id).unwrap().engage(player, Goal::Attack);
        run(&mut fx, 1);
        assert_eq!(fx.world.events.attacks.len(), 1);
        assert!(fx.world.actor(player).unwrap().in_combat());
        // An attacked player never schedules retaliation.
        assert!(fx.schedule.is_empty());
    }

    #[test]
    fn npc_abandons_a_chase_outside_its_area() {
        let mut fx = Fixture::open(30, 30);
        fx.config.wander_chance = 0.0;
        let player = fx.insert_player("ada", TilePos::new(20, 2));
        let id = fx.insert_npc(0, TilePos::new(2, 2));
        fx.world.actor_mut(id).unwrap().engage(player, Goal::Attack);
        run(&mut fx, 2);
        let npc = fx.world.actor(id).unwrap();
        assert!(npc.engagement.target.is_none());
        assert!(npc.position().chebyshev(TilePos::new(2, 2)) <= 3);
    }
}
