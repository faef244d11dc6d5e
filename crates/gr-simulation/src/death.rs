//! The death sequence and NPC respawn.

use gr_core::{Direction, TilePos};
use tracing::{debug, info};

use crate::actor::Actor;
use crate::changes::ActorFields;
use crate::context::SimContext;
use crate::reward;

/// Count one dying tick. Returns true while the actor is (or just stopped)
/// dying, meaning it does nothing else this tick.
pub fn advance_dying(actor: &mut Actor, ctx: &mut SimContext<'_>) -> bool {
    if !actor.is_dying() {
        return false;
    }
    actor.timers.dying_ticks += 1;
    if actor.timers.dying_ticks < ctx.config.dying_ticks {
        return true;
    }

    let at = actor.position();
    let spawn = actor.spawn();
    match actor.npc_data().map(|n| n.species) {
        Some(species) => {
            reward::drop_loot(species, at, ctx);
            reset(actor, spawn);
            actor.set_respawning(true);
            debug!(npc = %actor.label(), "hidden until respawn");
        }
        None => {
            let dropped = actor
                .update_player(ActorFields::INVENTORY, |p| p.inventory.drain())
                .unwrap_or_default();
            for slot in dropped {
                ctx.world
                    .spawn_item(slot.item_id, slot.amount, at, Some(ctx.config.item_despawn_ticks));
            }
            actor.set_weapon(None);
            actor.set_shield(None);
            reset(actor, spawn);
            info!(player = %actor.label(), %at, "player died");
            ctx.save_position(actor);
            ctx.save_inventory(actor);
            ctx.save_wieldables(actor);
        }
    }
    true
}

/// Count one hidden tick for a respawning NPC. Returns true while it is
/// hidden this tick.
pub fn advance_respawn(actor: &mut Actor) -> bool {
    if !actor.is_respawning() {
        return false;
    }
    if actor.tick_respawn() {
        debug!(npc = %actor.label(), at = %actor.position(), "respawned");
    }
    true
}

fn reset(actor: &mut Actor, spawn: TilePos) {
    actor.set_dying(false);
    actor.set_hitpoints(actor.max_hitpoints());
    actor.teleport(spawn);
    actor.face(Direction::Down);
    actor.clear_targets();
    actor.stop();
    actor.timers.attack_cooldown = 0;
    actor.timers.combat_ticks = 0;
    actor.timers.damage_shown_at = None;
    actor.nav.follow_delay = 0;
    actor.set_in_combat(false);
    actor.clear_damage();
}
