//! Melee resolution.
//!
//! Accuracy: the attacker rolls `0..=attack + accuracy bonus + 8` against the
//! defender's `0..=defence + 8` and hits only on a strictly higher roll.
//! Damage on a hit is `1..=max_hit` with `max_hit = 1 + (strength + strength
//! bonus) / 5`. Damage is clamped to the defender's remaining hitpoints.

use gr_core::content::DEFAULT_ATTACK_SPEED;
use gr_core::{ActorId, Skill};
use rand::Rng;
use tracing::{debug, warn};

use crate::actor::Actor;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::{AttackEvent, SoundEvent, sounds};
use crate::intake::Effect;
use crate::reward;
use crate::world::World;

/// Ticks an NPC waits after swinging before it chases again.
pub const NPC_FOLLOW_DELAY: u32 = 2;

/// Result of one attack attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// The attacker's cooldown has not run out.
    CoolingDown,
    /// Target is not adjacent.
    OutOfReach,
    /// Target is gone, hidden or already dying.
    Unavailable,
    /// The swing landed; `damage` 0 is a miss.
    Hit {
        /// Hitpoints actually removed.
        damage: u32,
        /// The defender died.
        killed: bool,
    },
}

/// Count down an actor's combat timers.
pub fn tick_timers(actor: &mut Actor, tick: u64) {
    actor.timers.attack_cooldown = actor.timers.attack_cooldown.saturating_sub(1);

    if actor.timers.damage_shown_at.is_some_and(|at| at < tick) {
        actor.timers.damage_shown_at = None;
        actor.clear_damage();
    }

    if actor.timers.combat_ticks > 0 {
        actor.timers.combat_ticks -= 1;
        if actor.timers.combat_ticks == 0 {
            actor.set_in_combat(false);
        }
    }
}

/// Roll one melee swing.
pub fn roll_damage<R: Rng + ?Sized>(
    rng: &mut R,
    attack: u32,
    strength: u32,
    defence: u32,
    accuracy_bonus: u32,
    strength_bonus: u32,
) -> u32 {
    let attack_roll = rng.random_range(0..=attack + accuracy_bonus + 8);
    let defence_roll = rng.random_range(0..=defence + 8);
    if attack_roll <= defence_roll {
        return 0;
    }
    let max_hit = 1 + (strength + strength_bonus) / 5;
    rng.random_range(1..=max_hit)
}

/// Swing at `target_id` if the cooldown allows and the target is in reach.
pub fn attack(
    attacker: &mut Actor,
    target_id: ActorId,
    ctx: &mut SimContext<'_>,
) -> SimResult<AttackOutcome> {
    if attacker.timers.attack_cooldown > 0 {
        return Ok(AttackOutcome::CoolingDown);
    }
    let me = attacker.id();
    let Some(target) = ctx.world.actor(target_id) else {
        return Ok(AttackOutcome::Unavailable);
    };
    if target_id == me || !target.is_present() || target.is_dying() || attacker.is_dying() {
        return Ok(AttackOutcome::Unavailable);
    }
    let there = target.position();
    if !ctx.in_reach(attacker.position(), there) {
        return Ok(AttackOutcome::OutOfReach);
    }
    let defence = target.skills().level(Skill::Defence);

    let weapon = attacker.weapon_stats(ctx.content);
    attacker.face_toward(there);
    attacker.timers.attack_cooldown = weapon.map_or(DEFAULT_ATTACK_SPEED, |w| w.attack_speed);
    let rolled = roll_damage(
        ctx.rng,
        attacker.skills().level(Skill::Attack),
        attacker.skills().level(Skill::Strength),
        defence,
        weapon.map_or(0, |w| w.accuracy_bonus),
        weapon.map_or(0, |w| w.strength_bonus),
    );

    let tick = ctx.tick();
    let combat_ticks = ctx.config.combat_ticks;
    let Some(defender) = ctx.world.actor_mut(target_id) else {
        return Ok(AttackOutcome::Unavailable);
    };
    let damage = defender.take_damage(rolled);
    defender.show_damage(damage);
    defender.timers.damage_shown_at = Some(tick);
    defender.timers.combat_ticks = combat_ticks;
    defender.set_in_combat(true);
    let killed = defender.hitpoints() == 0;
    let defender_is_player = defender.is_player();
    let species = defender.npc_data().map(|n| n.species);
    let retaliates = species.is_some() && !killed && defender.engagement.target.is_none();
    if killed {
        defender.set_dying(true);
        defender.stop();
        defender.clear_targets();
    }

    debug!(attacker = %attacker.label(), target = %target_id, damage, killed, "attack");
    ctx.world.events.attacks.push(AttackEvent {
        attacker: me,
        target: target_id,
    });
    let swing = if weapon.is_some() {
        sounds::SWORD_SLASH
    } else {
        sounds::PUNCH
    };
    ctx.world.sound(SoundEvent::global(swing, me));
    if defender_is_player {
        ctx.world.sound(SoundEvent::private(sounds::PLAYER_HIT, target_id));
    }

    if attacker.is_npc() {
        attacker.nav.follow_delay = NPC_FOLLOW_DELAY;
    }
    if damage > 0 {
        reward::grant_combat_xp(attacker, damage, ctx);
    }
    if retaliates {
        ctx.defer(Effect::Retaliate {
            npc: target_id,
            attacker: me,
        });
    }
    if killed {
        on_kill(attacker, target_id, species, ctx);
    }
    Ok(AttackOutcome::Hit { damage, killed })
}

fn on_kill(attacker: &mut Actor, victim: ActorId, species: Option<u32>, ctx: &mut SimContext<'_>) {
    attacker.disengage();
    attacker.stop();
    match species {
        Some(species) => {
            ctx.world.sound(SoundEvent::global(sounds::NPC_DEATH, victim));
            let content = ctx.content;
            let step = content.species(species).and_then(|s| s.kill_quest);
            if let Some(step) = step
                && attacker.is_player()
                && let Err(e) = reward::advance_quest(attacker, step, ctx)
            {
                warn!(player = %attacker.label(), error = %e, "kill quest update failed");
            }
        }
        None => {
            ctx.world.notify(victim, "Oh dear, you are dead!");
            ctx.world.sound(SoundEvent::private(sounds::PLAYER_DEATH, victim));
        }
    }
}

/// Point an NPC at whoever hit it, unless it already found a target.
pub fn retaliate(world: &mut World, npc: ActorId, attacker: ActorId) {
    let attacker_ok = world
        .actor(attacker)
        .is_some_and(|a| a.is_present() && !a.is_dying());
    let Some(actor) = world.actor_mut(npc) else {
        return;
    };
    if attacker_ok
        && actor.is_npc()
        && actor.is_present()
        && !actor.is_dying()
        && actor.engagement.target.is_none()
    {
        actor.engagement.interaction_target = None;
        actor.engage(attacker, crate::actor::Goal::Attack);
    }
}
