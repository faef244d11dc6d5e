// Drop and reward resolution: NPC loot, experience, quest progress, and item grants.

use gr_core::content::{QUEST_COMPLETE, QUEST_SLOTS, QuestStep};
use gr_core::{Skill, TilePos};
use tracing::debug;

use crate::actor::Actor;
use crate::changes::ActorFields;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::event::{SoundEvent, sounds};
use crate::inventory::INVENTORY_SIZE;

/// Loot rolls per NPC death.
pub const LOOT_ROLLS: usize = 2;

/// Experience per point of damage for the attack style's skill.
pub const STYLE_XP_PER_DAMAGE: u32 = 4;
/// Hitpoints experience per point of damage.
pub const HITPOINTS_XP_PER_DAMAGE: u32 = 1;

/// Roll a species' drop table at `at`. Rolled items despawn like drops.
pub fn drop_loot(species: u32, at: TilePos, ctx: &mut SimContext<'_>) {
    let content = ctx.content;
    let Some(data) = content.species(species) else {
        return;
    };
    for _ in 0..LOOT_ROLLS {
        let Some(drop) = data.drop_table.roll(ctx.rng) else {
            continue;
        };
        debug!(species, item = drop.item_id, amount = drop.amount, %at, "loot dropped");
        let stackable = content.item(drop.item_id).is_some_and(|i| i.is_stackable);
        let piles = if stackable { vec![drop.amount] } else { vec![1; drop.amount as usize] };
        for amount in piles {
            ctx.world
                .spawn_item(drop.item_id, amount, at, Some(ctx.config.item_despawn_ticks));
        }
    }
}

/// Experience for dealing `damage` in melee.
pub fn grant_combat_xp(actor: &mut Actor, damage: u32, ctx: &mut SimContext<'_>) {
    let style = actor.attack_style().skill();
    grant_xp(actor, style, damage * STYLE_XP_PER_DAMAGE, ctx);
    grant_xp(actor, Skill::Hitpoints, damage * HITPOINTS_XP_PER_DAMAGE, ctx);
}

/// Add experience to a player, announcing level-ups and saving the skill.
pub fn grant_xp(actor: &mut Actor, skill: Skill, amount: u32, ctx: &mut SimContext<'_>) {
    if amount == 0 || !actor.is_player() {
        return;
    }
    if let Some(level) = actor.add_xp(skill, amount) {
        let me = actor.id();
        ctx.world
            .notify(me, format!("Congratulations, your {skill} level is now {level}."));
        ctx.world.sound(SoundEvent::private(sounds::LEVEL_UP, me));
    }
    ctx.save_skill(actor, skill);
}

/// Put items in a player's inventory. Whatever does not fit lands on the
/// ground under the player. Returns true when everything fit.
pub fn give_item(
    actor: &mut Actor,
    item_id: u32,
    quantity: u32,
    ctx: &mut SimContext<'_>,
) -> SimResult<bool> {
    let content = ctx.content;
    let item = content
        .item(item_id)
        .ok_or_else(|| SimError::InvalidInput(format!("unknown item {item_id}")))?;
    if !actor.is_player() {
        return Err(SimError::InvalidInput(format!("{} carries no inventory", actor.label())));
    }
    let quantity = quantity.max(1);
    let units: Vec<u32> = if item.is_stackable {
        vec![quantity]
    } else if quantity as usize <= INVENTORY_SIZE {
        vec![1; quantity as usize]
    } else {
        return Err(SimError::InvalidInput(format!(
            "{quantity} x {} will never fit",
            item.name
        )));
    };

    let mut overflow = 0;
    for amount in units {
        let fits = actor
            .player_data()
            .is_some_and(|p| p.inventory.has_room_for(item));
        if fits {
            actor
                .update_player(ActorFields::INVENTORY, |p| p.inventory.add(item, amount))
                .transpose()?;
        } else {
            ctx.world.spawn_item(
                item_id,
                amount,
                actor.position(),
                Some(ctx.config.item_despawn_ticks),
            );
            overflow += 1;
        }
    }
    if overflow > 0 {
        ctx.world
            .notify(actor.id(), "You don't have enough space in your inventory.");
    }
    ctx.save_inventory(actor);
    Ok(overflow == 0)
}

/// Set quest progress. Completing a quest (progress 100) pays its reward
/// once; a completed quest never changes again.
pub fn set_quest_progress(
    actor: &mut Actor,
    quest_id: usize,
    progress: i32,
    ctx: &mut SimContext<'_>,
) -> SimResult<()> {
    if quest_id >= QUEST_SLOTS {
        return Err(SimError::InvalidInput(format!("quest {quest_id} does not exist")));
    }
    if !(0..=QUEST_COMPLETE).contains(&progress) {
        return Err(SimError::InvalidInput(format!("quest progress {progress} out of range")));
    }
    let current = actor
        .player_data()
        .ok_or_else(|| SimError::InvalidInput(format!("{} has no quests", actor.label())))?
        .quest_progress
        .get(quest_id)
        .copied()
        .unwrap_or(0);
    if current == QUEST_COMPLETE || current == progress {
        return Ok(());
    }

    actor.update_player(ActorFields::QUEST_PROGRESS, |p| {
        if p.quest_progress.len() < QUEST_SLOTS {
            p.quest_progress.resize(QUEST_SLOTS, 0);
        }
        p.quest_progress[quest_id] = progress;
    });
    ctx.save_quest_progress(actor);

    if progress == QUEST_COMPLETE {
        complete_quest(actor, quest_id, ctx)?;
    }
    Ok(())
}

/// Move a quest forward to `step`, never backward.
pub fn advance_quest(actor: &mut Actor, step: QuestStep, ctx: &mut SimContext<'_>) -> SimResult<()> {
    let behind = actor
        .player_data()
        .and_then(|p| p.quest_progress.get(step.quest_id))
        .is_some_and(|&current| current < step.progress);
    if behind {
        set_quest_progress(actor, step.quest_id, step.progress, ctx)?;
    }
    Ok(())
}

fn complete_quest(actor: &mut Actor, quest_id: usize, ctx: &mut SimContext<'_>) -> SimResult<()> {
    let me = actor.id();
    ctx.world.notify(me, "Congratulations, you've completed a quest!");
    ctx.world.sound(SoundEvent::private(sounds::QUEST_COMPLETE, me));

    let Some(quest) = ctx.content.quest(quest_id) else {
        return Ok(());
    };
    let reward = quest.reward.clone();
    if reward.influence != 0 {
        actor.update_player(ActorFields::INFLUENCE, |p| p.influence += reward.influence);
    }
    for grant in &reward.experience {
        grant_xp(actor, grant.skill, grant.xp, ctx);
    }
    for grant in &reward.items {
        give_item(actor, grant.item_id, grant.amount, ctx)?;
    }
    Ok(())
}
