//! Arrival-triggered behaviour: picking up items, opening conversations and
//! trades, and the NPC side of a conversation.

use gr_core::ItemId;
use tracing::debug;

use crate::actor::{Actor, Goal};
use crate::combat;
use crate::context::SimContext;
use crate::changes::ActorFields;
use crate::error::{SimError, SimResult};
use crate::event::{SoundEvent, TalkEvent, TradeEvent, sounds};

const GONE: &str = "Too late, it's gone!";
const FULL: &str = "You don't have enough space in your inventory.";

/// Start walking to a ground item. Standing on it picks it up right away.
pub fn walk_to_item(actor: &mut Actor, item: ItemId, ctx: &mut SimContext<'_>) -> SimResult<()> {
    let Some(found) = ctx.world.item(item).filter(|i| !i.is_deleted()) else {
        ctx.world.notify(actor.id(), GONE);
        return Ok(());
    };
    let tile = found.position();
    actor.clear_targets();
    actor.engagement.target_item = Some(item);
    if actor.position() == tile {
        actor.stop();
        take_item(actor, ctx)?;
    } else {
        actor.set_destination(tile);
    }
    Ok(())
}

/// Pick up the targeted item if the actor stands on it. Returns true when
/// the item went into the inventory.
pub fn take_item(actor: &mut Actor, ctx: &mut SimContext<'_>) -> SimResult<bool> {
    let Some(item_id) = actor.engagement.target_item else {
        return Ok(false);
    };
    let me = actor.id();
    let Some(item) = ctx.world.item(item_id).filter(|i| !i.is_deleted()) else {
        actor.engagement.target_item = None;
        ctx.world.notify(me, GONE);
        return Ok(false);
    };
    if item.position() != actor.position() {
        if actor.nav.destination.is_none() {
            // Route gave up short of the item.
            actor.engagement.target_item = None;
        }
        return Ok(false);
    }
    actor.engagement.target_item = None;
    let (item_type, amount) = (item.item_type(), item.amount());
    let content = ctx.content;
    let data = content
        .item(item_type)
        .ok_or_else(|| SimError::InvalidInput(format!("unknown item {item_type}")))?;
    if !actor.player_data().is_some_and(|p| p.inventory.has_room_for(data)) {
        ctx.world.notify(me, FULL);
        return Ok(false);
    }
    actor
        .update_player(ActorFields::INVENTORY, |p| p.inventory.add(data, amount))
        .transpose()?;
    if let Some(item) = ctx.world.item_mut(item_id) {
        item.delete();
    }
    ctx.world.sound(SoundEvent::private(sounds::PICK_UP, me));
    ctx.save_inventory(actor);
    Ok(true)
}

/// Act on the engaged target once it is in reach.
pub fn resolve_goal(actor: &mut Actor, ctx: &mut SimContext<'_>) -> SimResult<()> {
    let Some(target_id) = actor.engagement.target else {
        return Ok(());
    };
    let target = ctx
        .world
        .actor(target_id)
        .filter(|t| t.is_present() && !t.is_dying());
    let Some(target) = target else {
        debug!(actor = %actor.label(), target = %target_id, "stale target dropped");
        actor.disengage();
        actor.stop();
        return Ok(());
    };
    if !ctx.in_reach(actor.position(), target.position()) {
        return Ok(());
    }
    match actor.engagement.goal {
        Goal::Attack => {
            combat::attack(actor, target_id, ctx)?;
        }
        Goal::Talk | Goal::Trade => open_dialogue(actor, target_id, ctx),
        Goal::None => actor.disengage(),
    }
    Ok(())
}

fn open_dialogue(actor: &mut Actor, target_id: gr_core::ActorId, ctx: &mut SimContext<'_>) {
    let me = actor.id();
    let goal = actor.engagement.goal;
    let Some(target) = ctx.world.actor_mut(target_id) else {
        return;
    };
    let target_index = target.npc_data().map_or(0, |n| n.species);
    let there = target.position();
    target.face_toward(actor.position());
    target.stop();
    target.engagement.interaction_target = Some(me);

    actor.face_toward(there);
    actor.disengage();
    actor.stop();
    if goal == Goal::Trade {
        ctx.world.events.trades.push(TradeEvent {
            trader: me,
            target: target_id,
            target_index,
        });
    } else {
        ctx.world.events.talks.push(TalkEvent {
            talker: me,
            target: target_id,
            target_index,
        });
    }
}

/// Keep an NPC still and facing its conversation partner. Returns false
/// (and ends the conversation) once the partner leaves, dies or walks off.
pub fn hold_conversation(npc: &mut Actor, ctx: &SimContext<'_>) -> bool {
    let Some(partner) = npc.engagement.interaction_target else {
        return false;
    };
    let here = npc.position();
    let stays = ctx
        .world
        .actor(partner)
        .filter(|p| !p.is_dying() && p.position().chebyshev(here) <= 1)
        .map(|p| p.position());
    match stays {
        Some(there) => {
            npc.face_toward(there);
            npc.stop();
            true
        }
        None => {
            npc.engagement.interaction_target = None;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::INVENTORY_SIZE;
    use crate::testkit::Fixture;
    use gr_core::TilePos;

    #[test]
    fn taking_an_item_under_you_is_immediate() {
        let mut fx = Fixture::open(5, 5);
        let item = fx.world.spawn_item(103, 1, TilePos::new(2, 2), Some(10));
        let mut actor = fx.player_actor("ada", TilePos::new(2, 2));
        let mut ctx = fx.ctx();
        walk_to_item(&mut actor, item, &mut ctx).unwrap();
        assert_eq!(actor.player_data().unwrap().inventory.count(103), 1);
        assert!(ctx.world.item(item).unwrap().is_deleted());
        assert_eq!(ctx.world.events.sounds.len(), 1);
    }

    #[test]
    fn vanished_item_sends_notice() {
        let mut fx = Fixture::open(5, 5);
        let item = fx.world.spawn_item(103, 1, TilePos::new(2, 2), Some(10));
        fx.world.item_mut(item).unwrap().delete();
        let mut actor = fx.player_actor("ada", TilePos::new(0, 0));
        let mut ctx = fx.ctx();
        walk_to_item(&mut actor, item, &mut ctx).unwrap();
        assert!(actor.nav.destination.is_none());
        assert_eq!(ctx.world.chat[0].message, GONE);
    }

    #[test]
    fn full_inventory_leaves_item_on_ground() {
        let mut fx = Fixture::open(5, 5);
        let item = fx.world.spawn_item(104, 1, TilePos::new(1, 1), Some(10));
        let mut actor = fx.player_actor("ada", TilePos::new(1, 1));
        let bones = fx.content.item(104).unwrap().clone();
        for _ in 0..INVENTORY_SIZE {
            actor.update_player(ActorFields::INVENTORY, |p| p.inventory.add(&bones, 1).unwrap());
        }
        let mut ctx = fx.ctx();
        walk_to_item(&mut actor, item, &mut ctx).unwrap();
        assert!(!ctx.world.item(item).unwrap().is_deleted());
        assert_eq!(ctx.world.chat[0].message, FULL);
    }

    #[test]
    fn talking_holds_the_npc() {
        let mut fx = Fixture::open(5, 5);
        let guide = fx.insert_npc(1, TilePos::new(2, 1));
        let mut actor = fx.player_actor("ada", TilePos::new(1, 1));
        actor.engage(guide, Goal::Talk);
        let mut ctx = fx.ctx();
        resolve_goal(&mut actor, &mut ctx).unwrap();
        assert_eq!(ctx.world.events.talks.len(), 1);
        assert_eq!(ctx.world.events.talks[0].target_index, 1);
        assert!(actor.engagement.target.is_none());

        let id = actor.id();
        ctx.world.insert(actor);
        let mut npc = ctx.world.take_actor(guide).unwrap();
        assert_eq!(npc.engagement.interaction_target, Some(id));
        assert!(hold_conversation(&mut npc, &ctx));
        assert_eq!(npc.facing(), gr_core::Direction::Left);

        ctx.world.actor_mut(id).unwrap().teleport(TilePos::new(4, 4));
        assert!(!hold_conversation(&mut npc, &ctx));
        assert!(npc.engagement.interaction_target.is_none());
    }

    #[test]
    fn dead_target_cancels_silently() {
        let mut fx = Fixture::open(5, 5);
        let npc = fx.insert_npc(0, TilePos::new(2, 1));
        fx.world.actor_mut(npc).unwrap().set_dying(true);
        let mut actor = fx.player_actor("ada", TilePos::new(1, 1));
        actor.engage(npc, Goal::Attack);
        let mut ctx = fx.ctx();
        resolve_goal(&mut actor, &mut ctx).unwrap();
        assert!(actor.engagement.target.is_none());
        assert!(ctx.world.events.attacks.is_empty());
    }
}
