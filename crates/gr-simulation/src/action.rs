use gr_core::content::{DEFAULT_ATTACK_SPEED, WieldSlot};
use gr_core::{ActorId, ItemId, TilePos};
use serde::Deserialize;

use crate::actor::{Actor, Appearance, AttackStyle, Goal};
use crate::changes::ActorFields;
use crate::chat::ChatMessage;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::event::{SoundEvent, sounds};
use crate::inventory::Inventory;
use crate::{interaction, reward};

/// Longest chat line kept; the rest is cut off.
pub const MAX_CHAT_LEN: usize = 200;

/// A player intent, as sent by clients.
///
/// Wire form is a flat JSON object whose `action` field names the variant,
/// e.g. `{"action":"playerMove","x":3,"y":4}`. Extra fields (such as the
/// client's own `playerID`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Walk to a tile.
    PlayerMove {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
    /// Walk up to an actor and fight it.
    PlayerAttackMove {
        /// Target.
        #[serde(rename = "entityID")]
        target: ActorId,
    },
    /// Walk up to an NPC and talk.
    PlayerTalkMove {
        /// Target.
        #[serde(rename = "entityID")]
        target: ActorId,
    },
    /// Walk up to an NPC and trade.
    TradeMove {
        /// Target.
        #[serde(rename = "entityID")]
        target: ActorId,
    },
    /// Walk to a ground item and pick it up.
    PlayerTakeMove {
        /// Ground item.
        #[serde(rename = "uniqueItemID")]
        item: ItemId,
    },
    /// Drop an inventory slot on the ground.
    DropItem {
        /// Slot.
        inventory_index: usize,
    },
    /// Wield an inventory slot.
    WieldItem {
        /// Slot.
        inventory_index: usize,
    },
    /// Stop wielding an inventory slot.
    UnwieldItem {
        /// Slot.
        inventory_index: usize,
    },
    /// Eat one unit from an inventory slot.
    EatItem {
        /// Slot.
        inventory_index: usize,
    },
    /// Use an item on something.
    UseItem {
        /// Item type used.
        #[serde(rename = "itemID")]
        item_id: u32,
        /// What it was used on.
        #[serde(rename = "targetID", default)]
        target: Option<ActorId>,
    },
    /// Swap two inventory slots.
    SwapInventorySlots {
        /// First slot.
        from_slot: usize,
        /// Second slot.
        to_slot: usize,
    },
    /// Remove items from the inventory; `amount` 0 removes the stack.
    RemoveItemFromInventory {
        /// Item type.
        #[serde(rename = "itemID")]
        item_id: u32,
        /// Quantity.
        #[serde(default)]
        amount: u32,
    },
    /// Grant items (scripted dialogue rewards).
    AddItemToInventory {
        /// Item type.
        #[serde(rename = "itemID")]
        item_id: u32,
        /// Quantity.
        #[serde(default)]
        quantity: u32,
    },
    /// Advance a quest (scripted dialogue).
    QuestProgressUpdate {
        /// Quest slot.
        #[serde(rename = "questID")]
        quest_id: usize,
        /// New progress.
        progress: i32,
    },
    /// Pick which skill melee trains.
    ChangeAttackStyle {
        /// New style.
        attack_style: AttackStyle,
    },
    /// Recolour the character.
    ChangeAppearance {
        /// Skin colour.
        skin_color: u32,
        /// Hair colour.
        hair_color: u32,
        /// Shirt colour.
        shirt_color: u32,
        /// Pants colour.
        pants_color: u32,
    },
    /// Make an NPC attack the sender (scripted dialogue).
    ForceNpcAttackPlayer {
        /// The NPC.
        #[serde(rename = "npcID")]
        npc: ActorId,
    },
    /// Say something.
    ChatMessage {
        /// Text.
        message: String,
        /// Global channel.
        #[serde(default)]
        is_global: bool,
    },
    /// Leave the game.
    LogOut,
}

impl Action {
    /// Decode a wire intent.
    pub fn from_wire(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

fn inventory(actor: &Actor) -> SimResult<&Inventory> {
    actor
        .player_data()
        .map(|p| &p.inventory)
        .ok_or_else(|| SimError::InvalidInput(format!("{} carries no inventory", actor.label())))
}

fn unwield_slot(actor: &mut Actor, index: usize) {
    if actor.weapon() == Some(index) {
        actor.set_weapon(None);
    }
    if actor.shield() == Some(index) {
        actor.set_shield(None);
    }
}

fn npc_target<'w>(ctx: &'w SimContext<'_>, me: ActorId, target: ActorId) -> SimResult<&'w Actor> {
    if target == me {
        return Err(SimError::SelfTarget(me));
    }
    ctx.world.actor(target).ok_or(SimError::ActorNotFound(target))
}

/// Apply one intent to the player that sent it.
pub(crate) fn apply(actor: &mut Actor, action: Action, ctx: &mut SimContext<'_>) -> SimResult<()> {
    let me = actor.id();
    match action {
        Action::PlayerMove { x, y } => {
            let tile = TilePos::new(x, y);
            if !ctx.map.in_bounds(tile) {
                return Err(SimError::InvalidInput(format!("move target {tile} is off the map")));
            }
            actor.clear_targets();
            actor.set_destination(tile);
        }
        Action::PlayerAttackMove { target } => {
            let t = npc_target(ctx, me, target)?;
            if t.npc_data().is_some_and(|n| !n.attackable) {
                return Err(SimError::InvalidInput(format!("{} cannot be attacked", t.label())));
            }
            actor.engagement.interaction_target = None;
            actor.engage(target, Goal::Attack);
        }
        Action::PlayerTalkMove { target } => {
            let t = npc_target(ctx, me, target)?;
            if !t.npc_data().is_some_and(|n| n.talkable) {
                return Err(SimError::InvalidInput(format!("{} cannot be talked to", t.label())));
            }
            actor.engage(target, Goal::Talk);
        }
        Action::TradeMove { target } => {
            let t = npc_target(ctx, me, target)?;
            if !t.is_npc() {
                return Err(SimError::InvalidInput("trading is only possible with NPCs".into()));
            }
            actor.engage(target, Goal::Trade);
        }
        Action::PlayerTakeMove { item } => interaction::walk_to_item(actor, item, ctx)?,
        Action::DropItem { inventory_index } => {
            let slot = inventory(actor)?.occupied(inventory_index)?;
            actor
                .update_player(ActorFields::INVENTORY, |p| p.inventory.take_slot(inventory_index))
                .transpose()?;
            unwield_slot(actor, inventory_index);
            ctx.world.spawn_item(
                slot.item_id,
                slot.amount,
                actor.position(),
                Some(ctx.config.item_despawn_ticks),
            );
            ctx.world.sound(SoundEvent::private(sounds::DROP, me));
            ctx.save_inventory(actor);
            ctx.save_wieldables(actor);
        }
        Action::WieldItem { inventory_index } => {
            let slot = inventory(actor)?.occupied(inventory_index)?;
            let item = ctx
                .content
                .item(slot.item_id)
                .ok_or_else(|| SimError::InvalidInput(format!("unknown item {}", slot.item_id)))?;
            let wieldable = item
                .wieldable
                .ok_or_else(|| SimError::InvalidInput(format!("{} cannot be wielded", item.name)))?;
            match wieldable.slot {
                WieldSlot::Weapon => actor.set_weapon(Some(inventory_index)),
                WieldSlot::Shield => actor.set_shield(Some(inventory_index)),
            }
            ctx.save_wieldables(actor);
        }
        Action::UnwieldItem { inventory_index } => {
            if actor.weapon() != Some(inventory_index) && actor.shield() != Some(inventory_index) {
                return Err(SimError::InvalidInput(format!(
                    "slot {inventory_index} is not wielded"
                )));
            }
            unwield_slot(actor, inventory_index);
            ctx.save_wieldables(actor);
        }
        Action::EatItem { inventory_index } => {
            let slot = inventory(actor)?.occupied(inventory_index)?;
            let item = ctx
                .content
                .item(slot.item_id)
                .ok_or_else(|| SimError::InvalidInput(format!("unknown item {}", slot.item_id)))?;
            let heal = item
                .heal_amount
                .ok_or_else(|| SimError::InvalidInput(format!("{} is not edible", item.name)))?;
            let name = item.name.to_lowercase();
            actor
                .update_player(ActorFields::INVENTORY, |p| p.inventory.consume_one(inventory_index))
                .transpose()?;
            actor.heal(heal);
            actor.timers.attack_cooldown = DEFAULT_ATTACK_SPEED;
            ctx.world.notify(me, format!("You eat the {name}. It heals some health."));
            ctx.world.sound(SoundEvent::private(sounds::EAT, me));
            ctx.save_inventory(actor);
        }
        Action::UseItem { .. } => ctx.world.notify(me, "Nothing interesting happens."),
        Action::SwapInventorySlots { from_slot, to_slot } => {
            let inv = inventory(actor)?;
            inv.get(from_slot)?;
            inv.get(to_slot)?;
            if from_slot == to_slot {
                return Ok(());
            }
            actor
                .update_player(ActorFields::INVENTORY, |p| p.inventory.swap(from_slot, to_slot))
                .transpose()?;
            let remap = |slot: Option<usize>| match slot {
                Some(s) if s == from_slot => Some(to_slot),
                Some(s) if s == to_slot => Some(from_slot),
                other => other,
            };
            actor.set_weapon(remap(actor.weapon()));
            actor.set_shield(remap(actor.shield()));
            ctx.save_inventory(actor);
            ctx.save_wieldables(actor);
        }
        Action::RemoveItemFromInventory { item_id, amount } => {
            if inventory(actor)?.count(item_id) == 0 {
                return Err(SimError::InvalidInput(format!("item {item_id} is not carried")));
            }
            let index = actor
                .update_player(ActorFields::INVENTORY, |p| p.inventory.remove_item(item_id, amount))
                .transpose()?;
            if let Some(index) = index
                && inventory(actor)?.get(index)?.is_empty()
            {
                unwield_slot(actor, index);
                ctx.save_wieldables(actor);
            }
            ctx.save_inventory(actor);
        }
        Action::AddItemToInventory { item_id, quantity } => {
            reward::give_item(actor, item_id, quantity, ctx)?;
        }
        Action::QuestProgressUpdate { quest_id, progress } => {
            reward::set_quest_progress(actor, quest_id, progress, ctx)?;
        }
        Action::ChangeAttackStyle { attack_style } => actor.set_attack_style(attack_style),
        Action::ChangeAppearance {
            skin_color,
            hair_color,
            shirt_color,
            pants_color,
        } => {
            let appearance = Appearance {
                skin_color,
                hair_color,
                shirt_color,
                pants_color,
            };
            if actor.player_data().is_some_and(|p| p.appearance != appearance) {
                actor.update_player(ActorFields::APPEARANCE, |p| p.appearance = appearance);
                ctx.save_appearance(actor);
            }
        }
        Action::ForceNpcAttackPlayer { npc } => {
            let target = ctx.world.actor_mut(npc).ok_or(SimError::ActorNotFound(npc))?;
            if !target.is_npc() {
                return Err(SimError::InvalidInput(format!("{} is not an NPC", target.label())));
            }
            if target.is_present() && !target.is_dying() && target.engagement.target.is_none() {
                target.clear_targets();
                target.engage(me, Goal::Attack);
            }
        }
        Action::ChatMessage { message, is_global } => {
            let message: String = message.trim().chars().take(MAX_CHAT_LEN).collect();
            if message.is_empty() {
                return Err(SimError::InvalidInput("empty chat message".into()));
            }
            let sender = actor.label();
            ctx.world.chat.push(ChatMessage::said(&sender, &message, is_global));
        }
        Action::LogOut => {}
    }
    Ok(())
}
