//! Delta sync.
//!
//! After every tick each connection receives an [`Envelope`]: the players,
//! NPCs and ground items whose change sets are non-empty (each reduced to the
//! changed fields plus its id), the tick's events, and the chat lines it is
//! allowed to see. Empty collections are left out. A connection's first
//! envelope is a full snapshot instead.

use gr_core::{ActorId, Direction, ItemId, Skills};
use serde::Serialize;

use crate::actor::{Actor, ActorKind, AttackStyle};
use crate::changes::{ActorFields, ItemFields};
use crate::chat::ChatMessage;
use crate::event::{AttackEvent, SoundEvent, TalkEvent, TradeEvent};
use crate::item::WorldItem;
use crate::world::World;

/// Wire encoding of "no slot" and "no damage".
const NONE: i32 = -1;

fn slot_to_wire(slot: Option<usize>) -> i32 {
    slot.and_then(|s| i32::try_from(s).ok()).unwrap_or(NONE)
}

fn damage_to_wire(damage: Option<u32>) -> i32 {
    damage.and_then(|d| i32::try_from(d).ok()).unwrap_or(NONE)
}

/// Sparse view of a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    /// Always present.
    #[serde(rename = "entityID")]
    pub entity_id: ActorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_amounts: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quest_progress: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub influence: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shirt_color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pants_color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Skills>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_hitpoints: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_combat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shield: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_style: Option<AttackStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_damage_dealt: Option<i32>,
    #[serde(flatten)]
    pub motion: Motion,
}

/// Sparse view of an NPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcDto {
    /// Always present.
    #[serde(rename = "entityID")]
    pub entity_id: ActorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npc_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_hitpoints: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_combat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_damage_dealt: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_respawning: Option<bool>,
    #[serde(flatten)]
    pub motion: Motion,
}

/// Fields every actor shares: tile, previous tile, directions, dying flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Motion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tick_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tick_y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facing_direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tile_direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_dying: Option<bool>,
}

impl Motion {
    fn from_actor(actor: &Actor, fields: ActorFields) -> Self {
        let mut dto = Self::default();
        if fields.contains(ActorFields::POSITION) {
            dto.world_x = Some(actor.position().x);
            dto.world_y = Some(actor.position().y);
            dto.last_tick_x = Some(actor.last_position().x);
            dto.last_tick_y = Some(actor.last_position().y);
        }
        if fields.contains(ActorFields::FACING) {
            dto.facing_direction = Some(actor.facing());
        }
        if fields.contains(ActorFields::NEXT_DIRECTION) {
            dto.next_tile_direction = Some(actor.next_direction());
        }
        if fields.contains(ActorFields::DYING) {
            dto.is_dying = Some(actor.is_dying());
        }
        dto
    }
}

impl PlayerDto {
    /// View holding the fields in `fields`. Returns `None` for NPCs.
    pub fn from_fields(actor: &Actor, fields: ActorFields) -> Option<Self> {
        let ActorKind::Player(p) = actor.kind() else {
            return None;
        };
        let mut dto = Self {
            entity_id: actor.id(),
            motion: Motion::from_actor(actor, fields),
            ..Self::default()
        };
        if fields.contains(ActorFields::IDENTITY) {
            dto.username = Some(p.username.clone());
        }
        if fields.contains(ActorFields::INVENTORY) {
            dto.inventory = Some(p.inventory.item_ids());
            dto.inventory_amounts = Some(p.inventory.amounts());
        }
        if fields.contains(ActorFields::QUEST_PROGRESS) {
            dto.quest_progress = Some(p.quest_progress.clone());
        }
        if fields.contains(ActorFields::INFLUENCE) {
            dto.influence = Some(p.influence);
        }
        if fields.contains(ActorFields::APPEARANCE) {
            dto.skin_color = Some(p.appearance.skin_color);
            dto.hair_color = Some(p.appearance.hair_color);
            dto.shirt_color = Some(p.appearance.shirt_color);
            dto.pants_color = Some(p.appearance.pants_color);
        }
        if fields.contains(ActorFields::SKILLS) {
            dto.skills = Some(*actor.skills());
        }
        if fields.contains(ActorFields::HITPOINTS) {
            dto.current_hitpoints = Some(actor.hitpoints());
        }
        if fields.contains(ActorFields::IN_COMBAT) {
            dto.is_in_combat = Some(actor.in_combat());
        }
        if fields.contains(ActorFields::WEAPON) {
            dto.weapon = Some(slot_to_wire(actor.weapon()));
        }
        if fields.contains(ActorFields::SHIELD) {
            dto.shield = Some(slot_to_wire(actor.shield()));
        }
        if fields.contains(ActorFields::ATTACK_STYLE) {
            dto.attack_style = Some(actor.attack_style());
        }
        if fields.contains(ActorFields::LAST_DAMAGE) {
            dto.last_damage_dealt = Some(damage_to_wire(actor.last_damage()));
        }
        Some(dto)
    }

    /// Changed fields only; `None` when nothing but the id would be sent.
    pub fn delta(actor: &Actor) -> Option<Self> {
        Self::from_fields(actor, actor.changed()).filter(|d| !d.has_only_id())
    }

    /// Every field.
    pub fn full(actor: &Actor) -> Option<Self> {
        Self::from_fields(actor, ActorFields::all())
    }

    /// True when no field besides the id is set.
    pub fn has_only_id(&self) -> bool {
        *self
            == Self {
                entity_id: self.entity_id,
                ..Self::default()
            }
    }
}

impl NpcDto {
    /// View holding the fields in `fields`. Returns `None` for players.
    pub fn from_fields(actor: &Actor, fields: ActorFields) -> Option<Self> {
        let ActorKind::Npc(n) = actor.kind() else {
            return None;
        };
        let mut dto = Self {
            entity_id: actor.id(),
            motion: Motion::from_actor(actor, fields),
            ..Self::default()
        };
        if fields.contains(ActorFields::IDENTITY) {
            dto.npc_index = Some(n.species);
        }
        if fields.contains(ActorFields::HITPOINTS) {
            dto.current_hitpoints = Some(actor.hitpoints());
        }
        if fields.contains(ActorFields::IN_COMBAT) {
            dto.is_in_combat = Some(actor.in_combat());
        }
        if fields.contains(ActorFields::LAST_DAMAGE) {
            dto.last_damage_dealt = Some(damage_to_wire(actor.last_damage()));
        }
        if fields.contains(ActorFields::RESPAWNING) {
            dto.is_respawning = Some(n.respawning);
        }
        Some(dto)
    }

    /// Changed fields only; `None` when nothing but the id would be sent.
    pub fn delta(actor: &Actor) -> Option<Self> {
        Self::from_fields(actor, actor.changed()).filter(|d| !d.has_only_id())
    }

    /// Every field.
    pub fn full(actor: &Actor) -> Option<Self> {
        Self::from_fields(actor, ActorFields::all())
    }

    /// True when no field besides the id is set.
    pub fn has_only_id(&self) -> bool {
        *self
            == Self {
                entity_id: self.entity_id,
                ..Self::default()
            }
    }
}

/// Sparse view of a ground item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    /// Always present.
    #[serde(rename = "uniqueID")]
    pub unique_id: ItemId,
    #[serde(rename = "itemID", skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl ItemDto {
    /// View holding the fields in `fields`.
    pub fn from_fields(item: &WorldItem, fields: ItemFields) -> Self {
        let mut dto = Self {
            unique_id: item.id(),
            ..Self::default()
        };
        if fields.contains(ItemFields::ITEM_TYPE) {
            dto.item_id = Some(item.item_type());
        }
        if fields.contains(ItemFields::AMOUNT) {
            dto.amount = Some(item.amount());
        }
        if fields.contains(ItemFields::POSITION) {
            dto.world_x = Some(item.position().x);
            dto.world_y = Some(item.position().y);
        }
        if fields.contains(ItemFields::DELETED) {
            dto.is_deleted = Some(item.is_deleted());
        }
        dto
    }

    /// Changed fields only; `None` when nothing but the id would be sent.
    pub fn delta(item: &WorldItem) -> Option<Self> {
        Some(Self::from_fields(item, item.changed())).filter(|d| !d.has_only_id())
    }

    /// Every field.
    pub fn full(item: &WorldItem) -> Self {
        Self::from_fields(item, ItemFields::all())
    }

    /// True when no field besides the id is set.
    pub fn has_only_id(&self) -> bool {
        *self
            == Self {
                unique_id: self.unique_id,
                ..Self::default()
            }
    }
}

/// What one connection receives after a tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "tickAttackEvents", skip_serializing_if = "Option::is_none")]
    pub attack_events: Option<Vec<AttackEvent>>,
    #[serde(rename = "tickTalkEvents", skip_serializing_if = "Option::is_none")]
    pub talk_events: Option<Vec<TalkEvent>>,
    #[serde(rename = "tickTradeEvents", skip_serializing_if = "Option::is_none")]
    pub trade_events: Option<Vec<TradeEvent>>,
    #[serde(rename = "tickSoundEvents", skip_serializing_if = "Option::is_none")]
    pub sound_events: Option<Vec<SoundEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npcs: Option<Vec<NpcDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_messages: Option<Vec<ChatMessage>>,
    /// Set only in a connection's first snapshot.
    #[serde(rename = "playerID", skip_serializing_if = "Option::is_none")]
    pub player_id: Option<ActorId>,
    /// Entity ids of every online player; clients drop anyone missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_players: Option<Vec<ActorId>>,
}

impl Envelope {
    /// True when nothing would be sent.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// The parts of a tick's envelopes that every connection shares.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    players: Vec<PlayerDto>,
    npcs: Vec<NpcDto>,
    items: Vec<ItemDto>,
    online_players: Option<Vec<ActorId>>,
}

impl Frame {
    /// Changed entities only. The roster goes along when it changed.
    pub fn delta(world: &World, roster_changed: bool) -> Self {
        Self {
            players: world.players().filter_map(PlayerDto::delta).collect(),
            npcs: world.npcs().filter_map(NpcDto::delta).collect(),
            items: world.items().iter().filter_map(ItemDto::delta).collect(),
            online_players: roster_changed.then(|| roster(world)),
        }
    }

    /// Every live entity, regardless of change sets.
    pub fn full(world: &World) -> Self {
        Self {
            players: world.players().filter_map(PlayerDto::full).collect(),
            npcs: world.npcs().filter_map(NpcDto::full).collect(),
            items: world
                .items()
                .iter()
                .filter(|i| !i.is_deleted())
                .map(ItemDto::full)
                .collect(),
            online_players: Some(roster(world)),
        }
    }

    /// The envelope for `viewer`: shared entities plus the events and chat
    /// lines this viewer may see. `first` marks a connection's first envelope.
    pub fn envelope_for(&self, world: &World, viewer: ActorId, first: bool) -> Envelope {
        let events = &world.events;
        Envelope {
            attack_events: non_empty(events.attacks.clone()),
            talk_events: non_empty(events.talks.clone()),
            trade_events: non_empty(events.trades.clone()),
            sound_events: non_empty(
                events
                    .sounds
                    .iter()
                    .filter(|s| s.audible_to(viewer))
                    .cloned()
                    .collect(),
            ),
            players: non_empty(self.players.clone()),
            npcs: non_empty(self.npcs.clone()),
            items: non_empty(self.items.clone()),
            chat_messages: non_empty(
                world
                    .chat
                    .iter()
                    .filter(|c| c.visible_to(viewer))
                    .cloned()
                    .collect(),
            ),
            player_id: first.then_some(viewer),
            online_players: self.online_players.clone(),
        }
    }
}

/// Entity ids of everyone online, in join order.
pub fn roster(world: &World) -> Vec<ActorId> {
    world.players().map(Actor::id).collect()
}

/// A delivery target could not take the envelope.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The connection is gone.
    #[error("connection closed")]
    Closed,

    /// The envelope could not be serialized.
    #[error("could not encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where one connection's envelopes go. Implementations must not block.
pub trait Outbound: Send {
    /// Hand over an envelope.
    fn deliver(&self, envelope: &Envelope) -> Result<(), DeliveryError>;
}

impl Outbound for crossbeam_channel::Sender<Envelope> {
    fn deliver(&self, envelope: &Envelope) -> Result<(), DeliveryError> {
        self.send(envelope.clone()).map_err(|_| DeliveryError::Closed)
    }
}
