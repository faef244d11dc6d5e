use std::collections::VecDeque;

use gr_core::content::{ContentRegistry, QUEST_COMPLETE, SpeciesData, Wieldable};
use gr_core::{ActorId, Direction, ItemId, Skill, Skills, TilePos};
use serde::{Deserialize, Serialize};

use crate::changes::{ActorFields, assign};
use crate::inventory::Inventory;
use crate::persistence::CharacterRecord;

/// Player appearance colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    /// Skin colour index.
    pub skin_color: u32,
    /// Hair colour index.
    pub hair_color: u32,
    /// Shirt colour index.
    pub shirt_color: u32,
    /// Pants colour index.
    pub pants_color: u32,
}

/// Which skill melee hits train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStyle {
    /// Trains attack.
    #[default]
    Attack,
    /// Trains strength.
    Strength,
    /// Trains defence.
    Defence,
}

impl AttackStyle {
    /// The skill this style trains.
    pub fn skill(self) -> Skill {
        match self {
            AttackStyle::Attack => Skill::Attack,
            AttackStyle::Strength => Skill::Strength,
            AttackStyle::Defence => Skill::Defence,
        }
    }
}

/// What an actor wants to do with its target once adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Goal {
    /// Nothing.
    #[default]
    None,
    /// Fight it.
    Attack,
    /// Open a conversation.
    Talk,
    /// Open a trade.
    Trade,
}

/// Coarse actor state, derived from the fields below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Standing still with nothing to do.
    Idle,
    /// Following a route.
    Moving,
    /// Walking to, or held by, a conversation or trade.
    Interacting,
    /// Pursuing or fighting a target.
    Attacking,
    /// Playing the death sequence.
    Dying,
    /// Hidden, waiting to respawn (NPCs only).
    Respawning,
}

/// Route state.
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    /// Tile the actor is heading for.
    pub destination: Option<TilePos>,
    /// Remaining steps of the current route, nearest first.
    pub waypoints: VecDeque<TilePos>,
    /// Last tile of the full route; may lie beyond the kept waypoints.
    pub route_end: Option<TilePos>,
    /// Set when the destination changed and a new route is needed.
    pub replan: bool,
    /// Consecutive ticks the next step was blocked.
    pub stalled_ticks: u32,
    /// Target tile the current route was planned against.
    pub target_last_seen: Option<TilePos>,
    /// Ticks an NPC waits before chasing after it swung.
    pub follow_delay: u32,
}

/// Targets.
#[derive(Debug, Clone, Default)]
pub struct Engagement {
    /// Actor being pursued.
    pub target: Option<ActorId>,
    /// What to do on arrival.
    pub goal: Goal,
    /// Player an NPC is held in conversation with.
    pub interaction_target: Option<ActorId>,
    /// Ground item being walked to.
    pub target_item: Option<ItemId>,
}

/// Tick counters.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    /// Ticks until the next attack is allowed.
    pub attack_cooldown: u32,
    /// Tick the current hit splat was shown on.
    pub damage_shown_at: Option<u64>,
    /// Ticks until the in-combat flag drops.
    pub combat_ticks: u32,
    /// Ticks spent dying so far.
    pub dying_ticks: u32,
}

/// State only players have.
#[derive(Debug, Clone)]
pub struct PlayerData {
    /// Storage key.
    pub account_id: i64,
    /// Display name.
    pub username: String,
    /// Carried items.
    pub inventory: Inventory,
    /// Progress per quest slot.
    pub quest_progress: Vec<i32>,
    /// Influence points.
    pub influence: i32,
    /// Appearance colours.
    pub appearance: Appearance,
}

/// State only NPCs have.
#[derive(Debug, Clone)]
pub struct NpcData {
    /// Species index.
    pub species: u32,
    /// Ticks spent hidden before respawning.
    pub respawn_time: u32,
    /// Ticks spent hidden so far.
    pub respawn_ticks: u32,
    /// Hidden and waiting to respawn.
    pub respawning: bool,
    /// Half-width of the wander square around the spawn tile.
    pub wander_range: i32,
    /// Species can be attacked.
    pub attackable: bool,
    /// Species can be talked to.
    pub talkable: bool,
}

/// The kind-specific part of an actor.
#[derive(Debug, Clone)]
pub enum ActorKind {
    /// A connected player.
    Player(Box<PlayerData>),
    /// A server-controlled character.
    Npc(NpcData),
}

/// Anything that stands on a tile, moves, and fights.
///
/// Fields that clients see are private and only change through setters,
/// which record the change in the actor's [`ActorFields`] set. Navigation,
/// targeting and timers are server-side only and public to the crate.
#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    kind: ActorKind,
    position: TilePos,
    last_position: TilePos,
    spawn: TilePos,
    facing: Direction,
    next_direction: Direction,
    dying: bool,
    skills: Skills,
    hitpoints: u32,
    weapon: Option<usize>,
    shield: Option<usize>,
    attack_style: AttackStyle,
    last_damage: Option<u32>,
    in_combat: bool,
    changed: ActorFields,
    /// Route state.
    pub nav: Navigation,
    /// Targets.
    pub engagement: Engagement,
    /// Tick counters.
    pub timers: Timers,
}

impl Actor {
    fn base(id: ActorId, kind: ActorKind, position: TilePos, spawn: TilePos, skills: Skills) -> Self {
        Self {
            id,
            kind,
            position,
            last_position: position,
            spawn,
            facing: Direction::Down,
            next_direction: Direction::None,
            dying: false,
            hitpoints: skills.max_hitpoints(),
            skills,
            weapon: None,
            shield: None,
            attack_style: AttackStyle::default(),
            last_damage: None,
            in_combat: false,
            changed: ActorFields::all(),
            nav: Navigation::default(),
            engagement: Engagement::default(),
            timers: Timers::default(),
        }
    }

    /// A player restored from its stored record, at full health.
    pub fn player(id: ActorId, record: CharacterRecord, spawn: TilePos, content: &ContentRegistry) -> Self {
        let influence = record
            .quest_progress
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == QUEST_COMPLETE)
            .filter_map(|(quest_id, _)| content.quest(quest_id))
            .map(|q| q.reward.influence)
            .sum();
        let data = PlayerData {
            account_id: record.account_id,
            username: record.username,
            inventory: Inventory::from_slots(record.inventory),
            quest_progress: record.quest_progress,
            influence,
            appearance: record.appearance,
        };
        let mut actor = Self::base(
            id,
            ActorKind::Player(Box::new(data)),
            record.position,
            spawn,
            record.skills,
        );
        actor.weapon = record.weapon;
        actor.shield = record.shield;
        actor
    }

    /// A freshly spawned NPC of `species`.
    pub fn npc(id: ActorId, species: &SpeciesData, spawn: TilePos, wander_range: i32) -> Self {
        let data = NpcData {
            species: species.entity_index,
            respawn_time: species.respawn_time,
            respawn_ticks: 0,
            respawning: false,
            wander_range,
            attackable: species.is_attackable,
            talkable: species.is_talkable,
        };
        Self::base(id, ActorKind::Npc(data), spawn, spawn, species.skills)
    }

    /// Actor id.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Kind-specific state.
    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    /// Player state, when this is a player.
    pub fn player_data(&self) -> Option<&PlayerData> {
        match &self.kind {
            ActorKind::Player(p) => Some(p),
            ActorKind::Npc(_) => None,
        }
    }

    /// NPC state, when this is an NPC.
    pub fn npc_data(&self) -> Option<&NpcData> {
        match &self.kind {
            ActorKind::Npc(n) => Some(n),
            ActorKind::Player(_) => None,
        }
    }

    /// True for players.
    pub fn is_player(&self) -> bool {
        matches!(self.kind, ActorKind::Player(_))
    }

    /// True for NPCs.
    pub fn is_npc(&self) -> bool {
        matches!(self.kind, ActorKind::Npc(_))
    }

    /// Username for players, `npc#<species>` otherwise. For logs.
    pub fn label(&self) -> String {
        match &self.kind {
            ActorKind::Player(p) => p.username.clone(),
            ActorKind::Npc(n) => format!("npc#{}", n.species),
        }
    }

    /// Storage key for players.
    pub fn account_id(&self) -> Option<i64> {
        self.player_data().map(|p| p.account_id)
    }

    /// Current tile.
    pub fn position(&self) -> TilePos {
        self.position
    }

    /// Tile occupied before the last move.
    pub fn last_position(&self) -> TilePos {
        self.last_position
    }

    /// Spawn tile.
    pub fn spawn(&self) -> TilePos {
        self.spawn
    }

    /// Facing direction.
    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// Direction of the next queued step.
    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    /// True while the death sequence plays.
    pub fn is_dying(&self) -> bool {
        self.dying
    }

    /// True while an NPC is hidden waiting to respawn.
    pub fn is_respawning(&self) -> bool {
        self.npc_data().is_some_and(|n| n.respawning)
    }

    /// True when the actor can be targeted, hit, and blocks its tile.
    pub fn is_present(&self) -> bool {
        !self.is_respawning()
    }

    /// Skill experience.
    pub fn skills(&self) -> &Skills {
        &self.skills
    }

    /// Current hitpoints.
    pub fn hitpoints(&self) -> u32 {
        self.hitpoints
    }

    /// Hitpoints level.
    pub fn max_hitpoints(&self) -> u32 {
        self.skills.max_hitpoints()
    }

    /// Inventory slot holding the weapon.
    pub fn weapon(&self) -> Option<usize> {
        self.weapon
    }

    /// Inventory slot holding the shield.
    pub fn shield(&self) -> Option<usize> {
        self.shield
    }

    /// Attack style.
    pub fn attack_style(&self) -> AttackStyle {
        self.attack_style
    }

    /// Last damage taken, while its splat is showing.
    pub fn last_damage(&self) -> Option<u32> {
        self.last_damage
    }

    /// True while recently hit.
    pub fn in_combat(&self) -> bool {
        self.in_combat
    }

    /// Fields changed since the last broadcast.
    pub fn changed(&self) -> ActorFields {
        self.changed
    }

    /// Forget all recorded changes. Called once per tick after broadcasting.
    pub fn clear_changes(&mut self) {
        self.changed = ActorFields::empty();
    }

    /// Coarse state for reporting.
    pub fn state(&self) -> ActorState {
        if self.is_respawning() {
            ActorState::Respawning
        } else if self.dying {
            ActorState::Dying
        } else if self.engagement.interaction_target.is_some() {
            ActorState::Interacting
        } else if self.engagement.target.is_some() {
            match self.engagement.goal {
                Goal::Talk | Goal::Trade => ActorState::Interacting,
                Goal::Attack | Goal::None => ActorState::Attacking,
            }
        } else if self.nav.destination.is_some() {
            ActorState::Moving
        } else {
            ActorState::Idle
        }
    }

    /// Stats of the wielded weapon, if any.
    pub fn weapon_stats(&self, content: &ContentRegistry) -> Option<Wieldable> {
        let slot = self.weapon?;
        let item_id = self.player_data()?.inventory.get(slot).ok()?.item_id;
        content.item(item_id)?.wieldable
    }

    /// Step onto a neighbouring tile.
    pub fn move_to(&mut self, to: TilePos, facing: Direction) {
        self.last_position = self.position;
        self.position = to;
        self.changed.insert(ActorFields::POSITION);
        self.face(facing);
    }

    /// Place the actor on a tile without walking there.
    pub fn teleport(&mut self, to: TilePos) {
        self.last_position = to;
        assign(&mut self.changed, ActorFields::POSITION, &mut self.position, to);
    }

    /// Turn to `direction`; `None` keeps the current facing.
    pub fn face(&mut self, direction: Direction) {
        if direction != Direction::None {
            assign(&mut self.changed, ActorFields::FACING, &mut self.facing, direction);
        }
    }

    /// Turn toward a tile.
    pub fn face_toward(&mut self, tile: TilePos) {
        self.face(Direction::toward(self.position, tile));
    }

    /// Set the direction of the next queued step.
    pub fn set_next_direction(&mut self, direction: Direction) {
        assign(
            &mut self.changed,
            ActorFields::NEXT_DIRECTION,
            &mut self.next_direction,
            direction,
        );
    }

    /// Enter or leave the death sequence.
    pub fn set_dying(&mut self, dying: bool) {
        if dying != self.dying {
            self.timers.dying_ticks = 0;
        }
        assign(&mut self.changed, ActorFields::DYING, &mut self.dying, dying);
    }

    /// Set hitpoints, clamped to the hitpoints level.
    pub fn set_hitpoints(&mut self, hitpoints: u32) {
        let hitpoints = hitpoints.min(self.max_hitpoints());
        assign(&mut self.changed, ActorFields::HITPOINTS, &mut self.hitpoints, hitpoints);
    }

    /// Remove up to `amount` hitpoints, never going below zero. Returns the
    /// damage actually taken.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.hitpoints);
        self.set_hitpoints(self.hitpoints - dealt);
        dealt
    }

    /// Restore up to `amount` hitpoints. Returns the amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hitpoints;
        self.set_hitpoints(before.saturating_add(amount));
        self.hitpoints - before
    }

    /// Show a hit splat. Always marked, so equal consecutive hits still show.
    pub fn show_damage(&mut self, damage: u32) {
        self.last_damage = Some(damage);
        self.changed.insert(ActorFields::LAST_DAMAGE);
    }

    /// Hide the hit splat.
    pub fn clear_damage(&mut self) {
        assign(&mut self.changed, ActorFields::LAST_DAMAGE, &mut self.last_damage, None);
    }

    /// Set the in-combat flag.
    pub fn set_in_combat(&mut self, in_combat: bool) {
        assign(&mut self.changed, ActorFields::IN_COMBAT, &mut self.in_combat, in_combat);
    }

    /// Point the weapon at an inventory slot.
    pub fn set_weapon(&mut self, slot: Option<usize>) {
        assign(&mut self.changed, ActorFields::WEAPON, &mut self.weapon, slot);
    }

    /// Point the shield at an inventory slot.
    pub fn set_shield(&mut self, slot: Option<usize>) {
        assign(&mut self.changed, ActorFields::SHIELD, &mut self.shield, slot);
    }

    /// Change the attack style.
    pub fn set_attack_style(&mut self, style: AttackStyle) {
        assign(&mut self.changed, ActorFields::ATTACK_STYLE, &mut self.attack_style, style);
    }

    /// Add experience. Returns the new level on a level-up.
    pub fn add_xp(&mut self, skill: Skill, amount: u32) -> Option<u32> {
        if amount == 0 {
            return None;
        }
        let before = self.skills;
        let level_up = self.skills.add_xp(skill, amount);
        if self.skills != before {
            self.changed.insert(ActorFields::SKILLS);
        }
        level_up
    }

    /// Mutate player-only state, recording `field` as changed. Returns `None`
    /// for NPCs.
    pub fn update_player<R>(
        &mut self,
        field: ActorFields,
        f: impl FnOnce(&mut PlayerData) -> R,
    ) -> Option<R> {
        match &mut self.kind {
            ActorKind::Player(p) => {
                self.changed.insert(field);
                Some(f(p))
            }
            ActorKind::Npc(_) => None,
        }
    }

    /// Hide or reveal an NPC waiting to respawn.
    pub fn set_respawning(&mut self, respawning: bool) {
        if let ActorKind::Npc(n) = &mut self.kind {
            n.respawn_ticks = 0;
            assign(&mut self.changed, ActorFields::RESPAWNING, &mut n.respawning, respawning);
        }
    }

    /// Count one hidden tick. Returns true when the NPC reappears.
    pub fn tick_respawn(&mut self) -> bool {
        let due = match &mut self.kind {
            ActorKind::Npc(n) if n.respawning => {
                n.respawn_ticks += 1;
                n.respawn_ticks >= n.respawn_time
            }
            _ => false,
        };
        if due {
            self.set_respawning(false);
        }
        due
    }

    /// Head for `tile`. A new tile triggers a fresh route on the next step.
    pub fn set_destination(&mut self, tile: TilePos) {
        if self.nav.destination != Some(tile) {
            self.nav.destination = Some(tile);
            self.nav.replan = true;
            self.nav.stalled_ticks = 0;
        }
    }

    /// Drop the current route and stand still.
    pub fn stop(&mut self) {
        self.nav.destination = None;
        self.nav.waypoints.clear();
        self.nav.route_end = None;
        self.nav.replan = false;
        self.nav.stalled_ticks = 0;
        self.set_next_direction(Direction::None);
    }

    /// Pursue `target` with `goal`, dropping any item being walked to.
    pub fn engage(&mut self, target: ActorId, goal: Goal) {
        self.engagement.target = Some(target);
        self.engagement.goal = goal;
        self.engagement.target_item = None;
        self.nav.target_last_seen = None;
    }

    /// Forget the current target and goal.
    pub fn disengage(&mut self) {
        self.engagement.target = None;
        self.engagement.goal = Goal::None;
        self.nav.target_last_seen = None;
    }

    /// Forget every target, including items and conversations.
    pub fn clear_targets(&mut self) {
        self.disengage();
        self.engagement.interaction_target = None;
        self.engagement.target_item = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gr_core::content::ContentRegistry;

    fn fresh_player() -> Actor {
        let content = ContentRegistry::builtin();
        let record = CharacterRecord::new_character(1, "ada", TilePos::new(2, 2));
        Actor::player(ActorId::new(), record, TilePos::new(0, 0), &content)
    }

    #[test]
    fn new_actors_are_fully_dirty() {
        let actor = fresh_player();
        assert_eq!(actor.changed(), ActorFields::all());
        assert_eq!(actor.hitpoints(), 10);
        assert_eq!(actor.position(), TilePos::new(2, 2));
        assert_eq!(actor.spawn(), TilePos::new(0, 0));
    }

    #[test]
    fn setters_mark_only_on_change() {
        let mut actor = fresh_player();
        actor.clear_changes();
        actor.set_in_combat(false);
        actor.set_hitpoints(10);
        assert!(actor.changed().is_empty());

        actor.set_in_combat(true);
        assert_eq!(actor.changed(), ActorFields::IN_COMBAT);
    }

    #[test]
    fn hit_splat_always_marks() {
        let mut actor = fresh_player();
        actor.show_damage(2);
        actor.clear_changes();
        actor.show_damage(2);
        assert!(actor.changed().contains(ActorFields::LAST_DAMAGE));
    }

    #[test]
    fn damage_clamps_at_zero_and_heal_at_max() {
        let mut actor = fresh_player();
        assert_eq!(actor.take_damage(4), 4);
        assert_eq!(actor.hitpoints(), 6);
        assert_eq!(actor.take_damage(50), 6);
        assert_eq!(actor.hitpoints(), 0);
        assert_eq!(actor.heal(100), 10);
        assert_eq!(actor.hitpoints(), 10);
    }

    #[test]
    fn move_records_previous_tile_and_facing() {
        let mut actor = fresh_player();
        actor.clear_changes();
        actor.move_to(TilePos::new(3, 2), Direction::Right);
        assert_eq!(actor.last_position(), TilePos::new(2, 2));
        assert_eq!(actor.facing(), Direction::Right);
        assert!(actor.changed().contains(ActorFields::POSITION | ActorFields::FACING));
    }

    #[test]
    fn state_follows_fields() {
        let mut actor = fresh_player();
        assert_eq!(actor.state(), ActorState::Idle);
        actor.set_destination(TilePos::new(5, 5));
        assert_eq!(actor.state(), ActorState::Moving);
        actor.engage(ActorId::new(), Goal::Talk);
        assert_eq!(actor.state(), ActorState::Interacting);
        actor.engage(ActorId::new(), Goal::Attack);
        assert_eq!(actor.state(), ActorState::Attacking);
        actor.set_dying(true);
        assert_eq!(actor.state(), ActorState::Dying);
    }

    #[test]
    fn npc_respawning_hides_it() {
        let content = ContentRegistry::builtin();
        let species = content.species(0).unwrap();
        let mut npc = Actor::npc(ActorId::new(), species, TilePos::new(5, 5), 3);
        assert!(npc.is_present());
        npc.set_respawning(true);
        assert!(!npc.is_present());
        assert_eq!(npc.state(), ActorState::Respawning);
        assert!(npc.update_player(ActorFields::INVENTORY, |_| ()).is_none());
    }

    #[test]
    fn respawn_counts_species_delay() {
        let content = ContentRegistry::builtin();
        let species = content.species(0).unwrap();
        let mut npc = Actor::npc(ActorId::new(), species, TilePos::new(5, 5), 3);
        npc.set_respawning(true);
        for _ in 1..species.respawn_time {
            assert!(!npc.tick_respawn());
        }
        assert!(npc.tick_respawn());
        assert!(npc.is_present());
        assert!(!npc.tick_respawn());
    }

    #[test]
    fn influence_counts_completed_quests() {
        let content = ContentRegistry::builtin();
        let mut record = CharacterRecord::new_character(1, "ada", TilePos::new(0, 0));
        record.quest_progress[0] = QUEST_COMPLETE;
        let actor = Actor::player(ActorId::new(), record, TilePos::new(0, 0), &content);
        assert_eq!(actor.player_data().unwrap().influence, 1);
    }
}
