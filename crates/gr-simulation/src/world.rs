use std::collections::HashMap;

use gr_core::{ActorId, ItemId, TilePos};

use crate::actor::Actor;
use crate::chat::ChatMessage;
use crate::event::{SoundEvent, TickEvents};
use crate::item::WorldItem;

/// All live simulation state: actors, ground items, and the chat and events
/// produced during the current tick.
///
/// Players update in join order and NPCs in spawn order. During its own
/// update an actor is taken out of the map (see [`World::take_actor`]) so it
/// can read and mutate the others freely.
#[derive(Debug, Default)]
pub struct World {
    actors: HashMap<ActorId, Actor>,
    players: Vec<ActorId>,
    npcs: Vec<ActorId>,
    items: Vec<WorldItem>,
    /// Chat lines for the next snapshot.
    pub chat: Vec<ChatMessage>,
    /// Events for the next snapshot.
    pub events: TickEvents,
}

impl World {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an actor at the end of its kind's update order.
    pub fn insert(&mut self, actor: Actor) {
        let id = actor.id();
        if actor.is_player() {
            self.players.push(id);
        } else {
            self.npcs.push(id);
        }
        self.actors.insert(id, actor);
    }

    /// Remove an actor for good.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.players.retain(|&p| p != id);
        self.npcs.retain(|&n| n != id);
        self.actors.remove(&id)
    }

    /// Borrow an actor out for its update. Its slot in the update order is kept.
    pub fn take_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    /// Return an actor borrowed with [`World::take_actor`].
    pub fn restore_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id(), actor);
    }

    /// Look up an actor.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Look up an actor mutably.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// True when the actor exists.
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Player ids in update order.
    pub fn player_ids(&self) -> Vec<ActorId> {
        self.players.clone()
    }

    /// NPC ids in update order.
    pub fn npc_ids(&self) -> Vec<ActorId> {
        self.npcs.clone()
    }

    /// Players in update order.
    pub fn players(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.players.iter().filter_map(|id| self.actors.get(id))
    }

    /// NPCs in update order.
    pub fn npcs(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.npcs.iter().filter_map(|id| self.actors.get(id))
    }

    /// Every actor, in no particular order.
    pub fn actors_mut(&mut self) -> impl Iterator<Item = &mut Actor> + '_ {
        self.actors.values_mut()
    }

    /// Number of players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of NPCs.
    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    /// True when a visible actor stands on `tile`.
    pub fn is_occupied(&self, tile: TilePos) -> bool {
        self.actors
            .values()
            .any(|a| a.is_present() && a.position() == tile)
    }

    /// Place an item on the ground.
    pub fn spawn_item(
        &mut self,
        item_type: u32,
        amount: u32,
        position: TilePos,
        despawn_ticks: Option<u32>,
    ) -> ItemId {
        let item = WorldItem::new(item_type, amount, position, despawn_ticks);
        let id = item.id();
        self.items.push(item);
        id
    }

    /// Look up a ground item, deleted ones included.
    pub fn item(&self, id: ItemId) -> Option<&WorldItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Look up a ground item mutably.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut WorldItem> {
        self.items.iter_mut().find(|i| i.id() == id)
    }

    /// All ground items.
    pub fn items(&self) -> &[WorldItem] {
        &self.items
    }

    /// All ground items, mutably.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut WorldItem> + '_ {
        self.items.iter_mut()
    }

    /// Queue a private server notice.
    pub fn notify(&mut self, player: ActorId, message: impl Into<String>) {
        self.chat.push(ChatMessage::notice(player, message));
    }

    /// Queue a sound cue.
    pub fn sound(&mut self, sound: SoundEvent) {
        self.events.sounds.push(sound);
    }

    /// End-of-tick cleanup: clear every change set, purge deleted items, and
    /// drop the tick's chat and events.
    pub fn finish_tick(&mut self) {
        for actor in self.actors.values_mut() {
            actor.clear_changes();
        }
        self.items.retain(|i| !i.is_deleted());
        for item in &mut self.items {
            item.clear_changes();
        }
        self.chat.clear();
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::CharacterRecord;
    use gr_core::ContentRegistry;

    fn player(world: &mut World, name: &str, at: TilePos) -> ActorId {
        let content = ContentRegistry::builtin();
        let record = CharacterRecord::new_character(1, name, at);
        let actor = Actor::player(ActorId::new(), record, at, &content);
        let id = actor.id();
        world.insert(actor);
        id
    }

    #[test]
    fn update_order_survives_take_and_restore() {
        let mut world = World::new();
        let a = player(&mut world, "a", TilePos::new(0, 0));
        let b = player(&mut world, "b", TilePos::new(1, 0));
        let taken = world.take_actor(a).unwrap();
        assert!(!world.contains(a));
        assert_eq!(world.players().count(), 1);
        world.restore_actor(taken);
        assert_eq!(world.player_ids(), vec![a, b]);
    }

    #[test]
    fn occupancy_ignores_taken_actor() {
        let mut world = World::new();
        let a = player(&mut world, "a", TilePos::new(2, 2));
        assert!(world.is_occupied(TilePos::new(2, 2)));
        let taken = world.take_actor(a).unwrap();
        assert!(!world.is_occupied(TilePos::new(2, 2)));
        world.restore_actor(taken);
    }

    #[test]
    fn finish_tick_purges_and_clears() {
        let mut world = World::new();
        let a = player(&mut world, "a", TilePos::new(0, 0));
        let gone = world.spawn_item(5, 1, TilePos::new(0, 0), None);
        world.spawn_item(6, 1, TilePos::new(1, 0), None);
        world.item_mut(gone).unwrap().delete();
        world.notify(a, "hi");

        world.finish_tick();
        assert_eq!(world.items().len(), 1);
        assert!(world.items()[0].changed().is_empty());
        assert!(world.actor(a).unwrap().changed().is_empty());
        assert!(world.chat.is_empty());
    }

    #[test]
    fn remove_drops_from_order() {
        let mut world = World::new();
        let a = player(&mut world, "a", TilePos::new(0, 0));
        assert!(world.remove(a).is_some());
        assert_eq!(world.player_count(), 0);
        assert!(world.remove(a).is_none());
    }
}
