use gr_core::{CollisionMap, ContentRegistry, TilePos};
use rand::rngs::StdRng;
use tracing::error;

use crate::actor::Actor;
use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::intake::{Effect, Inbox, Schedule};
use crate::persistence::{CharacterStore, StoreError};
use crate::world::World;

/// Mutable context passed to systems during each tick.
pub struct SimContext<'a> {
    /// Live actors, items, chat and events.
    pub world: &'a mut World,
    /// Static collision map.
    pub map: &'a CollisionMap,
    /// Static content tables.
    pub content: &'a ContentRegistry,
    /// Tunables.
    pub config: &'a SimConfig,
    /// Tick counter.
    pub clock: &'a SimClock,
    /// Seeded RNG.
    pub rng: &'a mut StdRng,
    /// Character storage.
    pub store: &'a dyn CharacterStore,
    /// Effects due on later ticks.
    pub schedule: &'a mut Schedule,
    /// Player actions received for this tick.
    pub inbox: &'a mut Inbox,
}

impl SimContext<'_> {
    /// Current tick.
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Run `effect` at the start of the next tick.
    pub fn defer(&mut self, effect: Effect) {
        let at = self.clock.tick() + 1;
        self.schedule.at(at, effect);
    }

    /// True when two tiles are close enough to fight or talk.
    pub fn in_reach(&self, a: TilePos, b: TilePos) -> bool {
        if self.config.diagonal_reach {
            a.is_adjacent(b)
        } else {
            a.is_orthogonally_adjacent(b)
        }
    }

    /// Save a player's tile.
    pub fn save_position(&self, actor: &Actor) {
        if let Some(id) = actor.account_id() {
            log_save("position", id, self.store.save_position(id, actor.position()));
        }
    }

    /// Save a player's inventory.
    pub fn save_inventory(&self, actor: &Actor) {
        if let Some(p) = actor.player_data() {
            log_save(
                "inventory",
                p.account_id,
                self.store.save_inventory(p.account_id, p.inventory.slots()),
            );
        }
    }

    /// Save a player's wielded slots.
    pub fn save_wieldables(&self, actor: &Actor) {
        if let Some(id) = actor.account_id() {
            log_save(
                "wieldables",
                id,
                self.store.save_wieldables(id, actor.weapon(), actor.shield()),
            );
        }
    }

    /// Save one of a player's skills.
    pub fn save_skill(&self, actor: &Actor, skill: gr_core::Skill) {
        if let Some(id) = actor.account_id() {
            log_save(
                "skill",
                id,
                self.store.save_skill(id, skill, actor.skills().xp(skill)),
            );
        }
    }

    /// Save a player's appearance.
    pub fn save_appearance(&self, actor: &Actor) {
        if let Some(p) = actor.player_data() {
            log_save(
                "appearance",
                p.account_id,
                self.store.save_appearance(p.account_id, p.appearance),
            );
        }
    }

    /// Save a player's quest progress.
    pub fn save_quest_progress(&self, actor: &Actor) {
        if let Some(p) = actor.player_data() {
            log_save(
                "quest progress",
                p.account_id,
                self.store.save_quest_progress(p.account_id, &p.quest_progress),
            );
        }
    }
}

fn log_save(what: &str, account_id: i64, result: Result<(), StoreError>) {
    if let Err(e) = result {
        error!(account_id, error = %e, "failed to save {what}");
    }
}
