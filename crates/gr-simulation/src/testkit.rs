//! Owned state for building a [`SimContext`] in unit tests.

use std::time::Duration;

use gr_core::{ActorId, CollisionMap, ContentRegistry, TilePos};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::actor::Actor;
use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::intake::{Inbox, Schedule};
use crate::persistence::{CharacterRecord, MemoryStore};
use crate::world::World;

pub(crate) struct Fixture {
    pub world: World,
    pub map: CollisionMap,
    pub content: ContentRegistry,
    pub config: SimConfig,
    pub clock: SimClock,
    pub rng: StdRng,
    pub store: MemoryStore,
    pub schedule: Schedule,
    pub inbox: Inbox,
    next_account: i64,
}

impl Fixture {
    pub fn new(map: CollisionMap) -> Self {
        Self {
            world: World::new(),
            map,
            content: ContentRegistry::builtin(),
            config: SimConfig::default(),
            clock: SimClock::new(Duration::from_millis(600)),
            rng: StdRng::seed_from_u64(7),
            store: MemoryStore::new(),
            schedule: Schedule::default(),
            inbox: Inbox::default(),
            next_account: 1,
        }
    }

    pub fn open(width: i32, height: i32) -> Self {
        Self::new(CollisionMap::open(width, height))
    }

    pub fn ascii(rows: &[&str]) -> Self {
        Self::new(CollisionMap::from_ascii(rows))
    }

    pub fn ctx(&mut self) -> SimContext<'_> {
        SimContext {
            world: &mut self.world,
            map: &self.map,
            content: &self.content,
            config: &self.config,
            clock: &self.clock,
            rng: &mut self.rng,
            store: &self.store,
            schedule: &mut self.schedule,
            inbox: &mut self.inbox,
        }
    }

    /// A stored player that is not yet in the world.
    pub fn player_actor(&mut self, name: &str, at: TilePos) -> Actor {
        let record = CharacterRecord::new_character(self.next_account, name, at);
        self.next_account += 1;
        self.store.insert(record.clone());
        Actor::player(ActorId::new(), record, self.config.player_spawn, &self.content)
    }

    pub fn insert_player(&mut self, name: &str, at: TilePos) -> ActorId {
        let actor = self.player_actor(name, at);
        let id = actor.id();
        self.world.insert(actor);
        id
    }

    pub fn npc_actor(&self, species: u32, at: TilePos) -> Actor {
        let data = self
            .content
            .species(species)
            .unwrap_or_else(|| panic!("species {species} missing"));
        Actor::npc(ActorId::new(), data, at, 3)
    }

    pub fn insert_npc(&mut self, species: u32, at: TilePos) -> ActorId {
        let actor = self.npc_actor(species, at);
        let id = actor.id();
        self.world.insert(actor);
        id
    }
}
