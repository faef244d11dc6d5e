use std::collections::HashMap;
use std::time::Instant;

use gr_core::{ActorId, CollisionMap, ContentRegistry, TilePos};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::actor::Actor;
use crate::clock::SimClock;
use crate::combat;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::intake::{Effect, Inbound, Inbox, IntakeHandle, IntakeQueue, Login, Schedule};
use crate::item::ItemSystem;
use crate::npcs::NpcSystem;
use crate::persistence::{CharacterRecord, CharacterStore};
use crate::players::PlayerSystem;
use crate::sync::{Frame, Outbound};
use crate::system::System;
use crate::world::World;

const WELCOME: [&str; 2] = [
    "Welcome to the game!",
    "You can interact with the world using your mouse.",
];

struct Connection {
    outbound: Box<dyn Outbound>,
    fresh: bool,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number.
    pub tick: u64,
    /// Players in the world after the tick.
    pub players: usize,
    /// NPCs in the world after the tick.
    pub npcs: usize,
    /// Ground items before the end-of-tick purge.
    pub items: usize,
    /// Intents accepted into this tick.
    pub intents: usize,
    /// Envelopes handed to connections.
    pub envelopes: usize,
    /// Wall-clock time the tick took, in microseconds.
    pub micros: u128,
}

/// The top-level simulation orchestrator.
///
/// Owns the world, the static map and content, the RNG, the intake queue and
/// the connections. Each [`Simulation::tick`] drains the intake, runs due
/// effects, runs every system in registration order, broadcasts one envelope
/// per connection, and finally clears all change sets.
pub struct Simulation {
    world: World,
    map: CollisionMap,
    content: ContentRegistry,
    config: SimConfig,
    clock: SimClock,
    rng: StdRng,
    store: Box<dyn CharacterStore>,
    intake: IntakeQueue,
    schedule: Schedule,
    inbox: Inbox,
    connections: HashMap<ActorId, Connection>,
    roster_changed: bool,
    systems: Vec<Box<dyn System>>,
    initialized: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick())
            .field("players", &self.world.player_count())
            .field("npcs", &self.world.npc_count())
            .field("connections", &self.connections.len())
            .field("systems", &self.systems.len())
            .finish()
    }
}

impl Simulation {
    /// Create a simulation with the player, NPC and item systems registered.
    /// The world starts empty; see [`Simulation::populate`].
    pub fn new(
        map: CollisionMap,
        content: ContentRegistry,
        store: Box<dyn CharacterStore>,
        config: SimConfig,
    ) -> Self {
        let clock = SimClock::new(config.tick_period);
        let rng = StdRng::seed_from_u64(config.seed);
        let mut sim = Self {
            world: World::new(),
            map,
            content,
            config,
            clock,
            rng,
            store,
            intake: IntakeQueue::new(),
            schedule: Schedule::default(),
            inbox: Inbox::default(),
            connections: HashMap::new(),
            roster_changed: false,
            systems: Vec::new(),
            initialized: false,
        };
        sim.add_system(PlayerSystem::new());
        sim.add_system(NpcSystem::new());
        sim.add_system(ItemSystem::new());
        sim
    }

    /// Register a system. Systems are ticked in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Place the content's NPC and ground item spawns. Spawned items never
    /// despawn.
    pub fn populate(&mut self) -> SimResult<()> {
        let npc_spawns = self.content.npc_spawns().to_vec();
        for spawn in npc_spawns {
            self.spawn_npc(spawn.entity_index, spawn.position, spawn.wander_range)?;
        }
        let item_spawns = self.content.item_spawns().to_vec();
        for spawn in item_spawns {
            self.world
                .spawn_item(spawn.item_id, spawn.amount, spawn.position, None);
        }
        info!(
            npcs = self.world.npc_count(),
            items = self.world.items().len(),
            "world populated"
        );
        Ok(())
    }

    /// Spawn one NPC of `species`.
    pub fn spawn_npc(&mut self, species: u32, at: TilePos, wander_range: i32) -> SimResult<ActorId> {
        let data = self
            .content
            .species(species)
            .ok_or(SimError::UnknownSpecies(species))?;
        let actor = Actor::npc(ActorId::new(), data, at, wander_range);
        let id = actor.id();
        self.world.insert(actor);
        Ok(id)
    }

    /// A producer handle for network tasks.
    pub fn intake_handle(&self) -> IntakeHandle {
        self.intake.handle()
    }

    /// Initialize all registered systems.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let result = system.init(&mut self.context());
            self.systems[i] = system;
            result?;
        }
        self.initialized = true;
        Ok(())
    }

    fn context(&mut self) -> SimContext<'_> {
        SimContext {
            world: &mut self.world,
            map: &self.map,
            content: &self.content,
            config: &self.config,
            clock: &self.clock,
            rng: &mut self.rng,
            store: self.store.as_ref(),
            schedule: &mut self.schedule,
            inbox: &mut self.inbox,
        }
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> SimResult<TickReport> {
        if !self.initialized {
            self.init()?;
        }
        let started = Instant::now();
        let tick = self.clock.advance();

        let intents = self.drain_intake();
        for effect in self.schedule.take_due(tick) {
            self.apply_effect(effect);
        }

        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            if let Err(e) = system.tick(&mut self.context()) {
                error!(system = system.name(), error = %e, "system failed");
            }
            self.systems[i] = system;
        }

        let envelopes = self.broadcast();
        let report = TickReport {
            tick,
            players: self.world.player_count(),
            npcs: self.world.npc_count(),
            items: self.world.items().len(),
            intents,
            envelopes,
            micros: started.elapsed().as_micros(),
        };
        self.world.finish_tick();
        self.inbox.clear();
        debug!(?report, "tick complete");
        Ok(report)
    }

    /// Advance the simulation by `n` ticks.
    pub fn run(&mut self, n: u64) -> SimResult<Vec<TickReport>> {
        (0..n).map(|_| self.tick()).collect()
    }

    fn drain_intake(&mut self) -> usize {
        let mut intents = 0;
        for message in self.intake.drain() {
            match message {
                Inbound::Join {
                    session,
                    login,
                    outbound,
                } => {
                    let username = login.username.clone();
                    if let Err(e) = self.join(session, login, outbound) {
                        warn!(player = %username, error = %e, "join rejected");
                    }
                }
                Inbound::Leave { session } => self.leave(session),
                Inbound::Act { player, action } => {
                    if !self.world.contains(player) {
                        debug!(%player, "intent for unknown player dropped");
                    } else if matches!(action, crate::action::Action::LogOut) {
                        self.leave(player);
                    } else {
                        self.inbox.push(player, action);
                        intents += 1;
                    }
                }
            }
        }
        intents
    }

    fn join(&mut self, session: ActorId, login: Login, outbound: Box<dyn Outbound>) -> SimResult<()> {
        if self.world.contains(session) {
            return Err(SimError::DuplicateSession(session));
        }
        let lingering = self
            .world
            .players()
            .find(|p| p.account_id() == Some(login.account_id))
            .map(Actor::id);
        if let Some(old) = lingering {
            if self.connections.contains_key(&old) {
                return Err(SimError::DuplicateSession(old));
            }
            // Still waiting out combat after a disconnect; the new session wins.
            self.world.remove(old);
        }
        if self.world.player_count() >= self.config.max_players {
            return Err(SimError::ServerFull(self.config.max_players));
        }

        let record = match self.store.load(login.account_id)? {
            Some(record) => record,
            None => {
                let record = CharacterRecord::new_character(
                    login.account_id,
                    &login.username,
                    self.config.player_spawn,
                );
                self.store.create(&record)?;
                info!(account_id = login.account_id, "new character created");
                record
            }
        };
        let mut actor = Actor::player(session, record, self.config.player_spawn, &self.content);
        if !self.map.in_bounds(actor.position()) || self.map.is_blocked(actor.position()) {
            actor.teleport(self.config.player_spawn);
        }
        self.world.insert(actor);
        self.connections.insert(
            session,
            Connection {
                outbound,
                fresh: true,
            },
        );
        for line in WELCOME {
            self.world.notify(session, line);
        }
        self.roster_changed = true;
        info!(player = %login.username, %session, "player joined");
        Ok(())
    }

    fn leave(&mut self, session: ActorId) {
        self.connections.remove(&session);
        self.remove_player(session);
    }

    /// Remove a disconnected player, or try again next tick while it is
    /// still in combat.
    fn remove_player(&mut self, player: ActorId) {
        let Some(actor) = self.world.actor(player) else {
            return;
        };
        if self.connections.contains_key(&player) {
            // Reconnected under the same session.
            return;
        }
        if actor.in_combat() {
            debug!(%player, "in combat, removal deferred");
            self.schedule
                .at(self.clock.tick() + 1, Effect::RemovePlayer { player });
            return;
        }
        if let Some(actor) = self.world.remove(player) {
            if let Some(account_id) = actor.account_id()
                && let Err(e) = self.store.save_position(account_id, actor.position())
            {
                error!(account_id, error = %e, "failed to save position");
            }
            info!(player = %actor.label(), "player left");
        }
        self.roster_changed = true;
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Retaliate { npc, attacker } => combat::retaliate(&mut self.world, npc, attacker),
            Effect::RemovePlayer { player } => self.remove_player(player),
        }
    }

    /// Send this tick's envelopes. Connections that fail are dropped, and the
    /// resulting roster change goes out on the next tick.
    fn broadcast(&mut self) -> usize {
        let roster_changed = std::mem::take(&mut self.roster_changed);
        if self.connections.is_empty() {
            return 0;
        }
        let delta = Frame::delta(&self.world, roster_changed);
        let full = self
            .connections
            .values()
            .any(|c| c.fresh)
            .then(|| Frame::full(&self.world));

        let mut sent = 0;
        let mut closed = Vec::new();
        for (&viewer, connection) in &mut self.connections {
            let envelope = match (&full, connection.fresh) {
                (Some(full), true) => full.envelope_for(&self.world, viewer, true),
                _ => delta.envelope_for(&self.world, viewer, false),
            };
            connection.fresh = false;
            if envelope.is_empty() {
                continue;
            }
            match connection.outbound.deliver(&envelope) {
                Ok(()) => sent += 1,
                Err(e) => {
                    debug!(%viewer, error = %e, "delivery failed, dropping connection");
                    closed.push(viewer);
                }
            }
        }
        for viewer in closed {
            self.leave(viewer);
        }
        sent
    }

    /// Live simulation state.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Live simulation state, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The collision map.
    pub fn map(&self) -> &CollisionMap {
        &self.map
    }

    /// Static content.
    pub fn content(&self) -> &ContentRegistry {
        &self.content
    }

    /// Active configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Tick counter.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Pending scheduled effects.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Number of attached connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of the last completed tick.
    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}

/// Placeholder system used during the swap-and-tick pattern.
#[derive(Debug)]
struct NoopSystem;

impl System for NoopSystem {
    fn name(&self) -> &str {
        "noop"
    }
    fn tick(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }
}
