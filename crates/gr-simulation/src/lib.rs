//! Authoritative tick simulation for Gridrealm.
//!
//! A [`Simulation`] owns the live [`World`] and advances it in fixed ticks.
//! Network tasks never touch world state: they push joins, leaves and player
//! intents through an [`IntakeHandle`] and receive one [`Envelope`] per tick
//! through their [`Outbound`] sink. Every entity records which wire fields
//! changed, so envelopes carry only what moved since the previous tick.

/// Player intents and their validation.
pub mod action;
/// The actor model: players and NPCs with per-field change tracking.
pub mod actor;
/// Change-set bitflags for actors and ground items.
pub mod changes;
/// Chat lines and server notices.
pub mod chat;
/// Simulation clock.
pub mod clock;
/// Melee resolution and combat timers.
pub mod combat;
/// Configuration for simulation runs.
pub mod config;
/// Mutable context passed to systems each tick.
pub mod context;
/// The death sequence and NPC respawn.
pub mod death;
/// Error types for the simulation crate.
pub mod error;
/// Per-tick attack, talk, trade and sound events.
pub mod event;
/// Action intake queue and the tick-indexed effect schedule.
pub mod intake;
/// Item pickup and NPC conversations.
pub mod interaction;
/// Player inventories.
pub mod inventory;
/// Ground items and their despawn system.
pub mod item;
/// Route planning and stepping.
pub mod movement;
/// NPC behaviour system.
pub mod npcs;
/// The character storage boundary.
pub mod persistence;
/// Player update system.
pub mod players;
/// Loot, experience and quest rewards.
pub mod reward;
/// Top-level simulation orchestrator.
pub mod simulation;
/// Delta snapshots and delivery.
pub mod sync;
/// The trait that all simulation systems implement.
pub mod system;
/// Live world state.
pub mod world;

#[cfg(test)]
mod testkit;

/// Re-export of [`action::Action`].
pub use action::Action;
/// Re-exports of the actor types.
pub use actor::{Actor, ActorKind, ActorState};
/// Re-exports of the change sets.
pub use changes::{ActorFields, ItemFields};
/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-export of [`config::SimConfig`].
pub use config::SimConfig;
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of the intake types.
pub use intake::{Inbound, IntakeError, IntakeHandle, Login};
/// Re-exports of the persistence boundary.
pub use persistence::{CharacterRecord, CharacterStore, MemoryStore, StoreError};
/// Re-exports of [`simulation::Simulation`] and [`simulation::TickReport`].
pub use simulation::{Simulation, TickReport};
/// Re-exports of the sync types.
pub use sync::{DeliveryError, Envelope, Outbound};
/// Re-export of [`system::System`].
pub use system::System;
/// Re-export of [`world::World`].
pub use world::World;
