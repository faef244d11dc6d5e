//! Core types for the Gridrealm world server.
//!
//! Holds everything about the world that does not change while it runs:
//! identifiers, tile geometry, the layered collision map, the A* pathfinder,
//! the experience curve, and the static content tables (species, items,
//! quests, drop tables). The tick simulation lives in `gr-simulation`.

/// Static content registry: species, items, quests, and spawn tables.
pub mod content;
/// Probability-weighted drop tables.
pub mod drop_table;
/// Identifier newtypes for actors and ground items.
pub mod entity;
/// Error types for the core crate.
pub mod error;
/// Tile coordinates and facing directions.
pub mod geometry;
/// The layered collision map.
pub mod grid;
/// A* search over the collision map.
pub mod pathfinding;
/// Skills and the experience curve.
pub mod skills;

/// Re-export of [`content::ContentRegistry`].
pub use content::ContentRegistry;
/// Re-exports of [`entity::ActorId`] and [`entity::ItemId`].
pub use entity::{ActorId, ItemId};
/// Re-exports of [`error::CoreError`] and [`error::CoreResult`].
pub use error::{CoreError, CoreResult};
/// Re-exports of [`geometry::Direction`] and [`geometry::TilePos`].
pub use geometry::{Direction, TilePos};
/// Re-export of [`grid::CollisionMap`].
pub use grid::CollisionMap;
/// Re-exports of [`pathfinding::Path`] and [`pathfinding::find_path`].
pub use pathfinding::{Path, find_path};
/// Re-exports of [`skills::Skill`] and [`skills::Skills`].
pub use skills::{Skill, Skills};
