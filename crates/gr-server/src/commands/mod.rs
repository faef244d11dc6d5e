pub mod check_map;
pub mod serve;
pub mod simulate;

use std::path::Path;

use gr_core::{CollisionMap, ContentRegistry};
use gr_simulation::SimConfig;

use crate::assets;

/// Side of the open field used when no map directory is given.
const DEFAULT_MAP_SIZE: i32 = 32;

/// Load the map and content, falling back to an open field and the built-in
/// content.
fn load_world(
    map: Option<&Path>,
    content: Option<&Path>,
) -> Result<(CollisionMap, ContentRegistry), String> {
    let map = match map {
        Some(dir) => assets::load_map(dir).map_err(|e| e.to_string())?,
        None => CollisionMap::open(DEFAULT_MAP_SIZE, DEFAULT_MAP_SIZE),
    };
    let content = match content {
        Some(path) => assets::load_content(path).map_err(|e| e.to_string())?,
        None => ContentRegistry::builtin(),
    };
    Ok((map, content))
}

/// Move the configured player spawn onto a walkable tile.
fn walkable_spawn(config: SimConfig, map: &CollisionMap) -> Result<SimConfig, String> {
    let spawn = map
        .nearest_walkable(config.player_spawn)
        .ok_or_else(|| "map has no walkable tile near the player spawn".to_string())?;
    Ok(config.with_player_spawn(spawn))
}
