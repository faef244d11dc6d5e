//! Loading the map directory and content file.
//!
//! A map directory holds `map.json` (`{"width":..,"height":..,"tiles":[..]}`,
//! `tiles` optional) and `ground.csv`. `overlay.csv` and `objects.csv` are
//! optional and default to unpainted layers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gr_core::grid::{EMPTY_TILE, MAX_MAP_CELLS, TileDef, cell_count};
use gr_core::{CollisionMap, ContentRegistry, CoreError};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid map header {path}: {source}")]
    Header {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("map dimensions {width}x{height} must be positive and at most {MAX_MAP_CELLS} cells")]
    Dimensions { width: i32, height: i32 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[derive(Debug, Deserialize)]
struct MapHeader {
    width: i32,
    height: i32,
    #[serde(default = "TileDef::defaults")]
    tiles: Vec<TileDef>,
}

fn read(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_layer(dir: &Path, name: &str, width: i32, height: i32) -> Result<String, AssetError> {
    let path = dir.join(name);
    if path.exists() {
        return read(&path);
    }
    let row = vec![EMPTY_TILE.to_string(); width as usize].join(",");
    Ok(format!("{row}\n").repeat(height as usize))
}

/// Load a collision map from `dir`.
pub fn load_map(dir: &Path) -> Result<CollisionMap, AssetError> {
    let header_path = dir.join("map.json");
    let header: MapHeader =
        serde_json::from_str(&read(&header_path)?).map_err(|source| AssetError::Header {
            path: header_path,
            source,
        })?;
    if cell_count(header.width, header.height).is_err() {
        return Err(AssetError::Dimensions {
            width: header.width,
            height: header.height,
        });
    }
    let ground = read(&dir.join("ground.csv"))?;
    let overlay = read_layer(dir, "overlay.csv", header.width, header.height)?;
    let objects = read_layer(dir, "objects.csv", header.width, header.height)?;
    Ok(CollisionMap::from_csv(
        header.width,
        header.height,
        &header.tiles,
        &ground,
        &overlay,
        &objects,
    )?)
}

/// Load content from a JSON file.
pub fn load_content(path: &Path) -> Result<ContentRegistry, AssetError> {
    Ok(ContentRegistry::from_json(&read(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gr_core::TilePos;

    #[test]
    fn missing_layers_are_unpainted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("map.json"), r#"{"width":3,"height":2}"#).unwrap();
        fs::write(dir.path().join("ground.csv"), "0,1,0\n0,0,0\n").unwrap();
        let map = load_map(dir.path()).unwrap();
        assert_eq!((map.width(), map.height()), (3, 2));
        assert!(map.is_blocked(TilePos::new(1, 0)));
        assert_eq!(map.walkable_count(), 5);
    }

    #[test]
    fn custom_tile_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("map.json"),
            r#"{"width":2,"height":1,"tiles":[{"index":7,"collision":true},{"index":8,"collision":false}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("ground.csv"), "7,8\n").unwrap();
        let map = load_map(dir.path()).unwrap();
        assert!(map.is_blocked(TilePos::new(0, 0)));
        assert!(!map.is_blocked(TilePos::new(1, 0)));
    }

    #[test]
    fn missing_ground_layer_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("map.json"), r#"{"width":2,"height":2}"#).unwrap();
        assert!(matches!(load_map(dir.path()), Err(AssetError::Read { .. })));
    }

    #[test]
    fn huge_headers_fail_before_building_layers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("map.json"),
            r#"{"width":2147483647,"height":2147483647}"#,
        )
        .unwrap();
        fs::write(dir.path().join("ground.csv"), "0\n").unwrap();
        assert!(matches!(
            load_map(dir.path()),
            Err(AssetError::Dimensions { .. })
        ));
    }

    #[test]
    fn zero_sized_maps_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("map.json"), r#"{"width":0,"height":4}"#).unwrap();
        assert!(matches!(
            load_map(dir.path()),
            Err(AssetError::Dimensions { .. })
        ));
    }
}
