use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::TilePos;

/// Layer cell value meaning "nothing painted here".
pub const EMPTY_TILE: i32 = -1;

/// Largest number of cells a map may have.
pub const MAX_MAP_CELLS: usize = 4096 * 4096;

/// Number of cells in a `width` x `height` map, or an error when either side
/// is not positive or the map is larger than [`MAX_MAP_CELLS`].
pub fn cell_count(width: i32, height: i32) -> CoreResult<usize> {
    let cells = usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .filter(|&(w, h)| w > 0 && h > 0)
        .and_then(|(w, h)| w.checked_mul(h))
        .filter(|&cells| cells <= MAX_MAP_CELLS);
    cells.ok_or_else(|| CoreError::MapDimensions {
        layer: Layer::Ground.name().to_string(),
        found: format!("{width}x{height}"),
        expected: format!("a positive size of at most {MAX_MAP_CELLS} cells"),
    })
}

/// A tile definition: which tile index it is and whether it blocks movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDef {
    /// Index referenced from the layer grids.
    pub index: i32,
    /// True when actors cannot stand on this tile.
    pub collision: bool,
}

impl TileDef {
    /// The stock tile table: grass, wall, water, path, rock.
    pub fn defaults() -> Vec<TileDef> {
        [(0, false), (1, true), (2, true), (3, false), (4, true)]
            .into_iter()
            .map(|(index, collision)| TileDef { index, collision })
            .collect()
    }
}

/// The three stacked tile layers, from bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Terrain.
    Ground,
    /// Decorations painted over terrain.
    Overlay,
    /// Objects; the topmost layer and the first one consulted.
    Objects,
}

impl Layer {
    /// Layer name used in file names and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Layer::Ground => "ground",
            Layer::Overlay => "overlay",
            Layer::Objects => "objects",
        }
    }
}

/// Width x height tile grid with three layers and a collision table.
///
/// A tile is blocked when it is out of bounds, or when the topmost painted
/// layer at that cell references a colliding tile. Cells with no painted layer
/// at all are walkable.
#[derive(Debug, Clone)]
pub struct CollisionMap {
    width: i32,
    height: i32,
    ground: Vec<i32>,
    overlay: Vec<i32>,
    objects: Vec<i32>,
    collision: HashMap<i32, bool>,
}

impl CollisionMap {
    /// Build a map from already-decoded layers, validating sizes and tile indices.
    pub fn new(
        width: i32,
        height: i32,
        tiles: &[TileDef],
        ground: Vec<i32>,
        overlay: Vec<i32>,
        objects: Vec<i32>,
    ) -> CoreResult<Self> {
        let expected = cell_count(width, height)?;
        let collision: HashMap<i32, bool> =
            tiles.iter().map(|t| (t.index, t.collision)).collect();

        for (layer, cells) in [
            (Layer::Ground, &ground),
            (Layer::Overlay, &overlay),
            (Layer::Objects, &objects),
        ] {
            if cells.len() != expected {
                return Err(CoreError::MapDimensions {
                    layer: layer.name().to_string(),
                    found: format!("{} cells", cells.len()),
                    expected: format!("{expected} cells"),
                });
            }
            for (i, &index) in cells.iter().enumerate() {
                if index != EMPTY_TILE && !collision.contains_key(&index) {
                    return Err(CoreError::UnknownTile {
                        index,
                        x: i as i32 % width,
                        y: i as i32 / width,
                    });
                }
            }
        }

        Ok(Self {
            width,
            height,
            ground,
            overlay,
            objects,
            collision,
        })
    }

    /// An open field: every cell is walkable ground.
    pub fn open(width: i32, height: i32) -> Self {
        let cells = (width.max(0) as usize).saturating_mul(height.max(0) as usize);
        Self {
            width,
            height,
            ground: vec![0; cells],
            overlay: vec![EMPTY_TILE; cells],
            objects: vec![EMPTY_TILE; cells],
            collision: TileDef::defaults()
                .into_iter()
                .map(|t| (t.index, t.collision))
                .collect(),
        }
    }

    /// Build a map from CSV layers (one row per line, comma-separated indices).
    pub fn from_csv(
        width: i32,
        height: i32,
        tiles: &[TileDef],
        ground: &str,
        overlay: &str,
        objects: &str,
    ) -> CoreResult<Self> {
        cell_count(width, height)?;
        let ground = parse_layer(Layer::Ground, ground, width, height)?;
        let overlay = parse_layer(Layer::Overlay, overlay, width, height)?;
        let objects = parse_layer(Layer::Objects, objects, width, height)?;
        Self::new(width, height, tiles, ground, overlay, objects)
    }

    /// Build a map from ASCII rows: `#` is a wall object, anything else is ground.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as i32;
        let mut map = Self::open(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    let i = y * width as usize + x;
                    map.objects[i] = 1;
                }
            }
        }
        map
    }

    /// Grid width in tiles.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in tiles.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// True when `pos` lies inside the grid.
    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Tile index painted on `layer` at `pos`, if any.
    pub fn tile_at(&self, layer: Layer, pos: TilePos) -> Option<i32> {
        if !self.in_bounds(pos) {
            return None;
        }
        let i = (pos.y * self.width + pos.x) as usize;
        let cells = match layer {
            Layer::Ground => &self.ground,
            Layer::Overlay => &self.overlay,
            Layer::Objects => &self.objects,
        };
        Some(cells[i]).filter(|&t| t != EMPTY_TILE)
    }

    /// Static collision test for one tile.
    pub fn is_blocked(&self, pos: TilePos) -> bool {
        if !self.in_bounds(pos) {
            return true;
        }
        for layer in [Layer::Objects, Layer::Overlay, Layer::Ground] {
            if let Some(index) = self.tile_at(layer, pos) {
                return self.collision.get(&index).copied().unwrap_or(true);
            }
        }
        false
    }

    /// True when a single step from `from` to the neighbouring `to` is legal.
    ///
    /// Diagonal steps additionally require both orthogonal tiles they pass
    /// between to be open.
    pub fn can_step(&self, from: TilePos, to: TilePos) -> bool {
        if from.chebyshev(to) != 1 || self.is_blocked(to) {
            return false;
        }
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx != 0 && dy != 0 {
            return !self.is_blocked(from.offset(dx, 0)) && !self.is_blocked(from.offset(0, dy));
        }
        true
    }

    /// The closest walkable tile to `pos`, searched in growing square rings.
    ///
    /// Returns `pos` itself when it is walkable and `None` when the whole grid
    /// is blocked.
    pub fn nearest_walkable(&self, pos: TilePos) -> Option<TilePos> {
        let max_radius = self.width.max(self.height);
        for radius in 0..=max_radius {
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let candidate = pos.offset(dx, dy);
                    if self.in_bounds(candidate) && !self.is_blocked(candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    /// Number of walkable tiles on the grid.
    pub fn walkable_count(&self) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| TilePos::new(x, y)))
            .filter(|&p| !self.is_blocked(p))
            .count()
    }
}

fn parse_layer(layer: Layer, text: &str, width: i32, height: i32) -> CoreResult<Vec<i32>> {
    let mut cells = Vec::with_capacity(cell_count(width, height)?);
    let mut rows = 0;
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rows += 1;
        let mut cols = 0;
        for field in line.split(',') {
            let value = field.trim().parse::<i32>().map_err(|e| CoreError::MapParse {
                layer: layer.name().to_string(),
                line: n + 1,
                message: format!("'{}': {e}", field.trim()),
            })?;
            cells.push(value);
            cols += 1;
        }
        if cols != width {
            return Err(CoreError::MapParse {
                layer: layer.name().to_string(),
                line: n + 1,
                message: format!("expected {width} columns, found {cols}"),
            });
        }
    }
    if rows != height {
        return Err(CoreError::MapDimensions {
            layer: layer.name().to_string(),
            found: format!("{width}x{rows}"),
            expected: format!("{width}x{height}"),
        });
    }
    Ok(cells)
}
