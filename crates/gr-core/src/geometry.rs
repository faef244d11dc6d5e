use std::fmt;

use serde::{Deserialize, Serialize};

/// A tile coordinate on the world grid. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a tile position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile one step away in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Offset by a raw delta.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Manhattan distance.
    pub fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Squared euclidean distance.
    pub fn distance_squared(self, other: Self) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// True when `other` is exactly one orthogonal step away.
    pub fn is_orthogonally_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }

    /// True when `other` is one step away, diagonals included.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev(other) == 1
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 8-way facing direction, plus `None` for "not moving".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Toward negative y.
    Up,
    /// Toward positive y.
    Down,
    /// Toward negative x.
    Left,
    /// Toward positive x.
    Right,
    /// Up and left.
    UpLeft,
    /// Up and right.
    UpRight,
    /// Down and left.
    DownLeft,
    /// Down and right.
    DownRight,
    /// No direction.
    #[default]
    None,
}

impl Direction {
    /// The four orthogonal directions, in probe order.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// All eight movement directions, orthogonals first.
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// Unit delta `(dx, dy)` of this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (1, -1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
            Direction::None => (0, 0),
        }
    }

    /// Direction of a delta; only the signs are considered.
    pub fn from_delta(dx: i32, dy: i32) -> Self {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Direction::Up,
            (0, 1) => Direction::Down,
            (-1, 0) => Direction::Left,
            (1, 0) => Direction::Right,
            (-1, -1) => Direction::UpLeft,
            (1, -1) => Direction::UpRight,
            (-1, 1) => Direction::DownLeft,
            (1, 1) => Direction::DownRight,
            _ => Direction::None,
        }
    }

    /// Direction to face when standing on `from` and looking at `to`.
    pub fn toward(from: TilePos, to: TilePos) -> Self {
        Self::from_delta(to.x - from.x, to.y - from.y)
    }

    /// True for the four diagonal directions.
    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_round_trips_through_from_delta() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(Direction::from_delta(dx, dy), dir);
        }
        assert_eq!(Direction::from_delta(0, 0), Direction::None);
    }

    #[test]
    fn toward_uses_signs_only() {
        let from = TilePos::new(2, 2);
        assert_eq!(Direction::toward(from, TilePos::new(9, 2)), Direction::Right);
        assert_eq!(Direction::toward(from, TilePos::new(0, 0)), Direction::UpLeft);
        assert_eq!(Direction::toward(from, from), Direction::None);
    }

    #[test]
    fn adjacency_variants() {
        let a = TilePos::new(3, 3);
        assert!(a.is_orthogonally_adjacent(TilePos::new(3, 4)));
        assert!(!a.is_orthogonally_adjacent(TilePos::new(4, 4)));
        assert!(a.is_adjacent(TilePos::new(4, 4)));
        assert!(!a.is_adjacent(a));
        assert!(!a.is_adjacent(TilePos::new(5, 3)));
    }

    #[test]
    fn direction_wire_names() {
        assert_eq!(serde_json::to_string(&Direction::UpLeft).unwrap(), "\"UP_LEFT\"");
        assert_eq!(serde_json::to_string(&Direction::None).unwrap(), "\"NONE\"");
    }
}
