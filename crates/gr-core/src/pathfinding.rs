use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::geometry::TilePos;
use crate::grid::CollisionMap;

/// Cost of an orthogonal step.
pub const STRAIGHT_COST: u32 = 10;
/// Cost of a diagonal step.
pub const DIAGONAL_COST: u32 = 14;

/// Neighbour expansion order. Orthogonals come first so equal-cost ties
/// prefer straight moves.
const NEIGHBOURS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// A computed route. `tiles` starts with the start tile and ends at the goal
/// (or its walkable substitute). Empty when no route exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    /// Tiles from start to goal, inclusive.
    pub tiles: Vec<TilePos>,
    /// Sum of step costs along `tiles`.
    pub cost: u32,
}

impl Path {
    /// True when no route was found.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tiles, start included.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// The final tile of the route.
    pub fn end(&self) -> Option<TilePos> {
        self.tiles.last().copied()
    }
}

/// Octile distance: diagonals cost 14, straights 10.
pub fn octile(a: TilePos, b: TilePos) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    let diagonal = dx.min(dy);
    let straight = dx.max(dy) - diagonal;
    diagonal * DIAGONAL_COST + straight * STRAIGHT_COST
}

/// Cost of a single step between neighbouring tiles.
pub fn step_cost(from: TilePos, to: TilePos) -> u32 {
    if from.x != to.x && from.y != to.y {
        DIAGONAL_COST
    } else {
        STRAIGHT_COST
    }
}

/// Sum of step costs along a tile sequence.
pub fn path_cost(tiles: &[TilePos]) -> u32 {
    tiles.windows(2).map(|w| step_cost(w[0], w[1])).sum()
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct PathNode {
    pos: TilePos,
    f_score: u32,
    seq: u64,
}

// Reversed so the max-heap pops the lowest f first; earlier pushes win ties.
impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* from `start` to `goal` over 8-connected tiles.
///
/// A blocked goal is replaced by the nearest walkable tile. Diagonal moves
/// never cut a blocked corner. The start tile itself may be blocked (an actor
/// standing there is allowed to leave it).
pub fn find_path(map: &CollisionMap, start: TilePos, goal: TilePos) -> Path {
    let goal = if map.is_blocked(goal) {
        match map.nearest_walkable(goal) {
            Some(g) => g,
            None => return Path::default(),
        }
    } else {
        goal
    };

    if start == goal {
        return Path {
            tiles: vec![start],
            cost: 0,
        };
    }

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<TilePos> = HashSet::new();
    let mut g_score: HashMap<TilePos, u32> = HashMap::new();
    let mut came_from: HashMap<TilePos, TilePos> = HashMap::new();
    let mut seq = 0u64;

    g_score.insert(start, 0);
    open.push(PathNode {
        pos: start,
        f_score: octile(start, goal),
        seq,
    });

    while let Some(PathNode { pos, .. }) = open.pop() {
        if pos == goal {
            let tiles = reconstruct(&came_from, start, goal);
            let cost = g_score.get(&goal).copied().unwrap_or_default();
            return Path { tiles, cost };
        }
        if !closed.insert(pos) {
            continue;
        }
        let current_g = g_score.get(&pos).copied().unwrap_or(u32::MAX);

        for (dx, dy) in NEIGHBOURS {
            let next = pos.offset(dx, dy);
            if closed.contains(&next) || !map.can_step(pos, next) {
                continue;
            }
            let tentative = current_g + step_cost(pos, next);
            if tentative < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                g_score.insert(next, tentative);
                came_from.insert(next, pos);
                seq += 1;
                open.push(PathNode {
                    pos: next,
                    f_score: tentative + octile(next, goal),
                    seq,
                });
            }
        }
    }

    Path::default()
}

fn reconstruct(came_from: &HashMap<TilePos, TilePos>, start: TilePos, goal: TilePos) -> Vec<TilePos> {
    let mut tiles = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                tiles.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    tiles.reverse();
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn straight_line_on_open_grid() {
        let map = CollisionMap::open(20, 20);
        let path = find_path(&map, TilePos::new(0, 0), TilePos::new(5, 0));
        assert_eq!(path.len(), 6);
        assert_eq!(path.cost, 50);
        assert_eq!(path.tiles.first(), Some(&TilePos::new(0, 0)));
        assert_eq!(path.end(), Some(TilePos::new(5, 0)));
    }

    #[test]
    fn pure_diagonal_uses_two_diagonal_steps() {
        let map = CollisionMap::open(20, 20);
        let path = find_path(&map, TilePos::new(0, 0), TilePos::new(2, 2));
        assert_eq!(
            path.tiles,
            vec![TilePos::new(0, 0), TilePos::new(1, 1), TilePos::new(2, 2)]
        );
        assert_eq!(path.cost, 28);
    }

    #[test]
    fn start_equals_goal() {
        let map = CollisionMap::open(4, 4);
        let path = find_path(&map, TilePos::new(1, 1), TilePos::new(1, 1));
        assert_eq!(path.tiles, vec![TilePos::new(1, 1)]);
        assert_eq!(path.cost, 0);
    }

    #[test]
    fn routes_around_walls() {
        let map = CollisionMap::from_ascii(&[
            ".....", //
            ".###.", //
            ".....", //
        ]);
        let path = find_path(&map, TilePos::new(0, 1), TilePos::new(4, 1));
        assert!(!path.is_empty());
        assert!(path.tiles.iter().all(|&t| !map.is_blocked(t)));
        assert_eq!(path.cost, path_cost(&path.tiles));
    }

    #[test]
    fn does_not_cut_corners() {
        // Walls at (1,0) and (0,1): the diagonal (0,0)->(1,1) is illegal
        // and there is no other way out.
        let map = CollisionMap::from_ascii(&[".#.", "#..", "..."]);
        let path = find_path(&map, TilePos::new(0, 0), TilePos::new(2, 2));
        assert!(path.is_empty());
    }

    #[test]
    fn blocked_goal_is_substituted() {
        let map = CollisionMap::from_ascii(&["....", "..#.", "...."]);
        let path = find_path(&map, TilePos::new(0, 0), TilePos::new(2, 1));
        let end = path.end().unwrap();
        assert_ne!(end, TilePos::new(2, 1));
        assert!(!map.is_blocked(end));
        assert_eq!(end.chebyshev(TilePos::new(2, 1)), 1);
    }

    #[test]
    fn unreachable_goal_yields_empty_path() {
        let map = CollisionMap::from_ascii(&["..#..", "..#..", "..#.."]);
        let path = find_path(&map, TilePos::new(0, 0), TilePos::new(4, 2));
        assert!(path.is_empty());
    }

    #[test]
    fn fully_blocked_map_yields_empty_path() {
        let map = CollisionMap::from_ascii(&["##", "##"]);
        assert!(find_path(&map, TilePos::new(0, 0), TilePos::new(1, 1)).is_empty());
    }

    #[test]
    fn octile_matches_costs() {
        assert_eq!(octile(TilePos::new(0, 0), TilePos::new(5, 0)), 50);
        assert_eq!(octile(TilePos::new(0, 0), TilePos::new(2, 2)), 28);
        assert_eq!(octile(TilePos::new(0, 0), TilePos::new(3, 1)), 34);
    }

    fn arb_map() -> impl Strategy<Value = CollisionMap> {
        prop::collection::vec(prop::bool::weighted(0.25), 64).prop_map(|walls| {
            let rows: Vec<String> = walls
                .chunks(8)
                .map(|row| row.iter().map(|&w| if w { '#' } else { '.' }).collect())
                .collect();
            let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
            CollisionMap::from_ascii(&refs)
        })
    }

    proptest! {
        #[test]
        fn every_step_is_legal(
            map in arb_map(),
            sx in 0i32..8, sy in 0i32..8,
            gx in 0i32..8, gy in 0i32..8,
        ) {
            let start = TilePos::new(sx, sy);
            let goal = TilePos::new(gx, gy);
            prop_assume!(!map.is_blocked(start));
            let path = find_path(&map, start, goal);
            if !path.is_empty() {
                prop_assert_eq!(path.tiles[0], start);
                for w in path.tiles.windows(2) {
                    prop_assert!(w[0].is_adjacent(w[1]));
                    prop_assert!(map.can_step(w[0], w[1]));
                }
                prop_assert_eq!(path.cost, path_cost(&path.tiles));
                if !map.is_blocked(goal) {
                    prop_assert_eq!(path.end(), Some(goal));
                }
            }
        }

        #[test]
        fn open_grid_cost_is_octile(
            sx in 0i32..8, sy in 0i32..8,
            gx in 0i32..8, gy in 0i32..8,
        ) {
            let map = CollisionMap::open(8, 8);
            let start = TilePos::new(sx, sy);
            let goal = TilePos::new(gx, gy);
            let path = find_path(&map, start, goal);
            prop_assert_eq!(path.cost, octile(start, goal));
        }
    }
}
