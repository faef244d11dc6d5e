// Loot tables rolled when an NPC finishes dying.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One possible drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEntry {
    /// Item type dropped.
    #[serde(rename = "itemID")]
    pub item_id: u32,
    /// Probability in `0.0..=1.0`. Entries of one table share the unit interval.
    pub drop_chance: f64,
    /// Quantity dropped; 0 means a single unit.
    #[serde(default)]
    pub amount: u32,
}

/// The outcome of a successful roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drop {
    /// Item type dropped.
    pub item_id: u32,
    /// Quantity, at least 1.
    pub amount: u32,
}

/// Probability-weighted drop table. At most one entry is picked per roll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropTable(pub Vec<DropEntry>);

impl DropTable {
    /// Build a table from entries.
    pub fn new(entries: Vec<DropEntry>) -> Self {
        Self(entries)
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all entry probabilities.
    pub fn total_chance(&self) -> f64 {
        self.0.iter().map(|e| e.drop_chance).sum()
    }

    /// Roll once. Entries are laid out along `[0, 1)` in order; a roll that
    /// lands past the last entry drops nothing.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Drop> {
        if self.0.is_empty() {
            return None;
        }
        let roll: f64 = rng.random();
        let mut cumulative = 0.0;
        for entry in &self.0 {
            cumulative += entry.drop_chance;
            if roll < cumulative {
                return Some(Drop {
                    item_id: entry.item_id,
                    amount: entry.amount.max(1),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn entry(item_id: u32, drop_chance: f64, amount: u32) -> DropEntry {
        DropEntry {
            item_id,
            drop_chance,
            amount,
        }
    }

    #[test]
    fn certain_drop_always_drops() {
        let table = DropTable::new(vec![entry(7, 1.0, 0)]);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(table.roll(&mut rng), Some(Drop { item_id: 7, amount: 1 }));
        }
    }

    #[test]
    fn empty_and_zero_tables_never_drop() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(DropTable::default().roll(&mut rng), None);
        let zero = DropTable::new(vec![entry(1, 0.0, 5)]);
        for _ in 0..100 {
            assert_eq!(zero.roll(&mut rng), None);
        }
    }

    #[test]
    fn frequencies_follow_chances() {
        let table = DropTable::new(vec![entry(1, 0.5, 3), entry(2, 0.25, 0)]);
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            match table.roll(&mut rng) {
                Some(Drop { item_id: 1, amount }) => {
                    assert_eq!(amount, 3);
                    counts[0] += 1;
                }
                Some(Drop { item_id: 2, .. }) => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        assert!((4_500..5_500).contains(&counts[0]));
        assert!((2_000..3_000).contains(&counts[1]));
        assert!((2_000..3_000).contains(&counts[2]));
    }
}
