use std::time::Duration;

use gr_core::TilePos;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Wall-clock length of one tick.
    pub tick_period: Duration,
    /// Maximum concurrent players.
    pub max_players: usize,
    /// Where new and respawning players appear.
    pub player_spawn: TilePos,
    /// Waypoints kept from a computed path; longer routes are replanned en route.
    pub max_waypoints: usize,
    /// Ticks an actor spends dying before it is reset.
    pub dying_ticks: u32,
    /// Ticks before a dropped ground item disappears.
    pub item_despawn_ticks: u32,
    /// Ticks a defender stays flagged as in combat after a hit.
    pub combat_ticks: u32,
    /// Per-tick chance that an idle NPC picks a new wander tile.
    pub wander_chance: f64,
    /// Allow attacks and interactions across diagonals.
    pub diagonal_reach: bool,
    /// Consecutive blocked steps before an actor gives up on its route.
    pub max_stall_ticks: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_period: Duration::from_millis(600),
            max_players: 1000,
            player_spawn: TilePos::new(0, 0),
            max_waypoints: 25,
            dying_ticks: 5,
            item_despawn_ticks: 200,
            combat_ticks: 20,
            wander_chance: 0.05,
            diagonal_reach: false,
            max_stall_ticks: 5,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Set the player cap.
    pub fn with_max_players(mut self, max: usize) -> Self {
        self.max_players = max;
        self
    }

    /// Set the player spawn tile.
    pub fn with_player_spawn(mut self, spawn: TilePos) -> Self {
        self.player_spawn = spawn;
        self
    }

    /// Set the NPC wander chance per tick.
    pub fn with_wander_chance(mut self, chance: f64) -> Self {
        self.wander_chance = chance;
        self
    }

    /// Allow diagonal attack and interaction reach.
    pub fn with_diagonal_reach(mut self, enabled: bool) -> Self {
        self.diagonal_reach = enabled;
        self
    }

    /// Set the ground item despawn delay.
    pub fn with_item_despawn_ticks(mut self, ticks: u32) -> Self {
        self.item_despawn_ticks = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = SimConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.tick_period, Duration::from_millis(600));
        assert_eq!(config.max_players, 1000);
        assert_eq!(config.player_spawn, TilePos::new(0, 0));
        assert_eq!(config.max_waypoints, 25);
        assert!((config.wander_chance - 0.05).abs() < f64::EPSILON);
        assert!(!config.diagonal_reach);
    }

    #[test]
    fn config_builder_chain() {
        let config = SimConfig::default()
            .with_seed(123)
            .with_tick_period(Duration::from_millis(100))
            .with_max_players(2)
            .with_player_spawn(TilePos::new(3, 4))
            .with_wander_chance(0.0)
            .with_diagonal_reach(true)
            .with_item_despawn_ticks(7);
        assert_eq!(config.seed, 123);
        assert_eq!(config.tick_period, Duration::from_millis(100));
        assert_eq!(config.max_players, 2);
        assert_eq!(config.player_spawn, TilePos::new(3, 4));
        assert_eq!(config.wander_chance, 0.0);
        assert!(config.diagonal_reach);
        assert_eq!(config.item_despawn_ticks, 7);
    }
}
