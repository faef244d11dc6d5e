use std::time::Duration;

/// Tracks simulation time: a monotonic tick counter and the fixed tick period.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    period: Duration,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new(period: Duration) -> Self {
        Self { tick: 0, period }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Wall-clock length of one tick.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Nominal time elapsed since tick 0.
    pub fn elapsed(&self) -> Duration {
        self.period.saturating_mul(self.tick.min(u32::MAX as u64) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_initial_state() {
        let clock = SimClock::new(Duration::from_millis(600));
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn clock_advance_increments() {
        let mut clock = SimClock::new(Duration::from_millis(600));
        clock.advance();
        clock.advance();
        assert_eq!(clock.advance(), 3);
        assert_eq!(clock.elapsed(), Duration::from_millis(1800));
    }
}
