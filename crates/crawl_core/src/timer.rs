//! Cancellable periodic enemy timer.
//!
//! The core never reads a clock. Hosts feed elapsed wall-clock time into
//! [`EnemyTimer::poll`], which reports how many enemy ticks fell due.
//! Once cancelled the timer never fires again.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rules::ENEMY_TICK_MS;

/// Lifecycle of the enemy timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerState {
    /// Firing every interval.
    Armed,
    /// Stopped for good.
    Cancelled,
}

/// Fixed-interval timer driven by externally supplied elapsed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyTimer {
    interval: Duration,
    accumulated: Duration,
    state: TimerState,
    fired: u64,
}

impl Default for EnemyTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl EnemyTimer {
    /// Armed timer with the standard enemy tick interval.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_interval(Duration::from_millis(ENEMY_TICK_MS))
    }

    /// Armed timer with a custom interval.
    #[must_use]
    pub const fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
            state: TimerState::Armed,
            fired: 0,
        }
    }

    /// Timer that never started, for games without a hero.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            interval: Duration::from_millis(ENEMY_TICK_MS),
            accumulated: Duration::ZERO,
            state: TimerState::Cancelled,
            fired: 0,
        }
    }

    /// Firing interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// Whether the timer will still fire.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed)
    }

    /// Number of firings reported so far.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }

    /// Time left until the next firing, or `None` once cancelled.
    #[must_use]
    pub fn until_next(&self) -> Option<Duration> {
        self.is_armed()
            .then(|| self.interval.saturating_sub(self.accumulated))
    }

    /// Stop the timer.
    ///
    /// Returns `true` only for the call that actually cancelled it.
    pub fn cancel(&mut self) -> bool {
        if self.is_armed() {
            self.state = TimerState::Cancelled;
            self.accumulated = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Add `elapsed` time and return how many firings are now due.
    ///
    /// Leftover time carries over to the next poll. A cancelled timer
    /// swallows the time and returns 0.
    pub fn poll(&mut self, elapsed: Duration) -> u32 {
        if !self.is_armed() || self.interval.is_zero() {
            return 0;
        }

        self.accumulated += elapsed;
        let mut due = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            due += 1;
        }
        self.fired += u64::from(due);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        let timer = EnemyTimer::new();
        assert_eq!(timer.interval(), Duration::from_millis(500));
        assert!(timer.is_armed());
        assert_eq!(timer.until_next(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_poll_accumulates_partial_intervals() {
        let mut timer = EnemyTimer::new();
        assert_eq!(timer.poll(Duration::from_millis(300)), 0);
        assert_eq!(timer.until_next(), Some(Duration::from_millis(200)));
        assert_eq!(timer.poll(Duration::from_millis(300)), 1);
        assert_eq!(timer.poll(Duration::from_millis(1150)), 2);
        assert_eq!(timer.until_next(), Some(Duration::from_millis(250)));
        assert_eq!(timer.fired(), 3);
    }

    #[test]
    fn test_cancel_exactly_once() {
        let mut timer = EnemyTimer::new();
        timer.poll(Duration::from_millis(400));
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.state(), TimerState::Cancelled);
        assert_eq!(timer.poll(Duration::from_secs(10)), 0);
        assert_eq!(timer.until_next(), None);
    }

    #[test]
    fn test_idle_timer_never_fires() {
        let mut timer = EnemyTimer::idle();
        assert!(!timer.is_armed());
        assert!(!timer.cancel());
        assert_eq!(timer.poll(Duration::from_secs(5)), 0);
    }
}
