use std::time::{Duration, Instant};

/// Fixed-interval repeating timer driving reconnection attempts.
///
/// Time is passed in explicitly so callers control the clock.
#[derive(Debug, Clone)]
pub struct ReconnectTimer {
    interval: Duration,
    next_fire: Option<Instant>,
    fired: usize,
}

impl ReconnectTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_fire: None,
            fired: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts the timer unless it is already running.
    pub fn arm(&mut self, now: Instant) {
        if self.next_fire.is_none() {
            self.next_fire = Some(now + self.interval);
        }
    }

    /// Stops the timer. Returns whether it was running.
    pub fn cancel(&mut self) -> bool {
        self.next_fire.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.next_fire.is_some()
    }

    /// Fires at most once per call when due. Ticks that elapsed unpolled
    /// are skipped rather than replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.next_fire else {
            return false;
        };
        if now < deadline {
            return false;
        }
        let mut next = deadline + self.interval;
        while next <= now {
            next += self.interval;
        }
        self.next_fire = Some(next);
        self.fired += 1;
        true
    }

    /// Total ticks fired since construction.
    pub fn fired(&self) -> usize {
        self.fired
    }
}
