use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Advertising on the regular interval
    Normal,
    /// The last attempt failed, retrying on the shorter interval
    Retry,
}

/// Scheduling state of the advertisement loop.
///
/// Owned by the loop task only, so it needs no synchronization.
#[derive(Debug, Clone)]
pub struct AdvertiserState {
    phase: Phase,
    last_success: Instant,
    interval: Duration,
    retry_interval: Duration,
}

impl AdvertiserState {
    pub fn new(interval: Duration, retry_interval: Duration, started_at: Instant) -> Self {
        Self {
            phase: Phase::Normal,
            last_success: started_at,
            interval,
            retry_interval,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_success(&self) -> Instant {
        self.last_success
    }

    /// Tick period of the current phase.
    pub fn period(&self) -> Duration {
        match self.phase {
            Phase::Normal => self.interval,
            Phase::Retry => self.retry_interval,
        }
    }

    /// Whether a tick observed at `now` should trigger a patch attempt.
    pub fn should_attempt(&self, now: Instant) -> bool {
        match self.phase {
            Phase::Normal => now.saturating_duration_since(self.last_success) >= self.interval,
            Phase::Retry => true,
        }
    }

    /// Record a successful attempt started at `at`. Returns true if the phase changed.
    pub fn record_success(&mut self, at: Instant) -> bool {
        self.last_success = at;
        self.transition(Phase::Normal)
    }

    /// Record a failed attempt. Returns true if the phase changed.
    pub fn record_failure(&mut self) -> bool {
        self.transition(Phase::Retry)
    }

    fn transition(&mut self, phase: Phase) -> bool {
        let changed = self.phase != phase;
        self.phase = phase;
        changed
    }
}
