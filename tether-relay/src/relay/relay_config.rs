use std::time::Duration;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_FAILURE_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Timing of one relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Cadence of candidate drains and state polls.
    pub tick_interval: Duration,
    /// How long `failed`/`disconnected` may last before the session fails.
    pub failure_grace: Duration,
    /// Hard upper bound for reaching `connected`.
    pub deadline: Duration,
}

impl RelayConfig {
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_failure_grace(mut self, failure_grace: Duration) -> Self {
        self.failure_grace = failure_grace;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            failure_grace: DEFAULT_FAILURE_GRACE,
            deadline: DEFAULT_DEADLINE,
        }
    }
}
