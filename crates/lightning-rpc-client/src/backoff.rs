use std::time::Duration;

use crate::config::ReconnectPolicy;

/// Reconnect delay state.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        let current = policy.initial_delay.min(policy.max_delay);
        Self { policy, current }
    }

    /// The delay the next reconnect would wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Record a failure: double the delay, capped at the policy maximum.
    /// Returns the new delay.
    pub fn increase(&mut self) -> Duration {
        self.current = if self.current >= self.policy.max_delay {
            self.policy.max_delay
        } else {
            (self.current * 2).min(self.policy.max_delay)
        };
        self.current
    }

    /// Record a successful connection.
    pub fn reset(&mut self) {
        self.current = self.policy.reset_delay.min(self.policy.max_delay);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
