use crate::config::RetryPolicy;
use std::time::Duration;

/// Delay that grows by `multiplier` on every call, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct BackoffDelayer {
    current_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl BackoffDelayer {
    pub fn new(starting_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self {
            current_delay: starting_delay,
            max_delay,
            multiplier,
        }
    }

    pub fn from_policy(policy: &RetryPolicy) -> Self {
        Self::new(policy.initial_delay(), policy.multiplier, policy.max_delay())
    }

    pub fn next_delay(&mut self) -> Duration {
        if self.current_delay >= self.max_delay {
            return self.max_delay;
        }
        let delay = self.current_delay;
        // the multiplier comes from config and may be arbitrarily large
        let next = self.current_delay.as_secs_f64() * self.multiplier.max(1.0);
        self.current_delay = Duration::try_from_secs_f64(next)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        delay
    }

    pub async fn delay(&mut self) {
        tokio::time::sleep(self.next_delay()).await;
    }
}
