// Reconnect backoff for client transports
use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter. The hub transport retries until stopped,
/// so the policy bounds the delay, not the attempt count.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
}

impl ReconnectPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            exponential_base: 2.0,
        }
    }

    /// Delay before the given attempt (0-based), plus up to one second of
    /// jitter so a fleet of clients does not reconnect in lockstep.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.exponential_base.powi(attempt.min(16) as i32);
        let capped = (self.initial_delay.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
        Duration::from_secs_f64(capped) + jitter
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_and_cap() {
        let policy = ReconnectPolicy::new(Duration::from_secs(1), Duration::from_secs(60));
        let jitter_slack = Duration::from_secs(1);

        assert!(policy.delay_for(0) >= Duration::from_secs(1));
        assert!(policy.delay_for(0) <= Duration::from_secs(1) + jitter_slack);

        assert!(policy.delay_for(3) >= Duration::from_secs(8));
        assert!(policy.delay_for(3) <= Duration::from_secs(8) + jitter_slack);

        // Past the cap every delay lands on max (+ jitter).
        assert!(policy.delay_for(10) >= Duration::from_secs(60));
        assert!(policy.delay_for(10) <= Duration::from_secs(60) + jitter_slack);
        assert!(policy.delay_for(16) <= Duration::from_secs(60) + jitter_slack);
    }
}
