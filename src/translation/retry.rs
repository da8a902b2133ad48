use std::time::Duration;

/// Retry behavior for transient backend errors, injected into the worker so
/// tests can substitute a bounded policy with no real delays.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: Option<u32>,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn unbounded(base_delay: Duration) -> Self {
        Self {
            max_attempts: None,
            base_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn bounded(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            base_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Whether another attempt is allowed after `failed_attempts` failures.
    pub fn allows(&self, failed_attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => failed_attempts < max,
            None => true,
        }
    }

    /// Exponential backoff from the base delay, capped.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_always_allows() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        assert!(policy.allows(0));
        assert!(policy.allows(1_000_000));
    }

    #[test]
    fn bounded_stops_at_max() {
        let policy = RetryPolicy::bounded(3, Duration::from_millis(1));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::unbounded(Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(10), Duration::from_secs(60));
    }
}
