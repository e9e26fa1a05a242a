//! Retry policy for the start path's readiness poll.

use std::time::Duration;

/// How long to wait before and between inventory queries, and when to stop.
///
/// The default never gives up: a workload that stays pending keeps producing
/// progress events until the scheduler places it or an operator intervenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Settle time between install and the first query.
    pub initial_delay: Duration,
    /// Pause between consecutive queries.
    pub interval: Duration,
    /// Maximum number of queries; `None` is unbounded.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    #[must_use]
    pub const fn unbounded(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            interval,
            max_attempts: None,
        }
    }

    /// Cap the number of queries.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether `polls` completed queries use up the budget.
    #[must_use]
    pub fn exhausted(&self, polls: u32) -> bool {
        self.max_attempts.is_some_and(|max| polls >= max)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(2), Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_unbounded() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.initial_delay, Duration::from_secs(2));
        assert!(!policy.exhausted(u32::MAX));
    }

    #[test]
    fn bounded_policy_exhausts_at_limit() {
        let policy = PollPolicy::default().with_max_attempts(3);
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
        assert!(policy.exhausted(4));
    }
}
