//! # Reconnect backoff schedule.
//!
//! [`BackoffPolicy`] maps a retry counter to the wait before the next connect
//! attempt. It is a fixed ascending table:
//! - attempt `n < steps.len()` waits `steps[n]`;
//! - any attempt at or past the last index waits the last (maximum) entry.
//!
//! The table bounds reconnection pressure on the server while still
//! recovering quickly after short outages; the cap keeps the delay from
//! growing without limit during long ones.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use wirestate::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//!
//! assert_eq!(backoff.delay(0), Duration::from_secs(2));
//! assert_eq!(backoff.delay(3), Duration::from_secs(30));
//!
//! // Saturates at the last entry.
//! assert_eq!(backoff.delay(4), Duration::from_secs(60));
//! assert_eq!(backoff.delay(400), Duration::from_secs(60));
//! ```

use std::borrow::Cow;
use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Default reconnect table: 2s, 5s, 10s, 30s, 60s.
const DEFAULT_STEPS: [Duration; 5] = [
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
];

/// Table-driven reconnect backoff.
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Ascending, never empty.
    steps: Cow<'static, [Duration]>,
    jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns the `[2s, 5s, 10s, 30s, 60s]` table without jitter.
    fn default() -> Self {
        Self {
            steps: Cow::Borrowed(&DEFAULT_STEPS),
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Builds a policy from an explicit table.
    ///
    /// Steps are sorted ascending so the saturation entry is always the maximum.
    /// An empty table falls back to the default one; a link must never retry
    /// without waiting.
    pub fn from_steps(steps: impl IntoIterator<Item = Duration>) -> Self {
        let mut steps: Vec<Duration> = steps.into_iter().collect();
        if steps.is_empty() {
            return Self::default();
        }
        steps.sort_unstable();
        Self {
            steps: Cow::Owned(steps),
            jitter: JitterPolicy::None,
        }
    }

    /// Builds a policy that always waits `delay`.
    pub fn constant(delay: Duration) -> Self {
        Self::from_steps([delay])
    }

    /// The table, ascending.
    pub fn steps(&self) -> &[Duration] {
        &self.steps
    }

    pub fn jitter(&self) -> JitterPolicy {
        self.jitter
    }

    /// Returns a copy with the given jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Largest delay this policy can produce (before jitter).
    pub fn max(&self) -> Duration {
        self.steps.last().copied().unwrap_or(Duration::ZERO)
    }

    /// Computes the wait for the given retry counter (0-indexed).
    ///
    /// Pure: the result depends on `attempt` only (plus jitter, if enabled).
    pub fn delay(&self, attempt: u32) -> Duration {
        let Some(last) = self.steps.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        let idx = usize::try_from(attempt).map_or(last, |a| a.min(last));
        self.jitter.apply(self.steps[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_table_in_order() {
        let policy = BackoffPolicy::default();
        let secs: Vec<u64> = (0..5).map(|n| policy.delay(n).as_secs()).collect();
        assert_eq!(secs, vec![2, 5, 10, 30, 60]);
    }

    #[test]
    fn attempt_zero_is_first_entry() {
        let policy = BackoffPolicy::from_steps([
            Duration::from_millis(100),
            Duration::from_millis(400),
        ]);
        assert_eq!(policy.delay(0), Duration::from_millis(100));
    }

    #[test]
    fn from_steps_sorts_table() {
        let policy = BackoffPolicy::from_steps([
            Duration::from_secs(9),
            Duration::from_secs(1),
            Duration::from_secs(3),
        ]);
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.max(), Duration::from_secs(9));
    }

    #[test]
    fn empty_table_falls_back_to_default() {
        let policy = BackoffPolicy::from_steps([]);
        assert_eq!(policy, BackoffPolicy::default());
        assert_eq!(policy.delay(0), Duration::from_secs(2));
        assert_eq!(policy.delay(7), Duration::from_secs(60));
    }

    #[test]
    fn constant_policy() {
        let policy = BackoffPolicy::constant(Duration::from_millis(500));
        for attempt in 0..10 {
            assert_eq!(
                policy.delay(attempt),
                Duration::from_millis(500),
                "attempt {} should be constant at 500ms",
                attempt
            );
        }
    }

    #[test]
    fn huge_attempt_saturates() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn equal_jitter_stays_within_half_and_full() {
        let policy = BackoffPolicy::default().with_jitter(JitterPolicy::Equal);
        for attempt in 0..20 {
            let base = BackoffPolicy::default().delay(attempt);
            let delay = policy.delay(attempt);
            assert!(delay >= base / 2, "attempt {attempt}: {delay:?} < half of {base:?}");
            assert!(delay <= base, "attempt {attempt}: {delay:?} > {base:?}");
        }
    }

    proptest! {
        #[test]
        fn saturates_past_last_index(n in 4u32..=u32::MAX) {
            let policy = BackoffPolicy::default();
            let last = u32::try_from(policy.steps().len() - 1).unwrap();
            prop_assert_eq!(policy.delay(n), policy.delay(last));
        }

        #[test]
        fn never_exceeds_max(n in any::<u32>()) {
            let policy = BackoffPolicy::default().with_jitter(JitterPolicy::Full);
            prop_assert!(policy.delay(n) <= policy.max());
        }
    }
}
