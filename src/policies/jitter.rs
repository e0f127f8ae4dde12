//! # Jitter for reconnect delays.
//!
//! [`JitterPolicy`] randomizes the table entry picked by
//! [`BackoffPolicy`](crate::BackoffPolicy) so that many clients dropped by the
//! same server restart do not reconnect in lockstep.
//!
//! - [`JitterPolicy::None`] exact table delays (default)
//! - [`JitterPolicy::Full`] random delay in `[0, delay]`
//! - [`JitterPolicy::Equal`] `delay/2 + random[0, delay/2]`

use rand::Rng;
use std::time::Duration;

/// Randomization applied to a reconnect delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the table delay as-is.
    ///
    /// Keeps reconnect timing deterministic (tests, single clients).
    #[default]
    None,

    /// Random delay in `[0, delay]`.
    Full,

    /// `delay/2 + random[0, delay/2]`; keeps at least half of the table delay.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }
}

fn full_jitter(delay: Duration) -> Duration {
    let ms = millis(delay);
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal_jitter(delay: Duration) -> Duration {
    let ms = millis(delay);
    let half = ms / 2;
    if half == 0 {
        return delay;
    }
    let extra = rand::rng().random_range(0..=ms - half);
    Duration::from_millis(half + extra)
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
