//! # Context configuration.
//!
//! Provides [`Config`], the settings shared by every store built from one
//! [`StoreContext`](crate::StoreContext).
//!
//! It is handed to `ContextBuilder::new(config)` once. A
//! [`StoreSpec`](crate::StoreSpec) without its own backoff inherits
//! [`Config::backoff`].
//!
//! ## Sentinel values
//! - `seed_attempts = 0` → seeding disabled even when a store has a seed source
//! - `seed_timeout = 0s` → no timeout around a seed fetch

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for a store context.
///
/// ## Field semantics
/// - `backoff`: Default reconnect table (can be overridden per store)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `log_events`: Install the `tracing` event writer (feature `logging`)
/// - `seed_attempts`: Companion HTTP fetch attempts per link start (`0` = off)
/// - `seed_timeout`: Per-attempt timeout for a seed fetch (`0s` = none)
#[derive(Clone, Debug)]
pub struct Config {
    /// Default reconnect delays for stores.
    ///
    /// Used by `StoreContext::store()` when the `StoreSpec` sets none.
    pub backoff: BackoffPolicy,

    /// Events kept for slow bus receivers before they start skipping (`Lagged`).
    pub bus_capacity: usize,

    /// Whether to install [`LogWriter`](crate::LogWriter) as an event subscriber.
    ///
    /// Ignored when the crate is built without the `logging` feature.
    pub log_events: bool,

    /// Maximum seed fetch attempts per link start.
    pub seed_attempts: u32,

    /// Timeout applied to each seed fetch.
    pub seed_timeout: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the seed timeout as an `Option`.
    ///
    /// - `None` → wait as long as the source takes
    /// - `Some(d)` → each attempt is abandoned after `d`
    #[inline]
    pub fn seed_timeout(&self) -> Option<Duration> {
        if self.seed_timeout == Duration::ZERO {
            None
        } else {
            Some(self.seed_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `backoff = [2s, 5s, 10s, 30s, 60s]`, no jitter
    /// - `bus_capacity = 1024`
    /// - `log_events = true`
    /// - `seed_attempts = 5`
    /// - `seed_timeout = 10s`
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
            log_events: true,
            seed_attempts: 5,
            seed_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels() {
        let cfg = Config {
            bus_capacity: 0,
            seed_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.seed_timeout(), None);
        assert_eq!(
            Config::default().seed_timeout(),
            Some(Duration::from_secs(10))
        );
    }
}
