//! # Outbound send policy while disconnected.
//!
//! [`SendPolicy`] decides what happens to a `set` issued while the socket is
//! not open (connecting, awaiting retry, or idle).
//!
//! ```text
//! set(v) ──► state == Open ? ──yes──► send now
//!                   │
//!                   no
//!                   ├─► SendPolicy::Defer → keep as the single pending frame
//!                   │                       (replaces any earlier pending frame),
//!                   │                       flushed first thing after Open
//!                   └─► SendPolicy::Drop  → discard, publish SendDropped
//! ```
//!
//! The policy is fixed when the store is built and applies for its whole lifetime.

use crate::store::StoreMode;

/// What to do with an outbound frame when the socket is not open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendPolicy {
    /// Keep the latest frame and send it once the connection opens.
    Defer,
    /// Discard the frame.
    Drop,
}

impl SendPolicy {
    /// Default policy for a store mode.
    ///
    /// - `ReadWrite` → [`SendPolicy::Defer`]: the user's last edit must survive a reconnect.
    /// - `Asymmetric` → [`SendPolicy::Drop`]: a stale command is meaningless after reconnect.
    /// - `ReadOnly` → [`SendPolicy::Drop`]: nothing is ever sent.
    pub fn for_mode(mode: StoreMode) -> Self {
        match mode {
            StoreMode::ReadWrite => SendPolicy::Defer,
            StoreMode::ReadOnly | StoreMode::Asymmetric => SendPolicy::Drop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_per_mode() {
        assert_eq!(SendPolicy::for_mode(StoreMode::ReadWrite), SendPolicy::Defer);
        assert_eq!(SendPolicy::for_mode(StoreMode::Asymmetric), SendPolicy::Drop);
        assert_eq!(SendPolicy::for_mode(StoreMode::ReadOnly), SendPolicy::Drop);
    }
}
