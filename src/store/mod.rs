//! # Store façade.
//!
//! One parameterized type, [`Store<In, Out>`](Store), covers every kind of
//! synchronized value; the [`StoreMode`] flag decides which operations are
//! allowed.
//!
//! | Mode         | Alias                 | `set(v)`                         | `update(f)`               |
//! |--------------|-----------------------|----------------------------------|---------------------------|
//! | `ReadWrite`  | [`Writable<T>`]       | send + local echo                | read-modify-write + send  |
//! | `ReadOnly`   | [`Readable<T>`]       | `StoreError::Usage`              | `StoreError::Usage`       |
//! | `Asymmetric` | [`Asymmetric<In,Out>`]| send `Out`, local `In` untouched | `StoreError::Usage`       |
//!
//! Observers never see transport or decode errors: during an outage they keep
//! the last good value, and the connection flag lives on the
//! [`StatusBoard`](crate::StatusBoard).

mod hook;
mod spec;
#[allow(clippy::module_inception)]
mod store;


use std::fmt;

pub use hook::{BoxHookFuture, Hook, HookFn};
pub use spec::StoreSpec;
pub use store::{Store, Subscription};

/// Which operations a store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreMode {
    /// Symmetric value: the same type flows in both directions.
    ReadWrite,
    /// Values only arrive from the server.
    ReadOnly,
    /// `In` values arrive, `Out` commands are sent; the two never mix locally.
    Asymmetric,
}

impl StoreMode {
    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreMode::ReadWrite => "read_write",
            StoreMode::ReadOnly => "read_only",
            StoreMode::Asymmetric => "asymmetric",
        }
    }
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreMode::ReadWrite => "read-write",
            StoreMode::ReadOnly => "read-only",
            StoreMode::Asymmetric => "asymmetric",
        })
    }
}

/// Symmetric store.
pub type Writable<T> = Store<T, T>;

/// Read-only store.
pub type Readable<T> = Store<T, ()>;

/// Store whose inbound and outbound types differ.
pub type Asymmetric<In, Out> = Store<In, Out>;
