use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Time of a mutation, in whole seconds since the UNIX epoch.
///
/// Timestamps are always produced by the host's [`Clock`]; registries never
/// accept one from a caller.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The zero timestamp.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Seconds since the UNIX epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Returns `true` if this timestamp is strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The host environment's notion of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Timestamp(secs)
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: AtomicU64::new(start.0),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, at: Timestamp) {
        self.secs.store(at.0, Ordering::SeqCst);
    }

    /// Move forward by `secs` seconds and return the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        Timestamp(self.secs.fetch_add(secs, Ordering::SeqCst) + secs)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.secs.load(Ordering::SeqCst))
    }
}
