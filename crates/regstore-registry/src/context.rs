use std::sync::Arc;

use regstore_events::{EventSink, RegistryEvent, TracingSink};
use regstore_guard::{AccessGuard, Action, GuardDecision};
use regstore_types::{AccountId, Clock, SystemClock, Timestamp};
use tracing::warn;

use crate::error::{RegistryError, RegistryResult};

/// The host services a registry depends on.
///
/// Defaults to the system clock and a [`TracingSink`]; tests swap in a
/// [`ManualClock`](regstore_types::ManualClock) and an
/// [`InMemoryEventLog`](regstore_events::InMemoryEventLog).
#[derive(Clone)]
pub struct RegistryContext {
    guard: Arc<dyn AccessGuard>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl RegistryContext {
    pub fn new(guard: Arc<dyn AccessGuard>) -> Self {
        Self {
            guard,
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn guard(&self) -> &dyn AccessGuard {
        self.guard.as_ref()
    }

    /// Run the guard, turning a denial into `Unauthorized`.
    pub(crate) fn authorize(&self, caller: &AccountId, action: Action) -> RegistryResult<()> {
        match self.guard.check(caller, &action) {
            GuardDecision::Allow => Ok(()),
            GuardDecision::Deny { reason } => {
                warn!(
                    caller = %caller,
                    action = %action,
                    guard = self.guard.name(),
                    "mutation denied"
                );
                Err(RegistryError::Unauthorized {
                    caller: caller.to_string(),
                    action: action.to_string(),
                    reason,
                })
            }
        }
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub(crate) fn publish(&self, event: &RegistryEvent) {
        self.sink.publish(event);
    }
}
