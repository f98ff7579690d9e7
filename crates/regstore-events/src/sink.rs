use std::sync::{Arc, RwLock};

use regstore_types::{RegistryKind, Timestamp};
use tracing::info;

use crate::event::{EventKind, RegistryEvent};

/// Receiver of registry events.
///
/// Publishing cannot fail: a registry has already committed the mutation
/// when it publishes, and a sink must not be able to undo it.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &RegistryEvent);
}

/// Selects a subset of events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events from this registry match.
    pub registry: Option<RegistryKind>,
    /// If set, only events of these kinds match.
    pub kinds: Option<Vec<EventKind>>,
    /// If set, only events strictly after this time match.
    pub since: Option<Timestamp>,
}

impl EventFilter {
    pub fn registry(registry: RegistryKind) -> Self {
        Self {
            registry: Some(registry),
            ..Self::default()
        }
    }

    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &RegistryEvent) -> bool {
        if let Some(registry) = self.registry {
            if event.registry() != registry {
                return false;
            }
        }
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        if let Some(ref since) = self.since {
            if !event.timestamp.is_after(since) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// InMemoryEventLog
// ---------------------------------------------------------------------------

/// Ordered, queryable log of every published event.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<RegistryEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a log from previously persisted events.
    pub fn from_events(events: Vec<RegistryEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    /// All events in publication order.
    pub fn events(&self) -> Vec<RegistryEvent> {
        match self.events.read() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Events matching `filter`, in publication order.
    pub fn query(&self, filter: &EventFilter) -> Vec<RegistryEvent> {
        self.events()
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect()
    }

    /// The most recent `limit` events, oldest first.
    pub fn tail(&self, limit: usize) -> Vec<RegistryEvent> {
        let events = self.events();
        let start = events.len().saturating_sub(limit);
        events[start..].to_vec()
    }

    /// Sequence number of the last event from `registry`, or 0 if none.
    pub fn last_seq(&self, registry: RegistryKind) -> u64 {
        self.events()
            .iter()
            .rev()
            .find(|e| e.registry() == registry)
            .map(|e| e.seq)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        match self.events.read() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for InMemoryEventLog {
    fn publish(&self, event: &RegistryEvent) {
        match self.events.write() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Logs each event through `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &RegistryEvent) {
        info!(
            id = %event.id,
            seq = event.seq,
            kind = %event.kind,
            key = %event.key,
            timestamp = event.timestamp.as_secs(),
            "registry event"
        );
    }
}

// ---------------------------------------------------------------------------
// FanoutSink
// ---------------------------------------------------------------------------

/// Delivers every event to each of its sinks, in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink (builder style).
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn publish(&self, event: &RegistryEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}
