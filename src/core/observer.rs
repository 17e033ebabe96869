//! Lifecycle notifications.
//!
//! Each bin keeps an ordered observer list and delivers events synchronously,
//! in insertion order, on the owner thread. Within a bin `Despawned` is
//! delivered before the instance is hidden and `Spawned` after it is shown.
//! Events carry a wall-clock stamp from [`now_ms`], independent of the frame
//! time passed to registry operations.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{InstanceId, TemplateId};
use crate::util::clock::now_ms;

/// What happened to an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolEventKind {
    /// Created and parked idle.
    Created,
    /// Taken from idle stock.
    Spawned,
    /// Returned to idle stock.
    Despawned,
    /// Destroyed by culling.
    Culled,
    /// Destroyed by a pool clear.
    Destroyed,
}

/// A lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEvent {
    /// Template of the emitting pool.
    pub template: TemplateId,
    /// Affected instance.
    pub instance: InstanceId,
    /// Event kind.
    pub kind: PoolEventKind,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

impl PoolEvent {
    /// Build an event stamped with the current wall clock.
    #[must_use]
    pub fn now(template: TemplateId, instance: InstanceId, kind: PoolEventKind) -> Self {
        Self {
            template,
            instance,
            kind,
            created_at_ms: now_ms(),
        }
    }
}

/// Receives lifecycle events from a bin.
pub trait PoolObserver: Send {
    /// Handle one event.
    fn on_event(&mut self, event: &PoolEvent);
}

/// In-memory event log with a bounded buffer.
pub struct InMemoryEventLog {
    events: VecDeque<PoolEvent>,
    max_events: usize,
}

impl InMemoryEventLog {
    /// Create a new log keeping at most `max_events` entries.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Create a log behind a shared handle, for attaching to a bin while
    /// keeping read access.
    #[must_use]
    pub fn shared(max_events: usize) -> SharedEventLog {
        Arc::new(Mutex::new(Self::new(max_events)))
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.iter().cloned().collect()
    }

    /// Kinds of stored events, oldest first.
    #[must_use]
    pub fn kinds(&self) -> Vec<PoolEventKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    /// Drop all stored events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl PoolObserver for InMemoryEventLog {
    fn on_event(&mut self, event: &PoolEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());
    }
}

/// Shared handle to an [`InMemoryEventLog`].
pub type SharedEventLog = Arc<Mutex<InMemoryEventLog>>;

impl PoolObserver for SharedEventLog {
    fn on_event(&mut self, event: &PoolEvent) {
        self.lock().on_event(event);
    }
}

/// Forwards every event to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PoolObserver for TracingObserver {
    fn on_event(&mut self, event: &PoolEvent) {
        debug!(
            template = %event.template,
            instance = %event.instance,
            kind = ?event.kind,
            "pool event"
        );
    }
}

/// Ordered observer list owned by one bin.
#[derive(Default)]
pub(crate) struct ObserverList {
    observers: Vec<Box<dyn PoolObserver>>,
}

impl ObserverList {
    pub(crate) fn push(&mut self, observer: Box<dyn PoolObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn notify(
        &mut self,
        template: TemplateId,
        instance: InstanceId,
        kind: PoolEventKind,
    ) {
        if self.observers.is_empty() {
            return;
        }
        let event = PoolEvent::now(template, instance, kind);
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}
