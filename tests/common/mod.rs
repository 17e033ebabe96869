//! Shared in-memory host for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use prometheus_object_pool::core::{
    BatchSender, PendingBatch, Placement, PoolError, SpawnHost, TemplateId,
};

/// What the mock engine knows about one object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectState {
    pub template: TemplateId,
    pub active: bool,
    pub layer: u32,
    pub placement: Placement,
}

/// Deferred batch waiting for [`MockHost::complete_batches`].
struct Outstanding {
    template: TemplateId,
    count: usize,
    tx: BatchSender<u32>,
}

/// Engine stand-in. Objects are plain `u32` handles.
#[derive(Default)]
pub struct MockHost {
    next: u32,
    pub objects: HashMap<u32, ObjectState>,
    pub destroyed: Vec<u32>,
    pub detached: Vec<u32>,
    pub created_total: usize,
    /// Fail every creation after this many successes.
    pub fail_after: Option<usize>,
    /// Hand out channel-backed batches instead of completing them inline.
    pub deferred: bool,
    /// Lifetime reported for every object.
    pub lifetime: Option<Duration>,
    pub default_layer: u32,
    outstanding: Vec<Outstanding>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            lifetime: Some(lifetime),
            ..Self::default()
        }
    }

    pub fn alive(&self) -> usize {
        self.objects.len()
    }

    pub fn state(&self, object: u32) -> &ObjectState {
        &self.objects[&object]
    }

    pub fn is_active(&self, object: u32) -> bool {
        self.objects.get(&object).is_some_and(|s| s.active)
    }

    pub fn outstanding_batches(&self) -> usize {
        self.outstanding.len()
    }

    /// Create and deliver every outstanding deferred batch. Returns how many
    /// objects were accepted by their bins.
    pub fn complete_batches(&mut self) -> usize {
        let mut accepted = 0;
        for batch in std::mem::take(&mut self.outstanding) {
            let objects: Vec<u32> = (0..batch.count)
                .filter_map(|_| self.create(batch.template).ok())
                .collect();
            let sent = objects.len();
            match batch.tx.complete(objects) {
                Ok(()) => accepted += sent,
                Err(returned) => {
                    for object in returned {
                        self.destroy(object);
                    }
                }
            }
        }
        accepted
    }

    /// Drop every outstanding batch sender without delivering.
    pub fn abandon_batches(&mut self) {
        self.outstanding.clear();
    }
}

impl SpawnHost for MockHost {
    type Object = u32;

    fn create(&mut self, template: TemplateId) -> Result<u32, PoolError> {
        if self.fail_after.is_some_and(|limit| self.created_total >= limit) {
            return Err(PoolError::Host("factory exhausted".into()));
        }
        self.next += 1;
        self.created_total += 1;
        self.objects.insert(
            self.next,
            ObjectState {
                template,
                active: true,
                layer: self.default_layer,
                placement: Placement::default(),
            },
        );
        Ok(self.next)
    }

    fn create_batch(&mut self, template: TemplateId, count: usize) -> PendingBatch<u32> {
        if self.deferred {
            let (tx, batch) = PendingBatch::channel(count);
            self.outstanding.push(Outstanding {
                template,
                count,
                tx,
            });
            return batch;
        }
        let objects = (0..count).filter_map(|_| self.create(template).ok()).collect();
        PendingBatch::ready(count, objects)
    }

    fn destroy(&mut self, object: u32) {
        self.objects.remove(&object);
        self.destroyed.push(object);
    }

    fn set_active(&mut self, object: &u32, active: bool) {
        if let Some(state) = self.objects.get_mut(object) {
            state.active = active;
        }
    }

    fn set_placement(&mut self, object: &u32, placement: &Placement) {
        if let Some(state) = self.objects.get_mut(object) {
            state.placement = *placement;
        }
    }

    fn layer(&self, object: &u32) -> u32 {
        self.objects.get(object).map_or(0, |s| s.layer)
    }

    fn set_layer(&mut self, object: &u32, layer: u32) {
        if let Some(state) = self.objects.get_mut(object) {
            state.layer = layer;
        }
    }

    fn detach(&mut self, object: &u32) {
        self.detached.push(*object);
    }

    fn lifetime(&self, _object: &u32) -> Option<Duration> {
        self.lifetime
    }
}
