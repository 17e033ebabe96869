//! Idle/live bookkeeping shared by both bin variants.

use std::collections::HashMap;

use crate::config::{HidingPolicy, PoolConfig};
use crate::core::culling::cull_amount;
use crate::core::host::SpawnHost;
use crate::core::observer::{ObserverList, PoolEventKind, PoolObserver};
use crate::core::types::{IdAllocator, Instance, InstanceId, InstanceTag, Placement, TemplateId};
use crate::core::PoolError;

/// An instance waiting in the idle stack.
struct IdleEntry<O> {
    id: InstanceId,
    object: O,
    /// Layer to restore on spawn under [`HidingPolicy::LayerChange`].
    original_layer: Option<u32>,
}

/// An instance currently handed out.
struct LiveEntry<O> {
    object: O,
    serial: u64,
    original_layer: Option<u32>,
}

/// Lifetime counters.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counters {
    pub created: u64,
    pub spawned: u64,
    pub despawned: u64,
    pub culled: u64,
}

/// What a clear handed back instead of destroying.
#[derive(Debug)]
pub struct ClearedInstances<O> {
    /// Idle objects, still hidden.
    pub idle: Vec<O>,
    /// Objects that were live when the pool was cleared.
    pub live: Vec<(InstanceId, O)>,
}

impl<O> ClearedInstances<O> {
    pub(crate) const fn empty() -> Self {
        Self {
            idle: Vec::new(),
            live: Vec::new(),
        }
    }
}

/// Idle stack, live map and pending count of one template.
///
/// The idle collection is a stack: the most recently returned instance is
/// reused first and culling removes from the bottom.
pub(crate) struct BinStock<O> {
    template: TemplateId,
    config: PoolConfig,
    ids: IdAllocator,
    idle: Vec<IdleEntry<O>>,
    live: HashMap<InstanceId, LiveEntry<O>>,
    pending: usize,
    last_cull_ms: u128,
    next_serial: u64,
    counters: Counters,
    observers: ObserverList,
}

impl<O: Clone> BinStock<O> {
    pub(crate) fn new(
        template: TemplateId,
        config: PoolConfig,
        ids: IdAllocator,
        now_ms: u128,
    ) -> Self {
        Self {
            template,
            config,
            ids,
            idle: Vec::new(),
            live: HashMap::new(),
            pending: 0,
            last_cull_ms: now_ms,
            next_serial: 0,
            counters: Counters::default(),
            observers: ObserverList::default(),
        }
    }

    pub(crate) const fn template(&self) -> TemplateId {
        self.template
    }

    pub(crate) const fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub(crate) fn idle_len(&self) -> usize {
        self.idle.len()
    }

    pub(crate) fn live_len(&self) -> usize {
        self.live.len()
    }

    pub(crate) const fn pending(&self) -> usize {
        self.pending
    }

    pub(crate) const fn last_cull_ms(&self) -> u128 {
        self.last_cull_ms
    }

    pub(crate) const fn counters(&self) -> Counters {
        self.counters
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn add_observer(&mut self, observer: Box<dyn PoolObserver>) {
        self.observers.push(observer);
    }

    /// Instances that may still be added before the hard limit is reached.
    pub(crate) fn headroom(&self) -> usize {
        let total = self.idle.len() + self.live.len() + self.pending;
        self.config
            .limit()
            .map_or(usize::MAX, |limit| limit.saturating_sub(total))
    }

    /// `requested` clamped to the hard-limit headroom.
    pub(crate) fn clamp_growth(&self, requested: usize) -> usize {
        requested.min(self.headroom())
    }

    /// Live count has reached the hard limit.
    pub(crate) fn at_live_limit(&self) -> bool {
        self.config
            .limit()
            .is_some_and(|limit| self.live.len() >= limit)
    }

    /// Low-watermark growth trigger.
    pub(crate) fn wants_growth(&self) -> bool {
        self.idle.len() <= 1 && self.pending == 0
    }

    pub(crate) fn reserve_pending(&mut self, count: usize) {
        self.pending += count;
    }

    pub(crate) fn release_pending(&mut self, count: usize) {
        self.pending = self.pending.saturating_sub(count);
    }

    /// Park a freshly created object in the idle stack.
    pub(crate) fn admit<H>(&mut self, host: &mut H, object: O)
    where
        H: SpawnHost<Object = O>,
    {
        let id = self.ids.allocate();
        let original_layer = conceal(host, &self.config.hiding_policy, &object, None);
        self.idle.push(IdleEntry {
            id,
            object,
            original_layer,
        });
        self.counters.created += 1;
        self.observers.notify(self.template, id, PoolEventKind::Created);
    }

    /// Move the top idle instance to live. Placement is applied before the
    /// instance is revealed, and the `Spawned` event follows the reveal.
    pub(crate) fn take_idle<H>(
        &mut self,
        host: &mut H,
        placement: Option<&Placement>,
    ) -> Option<Instance<O>>
    where
        H: SpawnHost<Object = O>,
    {
        let entry = self.idle.pop()?;
        if let Some(placement) = placement {
            host.set_placement(&entry.object, placement);
        }
        reveal(host, &self.config.hiding_policy, &entry.object, entry.original_layer);

        self.next_serial += 1;
        let serial = self.next_serial;
        let instance = Instance::pooled(
            entry.id,
            serial,
            InstanceTag::new(self.template),
            entry.object.clone(),
        );
        self.live.insert(
            entry.id,
            LiveEntry {
                object: entry.object,
                serial,
                original_layer: entry.original_layer,
            },
        );
        self.counters.spawned += 1;
        self.observers.notify(self.template, entry.id, PoolEventKind::Spawned);
        Some(instance)
    }

    /// Whether `instance` is live here under the same spawn serial.
    pub(crate) fn is_live(&self, instance: &Instance<O>) -> bool {
        self.live
            .get(&instance.id())
            .is_some_and(|entry| entry.serial == instance.serial())
    }

    pub(crate) fn contains_live(&self, id: InstanceId) -> bool {
        self.live.contains_key(&id)
    }

    /// Return a live instance to the idle stack.
    pub(crate) fn release<H>(
        &mut self,
        host: &mut H,
        instance: &Instance<O>,
    ) -> Result<(), PoolError>
    where
        H: SpawnHost<Object = O>,
    {
        let id = instance.id();
        let live_serial = self
            .live
            .get(&id)
            .map(|entry| entry.serial)
            .ok_or(PoolError::NotLive(id))?;
        if live_serial != instance.serial() {
            return Err(PoolError::StaleInstance {
                id,
                held: instance.serial(),
                live: live_serial,
            });
        }

        // Listeners run while the instance is still visible.
        self.observers.notify(self.template, id, PoolEventKind::Despawned);

        let entry = self.live.remove(&id).ok_or(PoolError::NotLive(id))?;
        let original_layer = conceal(
            host,
            &self.config.hiding_policy,
            &entry.object,
            entry.original_layer,
        );
        host.detach(&entry.object);
        self.idle.push(IdleEntry {
            id,
            object: entry.object,
            original_layer,
        });
        self.counters.despawned += 1;
        Ok(())
    }

    /// Surplus this bin would cull at `now_ms`.
    pub(crate) fn cull_decision(&self, now_ms: u128) -> usize {
        cull_amount(&self.config.culling, self.idle.len(), self.last_cull_ms, now_ms)
    }

    /// Destroy up to `count` idle instances, oldest first, never going below
    /// the maintain floor.
    pub(crate) fn apply_cull<H>(&mut self, host: &mut H, count: usize, now_ms: u128) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        let surplus = self
            .idle
            .len()
            .saturating_sub(self.config.culling.maintain_count);
        let count = count.min(surplus);
        if count == 0 {
            return 0;
        }
        let culled: Vec<IdleEntry<O>> = self.idle.drain(..count).collect();
        for entry in culled {
            self.observers.notify(self.template, entry.id, PoolEventKind::Culled);
            host.destroy(entry.object);
        }
        self.last_cull_ms = now_ms;
        self.counters.culled += count as u64;
        count
    }

    /// Empty idle and live collections and forget pending work.
    ///
    /// `delivered` holds objects from batches that arrived but were never
    /// admitted; they share the fate of the idle stock.
    pub(crate) fn clear<H>(
        &mut self,
        host: &mut H,
        delivered: Vec<O>,
        destroy: bool,
    ) -> ClearedInstances<O>
    where
        H: SpawnHost<Object = O>,
    {
        self.pending = 0;
        let idle = std::mem::take(&mut self.idle);
        let live = std::mem::take(&mut self.live);
        if !destroy {
            return ClearedInstances {
                idle: idle
                    .into_iter()
                    .map(|entry| entry.object)
                    .chain(delivered)
                    .collect(),
                live: live
                    .into_iter()
                    .map(|(id, entry)| (id, entry.object))
                    .collect(),
            };
        }
        for object in delivered {
            host.destroy(object);
        }
        for entry in idle {
            self.observers.notify(self.template, entry.id, PoolEventKind::Destroyed);
            host.destroy(entry.object);
        }
        for (id, entry) in live {
            self.observers.notify(self.template, id, PoolEventKind::Destroyed);
            host.destroy(entry.object);
        }
        ClearedInstances::empty()
    }
}

/// Apply the hidden form. Returns the layer to restore on the next reveal.
fn conceal<H>(
    host: &mut H,
    policy: &HidingPolicy,
    object: &H::Object,
    original_layer: Option<u32>,
) -> Option<u32>
where
    H: SpawnHost,
{
    match *policy {
        HidingPolicy::Deactivate => {
            host.set_active(object, false);
            original_layer
        }
        HidingPolicy::RelocateOffscreen { position } => {
            host.set_placement(object, &Placement::at(position));
            original_layer
        }
        HidingPolicy::LayerChange { hidden_layer } => {
            let original = original_layer.unwrap_or_else(|| host.layer(object));
            host.set_layer(object, hidden_layer);
            Some(original)
        }
    }
}

/// Undo [`conceal`]. Relocated instances are brought back by the spawn
/// placement, not here.
fn reveal<H>(host: &mut H, policy: &HidingPolicy, object: &H::Object, original_layer: Option<u32>)
where
    H: SpawnHost,
{
    match *policy {
        HidingPolicy::Deactivate => host.set_active(object, true),
        HidingPolicy::RelocateOffscreen { .. } => {}
        HidingPolicy::LayerChange { .. } => {
            if let Some(layer) = original_layer {
                host.set_layer(object, layer);
            }
        }
    }
}
