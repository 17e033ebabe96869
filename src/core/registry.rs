//! The pool registry: owns every bin and routes spawn/despawn to them.
//!
//! The registry is an ordinary value. Hosts construct one at startup (see
//! [`crate::builders::build_registry`]), pass it to whatever drives their
//! update loop, and call [`Registry::shutdown`] on teardown.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, error, info, warn};

use crate::config::PoolConfig;
use crate::core::bin::{PoolBin, PoolStats};
use crate::core::culling::{plan_culls, CullReport, CullSnapshot};
use crate::core::deferred::DeferredDespawns;
use crate::core::host::SpawnHost;
use crate::core::index::{BinKey, LookupIndex};
use crate::core::observer::PoolObserver;
use crate::core::types::{IdAllocator, Instance, InstanceId, Placement, SpawnTarget};
use crate::core::PoolError;

/// Default bin count at which cull decisions go parallel.
pub const DEFAULT_PARALLEL_CULL_THRESHOLD: usize = 64;

/// Result of [`Registry::despawn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DespawnOutcome {
    /// Returned to its pool's idle stock.
    Returned,
    /// No live pool owned it; the instance was destroyed directly.
    DestroyedUnpooled,
    /// Not live anywhere (double despawn or stale handle); nothing changed.
    Rejected(PoolError),
}

/// Result of one [`Registry::update`] tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    /// Instances that finished deferred creation and became idle.
    pub materialized: usize,
    /// Delayed despawns that were carried out.
    pub delayed_despawns: usize,
    /// Delayed despawns dropped because the instance was no longer live.
    pub delayed_skipped: usize,
}

/// Owns all bins, the lookup index, and the host.
pub struct Registry<H: SpawnHost> {
    host: H,
    bins: SlotMap<BinKey, PoolBin<H::Object>>,
    index: LookupIndex,
    ids: IdAllocator,
    deferred: DeferredDespawns<H::Object>,
    /// Live instances that no pool owns: fallback spawns and instances
    /// abandoned by an unregister without destruction.
    unpooled: HashSet<InstanceId>,
    parallel_cull_threshold: usize,
}

impl<H: SpawnHost> Registry<H> {
    /// Empty registry driving `host`.
    pub fn new(host: H) -> Self {
        Self {
            host,
            bins: SlotMap::with_key(),
            index: LookupIndex::new(),
            ids: IdAllocator::new(),
            deferred: DeferredDespawns::new(),
            unpooled: HashSet::new(),
            parallel_cull_threshold: DEFAULT_PARALLEL_CULL_THRESHOLD,
        }
    }

    /// Set the bin count at which cull decisions run in parallel.
    #[must_use]
    pub fn with_parallel_cull_threshold(mut self, threshold: usize) -> Self {
        self.parallel_cull_threshold = threshold;
        self
    }

    /// The host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Register a pool and preallocate its instances.
    ///
    /// # Errors
    ///
    /// `NullTemplate`, `DuplicateName`, `DuplicateTemplate` or
    /// `InvalidConfig`. The error is also logged and the registry is left
    /// unchanged.
    pub fn register_pool(&mut self, config: PoolConfig, now_ms: u128) -> Result<BinKey, PoolError> {
        let result = self.try_register(config, now_ms);
        if let Err(e) = &result {
            error!("pool registration rejected: {e}");
        }
        result
    }

    fn try_register(&mut self, config: PoolConfig, now_ms: u128) -> Result<BinKey, PoolError> {
        let template = config
            .template
            .ok_or_else(|| PoolError::NullTemplate(config.name.clone()))?;
        self.index.check_free(&config.name, template)?;

        let name = config.name.clone();
        let bin = PoolBin::new(config, self.ids.clone(), now_ms)?;
        let key = self.bins.insert(bin);
        if let Err(e) = self.index.insert(&name, template, key) {
            self.bins.remove(key);
            return Err(e);
        }

        let preallocated = self
            .bins
            .get_mut(key)
            .map_or(0, |bin| bin.initialize(&mut self.host));
        info!(pool = %name, %template, preallocated, "pool registered");
        Ok(key)
    }

    /// Remove a pool. Absent names are ignored.
    ///
    /// With `destroy_instances` every idle and live instance is destroyed.
    /// Otherwise the idle objects are returned and the live ones become
    /// unpooled: despawning them later destroys them directly.
    pub fn unregister_pool(&mut self, name: &str, destroy_instances: bool) -> Vec<H::Object> {
        let Some((template, key)) = self.index.remove(name) else {
            debug!(pool = name, "unregister ignored: unknown pool");
            return Vec::new();
        };
        let Some(mut bin) = self.bins.remove(key) else {
            return Vec::new();
        };
        let cleared = bin.clear(&mut self.host, destroy_instances);
        self.unpooled.extend(cleared.live.iter().map(|(id, _)| *id));
        info!(
            pool = name,
            %template,
            destroyed = destroy_instances,
            abandoned_live = cleared.live.len(),
            "pool unregistered"
        );
        cleared.idle
    }

    /// Spawn from the pool named by `target` and place it.
    ///
    /// A template without a pool is instantiated directly and tracked as
    /// unpooled. A name without a pool yields `None`. Both are logged.
    pub fn spawn<'a>(
        &mut self,
        target: impl Into<SpawnTarget<'a>>,
        placement: &Placement,
        now_ms: u128,
    ) -> Option<Instance<H::Object>> {
        let target = target.into();
        let key = match target {
            SpawnTarget::Template(template) => self.index.bin_for_template(template),
            SpawnTarget::Name(name) => self.index.bin_for_name(name),
        };
        let Some(bin) = key.and_then(|key| self.bins.get_mut(key)) else {
            return self.spawn_unpooled(target, placement);
        };

        let instance = bin.spawn(&mut self.host, Some(placement))?;
        if bin.config().auto_recycle_timed {
            match self.host.lifetime(instance.object()) {
                Some(lifetime) => {
                    self.deferred
                        .schedule(instance.clone(), now_ms + lifetime.as_millis());
                }
                None => debug!(
                    pool = %bin.name(),
                    "auto recycle skipped: host reported no lifetime"
                ),
            }
        }
        Some(instance)
    }

    fn spawn_unpooled(
        &mut self,
        target: SpawnTarget<'_>,
        placement: &Placement,
    ) -> Option<Instance<H::Object>> {
        let SpawnTarget::Template(template) = target else {
            warn!(%target, "spawn requested for unknown pool");
            return None;
        };
        warn!(%template, "no pool registered for template; instantiating unpooled");
        match self.host.create(template) {
            Ok(object) => {
                self.host.set_placement(&object, placement);
                let id = self.ids.allocate();
                self.unpooled.insert(id);
                Some(Instance::unpooled(id, object))
            }
            Err(e) => {
                error!(%template, "unpooled instantiation failed: {e}");
                None
            }
        }
    }

    fn bin_of(&self, instance: &Instance<H::Object>) -> Option<&PoolBin<H::Object>> {
        let tag = instance.tag()?;
        let key = self.index.bin_for_template(tag.template())?;
        self.bins.get(key)
    }

    /// Whether `instance` is currently live, pooled or not.
    #[must_use]
    pub fn is_live(&self, instance: &Instance<H::Object>) -> bool {
        self.bin_of(instance).is_some_and(|bin| bin.is_live(instance))
            || self.unpooled.contains(&instance.id())
    }

    /// Return an instance to its pool, or destroy it if no pool owns it.
    pub fn despawn(&mut self, instance: &Instance<H::Object>) -> DespawnOutcome {
        let owning = instance
            .tag()
            .and_then(|tag| self.index.bin_for_template(tag.template()))
            .and_then(|key| self.bins.get_mut(key))
            .filter(|bin| bin.contains_live(instance.id()));
        if let Some(bin) = owning {
            return match bin.despawn(&mut self.host, instance) {
                Ok(()) => DespawnOutcome::Returned,
                Err(e) => {
                    warn!(pool = %bin.name(), "despawn rejected: {e}");
                    DespawnOutcome::Rejected(e)
                }
            };
        }

        if self.unpooled.remove(&instance.id()) {
            warn!(
                instance = %instance.id(),
                pooled = instance.is_pooled(),
                "despawned instance has no live pool; destroying"
            );
            self.host.destroy(instance.object().clone());
            return DespawnOutcome::DestroyedUnpooled;
        }

        let err = PoolError::NotLive(instance.id());
        warn!("despawn rejected: {err}");
        DespawnOutcome::Rejected(err)
    }

    /// Despawn `instance` once `delay` has passed, as seen by [`update`](Self::update).
    ///
    /// Not cancellable. If the instance is despawned (or despawned and spawned
    /// again) before the delay runs out, the delayed despawn is skipped.
    pub fn despawn_after_delay(
        &mut self,
        instance: &Instance<H::Object>,
        delay: Duration,
        now_ms: u128,
    ) {
        self.deferred
            .schedule(instance.clone(), now_ms + delay.as_millis());
    }

    /// Cooperative tick: integrate finished deferred batches, then run due
    /// delayed despawns.
    pub fn update(&mut self, now_ms: u128) -> UpdateReport {
        let mut report = UpdateReport::default();
        for bin in self.bins.values_mut() {
            report.materialized += bin.poll_pending(&mut self.host);
        }
        for instance in self.deferred.drain_due(now_ms) {
            if !self.is_live(&instance) {
                debug!(instance = %instance.id(), "delayed despawn skipped: no longer live");
                report.delayed_skipped += 1;
                continue;
            }
            match self.despawn(&instance) {
                DespawnOutcome::Returned | DespawnOutcome::DestroyedUnpooled => {
                    report.delayed_despawns += 1;
                }
                DespawnOutcome::Rejected(_) => report.delayed_skipped += 1,
            }
        }
        report
    }

    /// Cull idle surplus in every bin.
    ///
    /// Decisions are computed from per-bin snapshots (in parallel once the
    /// bin count reaches the threshold), then applied one bin at a time.
    pub fn cull_all_pools(&mut self, now_ms: u128) -> CullReport {
        let snapshots: Vec<CullSnapshot> = self
            .bins
            .iter()
            .map(|(key, bin)| bin.cull_snapshot(key))
            .collect();
        let parallel = snapshots.len() >= self.parallel_cull_threshold;
        let plans = plan_culls(&snapshots, now_ms, parallel);

        let mut report = CullReport {
            evaluated: snapshots.len(),
            parallel,
            ..CullReport::default()
        };
        for plan in plans {
            let Some(bin) = self.bins.get_mut(plan.key) else {
                continue;
            };
            let destroyed = bin.apply_cull(&mut self.host, plan.excess, now_ms);
            if destroyed > 0 {
                report.pools_culled += 1;
                report.instances_destroyed += destroyed;
            }
        }
        report
    }

    /// Unregister, destroying instances, every pool not marked
    /// `persist_across_reset`. Returns how many pools were removed.
    pub fn handle_scene_reset(&mut self) -> usize {
        let doomed: Vec<String> = self
            .bins
            .values()
            .filter(|bin| !bin.config().persist_across_reset)
            .map(|bin| bin.name().to_string())
            .collect();
        for name in &doomed {
            self.unregister_pool(name, true);
        }
        info!(removed = doomed.len(), kept = self.bins.len(), "scene reset handled");
        doomed.len()
    }

    /// Attach an observer to the named pool.
    ///
    /// # Errors
    ///
    /// `UnknownPool` if no pool has that name.
    pub fn add_observer(
        &mut self,
        name: &str,
        observer: Box<dyn PoolObserver>,
    ) -> Result<(), PoolError> {
        let bin = self
            .index
            .bin_for_name(name)
            .and_then(|key| self.bins.get_mut(key))
            .ok_or_else(|| PoolError::UnknownPool(name.to_string()))?;
        bin.add_observer(observer);
        Ok(())
    }

    /// The named pool.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&PoolBin<H::Object>> {
        self.index.bin_for_name(name).and_then(|key| self.bins.get(key))
    }

    /// Whether a pool with that name is registered.
    #[must_use]
    pub fn contains_pool(&self, name: &str) -> bool {
        self.index.contains_name(name)
    }

    /// Number of registered pools.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.bins.len()
    }

    /// Statistics of the named pool.
    #[must_use]
    pub fn pool_stats(&self, name: &str) -> Option<PoolStats> {
        self.pool(name).map(PoolBin::stats)
    }

    /// Statistics of every pool, sorted by name.
    #[must_use]
    pub fn stats(&self) -> Vec<PoolStats> {
        let mut stats: Vec<PoolStats> = self.bins.values().map(PoolBin::stats).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Delayed despawns not yet executed.
    #[must_use]
    pub fn delayed_despawn_count(&self) -> usize {
        self.deferred.len()
    }

    /// Live instances no pool owns.
    #[must_use]
    pub fn unpooled_count(&self) -> usize {
        self.unpooled.len()
    }

    /// Unregister every pool, destroying its instances, and drop pending
    /// delayed despawns. Unpooled instances stay with their callers.
    pub fn shutdown(&mut self) {
        let names: Vec<String> = self.index.names().map(str::to_string).collect();
        for name in &names {
            self.unregister_pool(name, true);
        }
        self.deferred.clear();
        info!(
            pools = names.len(),
            unpooled = self.unpooled.len(),
            "registry shut down"
        );
    }
}
