//! Per-template pools ("bins").
//!
//! A bin owns the reusable instances of one template: an idle stack, the
//! live set, and a count of instances still being created. Two variants share
//! one contract and differ only in when growth materialises:
//!
//! - [`SyncBin`] creates instances inline; a spawn that triggers growth gets
//!   its instance in the same call.
//! - [`AsyncBin`] asks the host for a deferred batch and integrates it on a
//!   later [`PoolBin::poll_pending`].
//!
//! Growth triggers lazily when idle stock drops to one or less with nothing
//! pending, adds `grow_count` clamped to the hard-limit headroom, and is
//! skipped silently when there is no headroom. Hitting the live limit is
//! backpressure: `spawn` returns `None`.

mod async_bin;
mod stock;
mod sync_bin;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{InstantiationMode, PoolConfig};
use crate::core::culling::CullSnapshot;
use crate::core::host::SpawnHost;
use crate::core::index::BinKey;
use crate::core::observer::PoolObserver;
use crate::core::types::{IdAllocator, Instance, InstanceId, Placement, TemplateId};
use crate::core::PoolError;

pub use async_bin::AsyncBin;
pub use stock::ClearedInstances;
pub use sync_bin::SyncBin;

use stock::BinStock;

/// Point-in-time statistics of one bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Pool name.
    pub name: String,
    /// Pooled template.
    pub template: TemplateId,
    /// Instantiation mode.
    pub mode: InstantiationMode,
    /// Idle instances.
    pub idle: usize,
    /// Live instances.
    pub live: usize,
    /// Instances under deferred creation.
    pub pending: usize,
    /// Hard limit, if enforced.
    pub hard_limit: Option<usize>,
    /// Instances ever created.
    pub created_total: u64,
    /// Spawns served.
    pub spawned_total: u64,
    /// Despawns accepted.
    pub despawned_total: u64,
    /// Instances destroyed by culling.
    pub culled_total: u64,
    /// Attached observers.
    pub observers: usize,
}

/// A bin of either variant.
pub enum PoolBin<O> {
    /// Inline creation.
    Sync(SyncBin<O>),
    /// Deferred creation.
    Async(AsyncBin<O>),
}

impl<O: Clone> PoolBin<O> {
    /// Build an uninitialised bin for `config`.
    ///
    /// # Errors
    ///
    /// `NullTemplate` when the config names no template, `InvalidConfig` when
    /// validation fails.
    pub fn new(config: PoolConfig, ids: IdAllocator, now_ms: u128) -> Result<Self, PoolError> {
        let template = config
            .template
            .ok_or_else(|| PoolError::NullTemplate(config.name.clone()))?;
        config.validate().map_err(PoolError::InvalidConfig)?;
        let mode = config.instantiation_mode;
        let stock = BinStock::new(template, config, ids, now_ms);
        Ok(match mode {
            InstantiationMode::Sync => Self::Sync(SyncBin::new(stock)),
            InstantiationMode::Async => Self::Async(AsyncBin::new(stock)),
        })
    }

    const fn stock(&self) -> &BinStock<O> {
        match self {
            Self::Sync(bin) => &bin.stock,
            Self::Async(bin) => &bin.stock,
        }
    }

    fn stock_mut(&mut self) -> &mut BinStock<O> {
        match self {
            Self::Sync(bin) => &mut bin.stock,
            Self::Async(bin) => &mut bin.stock,
        }
    }

    /// Preallocate `preallocate_count` instances, clamped to the hard limit.
    /// Returns how many were created (sync) or reserved (async).
    pub fn initialize<H>(&mut self, host: &mut H) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        let requested = self.config().preallocate_count;
        if let Some(limit) = self.config().limit() {
            if requested > limit {
                warn!(pool = %self.name(), requested, limit, "preallocation clamped to hard limit");
            }
        }
        if requested == 0 {
            return 0;
        }
        let made = match self {
            Self::Sync(bin) => bin.grow(host, requested),
            Self::Async(bin) => bin.schedule(host, requested),
        };
        debug!(pool = %self.name(), made, "pool preallocated");
        made
    }

    /// Take an idle instance, growing first if stock is low.
    ///
    /// `None` means the live limit is reached or (async) no idle instance has
    /// materialised yet. Neither is an error.
    pub fn spawn<H>(&mut self, host: &mut H, placement: Option<&Placement>) -> Option<Instance<O>>
    where
        H: SpawnHost<Object = O>,
    {
        match self {
            Self::Sync(bin) => bin.spawn(host, placement),
            Self::Async(bin) => bin.spawn(host, placement),
        }
    }

    /// Return a live instance to idle stock.
    ///
    /// # Errors
    ///
    /// `NotLive` if the instance is not live here (including a second
    /// despawn), `StaleInstance` if the handle is from an earlier spawn.
    /// State is unchanged on error.
    pub fn despawn<H>(&mut self, host: &mut H, instance: &Instance<O>) -> Result<(), PoolError>
    where
        H: SpawnHost<Object = O>,
    {
        self.stock_mut().release(host, instance)
    }

    /// Destroy idle surplus above `maintain_count` if the cull interval has
    /// elapsed. Returns how many were destroyed.
    pub fn cull_excess<H>(&mut self, host: &mut H, now_ms: u128) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        let excess = self.stock().cull_decision(now_ms);
        self.apply_cull(host, excess, now_ms)
    }

    pub(crate) fn apply_cull<H>(&mut self, host: &mut H, excess: usize, now_ms: u128) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        let culled = self.stock_mut().apply_cull(host, excess, now_ms);
        if culled > 0 {
            debug!(pool = %self.name(), culled, idle = self.idle_count(), "culled idle surplus");
        }
        culled
    }

    pub(crate) fn cull_snapshot(&self, key: BinKey) -> CullSnapshot {
        let stock = self.stock();
        let culling = &stock.config().culling;
        CullSnapshot {
            key,
            enabled: culling.enabled,
            maintain_count: culling.maintain_count,
            interval_ms: culling.interval_ms,
            idle: stock.idle_len(),
            last_cull_ms: stock.last_cull_ms(),
        }
    }

    /// Empty the bin. With `destroy` every instance is destroyed; otherwise
    /// the objects are handed back. In-flight batches are dropped, and
    /// objects they had already delivered are treated like idle ones.
    pub fn clear<H>(&mut self, host: &mut H, destroy: bool) -> ClearedInstances<O>
    where
        H: SpawnHost<Object = O>,
    {
        let delivered = match self {
            Self::Sync(_) => Vec::new(),
            Self::Async(bin) => bin.drop_batches(),
        };
        self.stock_mut().clear(host, delivered, destroy)
    }

    /// Integrate completed deferred batches. Always 0 for sync bins.
    pub fn poll_pending<H>(&mut self, host: &mut H) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        match self {
            Self::Sync(_) => 0,
            Self::Async(bin) => bin.poll(host),
        }
    }

    /// Whether `instance` is live here under the same spawn serial.
    #[must_use]
    pub fn is_live(&self, instance: &Instance<O>) -> bool {
        self.stock().is_live(instance)
    }

    /// Whether an instance with this id is live here, whatever its serial.
    #[must_use]
    pub fn contains_live(&self, id: InstanceId) -> bool {
        self.stock().contains_live(id)
    }

    /// Attach an observer; events are delivered in attachment order.
    pub fn add_observer(&mut self, observer: Box<dyn PoolObserver>) {
        self.stock_mut().add_observer(observer);
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        self.stock().config()
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config().name
    }

    /// Pooled template.
    #[must_use]
    pub const fn template(&self) -> TemplateId {
        self.stock().template()
    }

    /// Idle instances.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.stock().idle_len()
    }

    /// Live instances.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.stock().live_len()
    }

    /// Instances under deferred creation.
    #[must_use]
    pub const fn pending_count(&self) -> usize {
        self.stock().pending()
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let stock = self.stock();
        let counters = stock.counters();
        PoolStats {
            name: stock.config().name.clone(),
            template: stock.template(),
            mode: stock.config().instantiation_mode,
            idle: stock.idle_len(),
            live: stock.live_len(),
            pending: stock.pending(),
            hard_limit: stock.config().limit(),
            created_total: counters.created,
            spawned_total: counters.spawned,
            despawned_total: counters.despawned,
            culled_total: counters.culled,
            observers: stock.observer_count(),
        }
    }
}
