//! Culling decisions and the periodic culling scheduler.
//!
//! A cull pass runs in two phases. The decision phase reads a snapshot of
//! every bin and computes how many idle instances each should shed; it is a
//! pure function of each bin's own numbers, so for large bin counts it runs
//! on the rayon pool. The apply phase then destroys instances sequentially on
//! the owner thread.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CullingConfig, RegistryConfig};
use crate::core::host::SpawnHost;
use crate::core::index::BinKey;
use crate::core::registry::Registry;

/// Idle instances a bin should shed at `now_ms`.
///
/// Zero unless culling is enabled, at least `interval_ms` elapsed since
/// `last_cull_ms`, and `idle` exceeds the maintain floor.
#[must_use]
pub fn cull_amount(
    culling: &CullingConfig,
    idle: usize,
    last_cull_ms: u128,
    now_ms: u128,
) -> usize {
    if !culling.enabled {
        return 0;
    }
    if now_ms.saturating_sub(last_cull_ms) < u128::from(culling.interval_ms) {
        return 0;
    }
    idle.saturating_sub(culling.maintain_count)
}

/// Read-only view of one bin used by the decision phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullSnapshot {
    /// Bin slot.
    pub key: BinKey,
    /// Culling enabled for the bin.
    pub enabled: bool,
    /// Idle floor.
    pub maintain_count: usize,
    /// Per-bin interval.
    pub interval_ms: u64,
    /// Idle instances at snapshot time.
    pub idle: usize,
    /// Last time the bin was culled.
    pub last_cull_ms: u128,
}

impl CullSnapshot {
    fn decide(&self, now_ms: u128) -> usize {
        let culling = CullingConfig {
            enabled: self.enabled,
            maintain_count: self.maintain_count,
            interval_ms: self.interval_ms,
        };
        cull_amount(&culling, self.idle, self.last_cull_ms, now_ms)
    }
}

/// Decision for one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullPlan {
    /// Bin slot.
    pub key: BinKey,
    /// Idle instances to destroy.
    pub excess: usize,
}

/// Compute cull plans for every snapshot with a non-zero surplus.
///
/// With `parallel` the snapshots are evaluated on the rayon pool. Output
/// order follows input order either way.
#[must_use]
pub fn plan_culls(snapshots: &[CullSnapshot], now_ms: u128, parallel: bool) -> Vec<CullPlan> {
    let decide = |snapshot: &CullSnapshot| {
        let excess = snapshot.decide(now_ms);
        (excess > 0).then_some(CullPlan {
            key: snapshot.key,
            excess,
        })
    };
    if parallel {
        snapshots.par_iter().filter_map(decide).collect()
    } else {
        snapshots.iter().filter_map(decide).collect()
    }
}

/// Summary of one cull pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CullReport {
    /// Bins looked at.
    pub evaluated: usize,
    /// Bins that lost at least one instance.
    pub pools_culled: usize,
    /// Instances destroyed.
    pub instances_destroyed: usize,
    /// Whether the decision phase ran in parallel.
    pub parallel: bool,
}

/// Timer-driven driver of [`Registry::cull_all_pools`].
#[derive(Debug, Clone)]
pub struct CullingScheduler {
    interval_ms: u64,
    last_run_ms: Option<u128>,
}

impl CullingScheduler {
    /// Create a scheduler firing every `interval_ms` (at least 1).
    #[must_use]
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            last_run_ms: None,
        }
    }

    /// Scheduler using the registry config's global interval.
    #[must_use]
    pub fn from_config(cfg: &RegistryConfig) -> Self {
        Self::new(cfg.cull_interval_ms)
    }

    /// Configured interval.
    #[must_use]
    pub const fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Time of the last pass, if any.
    #[must_use]
    pub const fn last_run_ms(&self) -> Option<u128> {
        self.last_run_ms
    }

    /// Whether a pass is due. The first call is always due.
    #[must_use]
    pub fn is_due(&self, now_ms: u128) -> bool {
        self.last_run_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= u128::from(self.interval_ms))
    }

    /// Run a pass if one is due.
    pub fn tick<H: SpawnHost>(
        &mut self,
        registry: &mut Registry<H>,
        now_ms: u128,
    ) -> Option<CullReport> {
        self.is_due(now_ms).then(|| self.run_now(registry, now_ms))
    }

    /// Run a pass unconditionally.
    pub fn run_now<H: SpawnHost>(
        &mut self,
        registry: &mut Registry<H>,
        now_ms: u128,
    ) -> CullReport {
        self.last_run_ms = Some(now_ms);
        let report = registry.cull_all_pools(now_ms);
        if report.instances_destroyed > 0 {
            debug!(
                pools = report.pools_culled,
                destroyed = report.instances_destroyed,
                parallel = report.parallel,
                "cull pass complete"
            );
        }
        report
    }
}
