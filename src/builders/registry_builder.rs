//! Build a registry and its culling scheduler from a [`RegistryConfig`].

use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::core::{CullingScheduler, PoolError, Registry, SpawnHost};

/// Build a registry driving `host` and register every pool in `cfg`, in order.
///
/// Pools the registry rejects (duplicate name or template, missing template)
/// are logged and skipped so one bad entry does not take down the rest.
///
/// # Errors
///
/// `InvalidConfig` if `cfg` fails validation; nothing is registered then.
pub fn build_registry<H: SpawnHost>(
    cfg: &RegistryConfig,
    host: H,
    now_ms: u128,
) -> Result<(Registry<H>, CullingScheduler), PoolError> {
    cfg.validate()
        .map_err(|e| PoolError::InvalidConfig(format!("config invalid: {e}")))?;

    let mut registry =
        Registry::new(host).with_parallel_cull_threshold(cfg.parallel_cull_threshold);
    let mut skipped = 0_usize;
    for pool in &cfg.pools {
        if let Err(e) = registry.register_pool(pool.clone(), now_ms) {
            warn!(pool = %pool.name, "skipping pool: {e}");
            skipped += 1;
        }
    }
    info!(
        pools = registry.pool_count(),
        skipped,
        cull_interval_ms = cfg.cull_interval_ms,
        "registry built"
    );
    Ok((registry, CullingScheduler::from_config(cfg)))
}
