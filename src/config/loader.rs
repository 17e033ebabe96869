//! Loading registry configuration from disk and the environment.

use std::path::Path;

use anyhow::{anyhow, Context};
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::core::AppResult;

/// Path of the JSON registry configuration.
pub const CONFIG_PATH_ENV: &str = "OBJECT_POOL_CONFIG";
/// Optional override for [`RegistryConfig::cull_interval_ms`].
pub const CULL_INTERVAL_ENV: &str = "OBJECT_POOL_CULL_INTERVAL_MS";

/// Read and validate a JSON registry configuration file.
pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<RegistryConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading pool config {}", path.display()))?;
    let cfg = RegistryConfig::from_json_str(&raw)
        .map_err(|e| anyhow!("pool config {}: {e}", path.display()))?;
    info!(path = %path.display(), pools = cfg.pools.len(), "loaded pool config");
    Ok(cfg)
}

/// Load `.env` (if present), then the file named by `OBJECT_POOL_CONFIG`,
/// applying `OBJECT_POOL_CULL_INTERVAL_MS` on top.
pub fn load_from_env() -> AppResult<RegistryConfig> {
    if let Err(e) = dotenvy::dotenv() {
        debug!("no .env loaded: {e}");
    }
    let path = std::env::var(CONFIG_PATH_ENV)
        .with_context(|| format!("{CONFIG_PATH_ENV} is not set"))?;
    let mut cfg = load_from_path(&path)?;
    if let Ok(raw) = std::env::var(CULL_INTERVAL_ENV) {
        let interval: u64 = raw
            .parse()
            .with_context(|| format!("{CULL_INTERVAL_ENV}={raw} is not a number"))?;
        if interval == 0 {
            return Err(anyhow!("{CULL_INTERVAL_ENV} must be greater than 0"));
        }
        cfg.cull_interval_ms = interval;
    }
    Ok(cfg)
}
