//! Pool and registry configuration structures.

use serde::{Deserialize, Serialize};

use crate::core::types::TemplateId;

/// Where idle instances are parked by [`HidingPolicy::RelocateOffscreen`] when
/// no explicit position is configured.
pub const DEFAULT_OFFSCREEN_POSITION: [f32; 3] = [-10_000.0, -10_000.0, -10_000.0];

/// How a bin materialises new instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstantiationMode {
    /// Instances are created inline; growth completes before `spawn` returns.
    #[default]
    Sync,
    /// Instances are created by deferred batches and join the idle stock later.
    Async,
}

/// How an idle instance is made invisible and inert.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HidingPolicy {
    /// Disable on despawn, enable on spawn.
    #[default]
    Deactivate,
    /// Park far away on despawn; the spawn placement brings it back.
    RelocateOffscreen {
        /// Parking position.
        #[serde(default = "default_offscreen_position")]
        position: [f32; 3],
    },
    /// Move to a non-rendered layer on despawn; restore the original on spawn.
    LayerChange {
        /// Layer used while idle.
        hidden_layer: u32,
    },
}

const fn default_offscreen_position() -> [f32; 3] {
    DEFAULT_OFFSCREEN_POSITION
}

/// Periodic culling of idle surplus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Whether this bin is culled at all.
    pub enabled: bool,
    /// Idle floor that culling never goes below.
    pub maintain_count: usize,
    /// Minimum milliseconds between two culls of this bin.
    pub interval_ms: u64,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            maintain_count: 5,
            interval_ms: 10_000,
        }
    }
}

/// Per-template pool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Logical pool name, unique across active registrations.
    pub name: String,
    /// Template the pool instantiates. `None` is rejected at registration.
    pub template: Option<TemplateId>,
    /// Instances created when the pool is registered.
    #[serde(default)]
    pub preallocate_count: usize,
    /// Instances added per growth step.
    #[serde(default = "default_grow_count")]
    pub grow_count: usize,
    /// Whether `hard_limit` is enforced.
    #[serde(default)]
    pub use_hard_limit: bool,
    /// Maximum idle + live + pending instances.
    #[serde(default = "default_hard_limit")]
    pub hard_limit: usize,
    /// Despawn automatically after the host-reported lifetime.
    #[serde(default)]
    pub auto_recycle_timed: bool,
    /// Survive scene resets.
    #[serde(default)]
    pub persist_across_reset: bool,
    /// Inline or deferred creation.
    #[serde(default)]
    pub instantiation_mode: InstantiationMode,
    /// How idle instances are hidden.
    #[serde(default)]
    pub hiding_policy: HidingPolicy,
    /// Culling policy.
    #[serde(default)]
    pub culling: CullingConfig,
}

const fn default_grow_count() -> usize {
    1
}

const fn default_hard_limit() -> usize {
    100
}

impl PoolConfig {
    /// Start a config with defaults for everything but name and template.
    pub fn new(name: impl Into<String>, template: TemplateId) -> Self {
        Self {
            name: name.into(),
            template: Some(template),
            preallocate_count: 0,
            grow_count: default_grow_count(),
            use_hard_limit: false,
            hard_limit: default_hard_limit(),
            auto_recycle_timed: false,
            persist_across_reset: false,
            instantiation_mode: InstantiationMode::Sync,
            hiding_policy: HidingPolicy::Deactivate,
            culling: CullingConfig::default(),
        }
    }

    /// Set the preallocation count.
    #[must_use]
    pub fn with_preallocate(mut self, count: usize) -> Self {
        self.preallocate_count = count;
        self
    }

    /// Set the growth step.
    #[must_use]
    pub fn with_grow_count(mut self, count: usize) -> Self {
        self.grow_count = count;
        self
    }

    /// Enforce a hard limit.
    #[must_use]
    pub fn with_hard_limit(mut self, limit: usize) -> Self {
        self.use_hard_limit = true;
        self.hard_limit = limit;
        self
    }

    /// Select inline or deferred creation.
    #[must_use]
    pub fn with_mode(mut self, mode: InstantiationMode) -> Self {
        self.instantiation_mode = mode;
        self
    }

    /// Select the hiding policy.
    #[must_use]
    pub fn with_hiding(mut self, policy: HidingPolicy) -> Self {
        self.hiding_policy = policy;
        self
    }

    /// Enable culling down to `maintain_count` every `interval_ms`.
    #[must_use]
    pub fn with_culling(mut self, maintain_count: usize, interval_ms: u64) -> Self {
        self.culling = CullingConfig {
            enabled: true,
            maintain_count,
            interval_ms,
        };
        self
    }

    /// Keep the pool across scene resets.
    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.persist_across_reset = true;
        self
    }

    /// Recycle spawned instances after their host-reported lifetime.
    #[must_use]
    pub fn auto_recycle(mut self) -> Self {
        self.auto_recycle_timed = true;
        self
    }

    /// Hard limit, if enforced.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        if self.use_hard_limit {
            Some(self.hard_limit)
        } else {
            None
        }
    }

    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.grow_count == 0 {
            return Err("grow_count must be greater than 0".into());
        }
        if self.use_hard_limit && self.hard_limit == 0 {
            return Err("hard_limit must be greater than 0".into());
        }
        if self.culling.enabled && self.culling.interval_ms == 0 {
            return Err("culling.interval_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root configuration: the ordered pool list plus global culling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Milliseconds between global cull passes.
    #[serde(default = "default_cull_interval_ms")]
    pub cull_interval_ms: u64,
    /// Bin count at which cull decisions are computed in parallel.
    #[serde(default = "default_parallel_cull_threshold")]
    pub parallel_cull_threshold: usize,
    /// Pools in registration order.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

const fn default_cull_interval_ms() -> u64 {
    1_000
}

const fn default_parallel_cull_threshold() -> usize {
    64
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cull_interval_ms: default_cull_interval_ms(),
            parallel_cull_threshold: default_parallel_cull_threshold(),
            pools: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Validate global settings and every pool.
    ///
    /// Duplicate names are not checked here; the registry rejects the later
    /// registration and keeps the first.
    pub fn validate(&self) -> Result<(), String> {
        if self.cull_interval_ms == 0 {
            return Err("cull_interval_ms must be greater than 0".into());
        }
        for pool in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{}` invalid: {e}", pool.name))?;
        }
        Ok(())
    }

    /// Parse registry configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
