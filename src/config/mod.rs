//! Configuration models for pools and the registry.

pub mod loader;
pub mod pool;

pub use loader::{load_from_env, load_from_path};
pub use pool::{
    CullingConfig, HidingPolicy, InstantiationMode, PoolConfig, RegistryConfig,
    DEFAULT_OFFSCREEN_POSITION,
};
