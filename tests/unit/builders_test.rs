//! Tests for builder modules

use prometheus_object_pool::builders::build_registry;
use prometheus_object_pool::config::{PoolConfig, RegistryConfig};
use prometheus_object_pool::core::{PoolError, TemplateId};

use crate::common::MockHost;

#[test]
fn test_build_registry_registers_in_order() {
    let cfg = RegistryConfig {
        cull_interval_ms: 500,
        parallel_cull_threshold: 8,
        pools: vec![
            PoolConfig::new("bullet", TemplateId(1)).with_preallocate(3),
            PoolConfig::new("spark", TemplateId(2)),
        ],
    };
    let (registry, scheduler) = build_registry(&cfg, MockHost::new(), 0).unwrap();
    assert_eq!(registry.pool_count(), 2);
    assert_eq!(registry.pool_stats("bullet").unwrap().idle, 3);
    assert_eq!(scheduler.interval_ms(), 500);
    assert_eq!(scheduler.last_run_ms(), None);
}

#[test]
fn test_build_registry_skips_duplicates() {
    let cfg = RegistryConfig {
        pools: vec![
            PoolConfig::new("bullet", TemplateId(1)).with_preallocate(2),
            PoolConfig::new("bullet", TemplateId(2)).with_preallocate(5),
            PoolConfig::new("shell", TemplateId(1)),
        ],
        ..RegistryConfig::default()
    };
    let (registry, _) = build_registry(&cfg, MockHost::new(), 0).unwrap();
    assert_eq!(registry.pool_count(), 1);
    assert_eq!(registry.pool_stats("bullet").unwrap().template, TemplateId(1));
    assert_eq!(registry.host().alive(), 2);
}

#[test]
fn test_build_registry_rejects_invalid_config() {
    let cfg = RegistryConfig {
        pools: vec![PoolConfig::new("bullet", TemplateId(1)).with_grow_count(0)],
        ..RegistryConfig::default()
    };
    let result = build_registry(&cfg, MockHost::new(), 0);
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}
