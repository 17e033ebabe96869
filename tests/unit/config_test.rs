//! Tests for configuration validation and loading

use std::io::Write;

use prometheus_object_pool::config::{
    load_from_path, CullingConfig, HidingPolicy, InstantiationMode, PoolConfig, RegistryConfig,
};
use prometheus_object_pool::core::TemplateId;

#[test]
fn test_pool_config_defaults() {
    let cfg = PoolConfig::new("bullet", TemplateId(1));
    assert_eq!(cfg.grow_count, 1);
    assert_eq!(cfg.preallocate_count, 0);
    assert!(!cfg.use_hard_limit);
    assert_eq!(cfg.limit(), None);
    assert_eq!(cfg.instantiation_mode, InstantiationMode::Sync);
    assert_eq!(cfg.hiding_policy, HidingPolicy::Deactivate);
    assert_eq!(cfg.culling, CullingConfig::default());
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_name() {
    assert!(PoolConfig::new("  ", TemplateId(1)).validate().is_err());
}

#[test]
fn test_pool_config_invalid_grow_count() {
    assert!(PoolConfig::new("bullet", TemplateId(1)).with_grow_count(0).validate().is_err());
}

#[test]
fn test_pool_config_invalid_hard_limit() {
    assert!(PoolConfig::new("bullet", TemplateId(1)).with_hard_limit(0).validate().is_err());
}

#[test]
fn test_pool_config_invalid_cull_interval() {
    assert!(PoolConfig::new("bullet", TemplateId(1)).with_culling(2, 0).validate().is_err());
}

#[test]
fn test_registry_config_from_json() {
    let json = r#"{
        "cull_interval_ms": 250,
        "pools": [
            {
                "name": "bullet",
                "template": 7,
                "preallocate_count": 16,
                "use_hard_limit": true,
                "hard_limit": 64,
                "instantiation_mode": "async",
                "hiding_policy": { "kind": "layer_change", "hidden_layer": 31 },
                "culling": { "enabled": true, "maintain_count": 8 }
            },
            { "name": "spark", "template": 8 }
        ]
    }"#;
    let cfg = RegistryConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.cull_interval_ms, 250);
    assert_eq!(cfg.parallel_cull_threshold, 64);
    assert_eq!(cfg.pools.len(), 2);

    let bullet = &cfg.pools[0];
    assert_eq!(bullet.template, Some(TemplateId(7)));
    assert_eq!(bullet.limit(), Some(64));
    assert_eq!(bullet.instantiation_mode, InstantiationMode::Async);
    assert_eq!(bullet.hiding_policy, HidingPolicy::LayerChange { hidden_layer: 31 });
    assert_eq!(bullet.culling.maintain_count, 8);
    assert_eq!(bullet.culling.interval_ms, CullingConfig::default().interval_ms);

    let spark = &cfg.pools[1];
    assert_eq!(spark.grow_count, 1);
    assert_eq!(spark.hiding_policy, HidingPolicy::Deactivate);
}

#[test]
fn test_registry_config_rejects_invalid_pool() {
    let json = r#"{ "pools": [ { "name": "bullet", "template": 1, "grow_count": 0 } ] }"#;
    let err = RegistryConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("bullet"));
}

#[test]
fn test_registry_config_rejects_zero_interval() {
    let cfg = RegistryConfig {
        cull_interval_ms: 0,
        ..RegistryConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_load_from_path() {
    let path = std::env::temp_dir().join(format!("object-pool-config-{}.json", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, r#"{{ "pools": [ {{ "name": "orb", "template": 3 }} ] }}"#).unwrap();
    drop(file);

    let cfg = load_from_path(&path).unwrap();
    assert_eq!(cfg.pools[0].name, "orb");
    std::fs::remove_file(&path).unwrap();

    assert!(load_from_path(&path).is_err());
}
