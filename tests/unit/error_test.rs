//! Tests for error types

use prometheus_object_pool::core::{PoolError, TemplateId};

#[test]
fn test_null_template_error() {
    let err = PoolError::NullTemplate("bullet".to_string());
    assert_eq!(format!("{}", err), "pool `bullet` has no template");
}

#[test]
fn test_duplicate_name_error() {
    let err = PoolError::DuplicateName("bullet".to_string());
    assert_eq!(format!("{}", err), "duplicate pool name: bullet");
}

#[test]
fn test_duplicate_template_error() {
    let err = PoolError::DuplicateTemplate {
        template: TemplateId(4),
        existing: "spark".to_string(),
    };
    assert_eq!(format!("{}", err), "template template#4 already pooled as `spark`");
}

#[test]
fn test_unknown_pool_error() {
    let err = PoolError::UnknownPool("ghost".to_string());
    assert_eq!(format!("{}", err), "unknown pool: ghost");
}

#[test]
fn test_host_error() {
    let err = PoolError::Host("out of memory".to_string());
    assert_eq!(format!("{}", err), "host error: out of memory");
}

#[test]
fn test_errors_convert_to_anyhow() {
    let err: anyhow::Error =
        PoolError::InvalidConfig("grow_count must be greater than 0".into()).into();
    assert!(err.to_string().contains("grow_count"));
}
