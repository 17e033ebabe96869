//! Registry routing, registration and delayed despawn tests.

mod common;

use std::time::Duration;

use common::MockHost;
use prometheus_object_pool::config::{InstantiationMode, PoolConfig};
use prometheus_object_pool::core::{
    DespawnOutcome, InMemoryEventLog, Placement, PoolError, PoolEventKind, Registry, TemplateId,
};

const BULLET: TemplateId = TemplateId(1);
const SPARK: TemplateId = TemplateId(2);
const ROCK: TemplateId = TemplateId(3);

fn registry() -> Registry<MockHost> {
    let mut registry = Registry::new(MockHost::new());
    registry
        .register_pool(PoolConfig::new("bullet", BULLET).with_preallocate(4), 0)
        .unwrap();
    registry
        .register_pool(PoolConfig::new("spark", SPARK).with_preallocate(2).persistent(), 0)
        .unwrap();
    registry
}

fn here() -> Placement {
    Placement::at([5.0, 0.0, -5.0])
}

#[test]
fn test_register_preallocates() {
    let registry = registry();
    assert_eq!(registry.pool_count(), 2);
    assert!(registry.contains_pool("bullet"));
    assert_eq!(registry.pool_stats("bullet").unwrap().idle, 4);
    assert_eq!(registry.host().alive(), 6);
}

#[test]
fn test_duplicate_name_rejected_first_bin_untouched() {
    let mut registry = registry();
    let before = registry.pool_stats("bullet").unwrap();

    let err = registry
        .register_pool(PoolConfig::new("bullet", ROCK).with_preallocate(9), 0)
        .unwrap_err();
    assert_eq!(err, PoolError::DuplicateName("bullet".into()));
    assert_eq!(registry.pool_stats("bullet").unwrap(), before);
    assert_eq!(registry.pool_count(), 2);
    assert_eq!(registry.host().alive(), 6);
}

#[test]
fn test_duplicate_template_rejected() {
    let mut registry = registry();
    let err = registry
        .register_pool(PoolConfig::new("other", BULLET), 0)
        .unwrap_err();
    assert_eq!(
        err,
        PoolError::DuplicateTemplate {
            template: BULLET,
            existing: "bullet".into()
        }
    );
    assert!(!registry.contains_pool("other"));
}

#[test]
fn test_null_template_and_invalid_config_rejected() {
    let mut registry = registry();
    let mut missing = PoolConfig::new("ghost", ROCK);
    missing.template = None;
    assert_eq!(
        registry.register_pool(missing, 0),
        Err(PoolError::NullTemplate("ghost".into()))
    );

    let invalid = PoolConfig::new("rock", ROCK).with_grow_count(0);
    assert!(matches!(
        registry.register_pool(invalid, 0),
        Err(PoolError::InvalidConfig(_))
    ));
    assert_eq!(registry.pool_count(), 2);
}

#[test]
fn test_spawn_by_name_and_template_share_bin() {
    let mut registry = registry();
    let by_name = registry.spawn("bullet", &here(), 0).unwrap();
    let by_template = registry.spawn(BULLET, &here(), 0).unwrap();

    assert_eq!(by_name.tag().unwrap().template(), BULLET);
    assert_eq!(by_template.tag().unwrap().template(), BULLET);
    assert_eq!(registry.pool_stats("bullet").unwrap().live, 2);
    assert_eq!(
        registry.host().state(*by_name.object()).placement,
        here()
    );
}

#[test]
fn test_spawn_unknown_name_is_none() {
    let mut registry = registry();
    assert!(registry.spawn("nope", &here(), 0).is_none());
    assert_eq!(registry.unpooled_count(), 0);
}

#[test]
fn test_unpooled_fallback_spawn_and_despawn() {
    let mut registry = registry();
    let rock = registry.spawn(ROCK, &here(), 0).unwrap();
    assert!(!rock.is_pooled());
    assert!(registry.is_live(&rock));
    assert_eq!(registry.unpooled_count(), 1);
    assert_eq!(registry.host().state(*rock.object()).placement, here());

    assert_eq!(registry.despawn(&rock), DespawnOutcome::DestroyedUnpooled);
    assert!(registry.host().destroyed.contains(rock.object()));
    assert!(matches!(
        registry.despawn(&rock),
        DespawnOutcome::Rejected(PoolError::NotLive(_))
    ));
}

#[test]
fn test_despawn_returns_to_pool_and_rejects_repeat() {
    let mut registry = registry();
    let bullet = registry.spawn("bullet", &here(), 0).unwrap();
    assert_eq!(registry.despawn(&bullet), DespawnOutcome::Returned);
    assert!(!registry.is_live(&bullet));

    let stats = registry.pool_stats("bullet").unwrap();
    assert_eq!(
        registry.despawn(&bullet),
        DespawnOutcome::Rejected(PoolError::NotLive(bullet.id()))
    );
    assert_eq!(registry.pool_stats("bullet").unwrap(), stats);
}

#[test]
fn test_delayed_despawn_runs_on_update() {
    let mut registry = registry();
    let bullet = registry.spawn("bullet", &here(), 1_000).unwrap();
    registry.despawn_after_delay(&bullet, Duration::from_millis(500), 1_000);
    assert_eq!(registry.delayed_despawn_count(), 1);

    let report = registry.update(1_499);
    assert_eq!(report.delayed_despawns, 0);
    assert!(registry.is_live(&bullet));

    let report = registry.update(1_500);
    assert_eq!(report.delayed_despawns, 1);
    assert!(!registry.is_live(&bullet));
    assert_eq!(registry.delayed_despawn_count(), 0);
}

#[test]
fn test_delayed_despawn_skipped_after_early_despawn_and_reuse() {
    let mut registry = Registry::new(MockHost::new());
    registry
        .register_pool(PoolConfig::new("bullet", BULLET).with_preallocate(1), 0)
        .unwrap();
    let first = registry.spawn("bullet", &here(), 0).unwrap();
    registry.despawn_after_delay(&first, Duration::from_millis(100), 0);
    registry.despawn(&first);

    let second = registry.spawn("bullet", &here(), 10).unwrap();
    assert_eq!(second.id(), first.id());

    let report = registry.update(200);
    assert_eq!(report.delayed_despawns, 0);
    assert_eq!(report.delayed_skipped, 1);
    assert!(registry.is_live(&second));
}

#[test]
fn test_auto_recycle_uses_host_lifetime() {
    let mut registry = Registry::new(MockHost::with_lifetime(Duration::from_millis(250)));
    registry
        .register_pool(PoolConfig::new("spark", SPARK).auto_recycle(), 0)
        .unwrap();
    let spark = registry.spawn("spark", &here(), 1_000).unwrap();
    assert_eq!(registry.delayed_despawn_count(), 1);

    registry.update(1_249);
    assert!(registry.is_live(&spark));
    registry.update(1_250);
    assert!(!registry.is_live(&spark));
    assert_eq!(registry.pool_stats("spark").unwrap().idle, 1);
}

#[test]
fn test_update_materialises_async_batches() {
    let mut registry = Registry::new(MockHost::deferred());
    registry
        .register_pool(
            PoolConfig::new("bullet", BULLET)
                .with_preallocate(4)
                .with_mode(InstantiationMode::Async),
            0,
        )
        .unwrap();
    assert!(registry.spawn("bullet", &here(), 0).is_none());
    assert_eq!(registry.pool_stats("bullet").unwrap().pending, 4);

    registry.host_mut().complete_batches();
    let report = registry.update(16);
    assert_eq!(report.materialized, 4);
    assert!(registry.spawn("bullet", &here(), 16).is_some());
}

fn async_pool(preallocate: usize) -> PoolConfig {
    PoolConfig::new("orb", ROCK)
        .with_preallocate(preallocate)
        .with_mode(InstantiationMode::Async)
}

#[test]
fn test_unregister_destroys_delivered_but_unpolled_batch() {
    let mut registry = Registry::new(MockHost::new());
    registry.register_pool(async_pool(4), 0).unwrap();
    assert_eq!(registry.host().alive(), 4);

    assert!(registry.unregister_pool("orb", true).is_empty());
    assert_eq!(registry.host().alive(), 0);
    assert_eq!(registry.host().destroyed.len(), 4);
}

#[test]
fn test_unregister_without_destroy_hands_back_unpolled_batch() {
    let mut registry = Registry::new(MockHost::new());
    registry.register_pool(async_pool(4), 0).unwrap();

    let handed_back = registry.unregister_pool("orb", false);
    assert_eq!(handed_back.len(), 4);
    assert!(registry.host().destroyed.is_empty());
}

#[test]
fn test_scene_reset_destroys_completed_deferred_batch() {
    let mut registry = Registry::new(MockHost::deferred());
    registry.register_pool(async_pool(3), 0).unwrap();
    assert_eq!(registry.host_mut().complete_batches(), 3);

    assert_eq!(registry.handle_scene_reset(), 1);
    assert_eq!(registry.host().alive(), 0);
}

#[test]
fn test_unregister_with_destroy() {
    let mut registry = registry();
    let bullet = registry.spawn("bullet", &here(), 0).unwrap();
    let handed_back = registry.unregister_pool("bullet", true);
    assert!(handed_back.is_empty());
    assert!(!registry.contains_pool("bullet"));
    assert_eq!(registry.host().alive(), 2);
    assert!(matches!(registry.despawn(&bullet), DespawnOutcome::Rejected(_)));
    assert!(registry.unregister_pool("bullet", true).is_empty());
}

#[test]
fn test_unregister_without_destroy_abandons_live() {
    let mut registry = registry();
    let bullet = registry.spawn("bullet", &here(), 0).unwrap();
    let handed_back = registry.unregister_pool("bullet", false);
    assert_eq!(handed_back.len(), 3);
    assert_eq!(registry.unpooled_count(), 1);
    assert!(registry.is_live(&bullet));

    assert_eq!(registry.despawn(&bullet), DespawnOutcome::DestroyedUnpooled);
    assert_eq!(registry.host().destroyed, vec![*bullet.object()]);
}

#[test]
fn test_reregistered_template_after_unregister() {
    let mut registry = registry();
    registry.unregister_pool("bullet", true);
    registry
        .register_pool(PoolConfig::new("bullet", BULLET).with_preallocate(1), 0)
        .unwrap();
    assert!(registry.spawn(BULLET, &here(), 0).unwrap().is_pooled());
}

#[test]
fn test_scene_reset_keeps_persistent_pools() {
    let mut registry = registry();
    let spark = registry.spawn("spark", &here(), 0).unwrap();
    assert_eq!(registry.handle_scene_reset(), 1);
    assert!(!registry.contains_pool("bullet"));
    assert!(registry.contains_pool("spark"));
    assert!(registry.is_live(&spark));
    assert_eq!(registry.host().alive(), 2);
}

#[test]
fn test_cull_all_pools_reports() {
    let mut registry = Registry::new(MockHost::new());
    registry
        .register_pool(
            PoolConfig::new("bullet", BULLET)
                .with_preallocate(5)
                .with_culling(2, 1_000),
            0,
        )
        .unwrap();
    registry
        .register_pool(PoolConfig::new("spark", SPARK).with_preallocate(5), 0)
        .unwrap();

    let report = registry.cull_all_pools(500);
    assert_eq!(report.instances_destroyed, 0);

    let report = registry.cull_all_pools(1_000);
    assert_eq!(report.evaluated, 2);
    assert_eq!(report.pools_culled, 1);
    assert_eq!(report.instances_destroyed, 3);
    assert!(!report.parallel);
    assert_eq!(registry.pool_stats("spark").unwrap().idle, 5);
}

#[test]
fn test_parallel_cull_matches_sequential_outcome() {
    let build = |threshold: usize| {
        let mut registry = Registry::new(MockHost::new()).with_parallel_cull_threshold(threshold);
        for i in 0..40_u64 {
            let config = PoolConfig::new(format!("pool-{i}"), TemplateId(100 + i))
                .with_preallocate(usize::try_from(i % 9).unwrap())
                .with_culling(usize::try_from(i % 4).unwrap(), 1_000);
            registry.register_pool(config, 0).unwrap();
        }
        registry
    };
    let mut sequential = build(usize::MAX);
    let mut parallel = build(1);

    let a = sequential.cull_all_pools(5_000);
    let b = parallel.cull_all_pools(5_000);
    assert!(!a.parallel);
    assert!(b.parallel);
    assert_eq!(a.instances_destroyed, b.instances_destroyed);
    assert_eq!(sequential.stats(), parallel.stats());
}

#[test]
fn test_observer_attach_by_name() {
    let mut registry = registry();
    let log = InMemoryEventLog::shared(16);
    registry.add_observer("bullet", Box::new(log.clone())).unwrap();
    assert_eq!(
        registry.add_observer("nope", Box::new(log.clone())),
        Err(PoolError::UnknownPool("nope".into()))
    );

    let bullet = registry.spawn("bullet", &here(), 0).unwrap();
    registry.despawn(&bullet);
    assert_eq!(
        log.lock().kinds(),
        vec![PoolEventKind::Spawned, PoolEventKind::Despawned]
    );
    assert_eq!(registry.pool_stats("bullet").unwrap().observers, 1);
}

#[test]
fn test_stats_sorted_by_name() {
    let registry = registry();
    let names: Vec<_> = registry.stats().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["bullet", "spark"]);
}

#[test]
fn test_shutdown_destroys_everything_pooled() {
    let mut registry = registry();
    let bullet = registry.spawn("bullet", &here(), 0).unwrap();
    registry.despawn_after_delay(&bullet, Duration::from_secs(1), 0);
    registry.shutdown();
    assert_eq!(registry.pool_count(), 0);
    assert_eq!(registry.delayed_despawn_count(), 0);
    assert_eq!(registry.host().alive(), 0);
}

#[test]
fn test_observer_events_carry_wall_clock_stamp() {
    let mut registry = registry();
    let log = InMemoryEventLog::shared(4);
    registry.add_observer("bullet", Box::new(log.clone())).unwrap();

    let before = prometheus_object_pool::util::now_ms();
    registry.spawn("bullet", &here(), 5).unwrap();
    let events = log.lock().events();
    assert_eq!(events.len(), 1);
    assert!(events[0].created_at_ms >= before);
}
