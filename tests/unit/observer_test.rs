//! Tests for lifecycle observers

use prometheus_object_pool::core::{
    IdAllocator, InMemoryEventLog, PoolEvent, PoolEventKind, PoolObserver, TemplateId,
    TracingObserver,
};

fn event(kind: PoolEventKind) -> PoolEvent {
    PoolEvent::now(TemplateId(1), IdAllocator::new().allocate(), kind)
}

#[test]
fn test_event_log_is_bounded() {
    let mut log = InMemoryEventLog::new(2);
    log.on_event(&event(PoolEventKind::Created));
    log.on_event(&event(PoolEventKind::Spawned));
    log.on_event(&event(PoolEventKind::Despawned));
    assert_eq!(log.kinds(), vec![PoolEventKind::Spawned, PoolEventKind::Despawned]);

    log.clear();
    assert!(log.events().is_empty());
}

#[test]
fn test_zero_capacity_log_stores_nothing() {
    let mut log = InMemoryEventLog::new(0);
    log.on_event(&event(PoolEventKind::Culled));
    assert!(log.events().is_empty());
}

#[test]
fn test_shared_log_records_through_clone() {
    let log = InMemoryEventLog::shared(8);
    let mut observer = log.clone();
    observer.on_event(&event(PoolEventKind::Destroyed));
    assert_eq!(log.lock().kinds(), vec![PoolEventKind::Destroyed]);
}

#[test]
fn test_tracing_observer_accepts_events() {
    let mut observer = TracingObserver;
    observer.on_event(&event(PoolEventKind::Spawned));
}

#[test]
fn test_event_is_stamped() {
    assert!(event(PoolEventKind::Created).created_at_ms > 0);
}

#[test]
fn test_event_kind_serializes_snake_case() {
    let json = serde_json::to_string(&PoolEventKind::Despawned).unwrap();
    assert_eq!(json, "\"despawned\"");
}
