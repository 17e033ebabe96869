//! Background cull loop driven by a tokio interval.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::core::{CullingScheduler, Registry, SpawnHost};
use crate::util::clock::now_ms;

/// Run `scheduler` against `registry` every scheduler interval.
///
/// The loop holds only a weak reference and ends once every other owner of
/// the registry has dropped it. Abort the handle to stop it earlier.
pub fn spawn_cull_loop<H>(
    registry: &Arc<Mutex<Registry<H>>>,
    mut scheduler: CullingScheduler,
) -> JoinHandle<()>
where
    H: SpawnHost + Send + 'static,
    H::Object: Send,
{
    let registry: Weak<Mutex<Registry<H>>> = Arc::downgrade(registry);
    let period = Duration::from_millis(scheduler.interval_ms());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = scheduler.interval_ms(), "cull loop started");
        loop {
            ticker.tick().await;
            let Some(shared) = registry.upgrade() else {
                break;
            };
            let report = {
                let mut guard = shared.lock();
                scheduler.tick(&mut *guard, now_ms())
            };
            if let Some(report) = report {
                debug!(
                    evaluated = report.evaluated,
                    destroyed = report.instances_destroyed,
                    "cull loop pass"
                );
            }
        }
        info!("cull loop stopped: registry dropped");
    })
}
