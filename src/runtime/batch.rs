//! Deferred batch production on an async runtime.
//!
//! Hosts whose instance construction is itself async implement
//! [`AsyncInstanceFactory`] and return [`spawn_batch`] from
//! [`SpawnHost::create_batch`](crate::core::SpawnHost::create_batch). The
//! factory runs on the spawner; the bin picks the result up on a later
//! `Registry::update`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::{PendingBatch, PoolError, Spawn, TemplateId};

/// Async constructor of host objects.
#[async_trait]
pub trait AsyncInstanceFactory<O: Send + 'static>: Send + Sync + 'static {
    /// Construct one instance of `template`.
    async fn create(&self, template: TemplateId) -> Result<O, PoolError>;

    /// Dispose of an object whose batch was dropped before delivery.
    ///
    /// Objects delivered before the batch was dropped go through
    /// [`SpawnHost::destroy`](crate::core::SpawnHost::destroy) instead.
    async fn dispose(&self, _object: O) {}
}

/// Run `count` creations on `spawner` and return the batch they complete.
///
/// Creation stops at the first factory error; the batch then delivers what
/// was made so far.
pub fn spawn_batch<O, F, S>(
    spawner: &S,
    factory: Arc<F>,
    template: TemplateId,
    count: usize,
) -> PendingBatch<O>
where
    O: Send + 'static,
    F: AsyncInstanceFactory<O> + ?Sized,
    S: Spawn,
{
    let (tx, batch) = PendingBatch::channel(count);
    spawner.spawn(async move {
        let mut objects = Vec::with_capacity(count);
        for _ in 0..count {
            match factory.create(template).await {
                Ok(object) => objects.push(object),
                Err(e) => {
                    warn!(
                        %template,
                        created = objects.len(),
                        requested = count,
                        "async creation failed: {e}"
                    );
                    break;
                }
            }
        }
        if let Err(orphaned) = tx.complete(objects) {
            debug!(
                %template,
                orphaned = orphaned.len(),
                "batch dropped before delivery; disposing"
            );
            for object in orphaned {
                factory.dispose(object).await;
            }
        }
    });
    batch
}
