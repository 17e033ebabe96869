//! Host-side collaborators: the engine that owns real instances, deferred
//! creation batches, and the runtime spawner.

use std::future::Future;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use tracing::warn;

use crate::core::types::{Placement, TemplateId};
use crate::core::PoolError;

/// The engine the pool drives.
///
/// Every method is called from the registry's owner thread. `Object` is a
/// cheap handle; the pool clones it freely and never inspects it.
pub trait SpawnHost {
    /// Host handle of one instance.
    type Object: Clone;

    /// Construct one instance of `template`.
    fn create(&mut self, template: TemplateId) -> Result<Self::Object, PoolError>;

    /// Start constructing `count` instances whose arrival is observed later.
    ///
    /// The default creates inline and returns an already-completed batch; the
    /// bin still only picks it up on its next poll.
    fn create_batch(&mut self, template: TemplateId, count: usize) -> PendingBatch<Self::Object> {
        let mut objects = Vec::with_capacity(count);
        for _ in 0..count {
            match self.create(template) {
                Ok(object) => objects.push(object),
                Err(e) => {
                    warn!(
                        %template,
                        created = objects.len(),
                        requested = count,
                        "batch creation stopped: {e}"
                    );
                    break;
                }
            }
        }
        PendingBatch::ready(count, objects)
    }

    /// Destroy an instance for good.
    fn destroy(&mut self, object: Self::Object);

    /// Enable or disable an instance.
    fn set_active(&mut self, object: &Self::Object, active: bool);

    /// Move an instance.
    fn set_placement(&mut self, object: &Self::Object, placement: &Placement);

    /// Current render/interaction layer of an instance.
    fn layer(&self, object: &Self::Object) -> u32;

    /// Move an instance to another layer.
    fn set_layer(&mut self, object: &Self::Object, layer: u32);

    /// Detach an instance from any parent or grouping it was attached to.
    fn detach(&mut self, _object: &Self::Object) {}

    /// How long a timed instance stays live before auto-recycling.
    fn lifetime(&self, _object: &Self::Object) -> Option<Duration> {
        None
    }
}

/// Outcome of polling a [`PendingBatch`].
#[derive(Debug)]
pub(crate) enum BatchPoll<O> {
    /// Still in flight.
    Pending,
    /// Delivered.
    Ready(Vec<O>),
    /// Producer went away without delivering.
    Abandoned,
}

/// A deferred collection of instances under construction.
#[derive(Debug)]
pub struct PendingBatch<O> {
    requested: usize,
    rx: Receiver<Vec<O>>,
}

/// Producer half of a [`PendingBatch`].
#[derive(Debug)]
pub struct BatchSender<O> {
    tx: Sender<Vec<O>>,
}

impl<O> PendingBatch<O> {
    /// Create a batch of `requested` instances and the sender that completes it.
    #[must_use]
    pub fn channel(requested: usize) -> (BatchSender<O>, Self) {
        let (tx, rx) = bounded(1);
        (BatchSender { tx }, Self { requested, rx })
    }

    /// A batch that is already complete.
    #[must_use]
    pub fn ready(requested: usize, objects: Vec<O>) -> Self {
        let (tx, batch) = Self::channel(requested);
        // Capacity is 1 and the receiver is alive, so this cannot fail.
        let _ = tx.complete(objects);
        batch
    }

    /// Number of instances reserved for this batch.
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    pub(crate) fn poll(&self) -> BatchPoll<O> {
        match self.rx.try_recv() {
            Ok(objects) => BatchPoll::Ready(objects),
            Err(TryRecvError::Empty) => BatchPoll::Pending,
            Err(TryRecvError::Disconnected) => BatchPoll::Abandoned,
        }
    }
}

impl<O> BatchSender<O> {
    /// Deliver the created instances.
    ///
    /// # Errors
    ///
    /// Returns the objects if the batch was dropped (its pool was cleared or
    /// unregistered). The caller then owns and must dispose of them.
    pub fn complete(self, objects: Vec<O>) -> Result<(), Vec<O>> {
        self.tx.try_send(objects).map_err(|e| e.into_inner())
    }
}

/// Abstraction for spawning work on a runtime.
pub trait Spawn {
    /// Spawn a fire-and-forget future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
