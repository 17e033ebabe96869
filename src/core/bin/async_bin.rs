//! Bin that creates instances through deferred batches.

use tracing::{debug, warn};

use super::stock::BinStock;
use crate::core::host::{BatchPoll, PendingBatch, SpawnHost};
use crate::core::types::{Instance, Placement};

/// Asynchronous bin.
///
/// Growth reserves `pending` slots and asks the host for a [`PendingBatch`].
/// Delivered objects only become idle when [`poll`](Self::poll) runs on a
/// later tick, so a burst of spawns can come back empty while a batch is in
/// flight.
pub struct AsyncBin<O> {
    pub(super) stock: BinStock<O>,
    batches: Vec<InFlight<O>>,
}

/// A batch plus the pending slots reserved for it.
struct InFlight<O> {
    reserved: usize,
    batch: PendingBatch<O>,
}

impl<O: Clone> AsyncBin<O> {
    pub(super) const fn new(stock: BinStock<O>) -> Self {
        Self {
            stock,
            batches: Vec::new(),
        }
    }

    /// Number of batches still in flight.
    #[must_use]
    pub fn batches_in_flight(&self) -> usize {
        self.batches.len()
    }

    /// Request up to `requested` instances, clamped to the hard-limit
    /// headroom. Returns how many were reserved.
    pub(super) fn schedule<H>(&mut self, host: &mut H, requested: usize) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        let count = self.stock.clamp_growth(requested);
        if count == 0 {
            debug!(
                template = %self.stock.template(),
                requested,
                "deferred growth skipped: no headroom"
            );
            return 0;
        }
        let batch = host.create_batch(self.stock.template(), count);
        if batch.requested() != count {
            warn!(
                template = %self.stock.template(),
                count,
                returned = batch.requested(),
                "host resized a batch; keeping the original reservation"
            );
        }
        self.stock.reserve_pending(count);
        debug!(template = %self.stock.template(), count, "deferred growth scheduled");
        self.batches.push(InFlight {
            reserved: count,
            batch,
        });
        count
    }

    pub(super) fn spawn<H>(
        &mut self,
        host: &mut H,
        placement: Option<&Placement>,
    ) -> Option<Instance<O>>
    where
        H: SpawnHost<Object = O>,
    {
        if self.stock.at_live_limit() {
            debug!(
                template = %self.stock.template(),
                live = self.stock.live_len(),
                "hard limit reached"
            );
            return None;
        }
        if self.stock.wants_growth() {
            let grow_count = self.stock.config().grow_count;
            self.schedule(host, grow_count);
        }
        self.stock.take_idle(host, placement)
    }

    /// Integrate completed batches into the idle stock. Returns how many
    /// instances became idle.
    pub(super) fn poll<H>(&mut self, host: &mut H) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        let mut materialized = 0;
        let mut still_pending = Vec::with_capacity(self.batches.len());
        for in_flight in std::mem::take(&mut self.batches) {
            let reserved = in_flight.reserved;
            match in_flight.batch.poll() {
                BatchPoll::Pending => still_pending.push(in_flight),
                BatchPoll::Ready(objects) => {
                    self.stock.release_pending(reserved);
                    let delivered = objects.len();
                    if delivered < reserved {
                        warn!(
                            template = %self.stock.template(),
                            delivered,
                            reserved,
                            "batch delivered fewer instances than reserved"
                        );
                    }
                    for (index, object) in objects.into_iter().enumerate() {
                        // Extra objects beyond the reservation would break the hard limit.
                        if index >= reserved {
                            warn!(
                                template = %self.stock.template(),
                                "destroying surplus batch object"
                            );
                            host.destroy(object);
                            continue;
                        }
                        self.stock.admit(host, object);
                        materialized += 1;
                    }
                }
                BatchPoll::Abandoned => {
                    warn!(template = %self.stock.template(), reserved, "batch abandoned by host");
                    self.stock.release_pending(reserved);
                }
            }
        }
        self.batches = still_pending;
        materialized
    }

    /// Drop every in-flight batch, returning objects that were already
    /// delivered but not yet polled. Producers that complete later get their
    /// objects back from
    /// [`BatchSender::complete`](crate::core::host::BatchSender::complete).
    pub(super) fn drop_batches(&mut self) -> Vec<O> {
        let mut delivered = Vec::new();
        for in_flight in self.batches.drain(..) {
            if let BatchPoll::Ready(objects) = in_flight.batch.poll() {
                delivered.extend(objects);
            }
        }
        delivered
    }
}
