//! Bin that creates instances inline.

use tracing::{debug, warn};

use super::stock::BinStock;
use crate::core::host::SpawnHost;
use crate::core::types::{Instance, Placement};

/// Synchronous bin: growth finishes before `spawn` returns.
pub struct SyncBin<O> {
    pub(super) stock: BinStock<O>,
}

impl<O: Clone> SyncBin<O> {
    pub(super) const fn new(stock: BinStock<O>) -> Self {
        Self { stock }
    }

    /// Create up to `requested` instances, clamped to the hard-limit headroom.
    /// Stops at the first host failure. Returns how many were created.
    pub(super) fn grow<H>(&mut self, host: &mut H, requested: usize) -> usize
    where
        H: SpawnHost<Object = O>,
    {
        let count = self.stock.clamp_growth(requested);
        if count == 0 {
            debug!(template = %self.stock.template(), requested, "growth skipped: no headroom");
            return 0;
        }
        let template = self.stock.template();
        let mut created = 0;
        for _ in 0..count {
            match host.create(template) {
                Ok(object) => {
                    self.stock.admit(host, object);
                    created += 1;
                }
                Err(e) => {
                    warn!(%template, created, requested = count, "instance creation failed: {e}");
                    break;
                }
            }
        }
        created
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
            self.grow(host, grow_count);
        }
        self.stock.take_idle(host, placement)
    }
}
