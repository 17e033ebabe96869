//! Pool bins, the registry that routes to them, and their collaborators.

pub mod bin;
pub mod culling;
mod deferred;
pub mod error;
pub mod host;
pub mod index;
pub mod observer;
pub mod registry;
pub mod types;

pub use bin::{AsyncBin, ClearedInstances, PoolBin, PoolStats, SyncBin};
pub use culling::{cull_amount, plan_culls, CullPlan, CullReport, CullSnapshot, CullingScheduler};
pub use error::{AppResult, PoolError};
pub use host::{BatchSender, PendingBatch, Spawn, SpawnHost};
pub use index::{BinKey, LookupIndex};
pub use observer::{
    InMemoryEventLog, PoolEvent, PoolEventKind, PoolObserver, SharedEventLog, TracingObserver,
};
pub use registry::{DespawnOutcome, Registry, UpdateReport, DEFAULT_PARALLEL_CULL_THRESHOLD};
pub use types::{
    IdAllocator, Instance, InstanceId, InstanceTag, Placement, SpawnTarget, TemplateId,
};
