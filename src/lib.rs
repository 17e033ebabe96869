//! # Prometheus Object Pool
//!
//! An engine-agnostic object-pooling core that reuses heavyweight spawnable
//! resources instead of allocating and destroying them on every use.
//!
//! The crate never touches real engine objects. Everything that constructs,
//! destroys, shows or moves an instance goes through the [`core::SpawnHost`]
//! trait, implemented by the embedding engine. The crate owns the
//! bookkeeping around it:
//!
//! - **Pool bins**: one per template, with an idle stack, a live set, lazy
//!   low-watermark growth and an optional hard limit. Sync bins create
//!   instances inline; async bins request deferred batches and pick them up
//!   on a later tick.
//! - **Registry**: routes spawn and despawn by template identity or pool
//!   name, falls back to unpooled instantiation for unknown templates, and
//!   runs delayed despawns.
//! - **Culling**: periodic destruction of idle surplus above a per-pool
//!   floor. The per-bin decision phase runs on the rayon pool for large
//!   registries.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use prometheus_object_pool::config::PoolConfig;
//! use prometheus_object_pool::core::{Placement, Registry, TemplateId};
//! use prometheus_object_pool::util::now_ms;
//!
//! let mut registry = Registry::new(my_host);
//! registry.register_pool(
//!     PoolConfig::new("bullet", TemplateId(7)).with_preallocate(32).with_hard_limit(256),
//!     now_ms(),
//! )?;
//!
//! let bullet = registry.spawn("bullet", &Placement::at([0.0, 1.0, 0.0]), now_ms());
//! if let Some(bullet) = bullet {
//!     registry.despawn(&bullet);
//! }
//!
//! // Once per frame:
//! registry.update(now_ms());
//! scheduler.tick(&mut registry, now_ms());
//! ```
//!
//! With the `tokio-runtime` feature (default) the [`runtime`] module adds a
//! tokio spawner, async batch production, and a background cull loop.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Pool bins, registry, lookup index and culling.
pub mod core;
/// Configuration models for pools and the registry.
pub mod config;
/// Builders to construct a registry from configuration.
pub mod builders;
/// Tokio runtime adapters.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
