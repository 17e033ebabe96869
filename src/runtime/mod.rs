//! Tokio runtime adapters: a spawner, async batch production, and a
//! background cull loop.

pub mod batch;
pub mod cull_loop;
pub mod tokio_spawner;

pub use batch::{spawn_batch, AsyncInstanceFactory};
pub use cull_loop::spawn_cull_loop;
pub use tokio_spawner::TokioSpawner;
