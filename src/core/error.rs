//! Error types for pool operations.

use thiserror::Error;

use crate::core::types::{InstanceId, TemplateId};

/// Errors produced by pool components.
///
/// None of these are fatal. Registration errors leave the registry untouched;
/// despawn errors leave bin state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Pool configuration did not name a template.
    #[error("pool `{0}` has no template")]
    NullTemplate(String),
    /// A pool with this logical name is already registered.
    #[error("duplicate pool name: {0}")]
    DuplicateName(String),
    /// The template already has a pool under another name.
    #[error("template {template} already pooled as `{existing}`")]
    DuplicateTemplate {
        /// Template that was registered twice.
        template: TemplateId,
        /// Name of the pool that already owns it.
        existing: String,
    },
    /// Configuration values failed validation.
    #[error("invalid pool config: {0}")]
    InvalidConfig(String),
    /// No pool is registered under this name.
    #[error("unknown pool: {0}")]
    UnknownPool(String),
    /// The instance is not live in the pool it claims to belong to.
    #[error("instance {0} is not live")]
    NotLive(InstanceId),
    /// The handle belongs to an earlier spawn of this instance.
    #[error("instance {id} handle is stale (serial {held}, live serial {live})")]
    StaleInstance {
        /// Instance identifier.
        id: InstanceId,
        /// Serial carried by the caller's handle.
        held: u64,
        /// Serial of the current spawn.
        live: u64,
    },
    /// The host failed to create an instance.
    #[error("host error: {0}")]
    Host(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
