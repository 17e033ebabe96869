//! Identity and handle types shared by bins and the registry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable handle of a template (prefab) that instances are created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub u64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// Process-unique identifier of a pooled instance. Survives reuse cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Hands out instance ids. Clones share one counter.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    /// Create a fresh allocator starting at id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate the next id.
    pub fn allocate(&self) -> InstanceId {
        InstanceId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instance metadata naming the template whose pool owns it.
///
/// Only used to route despawns; the tag never owns anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceTag {
    template: TemplateId,
}

impl InstanceTag {
    pub(crate) const fn new(template: TemplateId) -> Self {
        Self { template }
    }

    /// Template of the owning pool.
    #[must_use]
    pub const fn template(&self) -> TemplateId {
        self.template
    }
}

/// A spawned instance as seen by callers.
///
/// `O` is the host's object handle (an entity id, a node pointer, ...). The
/// `serial` changes on every spawn, so a handle kept past its despawn is
/// recognised as stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance<O> {
    id: InstanceId,
    serial: u64,
    tag: Option<InstanceTag>,
    object: O,
}

impl<O> Instance<O> {
    pub(crate) const fn pooled(id: InstanceId, serial: u64, tag: InstanceTag, object: O) -> Self {
        Self {
            id,
            serial,
            tag: Some(tag),
            object,
        }
    }

    pub(crate) const fn unpooled(id: InstanceId, object: O) -> Self {
        Self {
            id,
            serial: 0,
            tag: None,
            object,
        }
    }

    /// Instance identifier.
    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Spawn generation of this handle.
    #[must_use]
    pub const fn serial(&self) -> u64 {
        self.serial
    }

    /// Owning-pool tag, `None` for unpooled fallback instances.
    #[must_use]
    pub const fn tag(&self) -> Option<InstanceTag> {
        self.tag
    }

    /// Whether the instance came out of a pool.
    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        self.tag.is_some()
    }

    /// Host object handle.
    #[must_use]
    pub const fn object(&self) -> &O {
        &self.object
    }
}

/// World position and orientation applied on spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// World position.
    pub position: [f32; 3],
    /// Orientation quaternion `[x, y, z, w]`.
    pub rotation: [f32; 4],
}

impl Placement {
    /// Identity rotation quaternion.
    pub const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    /// Placement at `position` with identity rotation.
    #[must_use]
    pub const fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            rotation: Self::IDENTITY_ROTATION,
        }
    }

    /// Replace the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::at([0.0; 3])
    }
}

/// What a spawn request names: a template or a pool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnTarget<'a> {
    /// Route by template identity.
    Template(TemplateId),
    /// Route by logical pool name.
    Name(&'a str),
}

impl From<TemplateId> for SpawnTarget<'_> {
    fn from(template: TemplateId) -> Self {
        Self::Template(template)
    }
}

impl<'a> From<&'a str> for SpawnTarget<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for SpawnTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(t) => write!(f, "{t}"),
            Self::Name(n) => write!(f, "`{n}`"),
        }
    }
}
