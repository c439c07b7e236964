/// Shared resource identity and view flags

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::Result;
use crate::video::{Buffer, Texture};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a native object
///
/// Ids are never reused, so two `ResourceId`s compare equal only when they
/// refer to the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value (for logging and debug names)
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Views a resource was created with
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ViewFlags: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const UNORDERED_ACCESS = 1 << 1;
        const RENDER_TARGET = 1 << 2;
        const DEPTH_STENCIL = 1 << 3;
    }
}

/// Base trait of every device object
///
/// Backends downcast through `as_any()` to reach their native wrapper; an
/// object from another backend simply fails the downcast.
pub trait Resource: Send + Sync + 'static {
    /// Unique identity
    fn id(&self) -> ResourceId;

    /// Debug name given at creation (may be empty)
    fn name(&self) -> &str;

    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}

/// Downcast a device object to the backend type `T`
///
/// Fails with `InvalidResource` when the object belongs to another backend.
pub fn downcast<'a, T: Any>(any: &'a dyn Any, name: &str) -> Result<&'a T> {
    match any.downcast_ref::<T>() {
        Some(native) => Ok(native),
        None => crate::engine_bail_invalid!(
            "gek::video::Resource",
            "'{}' was not created by this device's backend",
            name
        ),
    }
}

/// A buffer or texture bound through a shader-resource or unordered-access slot
#[derive(Clone)]
pub enum ResourceRef {
    Buffer(Arc<dyn Buffer>),
    Texture(Arc<dyn Texture>),
}

impl ResourceRef {
    /// Identity of the referenced object
    pub fn id(&self) -> ResourceId {
        match self {
            ResourceRef::Buffer(buffer) => buffer.id(),
            ResourceRef::Texture(texture) => texture.id(),
        }
    }

    /// Views of the referenced object
    pub fn views(&self) -> ViewFlags {
        match self {
            ResourceRef::Buffer(buffer) => buffer.views(),
            ResourceRef::Texture(texture) => texture.views(),
        }
    }

    /// Debug name of the referenced object
    pub fn name(&self) -> &str {
        match self {
            ResourceRef::Buffer(buffer) => buffer.name(),
            ResourceRef::Texture(texture) => texture.name(),
        }
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Buffer(buffer) => write!(f, "Buffer({} '{}')", buffer.id(), buffer.name()),
            ResourceRef::Texture(texture) => write!(f, "Texture({} '{}')", texture.id(), texture.name()),
        }
    }
}

impl From<Arc<dyn Buffer>> for ResourceRef {
    fn from(buffer: Arc<dyn Buffer>) -> Self {
        ResourceRef::Buffer(buffer)
    }
}

impl From<Arc<dyn Texture>> for ResourceRef {
    fn from(texture: Arc<dyn Texture>) -> Self {
        ResourceRef::Texture(texture)
    }
}
