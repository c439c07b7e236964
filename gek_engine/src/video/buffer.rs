/// Buffer trait and buffer description

use bitflags::bitflags;

use crate::video::{Format, Resource, ViewFlags};

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferType {
    /// Untyped byte-address buffer
    #[default]
    Raw,
    /// Vertex buffer
    Vertex,
    /// Index buffer (R16_UINT or R32_UINT)
    Index,
    /// Constant buffer (size is a multiple of 16 bytes)
    Constant,
    /// Structured buffer with an explicit stride
    Structured,
}

bitflags! {
    /// Buffer creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferFlags: u32 {
        /// CPU read-back copy target; cannot be bound to the pipeline
        const STAGING = 1 << 0;
        /// Updated from the CPU every frame (dynamic usage, write-discard mapping)
        const MUTABLE = 1 << 1;
        /// Readable from shaders through a shader-resource view
        const RESOURCE = 1 << 2;
        /// Writable from shaders through an unordered-access view
        const UNORDERED_ACCESS = 1 << 3;
        /// Unordered-access view carries a hidden append/consume counter
        const COUNTER = 1 << 4;
    }
}

/// Description of a buffer (immutable after creation)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferDescription {
    /// Debug name
    pub name: String,
    /// Element format (`Unknown` for structured and raw buffers)
    pub format: Format,
    /// Element size in bytes; 0 means "derive from `format`"
    pub stride: u32,
    /// Number of elements
    pub count: u32,
    /// Binding type
    pub buffer_type: BufferType,
    /// Creation flags
    pub flags: BufferFlags,
}

impl BufferDescription {
    /// Vertex buffer of `count` elements of `stride` bytes
    pub fn vertex(name: &str, stride: u32, count: u32) -> Self {
        Self {
            name: name.to_string(),
            stride,
            count,
            buffer_type: BufferType::Vertex,
            ..Default::default()
        }
    }

    /// Index buffer of `count` indices in `format` (R16_UINT or R32_UINT)
    pub fn index(name: &str, format: Format, count: u32) -> Self {
        Self {
            name: name.to_string(),
            format,
            count,
            buffer_type: BufferType::Index,
            ..Default::default()
        }
    }

    /// Mutable constant buffer of `size` bytes
    pub fn constant(name: &str, size: u32) -> Self {
        Self {
            name: name.to_string(),
            stride: size,
            count: 1,
            buffer_type: BufferType::Constant,
            flags: BufferFlags::MUTABLE,
            ..Default::default()
        }
    }

    /// Structured buffer readable from shaders
    pub fn structured(name: &str, stride: u32, count: u32) -> Self {
        Self {
            name: name.to_string(),
            stride,
            count,
            buffer_type: BufferType::Structured,
            flags: BufferFlags::RESOURCE,
            ..Default::default()
        }
    }

    /// Size in bytes of one element
    pub fn element_stride(&self) -> u32 {
        if self.stride > 0 {
            self.stride
        } else {
            self.format.stride()
        }
    }

    /// Total size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.element_stride() as u64 * self.count as u64
    }

    /// Views implied by the flags
    pub fn views(&self) -> ViewFlags {
        let mut views = ViewFlags::empty();
        if self.flags.contains(BufferFlags::RESOURCE) {
            views |= ViewFlags::SHADER_RESOURCE;
        }
        if self.flags.contains(BufferFlags::UNORDERED_ACCESS) {
            views |= ViewFlags::UNORDERED_ACCESS;
        }
        views
    }
}

/// Mapping mode for `Device::map_buffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// Read back (staging buffers)
    Read,
    /// Write, preserving contents
    Write,
    /// Write, discarding previous contents (mutable buffers)
    WriteDiscard,
    /// Write to a region the GPU is not using
    WriteNoOverwrite,
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types. The native buffer is
/// released when the last `Arc` drops.
pub trait Buffer: Resource {
    /// Description the buffer was created with
    fn description(&self) -> &BufferDescription;

    /// Views created for this buffer
    fn views(&self) -> ViewFlags {
        self.description().views()
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
