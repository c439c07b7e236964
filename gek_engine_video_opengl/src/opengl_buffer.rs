/// Buffer - OpenGL implementation of the Buffer trait

use std::any::Any;
use std::sync::Arc;

use glow::HasContext;

use gek_engine::gek::video::{
    Buffer, BufferDescription, BufferFlags, Resource, ResourceCounters, ResourceId, ResourceKind,
    ResourceTicket,
};
use gek_engine::gek::Result;
use gek_engine::{engine_bail_invalid, engine_err};

use crate::opengl_debug::check_error;
use crate::opengl_deletion::{DeletionQueue, GlObject};

const SOURCE: &str = "gek::video::opengl";

/// Usage hint for `glBufferData`
pub fn buffer_usage(desc: &BufferDescription) -> u32 {
    if desc.flags.contains(BufferFlags::STAGING) {
        glow::STREAM_READ
    } else if desc.flags.contains(BufferFlags::MUTABLE) {
        glow::DYNAMIC_DRAW
    } else if desc.flags.contains(BufferFlags::UNORDERED_ACCESS) {
        glow::DYNAMIC_COPY
    } else {
        glow::STATIC_DRAW
    }
}

/// Reject flags GL has no equivalent for
pub fn check_supported(desc: &BufferDescription) -> Result<()> {
    if desc.flags.contains(BufferFlags::COUNTER) {
        engine_bail_invalid!(SOURCE, "Buffer '{}': append/consume counters are not supported on OpenGL", desc.name);
    }
    Ok(())
}

pub struct OpenGlBuffer {
    id: ResourceId,
    description: BufferDescription,
    pub(crate) native: glow::NativeBuffer,
    deletion: Arc<DeletionQueue>,
    _ticket: ResourceTicket,
}

impl OpenGlBuffer {
    /// Allocate the buffer and upload optional initial data
    ///
    /// Uploads go through `GL_COPY_WRITE_BUFFER` so no vertex array state is
    /// touched.
    pub fn create(
        gl: &glow::Context,
        desc: &BufferDescription,
        data: Option<&[u8]>,
        deletion: &Arc<DeletionQueue>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        let size = desc.size_bytes() as i32;
        let native = unsafe { gl.create_buffer() }
            .map_err(|error| engine_err!(SOURCE, "Unable to create buffer '{}': {}", desc.name, error))?;

        unsafe {
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(native));
            gl.buffer_data_size(glow::COPY_WRITE_BUFFER, size, buffer_usage(desc));
            if let Some(data) = data {
                gl.buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, data);
            }
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        if let Err(error) = check_error(gl, &format!("Allocating buffer '{}'", desc.name)) {
            unsafe { gl.delete_buffer(native) };
            return Err(error);
        }

        Ok(Self {
            id: ResourceId::next(),
            description: desc.clone(),
            native,
            deletion: deletion.clone(),
            _ticket: counters.track(ResourceKind::Buffer),
        })
    }
}

impl Resource for OpenGlBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.description.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Buffer for OpenGlBuffer {
    fn description(&self) -> &BufferDescription {
        &self.description
    }
}

impl Drop for OpenGlBuffer {
    fn drop(&mut self) {
        self.deletion.push(GlObject::Buffer(self.native));
    }
}

#[cfg(test)]
#[path = "opengl_buffer_tests.rs"]
mod tests;
