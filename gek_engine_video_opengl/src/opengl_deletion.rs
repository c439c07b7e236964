/// Deferred deletion of GL objects
///
/// Resources are `Send + Sync` and may be dropped on any thread, but GL
/// calls are only valid on the thread that owns the context. Dropping a
/// resource pushes its handle here; the device drains the queue on its own
/// thread (at present, after executing a command list, and on drop).

use std::sync::Mutex;

use glow::HasContext;

use gek_engine::gek::video::ResourceId;

/// A GL object waiting for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlObject {
    Buffer(glow::NativeBuffer),
    /// Texture and the resource id framebuffers cache it under
    Texture(ResourceId, glow::NativeTexture),
    Sampler(glow::NativeSampler),
    Shader(glow::NativeShader),
    Program(glow::NativeProgram),
    VertexArray(glow::NativeVertexArray),
    Framebuffer(glow::NativeFramebuffer),
    Query(glow::NativeQuery),
}

impl GlObject {
    /// Delete the object; must run on the context thread
    pub fn delete(self, gl: &glow::Context) {
        unsafe {
            match self {
                GlObject::Buffer(buffer) => gl.delete_buffer(buffer),
                GlObject::Texture(_, texture) => gl.delete_texture(texture),
                GlObject::Sampler(sampler) => gl.delete_sampler(sampler),
                GlObject::Shader(shader) => gl.delete_shader(shader),
                GlObject::Program(program) => gl.delete_program(program),
                GlObject::VertexArray(vertex_array) => gl.delete_vertex_array(vertex_array),
                GlObject::Framebuffer(framebuffer) => gl.delete_framebuffer(framebuffer),
                GlObject::Query(query) => gl.delete_query(query),
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct DeletionQueue {
    pending: Mutex<Vec<GlObject>>,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, object: GlObject) {
        // A poisoned queue leaks the handle rather than panicking in Drop
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(object);
        }
    }

    /// Take every pending object, oldest first
    pub fn take(&self) -> Vec<GlObject> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ids of the textures in `objects`
pub fn deleted_texture_ids(objects: &[GlObject]) -> Vec<ResourceId> {
    objects
        .iter()
        .filter_map(|object| match object {
            GlObject::Texture(id, _) => Some(*id),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[path = "opengl_deletion_tests.rs"]
mod tests;
