/// Framebuffer objects for render-target combinations
///
/// GL has no standalone render-target views, so every distinct set of
/// color targets plus depth target gets one FBO, created on first use and
/// reused after that. Entries are purged when one of their textures is
/// deleted.

use glow::HasContext;
use rustc_hash::FxHashMap;

use gek_engine::gek::video::{ResourceId, Texture};
use gek_engine::gek::Result;
use gek_engine::engine_err;

use crate::opengl_texture::OpenGlTexture;

const SOURCE: &str = "gek::video::opengl";

/// Textures attached to one framebuffer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferKey {
    pub colors: Vec<ResourceId>,
    pub depth: Option<ResourceId>,
}

impl FramebufferKey {
    pub fn contains(&self, id: ResourceId) -> bool {
        self.depth == Some(id) || self.colors.contains(&id)
    }
}

/// Cache of framebuffer handles keyed by attachment set
#[derive(Debug)]
pub struct FramebufferCache<F> {
    entries: FxHashMap<FramebufferKey, F>,
}

impl<F: Copy> Default for FramebufferCache<F> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<F: Copy> FramebufferCache<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FramebufferKey) -> Option<F> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: FramebufferKey, framebuffer: F) {
        self.entries.insert(key, framebuffer);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry that references a deleted texture
    ///
    /// Returns the framebuffers the caller must delete.
    pub fn purge(&mut self, deleted: &[ResourceId]) -> Vec<F> {
        if deleted.is_empty() {
            return Vec::new();
        }
        let mut removed = Vec::new();
        self.entries.retain(|key, framebuffer| {
            let stale = deleted.iter().any(|id| key.contains(*id));
            if stale {
                removed.push(*framebuffer);
            }
            !stale
        });
        removed
    }

    /// Remove every entry
    pub fn drain(&mut self) -> Vec<F> {
        self.entries.drain().map(|(_, framebuffer)| framebuffer).collect()
    }
}

/// Attachment point of a depth texture
pub fn depth_attachment(texture: &OpenGlTexture) -> u32 {
    if texture.description().format.has_stencil() {
        glow::DEPTH_STENCIL_ATTACHMENT
    } else {
        glow::DEPTH_ATTACHMENT
    }
}

/// Create and complete a framebuffer for the given attachments
pub fn create_framebuffer(
    gl: &glow::Context,
    colors: &[&OpenGlTexture],
    depth: Option<&OpenGlTexture>,
) -> Result<glow::NativeFramebuffer> {
    let framebuffer = unsafe { gl.create_framebuffer() }
        .map_err(|error| engine_err!(SOURCE, "Unable to create framebuffer: {}", error))?;
    unsafe {
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
        let mut draw_buffers = Vec::with_capacity(colors.len());
        for (index, color) in colors.iter().enumerate() {
            let attachment = glow::COLOR_ATTACHMENT0 + index as u32;
            gl.framebuffer_texture(glow::FRAMEBUFFER, attachment, Some(color.native), 0);
            draw_buffers.push(attachment);
        }
        if draw_buffers.is_empty() {
            gl.draw_buffer(glow::NONE);
        } else {
            gl.draw_buffers(&draw_buffers);
        }
        if let Some(depth) = depth {
            gl.framebuffer_texture(glow::FRAMEBUFFER, depth_attachment(depth), Some(depth.native), 0);
        }

        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        if status != glow::FRAMEBUFFER_COMPLETE {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.delete_framebuffer(framebuffer);
            return Err(engine_err!(
                SOURCE,
                "Framebuffer with {} color target(s) is incomplete ({:#06x})",
                colors.len(), status
            ));
        }
    }
    Ok(framebuffer)
}

#[cfg(test)]
#[path = "opengl_framebuffer_tests.rs"]
mod tests;
