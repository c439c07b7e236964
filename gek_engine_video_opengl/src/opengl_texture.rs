/// Texture - OpenGL implementation of the Texture trait
///
/// Storage is immutable (`glTexStorage*`). Initial data is uploaded per
/// subresource in the engine order: array slice (cube face) first, then mip.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glow::HasContext;

use gek_engine::gek::video::{
    Resource, ResourceCounters, ResourceId, ResourceKind, ResourceTicket, Texture, TextureData,
    TextureDescription,
};
use gek_engine::gek::Result;
use gek_engine::engine_err;

use crate::opengl_debug::check_error;
use crate::opengl_deletion::{DeletionQueue, GlObject};
use crate::opengl_format::gl_format;

const SOURCE: &str = "gek::video::opengl";

/// Texture unit used for uploads and mip generation, above every resource slot
pub(crate) const SCRATCH_TEXTURE_UNIT: u32 = 64;

/// Texture target for a description
pub fn texture_target(desc: &TextureDescription) -> u32 {
    if desc.is_multisampled() {
        glow::TEXTURE_2D_MULTISAMPLE
    } else if desc.is_cube() {
        glow::TEXTURE_CUBE_MAP
    } else if desc.is_volume() {
        glow::TEXTURE_3D
    } else {
        glow::TEXTURE_2D
    }
}

/// Target used to upload array slice `slice` (cube faces have their own)
pub fn upload_target(target: u32, slice: u32) -> u32 {
    if target == glow::TEXTURE_CUBE_MAP {
        glow::TEXTURE_CUBE_MAP_POSITIVE_X + slice
    } else {
        target
    }
}

pub struct OpenGlTexture {
    id: ResourceId,
    description: TextureDescription,
    pub(crate) native: glow::NativeTexture,
    pub(crate) target: u32,
    /// Generation fetched under and the swap chain's live generation (back buffers only)
    generation: Option<(u64, Arc<AtomicU64>)>,
    deletion: Arc<DeletionQueue>,
    _ticket: ResourceTicket,
}

impl OpenGlTexture {
    pub fn create(
        gl: &glow::Context,
        desc: &TextureDescription,
        data: Option<&TextureData>,
        deletion: &Arc<DeletionQueue>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        let target = texture_target(desc);
        let format = gl_format(desc.format);
        let levels = desc.mip_levels();
        let native = unsafe { gl.create_texture() }
            .map_err(|error| engine_err!(SOURCE, "Unable to create texture '{}': {}", desc.name, error))?;

        unsafe {
            gl.active_texture(glow::TEXTURE0 + SCRATCH_TEXTURE_UNIT);
            gl.bind_texture(target, Some(native));
            match target {
                glow::TEXTURE_2D_MULTISAMPLE => gl.tex_storage_2d_multisample(
                    target,
                    desc.sample_count as i32,
                    format.internal_format,
                    desc.width as i32,
                    desc.height as i32,
                    true,
                ),
                glow::TEXTURE_3D => gl.tex_storage_3d(
                    target,
                    levels as i32,
                    format.internal_format,
                    desc.width as i32,
                    desc.height as i32,
                    desc.depth as i32,
                ),
                _ => gl.tex_storage_2d(
                    target,
                    levels as i32,
                    format.internal_format,
                    desc.width as i32,
                    desc.height as i32,
                ),
            }
            if target != glow::TEXTURE_2D_MULTISAMPLE {
                gl.tex_parameter_i32(target, glow::TEXTURE_MAX_LEVEL, levels as i32 - 1);
            }
        }

        if let Some(data) = data {
            Self::upload(gl, desc, target, data);
        }
        unsafe { gl.bind_texture(target, None) };

        if let Err(error) = check_error(gl, &format!("Allocating texture '{}'", desc.name)) {
            unsafe { gl.delete_texture(native) };
            return Err(error);
        }

        Ok(Self {
            id: ResourceId::next(),
            description: desc.clone(),
            native,
            target,
            generation: None,
            deletion: deletion.clone(),
            _ticket: counters.track(ResourceKind::Texture),
        })
    }

    /// Tie the texture to a swap-chain generation (back buffers)
    pub(crate) fn with_generation(mut self, generation: u64, live: Arc<AtomicU64>) -> Self {
        self.generation = Some((generation, live));
        self
    }

    fn upload(gl: &glow::Context, desc: &TextureDescription, target: u32, data: &TextureData) {
        let format = gl_format(desc.format);
        let levels = desc.mip_levels();
        unsafe {
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        }
        for slice in 0..desc.array_size() {
            for mip in 0..levels {
                let bytes = &data.subresources[TextureData::subresource_index(mip, slice, levels)];
                let (width, height, depth) = desc.mip_extent(mip);
                let face = upload_target(target, slice);
                unsafe {
                    match (target, desc.format.is_compressed()) {
                        (glow::TEXTURE_3D, true) => gl.compressed_tex_sub_image_3d(
                            face,
                            mip as i32,
                            0,
                            0,
                            0,
                            width as i32,
                            height as i32,
                            depth as i32,
                            format.internal_format,
                            glow::CompressedPixelUnpackData::Slice(bytes),
                        ),
                        (glow::TEXTURE_3D, false) => gl.tex_sub_image_3d(
                            face,
                            mip as i32,
                            0,
                            0,
                            0,
                            width as i32,
                            height as i32,
                            depth as i32,
                            format.format,
                            format.data_type,
                            glow::PixelUnpackData::Slice(Some(bytes)),
                        ),
                        (_, true) => gl.compressed_tex_sub_image_2d(
                            face,
                            mip as i32,
                            0,
                            0,
                            width as i32,
                            height as i32,
                            format.internal_format,
                            glow::CompressedPixelUnpackData::Slice(bytes),
                        ),
                        (_, false) => gl.tex_sub_image_2d(
                            face,
                            mip as i32,
                            0,
                            0,
                            width as i32,
                            height as i32,
                            format.format,
                            format.data_type,
                            glow::PixelUnpackData::Slice(Some(bytes)),
                        ),
                    }
                }
            }
        }
    }
}

impl Resource for OpenGlTexture {
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

impl Texture for OpenGlTexture {
    fn description(&self) -> &TextureDescription {
        &self.description
    }

    fn is_current(&self) -> bool {
        match &self.generation {
            Some((fetched, live)) => *fetched == live.load(Ordering::Acquire),
            None => true,
        }
    }
}

impl Drop for OpenGlTexture {
    fn drop(&mut self) {
        self.deletion.push(GlObject::Texture(self.id, self.native));
    }
}

#[cfg(test)]
#[path = "opengl_texture_tests.rs"]
mod tests;
