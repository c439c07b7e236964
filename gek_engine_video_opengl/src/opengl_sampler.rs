/// Sampler - OpenGL sampler objects

use std::any::Any;
use std::sync::Arc;

use glow::HasContext;

use gek_engine::gek::video::{
    Resource, ResourceCounters, ResourceId, ResourceKind, ResourceTicket, SamplerState, SamplerStateDescription,
};
use gek_engine::gek::Result;
use gek_engine::engine_err;

use crate::opengl_deletion::{DeletionQueue, GlObject};
use crate::opengl_format::TEXTURE_MAX_ANISOTROPY;
use crate::opengl_state::{address_mode, comparison_function, mag_filter, min_filter};

const SOURCE: &str = "gek::video::opengl";

/// Largest LOD passed to GL; `f32::MAX` means "no clamp"
const MAX_LOD: f32 = 1000.0;

pub struct OpenGlSamplerState {
    id: ResourceId,
    description: SamplerStateDescription,
    pub(crate) native: glow::NativeSampler,
    deletion: Arc<DeletionQueue>,
    _ticket: ResourceTicket,
}

impl OpenGlSamplerState {
    pub fn create(
        gl: &glow::Context,
        desc: &SamplerStateDescription,
        deletion: &Arc<DeletionQueue>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        let native = unsafe { gl.create_sampler() }
            .map_err(|error| engine_err!(SOURCE, "Unable to create sampler: {}", error))?;

        unsafe {
            gl.sampler_parameter_i32(native, glow::TEXTURE_MIN_FILTER, min_filter(desc.min_filter, desc.mip_filter) as i32);
            gl.sampler_parameter_i32(native, glow::TEXTURE_MAG_FILTER, mag_filter(desc.mag_filter) as i32);
            gl.sampler_parameter_i32(native, glow::TEXTURE_WRAP_S, address_mode(desc.address_mode_u) as i32);
            gl.sampler_parameter_i32(native, glow::TEXTURE_WRAP_T, address_mode(desc.address_mode_v) as i32);
            gl.sampler_parameter_i32(native, glow::TEXTURE_WRAP_R, address_mode(desc.address_mode_w) as i32);
            gl.sampler_parameter_f32(native, glow::TEXTURE_LOD_BIAS, desc.mip_lod_bias);
            gl.sampler_parameter_f32(native, glow::TEXTURE_MIN_LOD, desc.min_lod);
            gl.sampler_parameter_f32(native, glow::TEXTURE_MAX_LOD, desc.max_lod.min(MAX_LOD));
            if desc.is_anisotropic() {
                gl.sampler_parameter_f32(native, TEXTURE_MAX_ANISOTROPY, desc.max_anisotropy as f32);
            }
            if let Some(function) = desc.comparison_function {
                gl.sampler_parameter_i32(native, glow::TEXTURE_COMPARE_MODE, glow::COMPARE_REF_TO_TEXTURE as i32);
                gl.sampler_parameter_i32(native, glow::TEXTURE_COMPARE_FUNC, comparison_function(function) as i32);
            }
            let mut border = desc.border_color;
            gl.sampler_parameter_f32_slice(native, glow::TEXTURE_BORDER_COLOR, &mut border);
        }

        Ok(Self {
            id: ResourceId::next(),
            description: *desc,
            native,
            deletion: deletion.clone(),
            _ticket: counters.track(ResourceKind::SamplerState),
        })
    }
}

impl Resource for OpenGlSamplerState {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        "sampler"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl SamplerState for OpenGlSamplerState {
    fn description(&self) -> &SamplerStateDescription {
        &self.description
    }
}

impl Drop for OpenGlSamplerState {
    fn drop(&mut self) {
        self.deletion.push(GlObject::Sampler(self.native));
    }
}
