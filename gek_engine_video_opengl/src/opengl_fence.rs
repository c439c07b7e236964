/// Fence - GPU progress marker built on a timestamp query
///
/// `glQueryCounter` is written into the command stream at `signal_fence`;
/// the fence is signalled once the query result becomes available.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glow::HasContext;

use gek_engine::gek::video::{Fence, Resource, ResourceId};
use gek_engine::gek::Result;
use gek_engine::engine_err;

use crate::opengl_deletion::{DeletionQueue, GlObject};

const SOURCE: &str = "gek::video::opengl";

pub struct OpenGlFence {
    id: ResourceId,
    query: glow::NativeQuery,
    /// Set once a context has written the query
    issued: AtomicBool,
    deletion: Arc<DeletionQueue>,
}

impl OpenGlFence {
    pub fn create(gl: &glow::Context, deletion: &Arc<DeletionQueue>) -> Result<Self> {
        let query = unsafe { gl.create_query() }
            .map_err(|error| engine_err!(SOURCE, "Unable to create fence query: {}", error))?;
        Ok(Self {
            id: ResourceId::next(),
            query,
            issued: AtomicBool::new(false),
            deletion: deletion.clone(),
        })
    }

    /// Write the fence into the GL command stream
    pub fn signal(&self, gl: &glow::Context) {
        unsafe { gl.query_counter(self.query, glow::TIMESTAMP) };
        self.issued.store(true, Ordering::Release);
    }

    pub fn is_signaled(&self, gl: &glow::Context) -> bool {
        if !self.issued.load(Ordering::Acquire) {
            return false;
        }
        unsafe { gl.get_query_parameter_u32(self.query, glow::QUERY_RESULT_AVAILABLE) != 0 }
    }
}

impl Resource for OpenGlFence {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        "fence"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Fence for OpenGlFence {}

impl Drop for OpenGlFence {
    fn drop(&mut self) {
        self.deletion.push(GlObject::Query(self.query));
    }
}
