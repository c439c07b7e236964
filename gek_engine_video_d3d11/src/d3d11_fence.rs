/// Fence - GPU progress marker built on an event query
///
/// `End()` is written into the command stream at `signal_fence`; the fence
/// is signalled once `GetData` reports the event as reached.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};

use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11DeviceContext, ID3D11Query, D3D11_ASYNC_GETDATA_DONOTFLUSH, D3D11_QUERY_DESC,
    D3D11_QUERY_EVENT,
};

use gek_engine::gek::video::{Fence, Resource, ResourceId};
use gek_engine::gek::Result;

use crate::d3d11_error::{check, created};

pub struct D3D11Fence {
    id: ResourceId,
    query: ID3D11Query,
    /// Set once a context has ended the query
    issued: AtomicBool,
}

// SAFETY: D3D11 device children are free-threaded; only contexts are not.
unsafe impl Send for D3D11Fence {}
unsafe impl Sync for D3D11Fence {}

impl D3D11Fence {
    pub fn create(device: &ID3D11Device) -> Result<Self> {
        let desc = D3D11_QUERY_DESC {
            Query: D3D11_QUERY_EVENT,
            MiscFlags: 0,
        };
        let mut query: Option<ID3D11Query> = None;
        check(unsafe { device.CreateQuery(&desc, Some(&mut query)) }, "CreateQuery")?;
        Ok(Self {
            id: ResourceId::next(),
            query: created(query, "CreateQuery")?,
            issued: AtomicBool::new(false),
        })
    }

    /// Write the fence into the context's command stream
    pub fn signal(&self, context: &ID3D11DeviceContext) {
        unsafe { context.End(&self.query) };
        self.issued.store(true, Ordering::Release);
    }

    pub fn is_signaled(&self, context: &ID3D11DeviceContext) -> bool {
        if !self.issued.load(Ordering::Acquire) {
            return false;
        }
        let mut done: i32 = 0;
        let result = unsafe {
            context.GetData(
                &self.query,
                Some(&mut done as *mut i32 as *mut _),
                std::mem::size_of::<i32>() as u32,
                D3D11_ASYNC_GETDATA_DONOTFLUSH.0 as u32,
            )
        };
        // S_FALSE (not reached yet) comes back as Ok with `done` untouched
        result.is_ok() && done != 0
    }
}

impl Resource for D3D11Fence {
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

impl Fence for D3D11Fence {}
