/// HRESULT to engine error mapping
///
/// Every failed native call goes through `hresult_error`, which logs the
/// call, the code and the system message at the failure site.

use gek_engine::engine_error;
use gek_engine::gek::Error;

const SOURCE: &str = "gek::video::d3d11";

pub const E_OUTOFMEMORY: i32 = 0x8007_000E_u32 as i32;
pub const DXGI_ERROR_DEVICE_HUNG: i32 = 0x887A_0006_u32 as i32;
pub const DXGI_ERROR_DEVICE_REMOVED: i32 = 0x887A_0005_u32 as i32;
pub const DXGI_ERROR_DEVICE_RESET: i32 = 0x887A_0007_u32 as i32;
pub const DXGI_ERROR_INVALID_CALL: i32 = 0x887A_0001_u32 as i32;

/// True for the codes that mean the device is gone and must be recreated
pub fn is_device_lost(code: i32) -> bool {
    matches!(code, DXGI_ERROR_DEVICE_HUNG | DXGI_ERROR_DEVICE_REMOVED | DXGI_ERROR_DEVICE_RESET)
}

/// Log a failed call and turn its HRESULT into an engine error
pub fn hresult_error(what: &str, code: i32, message: &str) -> Error {
    let message = message.trim();
    engine_error!(SOURCE, "{} failed: 0x{:08X} {}", what, code as u32, message);
    if code == E_OUTOFMEMORY {
        return Error::OutOfMemory;
    }
    let detail = if is_device_lost(code) {
        format!("{}: device lost (0x{:08X})", what, code as u32)
    } else {
        format!("{}: 0x{:08X} {}", what, code as u32, message)
    };
    Error::BackendError(detail.trim_end().to_string())
}

#[cfg(windows)]
pub use native::*;

#[cfg(windows)]
mod native {
    use windows::core::Interface;
    use windows::Win32::Graphics::Direct3D::WKPDID_D3DDebugObjectName;
    use windows::Win32::Graphics::Direct3D11::ID3D11DeviceChild;

    use gek_engine::gek::Result;

    use super::hresult_error;

    /// Map a `windows` result, logging the failure
    pub fn check<T>(result: windows::core::Result<T>, what: &str) -> Result<T> {
        result.map_err(|error| hresult_error(what, error.code().0, &error.message()))
    }

    /// Unwrap an out-parameter a successful call must have filled
    pub fn created<T>(object: Option<T>, what: &str) -> Result<T> {
        object.ok_or_else(|| gek_engine::engine_err!(super::SOURCE, "{} returned no object", what))
    }

    /// Name a device child for the debug layer and graphics debuggers
    pub fn set_debug_name<T: Interface>(object: &T, name: &str) {
        if name.is_empty() {
            return;
        }
        if let Ok(child) = object.cast::<ID3D11DeviceChild>() {
            // Naming is best effort; a failure only affects debug output
            let _ = unsafe {
                child.SetPrivateData(
                    &WKPDID_D3DDebugObjectName,
                    name.len() as u32,
                    Some(name.as_ptr().cast()),
                )
            };
        }
    }
}

#[cfg(test)]
#[path = "d3d11_error_tests.rs"]
mod tests;
