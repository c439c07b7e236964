use gek_engine::gek::Error;

use crate::d3d11_error::{
    hresult_error, is_device_lost, DXGI_ERROR_DEVICE_REMOVED, DXGI_ERROR_INVALID_CALL, E_OUTOFMEMORY,
};

#[test]
fn test_out_of_memory_maps_to_its_variant() {
    assert!(matches!(hresult_error("CreateBuffer", E_OUTOFMEMORY, "Not enough memory"), Error::OutOfMemory));
}

#[test]
fn test_device_lost_codes() {
    assert!(is_device_lost(DXGI_ERROR_DEVICE_REMOVED));
    assert!(!is_device_lost(DXGI_ERROR_INVALID_CALL));

    match hresult_error("Present", DXGI_ERROR_DEVICE_REMOVED, "") {
        Error::BackendError(message) => {
            assert!(message.starts_with("Present"));
            assert!(message.contains("device lost"));
            assert!(message.contains("887A0005"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_other_codes_keep_the_system_message() {
    match hresult_error("ResizeBuffers", DXGI_ERROR_INVALID_CALL, "The application made a call that is invalid.\r\n") {
        Error::BackendError(message) => {
            assert_eq!(
                message,
                "ResizeBuffers: 0x887A0001 The application made a call that is invalid."
            );
        }
        other => panic!("unexpected error {:?}", other),
    }
}
