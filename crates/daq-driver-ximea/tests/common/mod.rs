//! Shared test utilities for XIMEA camera tests.
//!
//! - `init_tracing`: install a test subscriber honouring `RUST_LOG`
//! - `open_camera`: open a simulated 2048x2048 camera with default options
//! - `open_with`: open a camera on a prepared `MockHandle`, keeping a probe

#![allow(dead_code)] // Utilities may not all be used in every test file

use daq_driver_ximea::{MockHandle, MockSdk, XimeaCamera, XimeaConfig};
use tracing_subscriber::EnvFilter;

/// Install a tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Open `handle` with `config`, returning the camera and a probe sharing its state.
pub fn open_with_config(
    handle: MockHandle,
    config: &XimeaConfig,
) -> (XimeaCamera<MockHandle>, MockHandle) {
    init_tracing();
    let probe = handle.clone();
    let sdk = MockSdk::single(handle);
    let camera = XimeaCamera::open(&sdk, config).expect("simulated camera opens");
    probe.reset_calls();
    (camera, probe)
}

/// Open `handle` with default options.
pub fn open_with(handle: MockHandle) -> (XimeaCamera<MockHandle>, MockHandle) {
    open_with_config(handle, &XimeaConfig::default())
}

/// Open the default simulated camera.
pub fn open_camera() -> (XimeaCamera<MockHandle>, MockHandle) {
    open_with(MockHandle::default())
}
