//! Device lifecycle tests
//!
//! Tests opening (device selection, sensor discovery, cleanup on failure),
//! shutdown, exposure/cycle time, binning and SDK setup.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

mod common;

use common::{init_tracing, open_camera, open_with, open_with_config};
use daq_core::core::{Binning, SensorShape};
use daq_driver_ximea::{
    init_sdk, DebugLevel, MockFault, MockHandle, MockSdk, XiStatus, XimeaCamera, XimeaConfig,
    XimeaError, XimeaHandle,
};

// =============================================================================
// Opening
// =============================================================================

#[test]
fn open_without_cameras_fails() {
    init_tracing();
    let sdk = MockSdk::new(Vec::new());

    let err = XimeaCamera::open(&sdk, &XimeaConfig::default()).unwrap_err();

    assert!(matches!(err, XimeaError::NoDevice));
}

#[test]
fn open_with_several_cameras_requires_serial() {
    let sdk = MockSdk::new(vec![
        ("A".into(), MockHandle::default()),
        ("B".into(), MockHandle::default()),
    ]);

    let err = XimeaCamera::open(&sdk, &XimeaConfig::default()).unwrap_err();

    assert!(matches!(err, XimeaError::AmbiguousDevice { count: 2 }));
}

#[test]
fn open_by_serial_selects_camera() {
    let sdk = MockSdk::new(vec![
        ("A".into(), MockHandle::default()),
        ("B".into(), MockHandle::new(SensorShape::new(1280, 1024))),
    ]);
    let config = XimeaConfig {
        serial_number: Some("B".into()),
        ..Default::default()
    };

    let camera = XimeaCamera::open(&sdk, &config).unwrap();

    assert_eq!(camera.sensor_shape(), SensorShape::new(1280, 1024));
}

#[test]
fn open_with_unknown_serial_fails() {
    let sdk = MockSdk::single(MockHandle::default());
    let config = XimeaConfig {
        serial_number: Some("NOPE".into()),
        ..Default::default()
    };

    let err = XimeaCamera::open(&sdk, &config).unwrap_err();

    assert!(matches!(err, XimeaError::Device(_)));
}

#[test]
fn open_rejects_invalid_config() {
    let sdk = MockSdk::single(MockHandle::default());
    let config = XimeaConfig {
        exposure_s: Some(-1.0),
        ..Default::default()
    };

    let err = XimeaCamera::open(&sdk, &config).unwrap_err();

    assert!(matches!(err, XimeaError::Configuration(_)));
}

#[test]
fn open_applies_configured_exposure() {
    let config = XimeaConfig {
        exposure_s: Some(0.025),
        ..Default::default()
    };
    let (camera, probe) = open_with_config(MockHandle::default(), &config);

    assert_eq!(probe.device_exposure_us(), 25_000);
    assert!((camera.exposure_time().unwrap() - 0.025).abs() < 1e-9);
}

#[test]
fn failed_configuration_closes_handle() {
    init_tracing();
    let handle = MockHandle::default().with_fault(MockFault::Always {
        operation: "set_trigger_source",
        status: XiStatus::Other(57),
    });
    let probe = handle.clone();
    let sdk = MockSdk::single(handle);

    let err = XimeaCamera::open(&sdk, &XimeaConfig::default()).unwrap_err();

    assert_eq!(err.status(), Some(XiStatus::Other(57)));
    assert!(!probe.is_open());
}

#[test]
fn failed_probe_closes_handle() {
    let handle = MockHandle::default().with_fault(MockFault::Always {
        operation: "chip_temp",
        status: XiStatus::Other(57),
    });
    let probe = handle.clone();
    let sdk = MockSdk::single(handle);

    assert!(XimeaCamera::open(&sdk, &XimeaConfig::default()).is_err());
    assert!(!probe.is_open());
}

// =============================================================================
// Shutdown
// =============================================================================

#[test]
fn shutdown_stops_and_closes_once() {
    let (camera, probe) = open_camera();
    camera.enable().unwrap();

    camera.shutdown().unwrap();
    camera.shutdown().unwrap();

    assert!(!probe.device_acquiring());
    assert!(!probe.is_open());
    assert_eq!(probe.call_count("stop_acquisition"), 1);
    assert_eq!(probe.call_count("close"), 1);
}

#[test]
fn drop_shuts_down() {
    let (camera, probe) = open_camera();
    camera.enable().unwrap();

    drop(camera);

    assert!(!probe.device_acquiring());
    assert!(!probe.is_open());
}

// =============================================================================
// Exposure, cycle time, binning
// =============================================================================

#[test]
fn exposure_is_stored_in_microseconds() {
    let (camera, probe) = open_camera();

    camera.set_exposure_time(0.0105).unwrap();

    assert_eq!(probe.device_exposure_us(), 10_500);
    assert!((camera.exposure_time().unwrap() - 0.0105).abs() < 1e-9);
}

#[test]
fn exposure_rounds_to_nearest_microsecond() {
    let (camera, probe) = open_camera();

    camera.set_exposure_time(0.000_001_6).unwrap();

    assert_eq!(probe.device_exposure_us(), 2);
}

#[test]
fn invalid_exposure_is_rejected() {
    let (camera, probe) = open_camera();

    for seconds in [-0.1, f64::NAN, f64::INFINITY, 1e10] {
        let err = camera.set_exposure_time(seconds).unwrap_err();
        assert!(matches!(err, XimeaError::Configuration(_)), "{seconds}");
    }
    assert_eq!(probe.call_count("set_exposure"), 0);
}

#[test]
fn exposure_device_errors_propagate() {
    let (camera, _probe) = open_camera();

    // The simulated device rejects a zero exposure
    let err = camera.set_exposure_time(0.0).unwrap_err();

    assert_eq!(err.status(), Some(XiStatus::InvalidArguments));
}

#[test]
fn cycle_time_is_inverse_framerate() {
    let (camera, _probe) = open_with(MockHandle::default().with_framerate(40.0));

    assert!((camera.cycle_time().unwrap() - 0.025).abs() < 1e-12);
}

#[test]
fn zero_framerate_is_an_instrument_error() {
    let (camera, _probe) = open_with(MockHandle::default().with_framerate(0.0));

    assert!(matches!(
        camera.cycle_time(),
        Err(XimeaError::Instrument(_))
    ));
}

#[test]
fn only_identity_binning_is_supported() {
    let (camera, _probe) = open_camera();

    assert_eq!(camera.binning(), Binning::IDENTITY);
    camera.set_binning(Binning::new(1, 1)).unwrap();

    match camera.set_binning(Binning::new(2, 2)).unwrap_err() {
        XimeaError::UnsupportedFeature(msg) => assert!(msg.contains("2x2"), "message: {msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(camera.binning(), Binning::IDENTITY);
}

// =============================================================================
// SDK setup
// =============================================================================

#[test]
fn sdk_debug_level_is_applied_once() {
    let sdk = MockSdk::single(MockHandle::default());

    let first = init_sdk(&sdk, DebugLevel::Warning).unwrap();
    let second = init_sdk(&sdk, DebugLevel::Trace).unwrap();

    assert!(!second);
    // Another test in this binary may have configured the SDK first
    if first {
        assert_eq!(sdk.debug_level(), Some(DebugLevel::Warning));
    }
    assert!(sdk.debug_level_sets() <= 1);
}
