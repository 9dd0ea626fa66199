//! Integration tests for XimeaDriver
//!
//! Tests the async driver interface including:
//! - Async driver creation
//! - Capability traits (trigger, exposure, frames, settings)
//! - Error conversion at the capability seam
//! - DriverFactory build from TOML
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p daq-driver-ximea --test driver_test
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use daq_core::capabilities::{
    DeviceCategory, ExposureControl, FrameProducer, Settable, Triggerable,
};
use daq_core::driver::{Capability, DriverFactory};
use daq_core::error::{DaqError, DriverErrorKind};
use daq_driver_ximea::{
    AcquisitionState, MockHandle, MockSdk, MockXimeaFactory, TriggerMode, TriggerType,
    XimeaConfig, XimeaDriver,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn mock_driver(config: XimeaConfig) -> (XimeaDriver<MockHandle>, MockHandle) {
    init_tracing();
    let handle = MockHandle::default();
    let probe = handle.clone();
    let driver = XimeaDriver::new_async(MockSdk::single(handle), config)
        .await
        .expect("simulated camera opens");
    (driver, probe)
}

// =============================================================================
// Mock Mode Driver Tests
// =============================================================================

mod mock_driver {
    use super::*;

    #[tokio::test]
    async fn create_driver_mock() {
        let driver = XimeaDriver::new_async(
            MockSdk::single(MockHandle::default()),
            XimeaConfig::default(),
        )
        .await;
        assert!(driver.is_ok(), "Should create driver in mock mode");
    }

    #[tokio::test]
    async fn create_driver_without_camera_fails() {
        let result =
            XimeaDriver::<MockHandle>::new_async(MockSdk::new(Vec::new()), XimeaConfig::default())
                .await;

        let err = result.err().expect("no camera connected");
        let daq = err.downcast_ref::<DaqError>().expect("DaqError at the seam");
        match daq {
            DaqError::Driver(driver) => assert_eq!(driver.kind, DriverErrorKind::Initialization),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn driver_resolution() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;
        let (width, height) = driver.resolution();

        assert_eq!(width, 2048);
        assert_eq!(height, 2048);
    }

    #[tokio::test]
    async fn driver_exposure_control() {
        let (driver, probe) = mock_driver(XimeaConfig::default()).await;

        driver.set_exposure(0.050).await.unwrap();

        let exposure = driver.get_exposure().await.unwrap();
        assert!((exposure - 0.050).abs() < 1e-9, "Exposure should be 50ms");
        assert_eq!(probe.device_exposure_us(), 50_000);
    }

    #[tokio::test]
    async fn driver_arm_trigger() {
        let (driver, probe) = mock_driver(XimeaConfig::default()).await;

        assert!(!driver.is_armed().await.unwrap(), "Should not be armed initially");

        driver.arm().await.unwrap();
        assert!(driver.is_armed().await.unwrap(), "Should be armed after arm()");

        driver.trigger().await.unwrap();
        assert_eq!(probe.call_count("set_trigger_software"), 1);

        let frame = driver.poll_frame().await.unwrap().expect("triggered frame");
        assert_eq!((frame.width, frame.height), (2048, 2048));

        driver.disarm().await.unwrap();
        assert!(!driver.is_armed().await.unwrap());
        assert_eq!(driver.acquisition_state(), AcquisitionState::Disabled);
    }

    #[tokio::test]
    async fn trigger_without_arm_fails() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;

        assert!(driver.trigger().await.is_err());
    }

    #[tokio::test]
    async fn driver_streaming() {
        let config = XimeaConfig {
            trigger_type: TriggerType::Software,
            trigger_mode: TriggerMode::Strobe,
            ..Default::default()
        };
        let (driver, _probe) = mock_driver(config).await;
        driver
            .set_roi(daq_core::core::Roi::new(0, 0, 256, 128))
            .await
            .unwrap();

        assert!(driver.poll_frame().await.unwrap().is_none(), "No frames before start");

        driver.start_stream().await.unwrap();
        assert!(driver.is_streaming());

        for _ in 0..3 {
            let frame = driver.poll_frame().await.unwrap().expect("frame");
            assert_eq!(frame.pixel_count(), 256 * 128);
        }

        driver.stop_stream().await.unwrap();
        assert!(!driver.is_streaming());
        assert!(driver.poll_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn roi_errors_carry_driver_kind() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;

        let err = driver
            .set_roi(daq_core::core::Roi::new(0, 0, 2049, 2048))
            .await
            .unwrap_err();

        match err.downcast_ref::<DaqError>() {
            Some(DaqError::Driver(driver_err)) => {
                assert_eq!(driver_err.kind, DriverErrorKind::InvalidParameter);
                assert_eq!(driver_err.driver_type, "ximea");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

// =============================================================================
// Settable
// =============================================================================

mod settable {
    use super::*;

    #[tokio::test]
    async fn value_names_include_discovered_settings() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;
        let names = driver.value_names();

        assert!(names.contains(&"roi".to_string()));
        assert!(names.contains(&"trigger".to_string()));
        assert!(names.contains(&"chip_temp".to_string()));
        assert!(!names.contains(&"hous_temp".to_string()));
    }

    #[tokio::test]
    async fn roi_as_json() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;

        driver
            .set_value("roi", json!({"x": 0, "y": 0, "width": 1001, "height": 1000}))
            .await
            .unwrap();

        let roi = driver.get_value("roi").await.unwrap();
        assert_eq!(roi, json!({"x": 0, "y": 0, "width": 1000, "height": 1000}));
    }

    #[tokio::test]
    async fn trigger_as_json() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;

        driver
            .set_value(
                "trigger",
                json!({"trigger_type": "rising_edge", "trigger_mode": "once"}),
            )
            .await
            .unwrap();
        assert_eq!(
            driver.get_value("trigger").await.unwrap(),
            json!({"trigger_type": "rising_edge", "trigger_mode": "once"})
        );

        let err = driver
            .set_value(
                "trigger",
                json!({"trigger_type": "falling_edge", "trigger_mode": "strobe"}),
            )
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn binning_and_read_only_values() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;

        driver
            .set_value("binning", json!({"horizontal": 1, "vertical": 1}))
            .await
            .unwrap();
        assert!(driver
            .set_value("binning", json!({"horizontal": 2, "vertical": 2}))
            .await
            .is_err());

        let err = driver.set_value("cycle_time", json!(0.1)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DaqError>(),
            Some(DaqError::ParameterReadOnly)
        ));

        let cycle = driver.get_value("cycle_time").await.unwrap();
        assert!((cycle.as_f64().unwrap() - 0.02).abs() < 1e-12);
        assert_eq!(
            driver.get_value("acquisition_state").await.unwrap(),
            json!("disabled")
        );
        assert_eq!(
            driver.get_value("sensor_shape").await.unwrap(),
            json!({"width": 2048, "height": 2048})
        );
    }

    #[tokio::test]
    async fn temperature_settings() {
        let (driver, _probe) = mock_driver(XimeaConfig::default()).await;

        assert_eq!(driver.get_value("chip_temp").await.unwrap(), json!(41.5));

        let err = driver.set_value("chip_temp", json!(0.0)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DaqError>(),
            Some(DaqError::ParameterReadOnly)
        ));

        let err = driver.get_value("hous_temp").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DaqError>(),
            Some(DaqError::UnknownParameter(name)) if name == "hous_temp"
        ));
    }

    #[tokio::test]
    async fn exposure_time_value() {
        let (driver, probe) = mock_driver(XimeaConfig::default()).await;

        driver.set_value("exposure_time", json!(0.002)).await.unwrap();
        assert_eq!(probe.device_exposure_us(), 2_000);

        assert!(driver
            .set_value("exposure_time", json!("fast"))
            .await
            .is_err());
    }
}

// =============================================================================
// Factory
// =============================================================================

mod factory {
    use super::*;

    #[tokio::test]
    async fn factory_builds_camera_components() {
        init_tracing();
        let factory = MockXimeaFactory;
        let config: toml::Value = toml::from_str(
            r#"
            sensor_width = 1280
            sensor_height = 1024
            exposure_s = 0.01
            "#,
        )
        .unwrap();

        factory.validate(&config).unwrap();
        let components = factory.build(config).await.unwrap();

        assert_eq!(
            components.capabilities(),
            vec![
                Capability::Triggerable,
                Capability::FrameProducer,
                Capability::ExposureControl,
                Capability::Settable,
            ]
        );
        assert_eq!(components.category, Some(DeviceCategory::Camera));
        assert_eq!(components.metadata.frame_width, Some(1280));
        assert_eq!(components.metadata.frame_height, Some(1024));

        let exposure = components.exposure_control.as_ref().unwrap();
        assert!((exposure.get_exposure().await.unwrap() - 0.01).abs() < 1e-9);

        let frames = components.frame_producer.as_ref().unwrap();
        assert_eq!(frames.resolution(), (1280, 1024));
    }

    #[tokio::test]
    async fn factory_rejects_bad_config() {
        let factory = MockXimeaFactory;
        let config: toml::Value = toml::from_str("exposure_s = -1.0").unwrap();

        assert!(factory.validate(&config).is_err());
        assert!(factory.build(config).await.is_err());
    }
}
