//! DriverFactory for the simulated XIMEA camera.

use crate::components::connection::init_sdk;
use crate::components::mock::{MockHandle, MockSdk};
use crate::config::XimeaConfig;
use crate::XimeaDriver;
use anyhow::Result;
use daq_core::capabilities::DeviceCategory;
use daq_core::core::SensorShape;
use daq_core::driver::{Capability, DeviceComponents, DeviceMetadata, DriverFactory};
use daq_core::error::DaqError;
use futures::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;

// =============================================================================
// MockXimeaFactory - DriverFactory implementation
// =============================================================================

/// Configuration for the simulated XIMEA camera
#[derive(Debug, Clone, Deserialize)]
pub struct MockXimeaConfig {
    /// Sensor width in pixels (default: 2048)
    #[serde(default = "default_sensor_size")]
    pub sensor_width: u32,

    /// Sensor height in pixels (default: 2048)
    #[serde(default = "default_sensor_size")]
    pub sensor_height: u32,

    /// Camera options, as for real hardware
    #[serde(flatten)]
    pub camera: XimeaConfig,
}

fn default_sensor_size() -> u32 {
    2048
}

impl Default for MockXimeaConfig {
    fn default() -> Self {
        Self {
            sensor_width: 2048,
            sensor_height: 2048,
            camera: XimeaConfig::default(),
        }
    }
}

impl MockXimeaConfig {
    fn check(&self) -> Result<()> {
        if self.sensor_width == 0 || self.sensor_height == 0 {
            anyhow::bail!("Sensor size must be non-zero");
        }
        self.camera.validate().map_err(DaqError::from)?;
        Ok(())
    }
}

/// Factory for simulated XIMEA cameras.
pub struct MockXimeaFactory;

/// Static capabilities for the simulated camera
static MOCK_XIMEA_CAPABILITIES: &[Capability] = &[
    Capability::FrameProducer,
    Capability::Triggerable,
    Capability::ExposureControl,
    Capability::Settable,
];

impl DriverFactory for MockXimeaFactory {
    fn driver_type(&self) -> &'static str {
        "ximea_mock"
    }

    fn name(&self) -> &'static str {
        "XIMEA Camera (simulated)"
    }

    fn capabilities(&self) -> &'static [Capability] {
        MOCK_XIMEA_CAPABILITIES
    }

    fn validate(&self, config: &toml::Value) -> Result<()> {
        let cfg: MockXimeaConfig = config.clone().try_into().map_err(DaqError::from)?;
        cfg.check()
    }

    fn build(&self, config: toml::Value) -> BoxFuture<'static, Result<DeviceComponents>> {
        Box::pin(async move {
            let cfg: MockXimeaConfig = config.try_into().map_err(DaqError::from)?;
            cfg.check()?;

            let handle = MockHandle::new(SensorShape::new(cfg.sensor_width, cfg.sensor_height));
            let serial = cfg.camera.serial_number.clone().unwrap_or_else(|| "MOCK0001".into());
            let sdk = MockSdk::new(vec![(serial, handle)]);
            init_sdk(&sdk, cfg.camera.debug_level)?;

            let camera = Arc::new(XimeaDriver::new_async(sdk, cfg.camera).await?);
            let shape = camera.camera().sensor_shape();

            Ok(DeviceComponents::new()
                .with_category(DeviceCategory::Camera)
                .with_triggerable(camera.clone())
                .with_frame_producer(camera.clone())
                .with_exposure_control(camera.clone())
                .with_settable(camera)
                .with_metadata(DeviceMetadata {
                    frame_width: Some(shape.width),
                    frame_height: Some(shape.height),
                    bits_per_pixel: Some(8),
                }))
        })
    }
}
