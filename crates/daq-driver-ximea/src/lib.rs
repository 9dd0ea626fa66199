//! XIMEA Camera Driver (Componentized)
//!
//! Configuration and acquisition-state core for XIMEA cameras:
//! - Connection: vendor API traits, device selection, SDK setup
//! - Acquisition: enable/disable/abort and the polling fetch
//! - ROI: negotiation against the increment grid with rollback
//! - Trigger: fixed (type, mode) table
//! - Settings: probed optional readouts
//!
//! [`XimeaCamera`] is synchronous. [`XimeaDriver`] wraps it for the async
//! capability traits, running every device call on the blocking pool.

pub mod camera;
pub mod components;
pub mod config;
pub mod error;
#[cfg(feature = "mock")]
pub mod factory;

use anyhow::Result;
use async_trait::async_trait;
use daq_core::capabilities::{ExposureControl, Frame, FrameProducer, Settable, Triggerable};
use daq_core::core::{Binning, Roi, SensorShape};
use daq_core::error::DaqError;
use serde_json::Value;
use std::sync::Arc;

pub use crate::camera::XimeaCamera;
pub use crate::components::acquisition::{AcquisitionState, FETCH_TIMEOUT};
pub use crate::components::connection::{
    init_sdk, Axis, DebugLevel, RawImage, TemperatureSensor, XimeaHandle, XimeaSdk,
};
pub use crate::components::settings::{Setting, SettingType, SettingsRegistry};
pub use crate::components::trigger::{
    TriggerMode, TriggerSelector, TriggerSource, TriggerSpec, TriggerType,
};
pub use crate::config::XimeaConfig;
pub use crate::error::{XiError, XiStatus, XimeaError, XimeaResult};
#[cfg(feature = "mock")]
pub use crate::components::mock::{MockFault, MockHandle, MockSdk};
#[cfg(feature = "mock")]
pub use crate::factory::{MockXimeaConfig, MockXimeaFactory};

/// Values exposed through [`Settable`] besides the discovered settings.
const CAMERA_VALUES: [&str; 7] = [
    "roi",
    "binning",
    "trigger",
    "exposure_time",
    "cycle_time",
    "sensor_shape",
    "acquisition_state",
];

/// Async driver for one XIMEA camera.
///
/// The camera is shut down when the last reference to it is dropped.
pub struct XimeaDriver<H: XimeaHandle + 'static> {
    camera: Arc<XimeaCamera<H>>,
}

impl<H: XimeaHandle + 'static> XimeaDriver<H> {
    /// Open a camera through `sdk` and apply `config`.
    pub async fn new_async<S>(sdk: S, config: XimeaConfig) -> Result<Self>
    where
        S: XimeaSdk<Handle = H> + 'static,
    {
        tracing::info!(
            "XimeaDriver::new_async called, serial number: {:?}",
            config.serial_number
        );

        let camera = tokio::task::spawn_blocking(move || XimeaCamera::open(&sdk, &config))
            .await?
            .map_err(DaqError::from)?;

        Ok(Self::from_camera(camera))
    }

    /// Wrap an already opened camera
    pub fn from_camera(camera: XimeaCamera<H>) -> Self {
        Self {
            camera: Arc::new(camera),
        }
    }

    /// Underlying camera core
    pub fn camera(&self) -> &Arc<XimeaCamera<H>> {
        &self.camera
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&XimeaCamera<H>) -> XimeaResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let camera = Arc::clone(&self.camera);
        let value = tokio::task::spawn_blocking(move || f(&camera))
            .await?
            .map_err(DaqError::from)?;
        Ok(value)
    }

    /// Apply an ROI, returning the one actually applied
    pub async fn set_roi(&self, roi: Roi) -> Result<Roi> {
        self.run_blocking(move |camera| camera.set_roi(roi)).await
    }

    /// Current ROI
    pub async fn roi(&self) -> Result<Roi> {
        self.run_blocking(|camera| camera.roi()).await
    }

    /// Configure the trigger
    pub async fn set_trigger(&self, trigger_type: TriggerType, trigger_mode: TriggerMode) -> Result<()> {
        self.run_blocking(move |camera| camera.set_trigger(trigger_type, trigger_mode))
            .await
    }

    /// Active trigger configuration
    pub fn trigger_spec(&self) -> Option<TriggerSpec> {
        self.camera.trigger_spec()
    }

    /// Set binning; only identity is supported
    pub fn set_binning(&self, binning: Binning) -> Result<()> {
        self.camera
            .set_binning(binning)
            .map_err(DaqError::from)?;
        Ok(())
    }

    /// Time between frames in seconds
    pub async fn cycle_time(&self) -> Result<f64> {
        self.run_blocking(|camera| camera.cycle_time()).await
    }

    /// Current acquisition state
    pub fn acquisition_state(&self) -> AcquisitionState {
        self.camera.acquisition_state()
    }

    /// Stop acquisition and close the device
    pub async fn shutdown(&self) -> Result<()> {
        self.run_blocking(|camera| camera.shutdown()).await
    }
}

#[async_trait]
impl<H: XimeaHandle + 'static> Triggerable for XimeaDriver<H> {
    async fn arm(&self) -> Result<()> {
        self.run_blocking(|camera| camera.enable()).await
    }

    async fn trigger(&self) -> Result<()> {
        self.run_blocking(|camera| camera.trigger()).await
    }

    async fn disarm(&self) -> Result<()> {
        self.run_blocking(|camera| camera.disable()).await
    }

    async fn is_armed(&self) -> Result<bool> {
        Ok(self.camera.is_acquiring())
    }
}

#[async_trait]
impl<H: XimeaHandle + 'static> ExposureControl for XimeaDriver<H> {
    async fn set_exposure(&self, seconds: f64) -> Result<()> {
        self.run_blocking(move |camera| camera.set_exposure_time(seconds))
            .await
    }

    async fn get_exposure(&self) -> Result<f64> {
        self.run_blocking(|camera| camera.exposure_time()).await
    }
}

#[async_trait]
impl<H: XimeaHandle + 'static> FrameProducer for XimeaDriver<H> {
    async fn start_stream(&self) -> Result<()> {
        self.run_blocking(|camera| camera.enable()).await
    }

    async fn stop_stream(&self) -> Result<()> {
        self.run_blocking(|camera| camera.disable()).await
    }

    fn is_streaming(&self) -> bool {
        self.camera.is_acquiring()
    }

    fn resolution(&self) -> (u32, u32) {
        let SensorShape { width, height } = self.camera.sensor_shape();
        (width, height)
    }

    async fn poll_frame(&self) -> Result<Option<Frame>> {
        self.run_blocking(|camera| camera.fetch_frame()).await
    }
}

#[async_trait]
impl<H: XimeaHandle + 'static> Settable for XimeaDriver<H> {
    async fn set_value(&self, name: &str, value: Value) -> Result<()> {
        match name {
            "roi" => {
                let roi: Roi = serde_json::from_value(value)?;
                self.set_roi(roi).await?;
            }
            "binning" => {
                let binning: Binning = serde_json::from_value(value)?;
                self.set_binning(binning)?;
            }
            "trigger" => {
                let spec: TriggerSpec = serde_json::from_value(value)?;
                self.set_trigger(spec.trigger_type, spec.trigger_mode)
                    .await?;
            }
            "exposure_time" => {
                let seconds = value.as_f64().ok_or_else(|| {
                    DaqError::Configuration(format!("exposure_time must be a number, got {}", value))
                })?;
                self.set_exposure(seconds).await?;
            }
            "cycle_time" | "sensor_shape" | "acquisition_state" => {
                return Err(DaqError::ParameterReadOnly.into());
            }
            other => {
                let name = other.to_string();
                self.run_blocking(move |camera| camera.write_setting(&name, value))
                    .await?;
            }
        }
        Ok(())
    }

    async fn get_value(&self, name: &str) -> Result<Value> {
        let value = match name {
            "roi" => serde_json::to_value(self.roi().await?)?,
            "binning" => serde_json::to_value(self.camera.binning())?,
            "trigger" => serde_json::to_value(self.trigger_spec())?,
            "exposure_time" => Value::from(self.get_exposure().await?),
            "cycle_time" => Value::from(self.cycle_time().await?),
            "sensor_shape" => serde_json::to_value(self.camera.sensor_shape())?,
            "acquisition_state" => serde_json::to_value(self.acquisition_state())?,
            other => {
                let name = other.to_string();
                self.run_blocking(move |camera| camera.read_setting(&name))
                    .await?
            }
        };
        Ok(value)
    }

    fn value_names(&self) -> Vec<String> {
        let mut names: Vec<String> = CAMERA_VALUES.iter().map(|n| n.to_string()).collect();
        names.extend(
            self.camera
                .settings()
                .names()
                .into_iter()
                .map(str::to_string),
        );
        names
    }
}
