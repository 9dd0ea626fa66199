//! XIMEA camera core.
//!
//! [`XimeaCamera`] owns an opened handle and the software mirror of the
//! device state (ROI, active trigger, acquisition flags). Configuration
//! lives in the `components` modules; this module covers opening, shutdown
//! and the simple exposure/binning calls.

use crate::components::connection::{Axis, XimeaHandle, XimeaSdk};
use crate::components::settings::{discover_settings, SettingsRegistry};
use crate::components::trigger::TriggerMapping;
use crate::config::XimeaConfig;
use crate::error::{XimeaError, XimeaResult};
use daq_core::core::{Binning, Roi, SensorShape};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// One opened XIMEA camera.
///
/// Configuration calls are expected to be serialized by the caller. The
/// acquiring flag is atomic so a polling fetch can run alongside `abort()`.
#[derive(Debug)]
pub struct XimeaCamera<H: XimeaHandle> {
    pub(crate) handle: H,
    pub(crate) sensor: SensorShape,
    pub(crate) enabled: AtomicBool,
    pub(crate) acquiring: AtomicBool,
    pub(crate) roi: Mutex<Roi>,
    /// `None` until the first trigger is pushed
    pub(crate) trigger: Mutex<Option<TriggerMapping>>,
    pub(crate) settings: SettingsRegistry<H>,
}

impl<H: XimeaHandle> XimeaCamera<H> {
    /// Select and open a camera, then apply `config`.
    ///
    /// With a serial number the camera is opened by serial. Otherwise
    /// exactly one camera must be connected.
    pub fn open<S>(sdk: &S, config: &XimeaConfig) -> XimeaResult<Self>
    where
        S: XimeaSdk<Handle = H>,
    {
        config.validate()?;

        let handle = match config.serial_number.as_deref() {
            Some(serial) => {
                tracing::info!("Opening XIMEA camera with serial number {}", serial);
                sdk.open_by_serial(serial)?
            }
            None => match sdk.device_count()? {
                0 => return Err(XimeaError::NoDevice),
                1 => {
                    tracing::info!("Opening the only connected XIMEA camera");
                    sdk.open_first()?
                }
                count => return Err(XimeaError::AmbiguousDevice { count }),
            },
        };

        Self::from_handle(handle, config)
    }

    /// Take ownership of an opened handle and apply `config`.
    ///
    /// The handle is closed again if configuration fails.
    pub fn from_handle(handle: H, config: &XimeaConfig) -> XimeaResult<Self> {
        let sensor = match Self::discover_sensor(&handle) {
            Ok(sensor) => sensor,
            Err(err) => {
                close_quietly(&handle);
                return Err(err);
            }
        };
        let settings = match discover_settings(&handle) {
            Ok(settings) => settings,
            Err(err) => {
                close_quietly(&handle);
                return Err(err);
            }
        };

        let camera = Self {
            handle,
            sensor,
            enabled: AtomicBool::new(false),
            acquiring: AtomicBool::new(false),
            roi: Mutex::new(sensor.full_roi()),
            trigger: Mutex::new(None),
            settings,
        };

        if let Err(err) = camera.configure(config) {
            if let Err(shutdown_err) = camera.shutdown() {
                tracing::warn!("Shutdown after failed configuration: {}", shutdown_err);
            }
            return Err(err);
        }

        tracing::info!("XIMEA camera ready, sensor {}", sensor);
        Ok(camera)
    }

    /// The maxima depend on the geometry the device holds, so the window is
    /// first moved to the origin and grown to its largest size.
    fn discover_sensor(handle: &H) -> XimeaResult<SensorShape> {
        handle.set(Axis::OffsetX, 0)?;
        handle.set(Axis::OffsetY, 0)?;
        handle.set(Axis::Width, handle.maximum(Axis::Width)?)?;
        handle.set(Axis::Height, handle.maximum(Axis::Height)?)?;

        let width = handle.maximum(Axis::Width)? + handle.maximum(Axis::OffsetX)?;
        let height = handle.maximum(Axis::Height)? + handle.maximum(Axis::OffsetY)?;
        Ok(SensorShape::new(width, height))
    }

    fn configure(&self, config: &XimeaConfig) -> XimeaResult<()> {
        self.set_roi(self.sensor.full_roi())?;
        self.set_trigger(config.trigger_type, config.trigger_mode)?;
        if let Some(exposure) = config.exposure_s {
            self.set_exposure_time(exposure)?;
        }
        Ok(())
    }

    /// Stop acquisition and close the handle. Safe to call repeatedly.
    pub fn shutdown(&self) -> XimeaResult<()> {
        if self.is_acquiring() {
            self.abort()?;
        }
        self.enabled.store(false, Ordering::SeqCst);

        if self.handle.is_open() {
            self.handle.close()?;
            tracing::info!("XIMEA camera closed");
        }
        Ok(())
    }

    /// Full sensor size
    pub fn sensor_shape(&self) -> SensorShape {
        self.sensor
    }

    /// Underlying device handle
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Optional settings discovered at open
    pub fn settings(&self) -> &SettingsRegistry<H> {
        &self.settings
    }

    /// Read a discovered setting
    pub fn read_setting(&self, name: &str) -> XimeaResult<Value> {
        self.settings.read(name, &self.handle)
    }

    /// Write a discovered setting
    pub fn write_setting(&self, name: &str, value: Value) -> XimeaResult<()> {
        self.settings.write(name, &self.handle, value)
    }

    /// Set the exposure time in seconds, rounded to whole microseconds.
    pub fn set_exposure_time(&self, seconds: f64) -> XimeaResult<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(XimeaError::Configuration(format!(
                "exposure time must be a non-negative number of seconds, got {}",
                seconds
            )));
        }
        let micros = (seconds * 1e6).round();
        if micros > f64::from(u32::MAX) {
            return Err(XimeaError::Configuration(format!(
                "exposure time {} s is out of range",
                seconds
            )));
        }

        // Range checked above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let micros = micros as u32;
        self.handle.set_exposure_us(micros)?;
        tracing::debug!("Exposure set to {} us", micros);
        Ok(())
    }

    /// Exposure time in seconds
    pub fn exposure_time(&self) -> XimeaResult<f64> {
        Ok(f64::from(self.handle.exposure_us()?) * 1e-6)
    }

    /// Time between frames in seconds, `1 / framerate`
    pub fn cycle_time(&self) -> XimeaResult<f64> {
        let framerate = self.handle.framerate()?;
        if !(framerate.is_finite() && framerate > 0.0) {
            return Err(XimeaError::Instrument(format!(
                "device reported frame rate {}",
                framerate
            )));
        }
        Ok(1.0 / framerate)
    }

    /// Active binning; only identity is supported
    pub fn binning(&self) -> Binning {
        Binning::IDENTITY
    }

    /// Set binning; anything but identity is unsupported
    pub fn set_binning(&self, binning: Binning) -> XimeaResult<()> {
        if binning == Binning::IDENTITY {
            return Ok(());
        }
        Err(XimeaError::UnsupportedFeature(format!("binning {}", binning)))
    }
}

impl<H: XimeaHandle> Drop for XimeaCamera<H> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::error!("Failed to shut down XIMEA camera: {}", err);
        }
    }
}

fn close_quietly<H: XimeaHandle>(handle: &H) {
    if let Err(err) = handle.close() {
        tracing::warn!("Failed to close XIMEA handle: {}", err);
    }
}
