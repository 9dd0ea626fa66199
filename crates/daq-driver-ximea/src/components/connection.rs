//! XIMEA Connection Management
//!
//! The vendor API is reached only through two traits:
//!
//! - [`XimeaSdk`]: process-wide entry point (device enumeration, opening,
//!   debug level)
//! - [`XimeaHandle`]: one opened camera, exposing the primitive get/set calls
//!   the configuration core needs
//!
//! ## SDK Debug Level
//!
//! The vendor debug level is process-global. It is applied once by the
//! device manager through [`init_sdk`], never as a side effect of loading
//! this crate.

use crate::components::trigger::{TriggerSelector, TriggerSource};
use crate::error::XiError;
use daq_core::core::Roi;
use daq_core::data::Frame;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Set once the process-wide debug level has been applied.
static SDK_CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Geometry axis of the sensor readout window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left offset
    OffsetX,
    /// Top offset
    OffsetY,
    /// Readout width
    Width,
    /// Readout height
    Height,
}

impl Axis {
    /// Every axis
    pub const ALL: [Axis; 4] = [Axis::OffsetX, Axis::OffsetY, Axis::Width, Axis::Height];

    /// Whether this axis is a size rather than an offset
    pub const fn is_dimension(self) -> bool {
        matches!(self, Axis::Width | Axis::Height)
    }

    /// Component of `roi` along this axis
    pub const fn of(self, roi: &Roi) -> u32 {
        match self {
            Axis::OffsetX => roi.x,
            Axis::OffsetY => roi.y,
            Axis::Width => roi.width,
            Axis::Height => roi.height,
        }
    }

    /// Replace the component of `roi` along this axis
    pub fn apply(self, roi: &mut Roi, value: u32) {
        match self {
            Axis::OffsetX => roi.x = value,
            Axis::OffsetY => roi.y = value,
            Axis::Width => roi.width = value,
            Axis::Height => roi.height = value,
        }
    }
}

/// Optional on-board temperature readouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemperatureSensor {
    /// Sensor chip
    Chip,
    /// Camera housing
    Housing,
    /// Back side of the housing
    HousingBackSide,
    /// Sensor board
    SensorBoard,
}

impl TemperatureSensor {
    /// Every readout, in discovery order
    pub const ALL: [TemperatureSensor; 4] = [
        TemperatureSensor::Chip,
        TemperatureSensor::Housing,
        TemperatureSensor::HousingBackSide,
        TemperatureSensor::SensorBoard,
    ];

    /// Setting name under which the readout is exposed
    pub const fn setting_name(self) -> &'static str {
        match self {
            TemperatureSensor::Chip => "chip_temp",
            TemperatureSensor::Housing => "hous_temp",
            TemperatureSensor::HousingBackSide => "hous_back_side_temp",
            TemperatureSensor::SensorBoard => "sensor_board_temp",
        }
    }
}

/// Vendor API log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugLevel {
    /// No vendor logging
    Off,
    /// Errors only
    #[default]
    Error,
    /// Errors and warnings
    Warning,
    /// Informational messages
    Info,
    /// Everything
    Trace,
}

/// Pixel buffer as delivered by `get_image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bits per pixel
    pub bit_depth: u32,
    /// Little-endian pixel bytes
    pub data: Vec<u8>,
}

impl RawImage {
    /// Wrap the buffer as a [`Frame`] without copying
    pub fn into_frame(self) -> Frame {
        Frame::from_bytes(self.width, self.height, self.bit_depth, self.data)
    }
}

/// One opened camera.
///
/// Vendor handles serialize calls internally, so every method takes `&self`.
/// Each call either returns promptly or fails with an [`XiError`]; only
/// [`XimeaHandle::get_image`] may block, and never longer than its timeout.
pub trait XimeaHandle: Send + Sync {
    /// Current value along `axis`
    fn get(&self, axis: Axis) -> Result<u32, XiError>;

    /// Write `value` along `axis`
    ///
    /// The device validates against the current values of the other axes and
    /// rejects off-grid values with `InvalidArguments`.
    fn set(&self, axis: Axis, value: u32) -> Result<(), XiError>;

    /// Largest accepted value along `axis`, given the other axes
    fn maximum(&self, axis: Axis) -> Result<u32, XiError>;

    /// Step size of the increment grid along `axis`
    fn increment(&self, axis: Axis) -> Result<u32, XiError>;

    /// Select the trigger source
    fn set_trigger_source(&self, source: TriggerSource) -> Result<(), XiError>;

    /// Select what the trigger starts
    fn set_trigger_selector(&self, selector: TriggerSelector) -> Result<(), XiError>;

    /// Emit one software trigger pulse
    fn set_trigger_software(&self) -> Result<(), XiError>;

    /// Start acquisition
    fn start_acquisition(&self) -> Result<(), XiError>;

    /// Stop acquisition
    fn stop_acquisition(&self) -> Result<(), XiError>;

    /// Wait up to `timeout` for the next frame
    fn get_image(&self, timeout: Duration) -> Result<RawImage, XiError>;

    /// Exposure time in microseconds
    fn exposure_us(&self) -> Result<u32, XiError>;

    /// Set exposure time in microseconds
    fn set_exposure_us(&self, exposure_us: u32) -> Result<(), XiError>;

    /// Current frame rate in frames per second
    fn framerate(&self) -> Result<f64, XiError>;

    /// Read an optional temperature sensor in degrees Celsius
    fn temperature(&self, sensor: TemperatureSensor) -> Result<f64, XiError>;

    /// Whether the handle is still open
    fn is_open(&self) -> bool;

    /// Release the device
    fn close(&self) -> Result<(), XiError>;
}

/// Process-wide vendor API entry point.
pub trait XimeaSdk: Send + Sync {
    /// Handle type produced when opening a camera
    type Handle: XimeaHandle;

    /// Number of connected cameras
    fn device_count(&self) -> Result<u32, XiError>;

    /// Open the first enumerated camera
    fn open_first(&self) -> Result<Self::Handle, XiError>;

    /// Open the camera with the given serial number
    fn open_by_serial(&self, serial: &str) -> Result<Self::Handle, XiError>;

    /// Set vendor log verbosity for the whole process
    fn set_debug_level(&self, level: DebugLevel) -> Result<(), XiError>;
}

/// Apply the vendor debug level once per process.
///
/// Returns `Ok(true)` when this call applied the level and `Ok(false)` when
/// an earlier call already did. A failed attempt may be retried.
pub fn init_sdk<S: XimeaSdk>(sdk: &S, level: DebugLevel) -> Result<bool, XiError> {
    if SDK_CONFIGURED.swap(true, Ordering::SeqCst) {
        tracing::debug!("XIMEA SDK already configured, keeping existing debug level");
        return Ok(false);
    }

    if let Err(err) = sdk.set_debug_level(level) {
        SDK_CONFIGURED.store(false, Ordering::SeqCst);
        return Err(err);
    }

    tracing::info!("XIMEA SDK debug level set to {:?}", level);
    Ok(true)
}
