//! XIMEA status taxonomy and driver errors.
//!
//! Every primitive handle call fails with an [`XiError`] tagged by an
//! [`XiStatus`]. The configuration core decides locally which statuses are
//! benign (fetch timeouts, late "acquisition stopped", absent readouts,
//! off-grid geometry) and wraps everything else in [`XimeaError`] for the
//! caller.

use daq_core::core::{Roi, SensorShape};
use daq_core::error::{DaqError, DriverError, DriverErrorKind};
use std::fmt;
use thiserror::Error;

/// Driver type name reported in [`DriverError`]s
pub const DRIVER_TYPE: &str = "ximea";

/// Status codes reported by the vendor API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XiStatus {
    /// No frame arrived within the requested wait
    Timeout,
    /// Value rejected, typically off the increment grid or out of range
    InvalidArguments,
    /// Parameter not supported by this camera model
    NotSupported,
    /// Parameter known to the API but not implemented for this camera
    NotImplemented,
    /// Acquisition was stopped while waiting for a frame
    AcquisitionStopped,
    /// Parameter name unknown to the API
    UnknownParameter,
    /// Any other native status code
    Other(i32),
}

impl XiStatus {
    /// Map a native status code
    pub const fn from_code(code: i32) -> Self {
        match code {
            10 => Self::Timeout,
            11 => Self::InvalidArguments,
            12 => Self::NotSupported,
            26 => Self::NotImplemented,
            45 => Self::AcquisitionStopped,
            100 => Self::UnknownParameter,
            other => Self::Other(other),
        }
    }

    /// Native status code
    pub const fn code(self) -> i32 {
        match self {
            Self::Timeout => 10,
            Self::InvalidArguments => 11,
            Self::NotSupported => 12,
            Self::NotImplemented => 26,
            Self::AcquisitionStopped => 45,
            Self::UnknownParameter => 100,
            Self::Other(code) => code,
        }
    }

    /// True when the status means the feature is absent on this device.
    pub const fn is_absence(self) -> bool {
        matches!(self, Self::NotSupported | Self::NotImplemented)
    }
}

impl fmt::Display for XiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::InvalidArguments => write!(f, "invalid arguments"),
            Self::NotSupported => write!(f, "not supported"),
            Self::NotImplemented => write!(f, "not implemented"),
            Self::AcquisitionStopped => write!(f, "acquisition stopped"),
            Self::UnknownParameter => write!(f, "unknown parameter"),
            Self::Other(code) => write!(f, "status {}", code),
        }
    }
}

/// Failure of a single primitive handle call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{operation} failed: {status} (code {})", .status.code())]
pub struct XiError {
    /// Status reported by the device
    pub status: XiStatus,
    /// Primitive call that failed, e.g. `"set_width"`
    pub operation: &'static str,
}

impl XiError {
    /// Create a tagged error for `operation`
    pub const fn new(status: XiStatus, operation: &'static str) -> Self {
        Self { status, operation }
    }
}

/// Errors surfaced by the camera core.
#[derive(Error, Debug)]
pub enum XimeaError {
    /// The device rejected a call
    #[error(transparent)]
    Device(#[from] XiError),

    /// Requested ROI does not fit on the sensor
    #[error("ROI {roi} does not fit sensor {sensor}")]
    RoiOutOfBounds {
        /// Requested region
        roi: Roi,
        /// Sensor it was checked against
        sensor: SensorShape,
    },

    /// Feature or value outside the supported set
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Operation needs an enabled camera
    #[error("Camera is disabled")]
    Disabled,

    /// No camera connected
    #[error("No XIMEA camera connected")]
    NoDevice,

    /// More than one camera connected and no serial number configured
    #[error("{count} XIMEA cameras connected, a serial number is required")]
    AmbiguousDevice {
        /// Number of connected cameras
        count: u32,
    },

    /// No setting with this name was discovered
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// Setting has no setter
    #[error("Setting '{0}' is read-only")]
    ReadOnlySetting(String),

    /// Value parses but is logically invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Device reported an implausible value
    #[error("Instrument error: {0}")]
    Instrument(String),
}

/// Result alias for the camera core
pub type XimeaResult<T> = Result<T, XimeaError>;

impl XimeaError {
    /// Device status behind this error, if it came from the device
    pub fn status(&self) -> Option<XiStatus> {
        match self {
            Self::Device(err) => Some(err.status),
            _ => None,
        }
    }

    /// Recovery category for this error
    pub fn kind(&self) -> DriverErrorKind {
        match self {
            Self::Device(err) => match err.status {
                XiStatus::Timeout => DriverErrorKind::Timeout,
                XiStatus::InvalidArguments => DriverErrorKind::InvalidParameter,
                XiStatus::NotSupported | XiStatus::NotImplemented => {
                    DriverErrorKind::Configuration
                }
                _ => DriverErrorKind::Hardware,
            },
            Self::RoiOutOfBounds { .. } => DriverErrorKind::InvalidParameter,
            Self::UnsupportedFeature(_) | Self::Configuration(_) => {
                DriverErrorKind::Configuration
            }
            Self::NoDevice | Self::AmbiguousDevice { .. } => DriverErrorKind::Initialization,
            Self::UnknownSetting(_) | Self::ReadOnlySetting(_) => {
                DriverErrorKind::InvalidParameter
            }
            Self::Disabled | Self::Instrument(_) => DriverErrorKind::Hardware,
        }
    }
}

impl From<XimeaError> for DaqError {
    fn from(err: XimeaError) -> Self {
        match err {
            XimeaError::UnknownSetting(name) => DaqError::UnknownParameter(name),
            XimeaError::ReadOnlySetting(_) => DaqError::ParameterReadOnly,
            other => DaqError::Driver(DriverError::new(
                DRIVER_TYPE,
                other.kind(),
                other.to_string(),
            )),
        }
    }
}
