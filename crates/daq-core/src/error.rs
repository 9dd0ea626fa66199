//! Custom error types shared across drivers.
//!
//! This module defines the primary error type, `DaqError`, for every crate in the
//! workspace. Using the `thiserror` crate, it provides a centralized and consistent
//! way to report configuration mistakes, hardware faults and misuse of device
//! parameters.
//!
//! ## Error Hierarchy
//!
//! `DaqError` is an enum that consolidates various error sources:
//!
//! - **`Configuration`**: Values that parse correctly but are logically invalid
//!   (e.g. a negative exposure time).
//! - **`Driver`**: A structured driver error carrying a [`DriverErrorKind`] so callers
//!   can decide on a recovery strategy without parsing strings.
//! - **`Parameter*`**: Misuse of named device parameters (unknown, read-only).
//!
//! Driver crates keep their own precise error enums and convert into `DaqError`
//! at the crate boundary.

use thiserror::Error;

// =============================================================================
// Driver Errors
// =============================================================================

/// Category of a driver failure, used to pick a recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Device could not be found or opened
    Initialization,
    /// Requested feature or combination is not available
    Configuration,
    /// Device reported a fault
    Hardware,
    /// Device did not answer in time
    Timeout,
    /// Value rejected by the device or outside its limits
    InvalidParameter,
}

impl std::fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DriverErrorKind::Initialization => "initialization",
            DriverErrorKind::Configuration => "configuration",
            DriverErrorKind::Hardware => "hardware",
            DriverErrorKind::Timeout => "timeout",
            DriverErrorKind::InvalidParameter => "invalid_parameter",
        };
        write!(f, "{}", label)
    }
}

/// Driver failure with its category and a human readable message.
#[derive(Error, Debug, Clone)]
#[error("Driver '{driver_type}' {kind} error: {message}")]
pub struct DriverError {
    /// Driver type name, as registered with the factory
    pub driver_type: String,
    /// Failure category
    pub kind: DriverErrorKind,
    /// Diagnostic message including the device-reported status
    pub message: String,
}

impl DriverError {
    /// Create a driver error
    pub fn new(
        driver_type: impl Into<String>,
        kind: DriverErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            driver_type: driver_type.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Primary error type shared by all drivers.
///
/// # Error Categories
///
/// 1. **Configuration Errors** - `Configuration`, `ConfigParse`
///    - Occur when a caller asks for something the device cannot represent
///    - Recovery: Fix the requested value
///
/// 2. **Hardware Errors** - `Driver`
///    - Occur during device communication
///    - Recovery: Inspect [`DriverErrorKind`]; retry transient kinds, abort otherwise
///
/// 3. **Usage Errors** - `ParameterReadOnly`, `UnknownParameter`
///    - Indicate a programming error in the caller
///
/// # Example
///
/// ```rust
/// use daq_core::error::DaqError;
///
/// fn validate_exposure(exposure_seconds: f64) -> Result<(), DaqError> {
///     if exposure_seconds < 0.0 {
///         return Err(DaqError::Configuration(
///             "exposure_seconds must be positive".into()
///         ));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum DaqError {
    /// Configuration validation failed.
    ///
    /// Occurs when values parse correctly but fail semantic validation
    /// (e.g., negative exposure time, unmapped trigger combination).
    ///
    /// **Error Type**: Permanent - requires fixing the configuration values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Configuration could not be deserialized.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Structured driver error with category
    #[error("{0}")]
    Driver(DriverError),

    /// No parameter with the given name exists on the device.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Attempted to modify a read-only parameter.
    ///
    /// Examples include hardware-determined values like sensor temperature.
    ///
    /// **Recovery Strategy**: Check parameter metadata before attempting writes.
    #[error("Parameter is read-only")]
    ParameterReadOnly,
}

impl From<DriverError> for DaqError {
    fn from(err: DriverError) -> Self {
        DaqError::Driver(err)
    }
}
