//! Atomic Hardware Capabilities
//!
//! This module defines fine-grained capability traits that hardware devices can implement.
//! Instead of a monolithic `Camera` trait, devices implement the specific capabilities
//! they actually support:
//!
//! - A camera might implement: `Triggerable + ExposureControl + FrameProducer + Settable`
//! - A detector might implement: `Triggerable + Settable`
//!
//! # Design Philosophy
//!
//! Each capability trait:
//! - Is async (uses #[async_trait])
//! - Is thread-safe (requires Send + Sync)
//! - Uses anyhow::Result for errors
//! - Focuses on ONE thing
//!
//! # Example
//!
//! ```rust,ignore
//! async fn triggered_acquisition<T>(device: &T) -> Result<Option<Frame>>
//! where
//!     T: Triggerable + ExposureControl + FrameProducer
//! {
//!     device.set_exposure(0.1).await?;
//!     device.arm().await?;
//!     device.trigger().await?;
//!     device.poll_frame().await
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::data::Frame;

// =============================================================================
// Device Category
// =============================================================================

/// Device category for classification and UI grouping
///
/// Drivers should explicitly set their category in
/// [`crate::driver::DeviceComponents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    /// Cameras and imaging devices (FrameProducer)
    Camera,
    /// Devices that don't fit other categories
    #[default]
    Other,
}

impl DeviceCategory {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Camera => "Cameras",
            Self::Other => "Other",
        }
    }
}

// =============================================================================
// Capability Traits
// =============================================================================

/// Capability: External Triggering
///
/// Devices that can be armed and triggered (cameras, detectors, pulse generators).
///
/// # Contract
/// - `arm()` prepares device for trigger (may configure hardware buffers)
/// - `trigger()` initiates acquisition/output
/// - Calling `trigger()` on unarmed device should return Err
#[async_trait]
pub trait Triggerable: Send + Sync {
    /// Arm device for trigger
    ///
    /// # Returns
    /// - Ok(()) if armed successfully
    /// - Err if device is busy or in error state
    async fn arm(&self) -> Result<()>;

    /// Send software trigger
    ///
    /// # Returns
    /// - Ok(()) if trigger accepted
    /// - Err if not armed, the trigger source is not software, or hardware error
    async fn trigger(&self) -> Result<()>;

    /// Disarm device
    ///
    /// # Default Implementation
    /// Returns an error indicating disarm is not supported.
    async fn disarm(&self) -> Result<()> {
        anyhow::bail!("Disarm not supported by this device")
    }

    /// Check if device is currently armed
    ///
    /// # Default Implementation
    /// Returns an error indicating state query is not supported.
    async fn is_armed(&self) -> Result<bool> {
        anyhow::bail!("Armed state query not supported by this device")
    }
}

/// Capability: Exposure Time Control
///
/// Devices with configurable integration time (cameras, spectrometers, photodetectors).
///
/// # Contract
/// - Exposure is in seconds (not milliseconds)
/// - Setting exposure does not start acquisition
/// - Exposure applies to next acquisition
#[async_trait]
pub trait ExposureControl: Send + Sync {
    /// Set exposure/integration time
    ///
    /// # Returns
    /// - Ok(()) if exposure set successfully
    /// - Err if value is out of hardware range
    async fn set_exposure(&self, seconds: f64) -> Result<()>;

    /// Get current exposure setting in seconds
    async fn get_exposure(&self) -> Result<f64>;
}

/// Capability: Frame Production
///
/// Devices that produce image frames. Frames are polled, not pushed: each
/// `poll_frame()` blocks for at most a short, driver-defined timeout.
///
/// # Contract
/// - `poll_frame()` returns `Ok(None)` when no frame is ready yet or the
///   device is not streaming; this is not an error
/// - `stop_stream()` on a stopped device is a no-op
#[async_trait]
pub trait FrameProducer: Send + Sync {
    /// Start continuous frame acquisition
    async fn start_stream(&self) -> Result<()>;

    /// Stop frame acquisition
    async fn stop_stream(&self) -> Result<()>;

    /// Whether the device is currently acquiring
    fn is_streaming(&self) -> bool;

    /// Get sensor resolution (width, height) in pixels
    ///
    /// This is immutable - ROI changes do not affect it.
    fn resolution(&self) -> (u32, u32);

    /// Wait briefly for the next frame
    async fn poll_frame(&self) -> Result<Option<Frame>>;
}

/// Capability: Settable (Configurable Parameters)
///
/// Devices that have parameters which can be set and optionally queried.
///
/// # Contract
/// - Values are represented as `serde_json::Value` to allow flexibility (f64, i64, bool, string, enum).
/// - Methods take `&self` (not `&mut self`) to allow use with `Arc<dyn Settable>`.
///   Implementations should use interior mutability (e.g., `Mutex`) for state changes.
#[async_trait]
pub trait Settable: Send + Sync {
    /// Set a named parameter to a new value.
    async fn set_value(&self, name: &str, value: serde_json::Value) -> Result<()>;

    /// Get the current value of a named parameter.
    async fn get_value(&self, name: &str) -> Result<serde_json::Value> {
        anyhow::bail!("Get value for '{}' not supported by this device", name)
    }

    /// Names of all parameters this device exposes.
    fn value_names(&self) -> Vec<String> {
        Vec::new()
    }
}
