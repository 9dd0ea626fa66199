//! Driver factories and the capability bag they return.
//!
//! A driver crate exposes one [`DriverFactory`] per device type. The device
//! manager hands it the device's TOML table; the factory checks it, opens the
//! device and returns [`DeviceComponents`], one trait object per capability
//! the device has.
//!
//! ```rust,ignore
//! let config: toml::Value = toml::from_str("exposure_s = 0.01")?;
//! factory.validate(&config)?;
//! let components = factory.build(config).await?;
//! if let Some(frames) = &components.frame_producer {
//!     frames.start_stream().await?;
//! }
//! ```

use crate::capabilities::{
    DeviceCategory, ExposureControl, FrameProducer, Settable, Triggerable,
};
use anyhow::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Capability a device can provide, one per trait in [`crate::capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// [`Triggerable`]
    Triggerable,
    /// [`FrameProducer`]
    FrameProducer,
    /// [`ExposureControl`]
    ExposureControl,
    /// [`Settable`]
    Settable,
}

impl Capability {
    /// Every capability, in reporting order
    pub const ALL: [Capability; 4] = [
        Capability::Triggerable,
        Capability::FrameProducer,
        Capability::ExposureControl,
        Capability::Settable,
    ];

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Triggerable => "Triggerable",
            Self::FrameProducer => "Frame Producer",
            Self::ExposureControl => "Exposure Control",
            Self::Settable => "Settable",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait objects for one opened device.
///
/// A driver usually builds a single `Arc` and hands out clones of it for
/// each capability it implements.
#[derive(Default)]
pub struct DeviceComponents {
    /// Device category
    pub category: Option<DeviceCategory>,
    /// Arm/trigger control
    pub triggerable: Option<Arc<dyn Triggerable>>,
    /// Frame streaming
    pub frame_producer: Option<Arc<dyn FrameProducer>>,
    /// Exposure time
    pub exposure_control: Option<Arc<dyn ExposureControl>>,
    /// Named values
    pub settable: Option<Arc<dyn Settable>>,
    /// Static facts about the device
    pub metadata: DeviceMetadata,
}

impl DeviceComponents {
    /// Empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `capability` is present
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Triggerable => self.triggerable.is_some(),
            Capability::FrameProducer => self.frame_producer.is_some(),
            Capability::ExposureControl => self.exposure_control.is_some(),
            Capability::Settable => self.settable.is_some(),
        }
    }

    /// Present capabilities, in [`Capability::ALL`] order
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|&capability| self.has(capability))
            .collect()
    }

    /// Set the category
    pub fn with_category(mut self, category: DeviceCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Add trigger control
    pub fn with_triggerable(mut self, triggerable: Arc<dyn Triggerable>) -> Self {
        self.triggerable = Some(triggerable);
        self
    }

    /// Add frame streaming
    pub fn with_frame_producer(mut self, producer: Arc<dyn FrameProducer>) -> Self {
        self.frame_producer = Some(producer);
        self
    }

    /// Add exposure control
    pub fn with_exposure_control(mut self, exposure: Arc<dyn ExposureControl>) -> Self {
        self.exposure_control = Some(exposure);
        self
    }

    /// Add named values
    pub fn with_settable(mut self, settable: Arc<dyn Settable>) -> Self {
        self.settable = Some(settable);
        self
    }

    /// Set the metadata
    pub fn with_metadata(mut self, metadata: DeviceMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Facts about a device known once it is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceMetadata {
    /// Full sensor width in pixels
    pub frame_width: Option<u32>,
    /// Full sensor height in pixels
    pub frame_height: Option<u32>,
    /// Bits per delivered pixel
    pub bits_per_pixel: Option<u32>,
}

/// Builds devices of one type from their configuration table.
pub trait DriverFactory: Send + Sync + 'static {
    /// Value of the `type` key selecting this factory
    fn driver_type(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Capabilities every device built by this factory has
    fn capabilities(&self) -> &'static [Capability] {
        &[]
    }

    /// Check `config` without touching hardware.
    fn validate(&self, config: &toml::Value) -> Result<()>;

    /// Open the device described by `config`.
    fn build(&self, config: toml::Value) -> BoxFuture<'static, Result<DeviceComponents>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_names() {
        assert_eq!(Capability::FrameProducer.to_string(), "Frame Producer");
        assert_eq!(
            serde_json::to_string(&Capability::ExposureControl).unwrap(),
            "\"exposure_control\""
        );
        let parsed: Capability = serde_json::from_str("\"settable\"").unwrap();
        assert_eq!(parsed, Capability::Settable);
    }

    #[test]
    fn test_empty_components() {
        let components = DeviceComponents::new();
        assert!(components.capabilities().is_empty());
        assert!(!components.has(Capability::Triggerable));
        assert_eq!(components.category, None);
    }

    #[test]
    fn test_components_builder() {
        let components = DeviceComponents::new()
            .with_category(DeviceCategory::Camera)
            .with_metadata(DeviceMetadata {
                frame_width: Some(1280),
                frame_height: Some(1024),
                bits_per_pixel: Some(8),
            });

        assert_eq!(components.category, Some(DeviceCategory::Camera));
        assert_eq!(components.metadata.frame_width, Some(1280));
        assert_eq!(components.metadata.bits_per_pixel, Some(8));
    }
}
