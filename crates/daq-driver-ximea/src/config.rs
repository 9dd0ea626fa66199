//! Camera configuration, deserialized from a `[devices.*]` TOML table.

use crate::components::connection::DebugLevel;
use crate::components::trigger::{lookup, TriggerMode, TriggerSpec, TriggerType};
use crate::error::{XimeaError, XimeaResult};
use serde::{Deserialize, Serialize};

/// Options applied when a camera is opened.
///
/// ```toml
/// serial_number = "32052251"
/// trigger_type = "rising_edge"
/// trigger_mode = "once"
/// exposure_s = 0.01
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XimeaConfig {
    /// Serial number; required when more than one camera is connected
    pub serial_number: Option<String>,
    /// Initial trigger type
    pub trigger_type: TriggerType,
    /// Initial trigger mode
    pub trigger_mode: TriggerMode,
    /// Initial exposure time in seconds
    pub exposure_s: Option<f64>,
    /// Vendor API log verbosity
    pub debug_level: DebugLevel,
}

impl Default for XimeaConfig {
    fn default() -> Self {
        Self {
            serial_number: None,
            trigger_type: TriggerType::Software,
            trigger_mode: TriggerMode::Once,
            exposure_s: None,
            debug_level: DebugLevel::Error,
        }
    }
}

impl XimeaConfig {
    /// Initial trigger as a spec
    pub fn trigger(&self) -> TriggerSpec {
        TriggerSpec::new(self.trigger_type, self.trigger_mode)
    }

    /// Reject unmapped triggers and non-positive exposure.
    pub fn validate(&self) -> XimeaResult<()> {
        if lookup(self.trigger()).is_none() {
            return Err(XimeaError::Configuration(format!(
                "unsupported trigger {}",
                self.trigger()
            )));
        }
        if let Some(exposure) = self.exposure_s {
            if !exposure.is_finite() || exposure <= 0.0 {
                return Err(XimeaError::Configuration(format!(
                    "exposure_s must be positive, got {}",
                    exposure
                )));
            }
        }
        if self.serial_number.as_deref() == Some("") {
            return Err(XimeaError::Configuration(
                "serial_number must not be empty".into(),
            ));
        }
        Ok(())
    }
}
