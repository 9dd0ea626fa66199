//! Trigger configuration.
//!
//! An abstract [`TriggerSpec`] (type, mode) maps to the native
//! (source, selector) pair through a fixed table. Keys are unique; the
//! table is checked at compile time.

use crate::camera::XimeaCamera;
use crate::components::connection::XimeaHandle;
use crate::error::{XiError, XimeaError, XimeaResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of the acquisition start signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Software command
    #[default]
    Software,
    /// Rising edge on the trigger input
    RisingEdge,
    /// Falling edge on the trigger input
    FallingEdge,
}

/// How triggers produce frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// One frame per trigger
    #[default]
    Once,
    /// Free-running, frames follow the camera's own clock
    Strobe,
}

/// Native trigger source (`XI_TRG_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// Free run
    Off,
    /// Rising edge on the input line
    EdgeRising,
    /// Falling edge on the input line
    EdgeFalling,
    /// `trg_software` pulse
    Software,
}

impl TriggerSource {
    /// Native code
    pub const fn code(self) -> i32 {
        match self {
            TriggerSource::Off => 0,
            TriggerSource::EdgeRising => 1,
            TriggerSource::EdgeFalling => 2,
            TriggerSource::Software => 3,
        }
    }
}

/// Native trigger selector (`XI_TRG_SEL_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSelector {
    /// Trigger starts a frame
    FrameStart,
    /// Trigger level defines the exposure
    ExposureActive,
}

impl TriggerSelector {
    /// Native code
    pub const fn code(self) -> i32 {
        match self {
            TriggerSelector::FrameStart => 0,
            TriggerSelector::ExposureActive => 1,
        }
    }
}

/// Abstract trigger configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// Trigger origin
    pub trigger_type: TriggerType,
    /// Trigger behaviour
    pub trigger_mode: TriggerMode,
}

impl TriggerSpec {
    /// Create a spec
    pub const fn new(trigger_type: TriggerType, trigger_mode: TriggerMode) -> Self {
        Self {
            trigger_type,
            trigger_mode,
        }
    }

    /// Whether `trigger()` may send a software pulse for this spec
    pub fn is_software_once(&self) -> bool {
        self.trigger_type == TriggerType::Software && self.trigger_mode == TriggerMode::Once
    }
}

impl fmt::Display for TriggerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.trigger_type, self.trigger_mode)
    }
}

/// Entry of the trigger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerMapping {
    /// Abstract key
    pub spec: TriggerSpec,
    /// Native source
    pub source: TriggerSource,
    /// Native selector
    pub selector: TriggerSelector,
}

impl TriggerMapping {
    const fn new(
        trigger_type: TriggerType,
        trigger_mode: TriggerMode,
        source: TriggerSource,
        selector: TriggerSelector,
    ) -> Self {
        Self {
            spec: TriggerSpec::new(trigger_type, trigger_mode),
            source,
            selector,
        }
    }

    /// Native (source, selector) pair
    pub fn native(&self) -> (TriggerSource, TriggerSelector) {
        (self.source, self.selector)
    }
}

/// Supported trigger combinations.
pub const TRIGGER_TABLE: &[TriggerMapping] = &[
    TriggerMapping::new(
        TriggerType::Software,
        TriggerMode::Strobe,
        TriggerSource::Off,
        TriggerSelector::FrameStart,
    ),
    TriggerMapping::new(
        TriggerType::Software,
        TriggerMode::Once,
        TriggerSource::Software,
        TriggerSelector::FrameStart,
    ),
    TriggerMapping::new(
        TriggerType::RisingEdge,
        TriggerMode::Once,
        TriggerSource::EdgeRising,
        TriggerSelector::FrameStart,
    ),
    TriggerMapping::new(
        TriggerType::FallingEdge,
        TriggerMode::Once,
        TriggerSource::EdgeFalling,
        TriggerSelector::FrameStart,
    ),
];

const fn has_duplicate_keys(table: &[TriggerMapping]) -> bool {
    let mut i = 0;
    while i < table.len() {
        let mut j = i + 1;
        while j < table.len() {
            let a = table[i].spec;
            let b = table[j].spec;
            if a.trigger_type as u8 == b.trigger_type as u8
                && a.trigger_mode as u8 == b.trigger_mode as u8
            {
                return true;
            }
            j += 1;
        }
        i += 1;
    }
    false
}

const _: () = assert!(
    !has_duplicate_keys(TRIGGER_TABLE),
    "trigger table has duplicate (type, mode) keys"
);

/// Look up the native mapping for `spec`
pub fn lookup(spec: TriggerSpec) -> Option<&'static TriggerMapping> {
    TRIGGER_TABLE.iter().find(|m| m.spec == spec)
}

impl<H: XimeaHandle> XimeaCamera<H> {
    /// Configure the trigger.
    ///
    /// Unmapped combinations fail without touching the device. The native
    /// pair is only pushed when it differs from the active one, since a
    /// trigger change discards buffered frames.
    pub fn set_trigger(&self, trigger_type: TriggerType, trigger_mode: TriggerMode) -> XimeaResult<()> {
        let spec = TriggerSpec::new(trigger_type, trigger_mode);
        let mapping = lookup(spec).ok_or_else(|| {
            XimeaError::UnsupportedFeature(format!(
                "trigger type {:?} with mode {:?}",
                trigger_type, trigger_mode
            ))
        })?;

        let mut active = self.trigger.lock();
        if active.map(|m| m.native()) == Some(mapping.native()) {
            tracing::debug!("Trigger {} already active on the device", spec);
            *active = Some(*mapping);
            return Ok(());
        }

        let guard = self.disabled()?;
        tracing::debug!(
            "Setting trigger {}: source {} selector {}",
            spec,
            mapping.source.code(),
            mapping.selector.code()
        );
        if let Err(err) = self.write_trigger(mapping) {
            // The device may hold a half-written pair; put the previous one
            // back or forget it so the next call pushes again.
            *active = match *active {
                Some(previous) => match self.write_trigger(&previous) {
                    Ok(()) => Some(previous),
                    Err(restore_err) => {
                        tracing::warn!(
                            "Failed to restore trigger {}: {}",
                            previous.spec,
                            restore_err
                        );
                        None
                    }
                },
                None => None,
            };
            return Err(err.into());
        }
        *active = Some(*mapping);
        drop(active);
        guard.finish()?;

        tracing::info!("Trigger set to {}", spec);
        Ok(())
    }

    fn write_trigger(&self, mapping: &TriggerMapping) -> Result<(), XiError> {
        self.handle.set_trigger_source(mapping.source)?;
        self.handle.set_trigger_selector(mapping.selector)?;
        Ok(())
    }

    /// Active trigger configuration, `None` until a trigger is known to be
    /// on the device
    pub fn trigger_spec(&self) -> Option<TriggerSpec> {
        self.trigger.lock().map(|m| m.spec)
    }

    /// Active trigger type
    pub fn trigger_type(&self) -> Option<TriggerType> {
        self.trigger_spec().map(|s| s.trigger_type)
    }

    /// Active trigger mode
    pub fn trigger_mode(&self) -> Option<TriggerMode> {
        self.trigger_spec().map(|s| s.trigger_mode)
    }

    /// Send one software trigger pulse.
    ///
    /// Only valid while enabled with a software/once trigger; anything else
    /// fails without pulsing the device.
    pub fn trigger(&self) -> XimeaResult<()> {
        if !self.is_enabled() {
            return Err(XimeaError::Disabled);
        }
        match self.trigger_spec() {
            Some(spec) if spec.is_software_once() => {}
            Some(spec) => {
                return Err(XimeaError::UnsupportedFeature(format!(
                    "software trigger with active trigger {}",
                    spec
                )))
            }
            None => {
                return Err(XimeaError::UnsupportedFeature(
                    "software trigger before trigger configuration".into(),
                ))
            }
        }

        self.handle.set_trigger_software()?;
        tracing::debug!("Software trigger sent");
        Ok(())
    }

    /// Alias for [`XimeaCamera::trigger`]
    pub fn soft_trigger(&self) -> XimeaResult<()> {
        self.trigger()
    }
}
