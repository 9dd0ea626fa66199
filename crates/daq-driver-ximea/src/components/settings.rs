//! XIMEA Settings
//!
//! Optional readouts are discovered by probing: one read is attempted and
//! the setting is registered only if it succeeds. "Not supported" and "not
//! implemented" mean the feature is absent and the setting is skipped; any
//! other failure aborts discovery.

use crate::components::connection::{TemperatureSensor, XimeaHandle};
use crate::error::{XiError, XimeaError, XimeaResult};
use serde_json::Value;
use std::fmt;

/// Value type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingType {
    /// Floating point
    Float,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Free text
    Str,
    /// One of a fixed list of strings
    Enum,
}

/// Reads a setting from the device.
pub type Getter<H> = Box<dyn Fn(&H) -> Result<Value, XiError> + Send + Sync>;

/// Writes a setting to the device.
pub type Setter<H> = Box<dyn Fn(&H, Value) -> XimeaResult<()> + Send + Sync>;

/// A named device setting. Immutable once registered.
pub struct Setting<H> {
    name: String,
    kind: SettingType,
    getter: Getter<H>,
    setter: Option<Setter<H>>,
    values: Vec<String>,
}

impl<H> Setting<H> {
    /// Create a read-only setting
    pub fn read_only(name: impl Into<String>, kind: SettingType, getter: Getter<H>) -> Self {
        Self {
            name: name.into(),
            kind,
            getter,
            setter: None,
            values: Vec::new(),
        }
    }

    /// Make the setting writable
    pub fn with_setter(mut self, setter: Setter<H>) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Valid values of an [`SettingType::Enum`] setting
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Setting name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value type
    pub fn kind(&self) -> SettingType {
        self.kind
    }

    /// Valid values, empty unless the setting is an enum
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether the setting has no setter
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }
}

impl<H> fmt::Debug for Setting<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("read_only", &self.is_read_only())
            .field("values", &self.values)
            .finish()
    }
}

/// Insertion-ordered collection of discovered settings.
pub struct SettingsRegistry<H> {
    settings: Vec<Setting<H>>,
}

impl<H> Default for SettingsRegistry<H> {
    fn default() -> Self {
        Self {
            settings: Vec::new(),
        }
    }
}

impl<H> fmt::Debug for SettingsRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.settings).finish()
    }
}

impl<H: XimeaHandle> SettingsRegistry<H> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `setting`, replacing any setting with the same name
    pub fn register(&mut self, setting: Setting<H>) {
        match self.settings.iter_mut().find(|s| s.name == setting.name) {
            Some(existing) => *existing = setting,
            None => self.settings.push(setting),
        }
    }

    /// Probe `setting` once and register it if the device answers.
    ///
    /// Returns whether the setting was registered.
    pub fn probe(&mut self, handle: &H, setting: Setting<H>) -> XimeaResult<bool> {
        match (setting.getter)(handle) {
            Ok(_) => {
                tracing::debug!("Setting '{}' available", setting.name);
                self.register(setting);
                Ok(true)
            }
            Err(err) if err.status.is_absence() => {
                tracing::debug!("Setting '{}' absent: {}", setting.name, err.status);
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Names of all settings, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.settings.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a setting
    pub fn get(&self, name: &str) -> Option<&Setting<H>> {
        self.settings.iter().find(|s| s.name == name)
    }

    /// Read a setting from the device
    pub fn read(&self, name: &str, handle: &H) -> XimeaResult<Value> {
        let setting = self
            .get(name)
            .ok_or_else(|| XimeaError::UnknownSetting(name.to_string()))?;
        Ok((setting.getter)(handle)?)
    }

    /// Write a setting to the device
    pub fn write(&self, name: &str, handle: &H, value: Value) -> XimeaResult<()> {
        let setting = self
            .get(name)
            .ok_or_else(|| XimeaError::UnknownSetting(name.to_string()))?;
        let setter = setting
            .setter
            .as_ref()
            .ok_or_else(|| XimeaError::ReadOnlySetting(name.to_string()))?;

        if setting.kind == SettingType::Enum {
            let valid = value
                .as_str()
                .is_some_and(|v| setting.values.iter().any(|allowed| allowed == v));
            if !valid {
                return Err(XimeaError::Configuration(format!(
                    "'{}' is not one of {:?} for setting '{}'",
                    value, setting.values, name
                )));
            }
        }

        tracing::debug!("Writing setting '{}' = {}", name, value);
        setter(handle, value)
    }

    /// Number of registered settings
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Whether no setting was registered
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

/// Read-only setting for one temperature sensor
pub fn temperature_setting<H: XimeaHandle>(sensor: TemperatureSensor) -> Setting<H> {
    Setting::read_only(
        sensor.setting_name(),
        SettingType::Float,
        Box::new(move |handle: &H| handle.temperature(sensor).map(Value::from)),
    )
}

/// Probe every temperature sensor and keep those present on the device.
pub fn discover_settings<H: XimeaHandle>(handle: &H) -> XimeaResult<SettingsRegistry<H>> {
    let mut registry = SettingsRegistry::new();
    for sensor in TemperatureSensor::ALL {
        registry.probe(handle, temperature_setting(sensor))?;
    }
    tracing::info!("Discovered settings: {:?}", registry.names());
    Ok(registry)
}
