//! Simulated XIMEA camera.
//!
//! [`MockHandle`] behaves like a real handle for the calls the configuration
//! core makes: geometry is validated against the sensor and the increment
//! grid, software triggers queue frames, and reads of absent temperature
//! sensors fail with "not supported". Clones share state, so a test can keep
//! a probe handle while the camera owns another.
//!
//! Failures are injected per operation with [`MockFault`].

use crate::components::connection::{
    Axis, DebugLevel, RawImage, TemperatureSensor, XimeaHandle, XimeaSdk,
};
use crate::components::trigger::{TriggerSelector, TriggerSource};
use crate::error::{XiError, XiStatus};
use daq_core::core::{Roi, SensorShape};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Status returned when opening a camera that is not connected.
const INVALID_HANDLE: XiStatus = XiStatus::Other(1);

/// Injected failure for one operation.
#[derive(Debug, Clone)]
pub enum MockFault {
    /// Fail every call
    Always {
        /// Operation name, e.g. `"set_height"`
        operation: &'static str,
        /// Status to report
        status: XiStatus,
    },
    /// Fail the next `count` calls, then succeed
    Times {
        /// Operation name
        operation: &'static str,
        /// Status to report
        status: XiStatus,
        /// Number of failing calls
        count: u32,
    },
    /// Succeed `successes` times, then fail every call
    AfterN {
        /// Operation name
        operation: &'static str,
        /// Status to report
        status: XiStatus,
        /// Number of successful calls first
        successes: u32,
    },
}

#[derive(Debug)]
struct FaultSlot {
    fault: MockFault,
    hits: u32,
}

impl FaultSlot {
    fn trip(&mut self, operation: &str) -> Option<XiStatus> {
        match self.fault {
            MockFault::Always {
                operation: op,
                status,
            } if op == operation => Some(status),
            MockFault::Times {
                operation: op,
                status,
                count,
            } if op == operation && self.hits < count => {
                self.hits += 1;
                Some(status)
            }
            MockFault::AfterN {
                operation: op,
                status,
                successes,
            } if op == operation => {
                self.hits += 1;
                (self.hits > successes).then_some(status)
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
struct MockState {
    sensor: SensorShape,
    increments: HashMap<Axis, u32>,
    roi: Roi,
    trigger_source: TriggerSource,
    trigger_selector: TriggerSelector,
    acquiring: bool,
    open: bool,
    pending_triggers: u32,
    frame_counter: u32,
    exposure_us: u32,
    framerate: f64,
    temperatures: HashMap<TemperatureSensor, Result<f64, XiStatus>>,
    faults: Vec<FaultSlot>,
    calls: HashMap<&'static str, u32>,
    writes_while_acquiring: u32,
}

impl MockState {
    fn new(sensor: SensorShape) -> Self {
        let increments = HashMap::from([
            (Axis::OffsetX, 4),
            (Axis::OffsetY, 2),
            (Axis::Width, 4),
            (Axis::Height, 2),
        ]);
        let temperatures = HashMap::from([
            (TemperatureSensor::Chip, Ok(41.5)),
            (TemperatureSensor::Housing, Err(XiStatus::NotSupported)),
            (TemperatureSensor::HousingBackSide, Err(XiStatus::NotImplemented)),
            (TemperatureSensor::SensorBoard, Ok(37.25)),
        ]);
        Self {
            sensor,
            increments,
            roi: sensor.full_roi(),
            trigger_source: TriggerSource::Off,
            trigger_selector: TriggerSelector::FrameStart,
            acquiring: false,
            open: true,
            pending_triggers: 0,
            frame_counter: 0,
            exposure_us: 10_000,
            framerate: 50.0,
            temperatures,
            faults: Vec::new(),
            calls: HashMap::new(),
            writes_while_acquiring: 0,
        }
    }

    /// Count the call and apply injected faults
    fn enter(&mut self, operation: &'static str) -> Result<(), XiError> {
        *self.calls.entry(operation).or_insert(0) += 1;
        for slot in &mut self.faults {
            if let Some(status) = slot.trip(operation) {
                return Err(XiError::new(status, operation));
            }
        }
        Ok(())
    }

    fn enter_write(&mut self, operation: &'static str) -> Result<(), XiError> {
        self.enter(operation)?;
        if self.acquiring {
            self.writes_while_acquiring += 1;
        }
        Ok(())
    }

    fn increment(&self, axis: Axis) -> u32 {
        self.increments.get(&axis).copied().unwrap_or(1)
    }

    fn set_axis(&mut self, axis: Axis, value: u32) -> Result<(), XiError> {
        let operation = set_operation(axis);
        self.enter_write(operation)?;

        let increment = self.increment(axis);
        if value % increment != 0 {
            return Err(XiError::new(XiStatus::InvalidArguments, operation));
        }

        let mut candidate = self.roi;
        axis.apply(&mut candidate, value);
        if candidate.width == 0 || candidate.height == 0 || !candidate.fits_within(self.sensor) {
            return Err(XiError::new(XiStatus::InvalidArguments, operation));
        }

        self.roi = candidate;
        Ok(())
    }

    fn next_image(&mut self) -> RawImage {
        let Roi { width, height, .. } = self.roi;
        let seed = self.frame_counter;
        self.frame_counter = self.frame_counter.wrapping_add(1);

        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x.wrapping_add(y).wrapping_add(seed) % 256) as u8))
            .collect();
        RawImage {
            width,
            height,
            bit_depth: 8,
            data,
        }
    }
}

const fn get_operation(axis: Axis) -> &'static str {
    match axis {
        Axis::OffsetX => "get_offset_x",
        Axis::OffsetY => "get_offset_y",
        Axis::Width => "get_width",
        Axis::Height => "get_height",
    }
}

const fn set_operation(axis: Axis) -> &'static str {
    match axis {
        Axis::OffsetX => "set_offset_x",
        Axis::OffsetY => "set_offset_y",
        Axis::Width => "set_width",
        Axis::Height => "set_height",
    }
}

const fn maximum_operation(axis: Axis) -> &'static str {
    match axis {
        Axis::OffsetX => "get_offset_x_maximum",
        Axis::OffsetY => "get_offset_y_maximum",
        Axis::Width => "get_width_maximum",
        Axis::Height => "get_height_maximum",
    }
}

const fn increment_operation(axis: Axis) -> &'static str {
    match axis {
        Axis::OffsetX => "get_offset_x_increment",
        Axis::OffsetY => "get_offset_y_increment",
        Axis::Width => "get_width_increment",
        Axis::Height => "get_height_increment",
    }
}

/// Simulated camera handle.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockHandle {
    fn default() -> Self {
        Self::new(SensorShape::new(2048, 2048))
    }
}

impl MockHandle {
    /// Open simulated camera reading out the full `sensor`.
    ///
    /// Increments default to 4 for width and left offset and 2 for height
    /// and top offset. The chip and sensor board temperatures are present.
    pub fn new(sensor: SensorShape) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new(sensor))),
        }
    }

    /// Set the increment grid along `axis`
    pub fn with_increment(self, axis: Axis, increment: u32) -> Self {
        self.state.lock().increments.insert(axis, increment.max(1));
        self
    }

    /// Set a temperature readout, or the status its read fails with
    pub fn with_temperature(self, sensor: TemperatureSensor, reading: Result<f64, XiStatus>) -> Self {
        self.state.lock().temperatures.insert(sensor, reading);
        self
    }

    /// Set the reported frame rate
    pub fn with_framerate(self, framerate: f64) -> Self {
        self.state.lock().framerate = framerate;
        self
    }

    /// Add a fault at construction
    pub fn with_fault(self, fault: MockFault) -> Self {
        self.inject(fault);
        self
    }

    /// Add a fault
    pub fn inject(&self, fault: MockFault) {
        self.state.lock().faults.push(FaultSlot { fault, hits: 0 });
    }

    /// Remove all faults
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Number of calls made to `operation`, faulted calls included
    pub fn call_count(&self, operation: &str) -> u32 {
        self.state.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Reset all call counters
    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Configuration writes issued while acquiring
    pub fn writes_while_acquiring(&self) -> u32 {
        self.state.lock().writes_while_acquiring
    }

    /// ROI currently held by the simulated device
    pub fn device_roi(&self) -> Roi {
        self.state.lock().roi
    }

    /// Overwrite the device ROI behind the driver's back
    pub fn force_roi(&self, roi: Roi) {
        self.state.lock().roi = roi;
    }

    /// Trigger source and selector currently held
    pub fn device_trigger(&self) -> (TriggerSource, TriggerSelector) {
        let state = self.state.lock();
        (state.trigger_source, state.trigger_selector)
    }

    /// Whether the simulated device is acquiring
    pub fn device_acquiring(&self) -> bool {
        self.state.lock().acquiring
    }

    /// Stop acquisition behind the driver's back
    pub fn force_stop(&self) {
        self.state.lock().acquiring = false;
    }

    /// Exposure currently held, in microseconds
    pub fn device_exposure_us(&self) -> u32 {
        self.state.lock().exposure_us
    }
}

impl XimeaHandle for MockHandle {
    fn get(&self, axis: Axis) -> Result<u32, XiError> {
        let mut state = self.state.lock();
        state.enter(get_operation(axis))?;
        Ok(axis.of(&state.roi))
    }

    fn set(&self, axis: Axis, value: u32) -> Result<(), XiError> {
        self.state.lock().set_axis(axis, value)
    }

    fn maximum(&self, axis: Axis) -> Result<u32, XiError> {
        let mut state = self.state.lock();
        state.enter(maximum_operation(axis))?;
        let (sensor, roi) = (state.sensor, state.roi);
        Ok(match axis {
            Axis::Width => sensor.width - roi.x,
            Axis::Height => sensor.height - roi.y,
            Axis::OffsetX => sensor.width - roi.width,
            Axis::OffsetY => sensor.height - roi.height,
        })
    }

    fn increment(&self, axis: Axis) -> Result<u32, XiError> {
        let mut state = self.state.lock();
        state.enter(increment_operation(axis))?;
        Ok(state.increment(axis))
    }

    fn set_trigger_source(&self, source: TriggerSource) -> Result<(), XiError> {
        let mut state = self.state.lock();
        state.enter_write("set_trigger_source")?;
        state.trigger_source = source;
        state.pending_triggers = 0;
        Ok(())
    }

    fn set_trigger_selector(&self, selector: TriggerSelector) -> Result<(), XiError> {
        let mut state = self.state.lock();
        state.enter_write("set_trigger_selector")?;
        state.trigger_selector = selector;
        Ok(())
    }

    fn set_trigger_software(&self) -> Result<(), XiError> {
        let mut state = self.state.lock();
        state.enter("set_trigger_software")?;
        if state.acquiring && state.trigger_source == TriggerSource::Software {
            state.pending_triggers += 1;
        }
        Ok(())
    }

    fn start_acquisition(&self) -> Result<(), XiError> {
        let mut state = self.state.lock();
        state.enter("start_acquisition")?;
        state.acquiring = true;
        state.pending_triggers = 0;
        Ok(())
    }

    fn stop_acquisition(&self) -> Result<(), XiError> {
        let mut state = self.state.lock();
        state.enter("stop_acquisition")?;
        state.acquiring = false;
        Ok(())
    }

    fn get_image(&self, _timeout: Duration) -> Result<RawImage, XiError> {
        let mut state = self.state.lock();
        state.enter("get_image")?;
        if !state.acquiring {
            return Err(XiError::new(XiStatus::AcquisitionStopped, "get_image"));
        }

        match state.trigger_source {
            TriggerSource::Off => Ok(state.next_image()),
            TriggerSource::Software if state.pending_triggers > 0 => {
                state.pending_triggers -= 1;
                Ok(state.next_image())
            }
            _ => Err(XiError::new(XiStatus::Timeout, "get_image")),
        }
    }

    fn exposure_us(&self) -> Result<u32, XiError> {
        let mut state = self.state.lock();
        state.enter("get_exposure")?;
        Ok(state.exposure_us)
    }

    fn set_exposure_us(&self, exposure_us: u32) -> Result<(), XiError> {
        let mut state = self.state.lock();
        state.enter("set_exposure")?;
        if exposure_us == 0 {
            return Err(XiError::new(XiStatus::InvalidArguments, "set_exposure"));
        }
        state.exposure_us = exposure_us;
        Ok(())
    }

    fn framerate(&self) -> Result<f64, XiError> {
        let mut state = self.state.lock();
        state.enter("get_framerate")?;
        Ok(state.framerate)
    }

    fn temperature(&self, sensor: TemperatureSensor) -> Result<f64, XiError> {
        let mut state = self.state.lock();
        state.enter(sensor.setting_name())?;
        match state.temperatures.get(&sensor) {
            Some(Ok(value)) => Ok(*value),
            Some(Err(status)) => Err(XiError::new(*status, sensor.setting_name())),
            None => Err(XiError::new(XiStatus::NotSupported, sensor.setting_name())),
        }
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn close(&self) -> Result<(), XiError> {
        let mut state = self.state.lock();
        state.enter("close")?;
        state.acquiring = false;
        state.open = false;
        Ok(())
    }
}

/// Simulated vendor API with a fixed set of connected cameras.
#[derive(Debug, Clone, Default)]
pub struct MockSdk {
    devices: Vec<(String, MockHandle)>,
    debug_level: Arc<Mutex<Option<DebugLevel>>>,
    debug_level_sets: Arc<Mutex<u32>>,
}

impl MockSdk {
    /// SDK with the given cameras, keyed by serial number
    pub fn new(devices: Vec<(String, MockHandle)>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    /// SDK with a single camera
    pub fn single(handle: MockHandle) -> Self {
        Self::new(vec![("MOCK0001".to_string(), handle)])
    }

    /// Handle of the camera with `serial`, sharing its state
    pub fn device(&self, serial: &str) -> Option<MockHandle> {
        self.devices
            .iter()
            .find(|(s, _)| s == serial)
            .map(|(_, handle)| handle.clone())
    }

    /// Last debug level applied
    pub fn debug_level(&self) -> Option<DebugLevel> {
        *self.debug_level.lock()
    }

    /// Number of times a debug level was applied
    pub fn debug_level_sets(&self) -> u32 {
        *self.debug_level_sets.lock()
    }
}

impl XimeaSdk for MockSdk {
    type Handle = MockHandle;

    fn device_count(&self) -> Result<u32, XiError> {
        Ok(u32::try_from(self.devices.len()).unwrap_or(u32::MAX))
    }

    fn open_first(&self) -> Result<MockHandle, XiError> {
        let (_, handle) = self
            .devices
            .first()
            .ok_or(XiError::new(INVALID_HANDLE, "open_device"))?;
        handle.state.lock().open = true;
        Ok(handle.clone())
    }

    fn open_by_serial(&self, serial: &str) -> Result<MockHandle, XiError> {
        let handle = self
            .device(serial)
            .ok_or(XiError::new(INVALID_HANDLE, "open_device_by_sn"))?;
        handle.state.lock().open = true;
        Ok(handle)
    }

    fn set_debug_level(&self, level: DebugLevel) -> Result<(), XiError> {
        *self.debug_level.lock() = Some(level);
        *self.debug_level_sets.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_off_grid_and_out_of_bounds() {
        let handle = MockHandle::default();
        let err = handle.set(Axis::Width, 1001).unwrap_err();
        assert_eq!(err.status, XiStatus::InvalidArguments);

        // Full width with a non-zero offset does not fit
        let err = handle.set(Axis::OffsetX, 4).unwrap_err();
        assert_eq!(err.status, XiStatus::InvalidArguments);

        handle.set(Axis::Width, 1000).unwrap();
        handle.set(Axis::OffsetX, 4).unwrap();
        assert_eq!(handle.device_roi(), Roi::new(4, 0, 1000, 2048));
    }

    #[test]
    fn test_maximum_depends_on_other_axis() {
        let handle = MockHandle::default();
        assert_eq!(handle.maximum(Axis::Width).unwrap(), 2048);
        assert_eq!(handle.maximum(Axis::OffsetX).unwrap(), 0);

        handle.set(Axis::Width, 1024).unwrap();
        assert_eq!(handle.maximum(Axis::OffsetX).unwrap(), 1024);
    }

    #[test]
    fn test_fault_kinds() {
        let handle = MockHandle::default()
            .with_fault(MockFault::Times {
                operation: "get_framerate",
                status: XiStatus::Other(57),
                count: 1,
            })
            .with_fault(MockFault::AfterN {
                operation: "get_exposure",
                status: XiStatus::Other(57),
                successes: 1,
            });

        assert!(handle.framerate().is_err());
        assert!(handle.framerate().is_ok());

        assert!(handle.exposure_us().is_ok());
        assert!(handle.exposure_us().is_err());
        assert!(handle.exposure_us().is_err());
        assert_eq!(handle.call_count("get_exposure"), 3);
    }

    #[test]
    fn test_software_trigger_queues_frame() {
        let handle = MockHandle::new(SensorShape::new(8, 4));
        handle.set_trigger_source(TriggerSource::Software).unwrap();
        handle.start_acquisition().unwrap();

        let err = handle.get_image(Duration::from_millis(1)).unwrap_err();
        assert_eq!(err.status, XiStatus::Timeout);

        handle.set_trigger_software().unwrap();
        let image = handle.get_image(Duration::from_millis(1)).unwrap();
        assert_eq!((image.width, image.height), (8, 4));
        assert_eq!(image.data.len(), 32);
    }

    #[test]
    fn test_sdk_open_by_serial() {
        let sdk = MockSdk::new(vec![
            ("A".into(), MockHandle::default()),
            ("B".into(), MockHandle::new(SensorShape::new(640, 480))),
        ]);
        assert_eq!(sdk.device_count().unwrap(), 2);
        let handle = sdk.open_by_serial("B").unwrap();
        assert_eq!(handle.get(Axis::Width).unwrap(), 640);
        assert!(sdk.open_by_serial("C").is_err());
    }
}
