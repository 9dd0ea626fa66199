//! ROI negotiation.
//!
//! The device validates width/height against the *current* offsets, so a new
//! ROI is always written as: offsets to zero, width, height, then offsets.
//! Off-grid values are rejected with `InvalidArguments`; the request is then
//! rounded to the increment grid on the axes that changed and written again.
//! Any other failure restores the previous ROI before returning the error.

use crate::camera::XimeaCamera;
use crate::components::connection::{Axis, XimeaHandle};
use crate::error::{XiError, XiStatus, XimeaError, XimeaResult};
use daq_core::core::Roi;

/// Order in which changed axes are rounded to their increment.
const ROUNDING_ORDER: [Axis; 4] = [Axis::Height, Axis::Width, Axis::OffsetX, Axis::OffsetY];

/// Round `value` to the nearest multiple of `increment`, ties to even.
pub fn round_to_increment(value: u32, increment: u32) -> u32 {
    if increment <= 1 {
        return value;
    }
    let (increment, value) = (u64::from(increment), u64::from(value));
    let mut steps = value / increment;
    let twice_remainder = 2 * (value % increment);
    if twice_remainder > increment || (twice_remainder == increment && steps % 2 == 1) {
        steps += 1;
    }
    // Saturate at the largest on-grid value.
    let steps = steps.min(u64::from(u32::MAX) / increment);
    u32::try_from(steps * increment).unwrap_or(u32::MAX)
}

impl<H: XimeaHandle> XimeaCamera<H> {
    /// Apply `requested` and return the ROI the device actually holds.
    ///
    /// Fails with [`XimeaError::RoiOutOfBounds`] without touching the device
    /// when the request does not fit the sensor.
    pub fn set_roi(&self, requested: Roi) -> XimeaResult<Roi> {
        if !requested.fits_within(self.sensor) {
            return Err(XimeaError::RoiOutOfBounds {
                roi: requested,
                sensor: self.sensor,
            });
        }

        let mut mirror = self.roi.lock();
        let previous = *mirror;
        let guard = self.disabled()?;

        let applied = match self.negotiate_roi(requested, previous) {
            Ok(applied) => applied,
            Err(err) => {
                tracing::warn!("Setting ROI {} failed ({}), restoring {}", requested, err, previous);
                if let Err(restore_err) = self.write_roi(previous) {
                    tracing::warn!("Failed to restore ROI {}: {}", previous, restore_err);
                }
                return Err(err.into());
            }
        };

        *mirror = applied;
        drop(mirror);
        guard.finish()?;

        tracing::info!("ROI set to {}", applied);
        Ok(applied)
    }

    /// Mirrored ROI, checked against the device.
    ///
    /// # Panics
    ///
    /// Panics if the mirror and the device disagree; that is a bug in the
    /// negotiation, not a recoverable condition.
    pub fn roi(&self) -> XimeaResult<Roi> {
        let mirrored = *self.roi.lock();
        let hardware = self.read_roi()?;
        assert_eq!(
            mirrored, hardware,
            "mirrored ROI diverged from the device"
        );
        Ok(mirrored)
    }

    fn negotiate_roi(&self, requested: Roi, previous: Roi) -> Result<Roi, XiError> {
        match self.write_roi(requested) {
            Ok(()) => Ok(requested),
            Err(err) if err.status == XiStatus::InvalidArguments => {
                let corrected = self.quantize_roi(requested, previous)?;
                tracing::warn!(
                    "ROI {} rejected by the device, retrying with {}",
                    requested,
                    corrected
                );
                self.write_roi(corrected)?;
                Ok(corrected)
            }
            Err(err) => Err(err),
        }
    }

    /// Round the axes that differ from `previous` to their increments.
    fn quantize_roi(&self, requested: Roi, previous: Roi) -> Result<Roi, XiError> {
        let mut corrected = requested;
        for axis in ROUNDING_ORDER {
            let value = axis.of(&requested);
            if value == axis.of(&previous) {
                continue;
            }
            let increment = self.handle.increment(axis)?;
            let mut rounded = round_to_increment(value, increment);
            if axis.is_dimension() {
                rounded = rounded.max(increment);
            }
            axis.apply(&mut corrected, rounded);
        }

        if !corrected.fits_within(self.sensor) {
            return Err(XiError::new(XiStatus::InvalidArguments, "quantize_roi"));
        }
        Ok(corrected)
    }

    fn write_roi(&self, roi: Roi) -> Result<(), XiError> {
        tracing::debug!("Writing ROI {}", roi);
        self.handle.set(Axis::OffsetX, 0)?;
        self.handle.set(Axis::OffsetY, 0)?;
        self.handle.set(Axis::Width, roi.width)?;
        self.handle.set(Axis::Height, roi.height)?;
        self.handle.set(Axis::OffsetX, roi.x)?;
        self.handle.set(Axis::OffsetY, roi.y)?;
        Ok(())
    }

    fn read_roi(&self) -> Result<Roi, XiError> {
        Ok(Roi::new(
            self.handle.get(Axis::OffsetX)?,
            self.handle.get(Axis::OffsetY)?,
            self.handle.get(Axis::Width)?,
            self.handle.get(Axis::Height)?,
        ))
    }
}
