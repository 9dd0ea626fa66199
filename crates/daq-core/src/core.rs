//! Sensor geometry types shared by camera drivers.
//!
//! All coordinates are in unbinned sensor pixels with the origin at the
//! top-left corner of the sensor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Full readable area of a camera sensor.
///
/// Discovered once when the camera is opened; every ROI and offset is bounded
/// by it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SensorShape {
    /// Sensor width in pixels
    pub width: u32,
    /// Sensor height in pixels
    pub height: u32,
}

impl SensorShape {
    /// Create a sensor shape
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// ROI covering the whole sensor
    pub const fn full_roi(&self) -> Roi {
        Roi::new(0, 0, self.width, self.height)
    }
}

impl fmt::Display for SensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Region of Interest for camera acquisition
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Roi {
    /// X-coordinate of top-left corner in pixels
    pub x: u32,
    /// Y-coordinate of top-left corner in pixels
    pub y: u32,
    /// Width of ROI in pixels
    pub width: u32,
    /// Height of ROI in pixels
    pub height: u32,
}

impl Roi {
    /// Create a ROI from its left/top offsets and size
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Calculate area in pixels
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Exclusive right edge (`x + width`), widened so it cannot overflow
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge (`y + height`), widened so it cannot overflow
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Check if ROI lies entirely inside the given sensor
    pub fn fits_within(&self, sensor: SensorShape) -> bool {
        self.right() <= u64::from(sensor.width) && self.bottom() <= u64::from(sensor.height)
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Pixel binning factors (horizontal, vertical)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Binning {
    /// Horizontal binning factor
    pub horizontal: u32,
    /// Vertical binning factor
    pub vertical: u32,
}

impl Binning {
    /// No pixel combination
    pub const IDENTITY: Binning = Binning {
        horizontal: 1,
        vertical: 1,
    };

    /// Create a binning value
    pub const fn new(horizontal: u32, vertical: u32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

impl Default for Binning {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Binning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.horizontal, self.vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_fits_full_sensor() {
        let sensor = SensorShape::new(2048, 2048);
        assert!(sensor.full_roi().fits_within(sensor));
        assert!(Roi::new(1024, 1024, 1024, 1024).fits_within(sensor));
    }

    #[test]
    fn test_roi_exceeding_sensor() {
        let sensor = SensorShape::new(2048, 2048);
        assert!(!Roi::new(0, 0, 2049, 2048).fits_within(sensor));
        assert!(!Roi::new(1, 0, 2048, 2048).fits_within(sensor));
        assert!(!Roi::new(0, 2000, 16, 49).fits_within(sensor));
    }

    #[test]
    fn test_roi_edges_do_not_overflow() {
        let roi = Roi::new(u32::MAX, u32::MAX, u32::MAX, 1);
        assert_eq!(roi.right(), 2 * u64::from(u32::MAX));
        assert!(!roi.fits_within(SensorShape::new(u32::MAX, u32::MAX)));
    }

    #[test]
    fn test_roi_area() {
        assert_eq!(Roi::new(0, 0, 2048, 2048).area(), 4_194_304);
    }

    #[test]
    fn test_display() {
        assert_eq!(Roi::new(4, 8, 640, 480).to_string(), "640x480+4+8");
        assert_eq!(SensorShape::new(2048, 1536).to_string(), "2048x1536");
        assert_eq!(Binning::IDENTITY.to_string(), "1x1");
    }

    #[test]
    fn test_binning_default_is_identity() {
        assert_eq!(Binning::default(), Binning::new(1, 1));
    }
}
