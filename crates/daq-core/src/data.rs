//! Image frame container.

/// Represents a single image frame.
///
/// # Storage
/// Data is stored as a raw byte vector (`Vec<u8>`), exactly as delivered by
/// the camera.
/// - 8-bit images: 1 byte per pixel.
/// - 12/16-bit images: 2 bytes per pixel, Little Endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Bits per pixel (e.g., 8, 12, 16)
    pub bit_depth: u32,

    /// Raw pixel data
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame from raw byte data with explicit bit depth.
    ///
    /// The caller must ensure the buffer length matches the expected size for the bit depth.
    pub fn from_bytes(width: u32, height: u32, bit_depth: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bit_depth,
            data,
        }
    }

    /// Number of pixels in the frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Get pixel value at (x, y) as u32 (handling bit depth conversion).
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let idx = y as usize * self.width as usize + x as usize;

        match self.bit_depth {
            8 => self.data.get(idx).map(|&v| u32::from(v)),
            12 | 16 => {
                let start = idx * 2;
                match self.data.get(start..start + 2) {
                    Some(&[lo, hi]) => Some(u32::from(u16::from_le_bytes([lo, hi]))),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
