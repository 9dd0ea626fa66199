//! `daq-core`
//!
//! Core trait definitions and types shared by the camera drivers.
//!
//! This crate provides the vocabulary every driver speaks: sensor geometry
//! ([`core::Roi`], [`core::SensorShape`], [`core::Binning`]), image frames
//! ([`data::Frame`]), the application error type ([`error::DaqError`]),
//! async capability traits ([`capabilities`]) and the driver factory API
//! ([`driver`]).
//!
//! ## Key Types
//!
//! - [`core::Roi`]: Region of interest in sensor pixel coordinates
//! - [`error::DaqError`]: Self-contained error type with recovery information
//! - [`driver::DriverFactory`]: Plugin entry point for device construction
//!
//! ## Example
//!
//! ```rust
//! use daq_core::core::{Roi, SensorShape};
//!
//! let sensor = SensorShape::new(2048, 2048);
//! let roi = Roi::new(0, 0, 2048, 2048);
//! assert!(roi.fits_within(sensor));
//! ```

pub mod capabilities;
pub mod core;
pub mod data;
pub mod driver;
pub mod error;

// Re-export commonly used types
pub use anyhow::{anyhow, Result};
pub use thiserror::Error;
