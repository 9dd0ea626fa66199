//! Camera components.
//!
//! - `connection`: vendor API traits and process-wide SDK setup
//! - `acquisition`: enable/disable/abort, scoped reconfiguration, frame fetch
//! - `roi`: ROI negotiation with quantization retry and rollback
//! - `trigger`: trigger table and configuration
//! - `settings`: probed optional readouts
//! - `mock`: simulated camera (feature `mock`)

pub mod acquisition;
pub mod connection;
#[cfg(feature = "mock")]
pub mod mock;
pub mod roi;
pub mod settings;
pub mod trigger;
