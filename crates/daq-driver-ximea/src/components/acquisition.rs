//! XIMEA Acquisition State
//!
//! Owns the enabled/acquiring flags and the polling fetch.
//!
//! ## Abort Ordering
//!
//! `abort()` clears the acquiring flag *before* asking the device to stop. A
//! fetch that is already waiting inside `get_image` then sees
//! "acquisition stopped" with the flag cleared and returns no frame instead
//! of an error. If the stop call fails the flag is restored.
//!
//! ## Scoped Reconfiguration
//!
//! [`DisabledGuard`] disables the camera for a block of configuration calls
//! and restores the previous state on every exit path. On success call
//! [`DisabledGuard::finish`] so a failing restore is reported; on early
//! return the `Drop` impl restores and logs.

use crate::camera::XimeaCamera;
use crate::components::connection::XimeaHandle;
use crate::error::{XiStatus, XimeaResult};
use daq_core::data::Frame;
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Wait per fetch, in vendor units of one millisecond.
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(1);

/// Acquisition state of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionState {
    /// Not enabled, not acquiring
    Disabled,
    /// Enabled but acquisition was aborted
    EnabledIdle,
    /// Device is acquiring
    Acquiring,
}

impl<H: XimeaHandle> XimeaCamera<H> {
    /// Start acquisition.
    ///
    /// Re-enabling an acquiring camera stops and restarts it once.
    pub fn enable(&self) -> XimeaResult<()> {
        if self.is_acquiring() {
            self.abort()?;
        }

        self.handle.start_acquisition()?;
        self.acquiring.store(true, Ordering::SeqCst);
        self.enabled.store(true, Ordering::SeqCst);
        tracing::debug!("Acquisition started");
        Ok(())
    }

    /// Stop acquisition and mark the camera disabled.
    pub fn disable(&self) -> XimeaResult<()> {
        self.abort()?;
        self.enabled.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Stop acquisition, keeping the enabled flag. No-op when idle.
    pub fn abort(&self) -> XimeaResult<()> {
        if !self.acquiring.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(err) = self.handle.stop_acquisition() {
            self.acquiring.store(true, Ordering::SeqCst);
            tracing::warn!("Failed to stop acquisition: {}", err);
            return Err(err.into());
        }

        tracing::debug!("Acquisition stopped");
        Ok(())
    }

    /// Whether the camera is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Whether the device is acquiring
    pub fn is_acquiring(&self) -> bool {
        self.acquiring.load(Ordering::SeqCst)
    }

    /// Current acquisition state
    pub fn acquisition_state(&self) -> AcquisitionState {
        if self.is_acquiring() {
            AcquisitionState::Acquiring
        } else if self.is_enabled() {
            AcquisitionState::EnabledIdle
        } else {
            AcquisitionState::Disabled
        }
    }

    /// Poll for one frame, waiting at most [`FETCH_TIMEOUT`].
    ///
    /// Returns `Ok(None)` on timeout and on "acquisition stopped" after an
    /// abort. Any other device error is returned.
    pub fn fetch_frame(&self) -> XimeaResult<Option<Frame>> {
        match self.handle.get_image(FETCH_TIMEOUT) {
            Ok(image) => Ok(Some(image.into_frame())),
            Err(err) if err.status == XiStatus::Timeout => Ok(None),
            Err(err) if err.status == XiStatus::AcquisitionStopped && !self.is_acquiring() => {
                tracing::debug!("Fetch raced with abort, discarding");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Disable for the lifetime of the returned guard.
    ///
    /// The guard puts the camera back in the state it found it in: an
    /// acquiring camera is restarted, an enabled idle one is only marked
    /// enabled again.
    pub fn disabled(&self) -> XimeaResult<DisabledGuard<'_, H>> {
        let prior = self.acquisition_state();
        if prior != AcquisitionState::Disabled {
            self.disable()?;
        }
        Ok(DisabledGuard {
            camera: self,
            restore: Some(prior),
        })
    }

    fn restore_state(&self, state: AcquisitionState) -> XimeaResult<()> {
        match state {
            AcquisitionState::Acquiring => self.enable(),
            AcquisitionState::EnabledIdle => {
                self.enabled.store(true, Ordering::SeqCst);
                Ok(())
            }
            AcquisitionState::Disabled => Ok(()),
        }
    }

    /// Enable for the lifetime of the returned guard.
    pub fn enabled(&self) -> XimeaResult<EnabledGuard<'_, H>> {
        let restore = !self.is_enabled();
        if restore {
            self.enable()?;
        }
        Ok(EnabledGuard {
            camera: self,
            restore,
        })
    }
}

/// Keeps the camera disabled; restores the prior state on drop.
#[must_use = "the camera is re-enabled as soon as the guard is dropped"]
pub struct DisabledGuard<'a, H: XimeaHandle> {
    camera: &'a XimeaCamera<H>,
    restore: Option<AcquisitionState>,
}

impl<H: XimeaHandle> DisabledGuard<'_, H> {
    /// Restore the previous state, reporting a failed re-enable.
    pub fn finish(mut self) -> XimeaResult<()> {
        match self.restore.take() {
            Some(state) => self.camera.restore_state(state),
            None => Ok(()),
        }
    }
}

impl<H: XimeaHandle> Drop for DisabledGuard<'_, H> {
    fn drop(&mut self) {
        if let Some(state) = self.restore.take() {
            if let Err(err) = self.camera.restore_state(state) {
                tracing::error!("Failed to re-enable camera after reconfiguration: {}", err);
            }
        }
    }
}

/// Keeps the camera enabled; disables on drop if it was disabled.
#[must_use = "the camera is disabled as soon as the guard is dropped"]
pub struct EnabledGuard<'a, H: XimeaHandle> {
    camera: &'a XimeaCamera<H>,
    restore: bool,
}

impl<H: XimeaHandle> EnabledGuard<'_, H> {
    /// Restore the previous state, reporting a failed disable.
    pub fn finish(mut self) -> XimeaResult<()> {
        if std::mem::take(&mut self.restore) {
            self.camera.disable()?;
        }
        Ok(())
    }
}

impl<H: XimeaHandle> Drop for EnabledGuard<'_, H> {
    fn drop(&mut self) {
        if self.restore {
            if let Err(err) = self.camera.disable() {
                tracing::error!("Failed to disable camera after enabled block: {}", err);
            }
        }
    }
}
