//! Camera capture source
//!
//! [`CaptureSource`] owns the session's single camera handle. The actual
//! device sits behind the [`CameraDriver`] seam so hosts can plug in
//! whatever platform camera stack they have; [`StaticCamera`] serves a
//! fixed frame where no hardware exists.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use futures::future::BoxFuture;

use crate::error::DeviceError;
use crate::model::Frame;

/// Platform camera seam.
///
/// Implementations own the OS-level device. `open` may suspend while the
/// platform negotiates permissions; `grab` is only called between a
/// successful `open` and `shutdown` and should return the most recent
/// decoded frame without blocking on the sensor.
pub trait CameraDriver: Send + Sync {
    fn open(&self) -> BoxFuture<'_, Result<()>>;
    fn grab(&self) -> Result<Frame>;
    /// Stop the device. Idempotent.
    fn shutdown(&self);
}

/// Owns the camera handle for one session.
pub struct CaptureSource {
    driver: Arc<dyn CameraDriver>,
    acquired: AtomicBool,
}

impl CaptureSource {
    pub fn new(driver: Arc<dyn CameraDriver>) -> Self {
        Self {
            driver,
            acquired: AtomicBool::new(false),
        }
    }

    /// Open the camera.
    ///
    /// Fails with [`DeviceError::Unavailable`] when the device is missing
    /// or permission was denied; the session then runs degraded (every
    /// detection reports no face) instead of failing outright.
    pub async fn acquire(&self) -> Result<(), DeviceError> {
        match self.driver.open().await {
            Ok(()) => {
                self.acquired.store(true, Ordering::SeqCst);
                tracing::debug!("Camera acquired");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Camera acquisition failed");
                Err(DeviceError::Unavailable(e))
            }
        }
    }

    /// Most recent frame from the open device.
    pub fn current_frame(&self) -> Result<Frame, DeviceError> {
        if !self.acquired.load(Ordering::SeqCst) {
            return Err(DeviceError::NotAcquired);
        }
        self.driver.grab().map_err(DeviceError::Unavailable)
    }

    /// True while the device handle is open.
    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Stop the device. Safe to call any number of times; only the first
    /// call after an acquire reaches the driver.
    pub fn release(&self) {
        if self.acquired.swap(false, Ordering::SeqCst) {
            self.driver.shutdown();
            tracing::debug!("Camera released");
        }
    }
}

/// Driver that serves one fixed frame. Useful for hosts without camera
/// hardware and as a harness in tests.
pub struct StaticCamera {
    frame: Frame,
}

impl StaticCamera {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }
}

impl CameraDriver for StaticCamera {
    fn open(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn grab(&self) -> Result<Frame> {
        Ok(self.frame.clone())
    }

    fn shutdown(&self) {}
}
