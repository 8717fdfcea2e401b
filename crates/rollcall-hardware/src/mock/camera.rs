//! Mock camera implementation for testing and development.
//!
//! The mock "films" a scene controlled through [`MockCameraHandle`]: holding
//! a code in front of it makes every captured frame carry that code until it
//! is taken away, just like a real QR code held up to a kiosk camera.

use crate::{
    HardwareError, Result,
    traits::CameraDevice,
    types::{DeviceInfo, Frame},
};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;

#[derive(Debug, Default)]
struct Scene {
    /// Code currently held in front of the camera.
    payload: Option<Bytes>,

    /// Camera is streaming but has no frame yet.
    warming_up: bool,

    /// Number of upcoming captures that fail.
    pending_failures: u32,
}

#[derive(Debug, Default)]
struct Shared {
    scene: Mutex<Scene>,
    streaming: AtomicBool,
    permission_denied: AtomicBool,
    broken_driver: AtomicBool,
    frames_captured: AtomicU64,
    open_count: AtomicU32,
}

impl Shared {
    fn scene(&self) -> MutexGuard<'_, Scene> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock camera for testing and development.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::mock::MockCamera;
/// use rollcall_hardware::traits::CameraDevice;
///
/// #[tokio::main]
/// async fn main() -> rollcall_hardware::Result<()> {
///     let (mut camera, handle) = MockCamera::new();
///
///     camera.open_stream().await?;
///     handle.present("qr_011");
///
///     let frame = camera.capture_frame().await?.unwrap();
///     assert_eq!(&frame.data[..], b"qr_011");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCamera {
    shared: Arc<Shared>,
    name: String,
}

impl MockCamera {
    /// Create a new mock camera with the default name.
    ///
    /// Returns a tuple of (MockCamera, MockCameraHandle) where the handle
    /// controls what the camera sees.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_name("Mock Camera".to_string())
    }

    /// Create a new mock camera with a custom name.
    pub fn with_name(name: String) -> (Self, MockCameraHandle) {
        let shared = Arc::new(Shared::default());

        let camera = Self {
            shared: Arc::clone(&shared),
            name: name.clone(),
        };

        let handle = MockCameraHandle { shared, name };

        (camera, handle)
    }

    /// Create a mock camera whose stream cannot be opened because the
    /// platform denied camera permission.
    pub fn denied() -> (Self, MockCameraHandle) {
        let (camera, handle) = Self::new();
        handle.deny_permission();
        (camera, handle)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new().0
    }
}

impl CameraDevice for MockCamera {
    async fn open_stream(&mut self) -> Result<()> {
        if self.shared.permission_denied.load(Ordering::SeqCst) {
            return Err(HardwareError::permission_denied(self.name.clone()));
        }
        if self.shared.broken_driver.load(Ordering::SeqCst) {
            return Err(HardwareError::initialization_failed(format!(
                "{}: no supported video format",
                self.name
            )));
        }

        self.shared.streaming.store(true, Ordering::SeqCst);
        self.shared.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn capture_frame(&mut self) -> Result<Option<Frame>> {
        if !self.shared.streaming.load(Ordering::SeqCst) {
            return Err(HardwareError::disconnected(format!(
                "{}: stream not open",
                self.name
            )));
        }

        let mut scene = self.shared.scene();

        if scene.pending_failures > 0 {
            scene.pending_failures -= 1;
            return Err(HardwareError::frame_capture("simulated capture failure"));
        }

        if scene.warming_up {
            return Ok(None);
        }

        self.shared.frames_captured.fetch_add(1, Ordering::SeqCst);
        let data = scene.payload.clone().unwrap_or_default();
        Ok(Some(Frame::new(FRAME_WIDTH, FRAME_HEIGHT, data)))
    }

    async fn close_stream(&mut self) -> Result<()> {
        self.shared.streaming.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.shared.streaming.load(Ordering::SeqCst)
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Camera v1.0").with_firmware_version("1.0.0"))
    }
}

/// Handle for controlling a mock camera.
///
/// Cloning the handle shares the same scene.
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    shared: Arc<Shared>,
    name: String,
}

impl MockCameraHandle {
    /// Hold a code in front of the camera.
    ///
    /// Every subsequent frame carries `text` until [`clear`](Self::clear)
    /// is called or another code is presented.
    pub fn present(&self, text: &str) {
        self.shared.scene().payload = Some(Bytes::copy_from_slice(text.as_bytes()));
    }

    /// Take the code away from the camera.
    pub fn clear(&self) {
        self.shared.scene().payload = None;
    }

    /// Simulate camera warm-up: the stream is open but yields no frames.
    pub fn set_warming_up(&self, warming_up: bool) {
        self.shared.scene().warming_up = warming_up;
    }

    /// Make the next `count` captures fail.
    pub fn fail_next_captures(&self, count: u32) {
        self.shared.scene().pending_failures = count;
    }

    /// Make future stream opens fail with a permission error.
    pub fn deny_permission(&self) {
        self.shared.permission_denied.store(true, Ordering::SeqCst);
    }

    /// Make future stream opens fail as if the driver rejected every
    /// stream configuration.
    pub fn break_driver(&self) {
        self.shared.broken_driver.store(true, Ordering::SeqCst);
    }

    /// Check whether the camera stream is open.
    pub fn is_streaming(&self) -> bool {
        self.shared.streaming.load(Ordering::SeqCst)
    }

    /// Number of frames successfully captured so far.
    pub fn frames_captured(&self) -> u64 {
        self.shared.frames_captured.load(Ordering::SeqCst)
    }

    /// Number of times the stream was opened.
    pub fn open_count(&self) -> u32 {
        self.shared.open_count.load(Ordering::SeqCst)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
