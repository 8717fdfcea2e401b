//! Resource lifecycle management.
//!
//! The camera stream and the radio session are the two physical resources a
//! kiosk session holds. [`ResourceManager`] opens them, runs each armed
//! channel as its own task with its own cancellation token, and guarantees
//! both are released when the session ends, whichever way it ends.
//!
//! Acquisition failures are fatal to one channel only and are never retried
//! by the manager. [`ResourceManager::release`] is idempotent.

use std::fmt;
use std::time::Duration;

use rollcall_core::{Channel, ScanState};
use rollcall_hardware::{
    AnyCameraDevice, AnyFeedbackDevice, AnyRadioDevice, CameraDevice, DecoderChain, RadioDevice,
};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::channels::optical::{self, OpticalDevices, OpticalSettings};
use crate::channels::{ChannelSignal, SignalSender, radio};
use crate::error::AcquisitionError;

/// How long a channel task gets to stop on its own before it is aborted.
const RELEASE_GRACE: Duration = Duration::from_secs(1);

/// Devices handed to a kiosk session.
///
/// Every device is optional: a kiosk without a camera or radio still scans
/// through the manual channel.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::mock::{MockCamera, MockDecoder, MockRadio};
/// use rollcall_hardware::{AnyCameraDevice, AnyFrameDecoder, AnyRadioDevice, DecoderChain};
/// use rollcall_kiosk::KioskDevices;
///
/// let (camera, _camera_handle) = MockCamera::new();
/// let (radio, _radio_handle) = MockRadio::new();
///
/// let devices = KioskDevices::new()
///     .with_camera(
///         AnyCameraDevice::Mock(camera),
///         DecoderChain::single(AnyFrameDecoder::Mock(MockDecoder::payload("software"))),
///     )
///     .with_radio(AnyRadioDevice::Mock(radio));
///
/// assert!(devices.has_camera());
/// assert!(devices.has_radio());
/// ```
#[derive(Debug, Default)]
pub struct KioskDevices {
    pub(crate) optical: Option<OpticalDevices>,
    pub(crate) radio: Option<AnyRadioDevice>,
    pub(crate) feedback: Option<AnyFeedbackDevice>,
}

impl KioskDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a camera and the decoders reading its frames.
    pub fn with_camera(mut self, camera: AnyCameraDevice, decoder: DecoderChain) -> Self {
        self.optical = Some(OpticalDevices::new(camera, decoder));
        self
    }

    /// Attach a near-field radio reader.
    pub fn with_radio(mut self, radio: AnyRadioDevice) -> Self {
        self.radio = Some(radio);
        self
    }

    /// Attach a speaker/vibration device.
    pub fn with_feedback(mut self, feedback: AnyFeedbackDevice) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn has_camera(&self) -> bool {
        self.optical.is_some()
    }

    pub fn has_radio(&self) -> bool {
        self.radio.is_some()
    }
}

/// How a channel task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTermination {
    /// Stopped cleanly.
    Success,
    /// Stopped because its device failed.
    Error,
    /// Aborted after ignoring cancellation.
    Cancelled,
    /// Panicked.
    Panic,
}

impl fmt::Display for TaskTermination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Panic => f.write_str("panic"),
        }
    }
}

/// Outcome of [`ResourceManager::release`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    /// Channel tasks stopped by this call, in release order.
    pub stopped: Vec<(Channel, TaskTermination)>,
}

impl ReleaseReport {
    /// Check whether any task ended abnormally.
    pub fn has_failures(&self) -> bool {
        self.stopped
            .iter()
            .any(|(_, termination)| *termination != TaskTermination::Success)
    }
}

struct ChannelTask {
    cancel: CancellationToken,
    handle: JoinHandle<rollcall_hardware::Result<()>>,
}

impl ChannelTask {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    async fn stop(mut self, channel: Channel) -> TaskTermination {
        self.cancel.cancel();

        let result = match tokio::time::timeout(RELEASE_GRACE, &mut self.handle).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%channel, "Channel task ignored cancellation, aborting");
                self.handle.abort();
                (&mut self.handle).await
            }
        };

        classify_task_result(result)
    }
}

/// Classify the termination status of a channel task.
fn classify_task_result(
    result: Result<rollcall_hardware::Result<()>, JoinError>,
) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(_)) => TaskTermination::Error,
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

/// A channel's resource, from configured to released.
enum Slot<T> {
    /// No device configured.
    Missing,
    /// Device available, not opened.
    Idle(T),
    /// Device opened, channel task running.
    Armed(ChannelTask),
    /// Released; the device is gone for good.
    Released,
}

impl<T> Slot<T> {
    fn from_option(device: Option<T>) -> Self {
        device.map_or(Slot::Missing, Slot::Idle)
    }

    fn is_armed(&self) -> bool {
        matches!(self, Slot::Armed(task) if task.is_running())
    }

    fn cancel(&self) {
        if let Slot::Armed(task) = self {
            task.cancel.cancel();
        }
    }
}

/// Acquires, runs and releases the camera stream and radio session.
pub struct ResourceManager {
    optical: Slot<OpticalDevices>,
    radio: Slot<AnyRadioDevice>,
    signals: mpsc::Sender<ChannelSignal>,
    state: watch::Receiver<ScanState>,
    session_cancel: CancellationToken,
    optical_settings: OpticalSettings,
    released: bool,
}

impl ResourceManager {
    /// Create a manager. Channel tasks push into `signals`, observe `state`
    /// and stop when `session_cancel` is cancelled.
    pub fn new(
        optical: Option<OpticalDevices>,
        radio: Option<AnyRadioDevice>,
        signals: mpsc::Sender<ChannelSignal>,
        state: watch::Receiver<ScanState>,
        session_cancel: CancellationToken,
        optical_settings: OpticalSettings,
    ) -> Self {
        Self {
            optical: Slot::from_option(optical),
            radio: Slot::from_option(radio),
            signals,
            state,
            session_cancel,
            optical_settings,
            released: false,
        }
    }

    /// Open the camera stream and start the optical channel.
    ///
    /// Does nothing if the channel is already armed.
    ///
    /// # Errors
    ///
    /// Returns an [`AcquisitionError`] if there is no camera, the platform
    /// denies access, or the session was released.
    pub async fn acquire_optical(&mut self) -> Result<(), AcquisitionError> {
        let channel = Channel::Optical;
        let mut devices = match std::mem::replace(&mut self.optical, Slot::Missing) {
            Slot::Idle(devices) => devices,
            Slot::Missing => {
                return Err(AcquisitionError::unavailable(channel, "no camera attached"));
            }
            Slot::Released => {
                self.optical = Slot::Released;
                return Err(AcquisitionError::Released { channel });
            }
            Slot::Armed(task) => {
                let running = task.is_running();
                self.optical = Slot::Armed(task);
                if running {
                    return Ok(());
                }
                return Err(AcquisitionError::unavailable(channel, "optical channel stopped"));
            }
        };

        let opened = self
            .session_cancel
            .run_until_cancelled(devices.camera.open_stream())
            .await;
        let Some(opened) = opened else {
            debug!(%channel, "Camera acquisition interrupted");
            self.optical = Slot::Idle(devices);
            return Err(AcquisitionError::Interrupted { channel });
        };
        if let Err(e) = opened {
            warn!(%channel, "Camera acquisition failed: {}", e);
            self.optical = Slot::Idle(devices);
            return Err(AcquisitionError::from_hardware(channel, e));
        }

        let cancel = self.session_cancel.child_token();
        let handle = tokio::spawn(optical::run(
            devices,
            SignalSender::new(self.signals.clone(), channel),
            self.state.clone(),
            cancel.clone(),
            self.optical_settings,
        ));
        self.optical = Slot::Armed(ChannelTask { cancel, handle });
        info!(%channel, "Camera stream acquired");
        Ok(())
    }

    /// Open the radio session and start the radio channel.
    ///
    /// Does nothing if the channel is already armed. On most platforms this
    /// must follow an operator gesture.
    ///
    /// # Errors
    ///
    /// Returns an [`AcquisitionError`] if there is no radio, the platform
    /// refuses the session, or the session was released. Cancelling the
    /// session while the radio is opening yields `Interrupted`.
    pub async fn acquire_radio(&mut self) -> Result<(), AcquisitionError> {
        let channel = Channel::Radio;
        let mut radio = match std::mem::replace(&mut self.radio, Slot::Missing) {
            Slot::Idle(radio) => radio,
            Slot::Missing => {
                return Err(AcquisitionError::unavailable(channel, "no radio attached"));
            }
            Slot::Released => {
                self.radio = Slot::Released;
                return Err(AcquisitionError::Released { channel });
            }
            Slot::Armed(task) => {
                let running = task.is_running();
                self.radio = Slot::Armed(task);
                if running {
                    return Ok(());
                }
                return Err(AcquisitionError::unavailable(channel, "radio channel stopped"));
            }
        };

        // Opening may wait on a permission prompt; teardown must not.
        let opened = self
            .session_cancel
            .run_until_cancelled(radio.open_session())
            .await;
        let Some(opened) = opened else {
            debug!(%channel, "Radio acquisition interrupted");
            self.radio = Slot::Idle(radio);
            return Err(AcquisitionError::Interrupted { channel });
        };
        if let Err(e) = opened {
            warn!(%channel, "Radio acquisition failed: {}", e);
            self.radio = Slot::Idle(radio);
            return Err(AcquisitionError::from_hardware(channel, e));
        }

        let cancel = self.session_cancel.child_token();
        let handle = tokio::spawn(radio::run(
            radio,
            SignalSender::new(self.signals.clone(), channel),
            self.state.clone(),
            cancel.clone(),
        ));
        self.radio = Slot::Armed(ChannelTask { cancel, handle });
        info!(%channel, "Radio session acquired");
        Ok(())
    }

    /// Check whether `channel` is currently armed.
    ///
    /// The manual channel owns no resource and is always armed.
    pub fn is_armed(&self, channel: Channel) -> bool {
        match channel {
            Channel::Optical => self.optical.is_armed(),
            Channel::Radio => self.radio.is_armed(),
            Channel::Manual => !self.released,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop every channel task and release both resources.
    ///
    /// The optical channel is stopped first, then the radio. Devices never
    /// opened are dropped. Calling this again returns an empty report.
    pub async fn release(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        if self.released {
            return report;
        }
        self.released = true;

        if let Slot::Armed(task) = std::mem::replace(&mut self.optical, Slot::Released) {
            report.stopped.push((Channel::Optical, task.stop(Channel::Optical).await));
        }
        if let Slot::Armed(task) = std::mem::replace(&mut self.radio, Slot::Released) {
            report.stopped.push((Channel::Radio, task.stop(Channel::Radio).await));
        }

        for (channel, termination) in &report.stopped {
            match termination {
                TaskTermination::Success => debug!(%channel, "Channel released"),
                TaskTermination::Error => warn!(%channel, "Channel had failed before release"),
                TaskTermination::Cancelled => warn!(%channel, "Channel task aborted"),
                TaskTermination::Panic => error!(%channel, "Channel task panicked"),
            }
        }
        info!(stopped = report.stopped.len(), "Resources released");
        report
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        // Without a release, tasks still get the signal to close their devices.
        self.optical.cancel();
        self.radio.cancel();
    }
}
