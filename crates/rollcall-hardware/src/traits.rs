//! Hardware device trait definitions.
//!
//! This module defines the contract between the kiosk scan engine and its
//! peripherals: the camera feeding the optical channel, the near-field radio
//! feeding the radio channel, the frame decoders turning camera frames into
//! tokens, and the speaker/vibration motor used for feedback.
//!
//! All device traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), eliminating the need for the `async_trait` macro. Dynamic
//! dispatch goes through the enum wrappers in [`devices`](crate::devices).

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, Frame, HapticPattern, Tone};

/// Camera device abstraction.
///
/// A camera is acquired by opening its stream (which is where platform
/// permission checks surface), polled one frame at a time by the optical
/// channel, and released by closing the stream.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the
/// [`AnyCameraDevice`](crate::devices::AnyCameraDevice) enum wrapper for
/// concrete type dispatch.
///
/// # Examples
///
/// ```no_run
/// use rollcall_hardware::traits::CameraDevice;
/// use rollcall_hardware::error::Result;
///
/// async fn grab_one<C: CameraDevice>(camera: &mut C) -> Result<bool> {
///     camera.open_stream().await?;
///     let frame = camera.capture_frame().await?;
///     camera.close_stream().await?;
///     Ok(frame.is_some())
/// }
/// ```
pub trait CameraDevice: Send + Sync {
    /// Open the video stream.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The platform denies camera access (`PermissionDenied`)
    /// - No camera is attached (`Disconnected`)
    /// - The stream cannot be configured (`InitializationFailed`)
    async fn open_stream(&mut self) -> Result<()>;

    /// Capture the current frame.
    ///
    /// Returns `Ok(None)` while the stream is open but has no frame ready
    /// yet (e.g. during camera warm-up).
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not open or the capture fails.
    async fn capture_frame(&mut self) -> Result<Option<Frame>>;

    /// Stop the video stream and release the camera.
    ///
    /// Closing a stream that is not open is a no-op.
    async fn close_stream(&mut self) -> Result<()>;

    /// Check whether the stream is currently open.
    fn is_streaming(&self) -> bool;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Frame decoder abstraction.
///
/// Decoding is CPU work on a frame already in memory, so it is synchronous.
pub trait FrameDecoder: Send + Sync {
    /// Decode a token from the frame.
    ///
    /// Returns `Ok(None)` when the frame contains no readable code.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if this decoder cannot run on the current
    /// platform at all, or `DecodeError` for a frame-level failure.
    fn decode(&mut self, frame: &Frame) -> Result<Option<String>>;

    /// Human-readable decoder name, for logs.
    fn name(&self) -> &str;
}

/// Notification delivered by an open radio session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RadioNotification {
    /// A tag was read and its text payload decoded.
    TagRead {
        /// Text record stored on the tag.
        payload: String,

        /// Tag serial number, if the platform exposes it.
        serial: Option<String>,
    },

    /// A tag was detected but could not be read.
    ReadError {
        /// Platform-provided reason.
        message: String,
    },
}

/// Near-field radio reader abstraction.
///
/// The radio is event-driven: once a session is open, notifications arrive
/// whenever a tag enters the field. [`next_notification`] awaits the next
/// one; there is no polling.
///
/// [`next_notification`]: RadioDevice::next_notification
///
/// # Examples
///
/// ```no_run
/// use rollcall_hardware::traits::{RadioDevice, RadioNotification};
/// use rollcall_hardware::error::Result;
///
/// async fn first_tag<R: RadioDevice>(radio: &mut R) -> Result<String> {
///     radio.open_session().await?;
///     loop {
///         if let RadioNotification::TagRead { payload, .. } = radio.next_notification().await? {
///             radio.close_session().await?;
///             return Ok(payload);
///         }
///     }
/// }
/// ```
pub trait RadioDevice: Send + Sync {
    /// Open a scanning session.
    ///
    /// On most platforms this must follow an explicit operator gesture.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The platform denies radio access (`PermissionDenied`)
    /// - The platform has no radio (`Unsupported`)
    async fn open_session(&mut self) -> Result<()>;

    /// Wait for the next notification of the open session.
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` if the session is not open or was closed
    /// underneath the caller.
    async fn next_notification(&mut self) -> Result<RadioNotification>;

    /// Close the session; no notifications are delivered afterwards.
    ///
    /// Closing a session that is not open is a no-op.
    async fn close_session(&mut self) -> Result<()>;

    /// Check whether a session is currently open.
    fn is_session_open(&self) -> bool;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Audible and haptic feedback abstraction.
///
/// Feedback is best-effort: callers log failures and move on.
pub trait FeedbackDevice: Send + Sync {
    /// Play a tone.
    ///
    /// # Errors
    ///
    /// Returns an error if the device has no speaker or playback fails.
    async fn play_tone(&mut self, tone: Tone) -> Result<()>;

    /// Vibrate with the given pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the device has no vibration motor.
    async fn pulse(&mut self, pattern: HapticPattern) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
