//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Rust Edition 2024) is not
//! object-safe, so `Box<dyn CameraDevice>` is not an option. The enums in
//! this module provide concrete type dispatch instead: zero-cost, type-safe,
//! and compatible with feature-gated hardware variants.
//!
//! # Examples
//!
//! ```
//! use rollcall_hardware::devices::AnyCameraDevice;
//! use rollcall_hardware::mock::MockCamera;
//!
//! let (camera, _handle) = MockCamera::new();
//! let any_camera = AnyCameraDevice::Mock(camera);
//!
//! // Can now be used polymorphically through the CameraDevice trait
//! ```

use crate::mock::{MockCamera, MockDecoder, MockFeedback, MockRadio};
use crate::traits::{CameraDevice, FeedbackDevice, FrameDecoder, RadioDevice, RadioNotification};
use crate::{DeviceInfo, Frame, HapticPattern, Result, Tone};

/// Enum wrapper for camera device dispatch.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::devices::AnyCameraDevice;
/// use rollcall_hardware::traits::CameraDevice;
/// use rollcall_hardware::mock::MockCamera;
///
/// #[tokio::main]
/// async fn main() -> rollcall_hardware::Result<()> {
///     let (camera, _handle) = MockCamera::new();
///     let any_camera = AnyCameraDevice::Mock(camera);
///
///     let info = any_camera.get_info().await?;
///     println!("Camera: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCameraDevice {
    /// Mock camera for development and testing.
    Mock(MockCamera),
    // Platform capture backends (V4L2, AVFoundation) become variants here,
    // each behind its `hardware-*` feature.
}

impl CameraDevice for AnyCameraDevice {
    async fn open_stream(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.open_stream().await,
        }
    }

    async fn capture_frame(&mut self) -> Result<Option<Frame>> {
        match self {
            Self::Mock(device) => device.capture_frame().await,
        }
    }

    async fn close_stream(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.close_stream().await,
        }
    }

    fn is_streaming(&self) -> bool {
        match self {
            Self::Mock(device) => device.is_streaming(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for near-field radio dispatch.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::devices::AnyRadioDevice;
/// use rollcall_hardware::traits::RadioDevice;
/// use rollcall_hardware::mock::MockRadio;
///
/// #[tokio::main]
/// async fn main() -> rollcall_hardware::Result<()> {
///     let (radio, _handle) = MockRadio::new();
///     let any_radio = AnyRadioDevice::Mock(radio);
///
///     let info = any_radio.get_info().await?;
///     println!("Radio: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRadioDevice {
    /// Mock radio for development and testing.
    Mock(MockRadio),
    // PC/SC readers become a variant here behind `hardware-pcsc`.
}

impl RadioDevice for AnyRadioDevice {
    async fn open_session(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.open_session().await,
        }
    }

    async fn next_notification(&mut self) -> Result<RadioNotification> {
        match self {
            Self::Mock(device) => device.next_notification().await,
        }
    }

    async fn close_session(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.close_session().await,
        }
    }

    fn is_session_open(&self) -> bool {
        match self {
            Self::Mock(device) => device.is_session_open(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for feedback device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyFeedbackDevice {
    /// Mock feedback device for development and testing.
    Mock(MockFeedback),
}

impl FeedbackDevice for AnyFeedbackDevice {
    async fn play_tone(&mut self, tone: Tone) -> Result<()> {
        match self {
            Self::Mock(device) => device.play_tone(tone).await,
        }
    }

    async fn pulse(&mut self, pattern: HapticPattern) -> Result<()> {
        match self {
            Self::Mock(device) => device.pulse(pattern).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for frame decoder dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyFrameDecoder {
    /// Mock decoder for development and testing.
    Mock(MockDecoder),
}

impl FrameDecoder for AnyFrameDecoder {
    fn decode(&mut self, frame: &Frame) -> Result<Option<String>> {
        match self {
            Self::Mock(decoder) => decoder.decode(frame),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Mock(decoder) => decoder.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_camera_device_mock() {
        let (camera, _handle) = MockCamera::new();
        let any_camera = AnyCameraDevice::Mock(camera);

        let info = any_camera.get_info().await.unwrap();
        assert_eq!(info.name, "Mock Camera");
        assert!(!any_camera.is_streaming());
    }

    #[tokio::test]
    async fn test_any_radio_device_mock() {
        let (radio, _handle) = MockRadio::new();
        let any_radio = AnyRadioDevice::Mock(radio);

        let info = any_radio.get_info().await.unwrap();
        assert_eq!(info.name, "Mock NFC Reader");
        assert!(!any_radio.is_session_open());
    }

    #[tokio::test]
    async fn test_any_feedback_device_mock() {
        let (feedback, handle) = MockFeedback::new();
        let mut any_feedback = AnyFeedbackDevice::Mock(feedback);

        any_feedback.play_tone(Tone::Success).await.unwrap();
        assert_eq!(handle.tones(), vec![Tone::Success]);
    }

    #[test]
    fn test_any_frame_decoder_mock() {
        let decoder = AnyFrameDecoder::Mock(MockDecoder::payload("software"));
        assert_eq!(decoder.name(), "software");
    }
}
