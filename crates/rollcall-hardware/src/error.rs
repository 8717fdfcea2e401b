//! Error types for hardware operations.
//!
//! This module defines error types specific to kiosk peripherals: camera
//! streams, near-field radio sessions, frame decoders and feedback devices.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// The platform refused access to the device (camera or NFC permission).
    #[error("Permission denied: {device}")]
    PermissionDenied { device: String },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Frame capture error.
    #[error("Frame capture error: {message}")]
    FrameCaptureError { message: String },

    /// Frame decoding error.
    #[error("Decode error: {message}")]
    DecodeError { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new permission denied error.
    pub fn permission_denied(device: impl Into<String>) -> Self {
        Self::PermissionDenied {
            device: device.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new frame capture error.
    pub fn frame_capture(message: impl Into<String>) -> Self {
        Self::FrameCaptureError {
            message: message.into(),
        }
    }

    /// Create a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeError {
            message: message.into(),
        }
    }

    /// Check if this error means the operation can never succeed on this
    /// device, as opposed to a transient failure.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::frame(HardwareError::frame_capture("sensor busy"), "Frame capture error: sensor busy")]
    #[case::decode(HardwareError::decode("blurry"), "Decode error: blurry")]
    #[case::init(HardwareError::initialization_failed("no driver"), "Initialization failed: no driver")]
    fn test_error_display(#[case] error: HardwareError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
        assert!(!error.is_unsupported());
    }

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("Front camera");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: Front camera");
    }

    #[test]
    fn test_permission_denied_error() {
        let error = HardwareError::permission_denied("camera");
        assert_eq!(error.to_string(), "Permission denied: camera");
    }

    #[test]
    fn test_unsupported_error() {
        let error = HardwareError::unsupported("native barcode detection");
        assert!(error.is_unsupported());
        assert_eq!(
            error.to_string(),
            "Unsupported operation: native barcode detection"
        );
        assert!(!HardwareError::decode("blurry").is_unsupported());
    }
}
