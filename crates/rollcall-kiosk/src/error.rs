use rollcall_core::Channel;
use rollcall_hardware::HardwareError;
use thiserror::Error;

/// Failure to arm an input channel.
///
/// Fatal to that one channel only: the session keeps running on the
/// remaining channels, and the manual channel is always available.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The platform refused access to the device
    #[error("{channel} permission denied: {reason}")]
    PermissionDenied { channel: Channel, reason: String },

    /// No usable device for this channel
    #[error("{channel} unavailable: {reason}")]
    Unavailable { channel: Channel, reason: String },

    /// The device failed while being opened
    #[error("{channel} device error: {source}")]
    Device {
        channel: Channel,
        #[source]
        source: HardwareError,
    },

    /// Resources were already released for this session
    #[error("{channel} cannot be armed: session resources released")]
    Released { channel: Channel },

    /// The session was torn down while the device was being opened
    #[error("{channel} acquisition interrupted by teardown")]
    Interrupted { channel: Channel },
}

impl AcquisitionError {
    /// Classify a device error raised while opening `channel`.
    pub fn from_hardware(channel: Channel, error: HardwareError) -> Self {
        match error {
            HardwareError::PermissionDenied { device } => Self::PermissionDenied {
                channel,
                reason: device,
            },
            HardwareError::Unsupported { operation } => Self::Unavailable {
                channel,
                reason: format!("unsupported: {operation}"),
            },
            HardwareError::Disconnected { device } => Self::Unavailable {
                channel,
                reason: format!("disconnected: {device}"),
            },
            source => Self::Device { channel, source },
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(channel: Channel, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            channel,
            reason: reason.into(),
        }
    }

    /// Channel the acquisition was attempted for.
    pub fn channel(&self) -> Channel {
        match self {
            Self::PermissionDenied { channel, .. }
            | Self::Unavailable { channel, .. }
            | Self::Device { channel, .. }
            | Self::Released { channel }
            | Self::Interrupted { channel } => *channel,
        }
    }
}

/// Errors returned by the kiosk session handle.
#[derive(Debug, Error)]
pub enum KioskError {
    #[error(transparent)]
    Core(#[from] rollcall_core::Error),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// The session has ended; no further input is accepted
    #[error("Kiosk session closed")]
    SessionClosed,

    /// The gate queue is full; the input was dropped
    #[error("Scan queue full, input dropped")]
    QueueFull,
}

/// Result type alias for kiosk operations.
pub type Result<T> = std::result::Result<T, KioskError>;
