//! Common types shared across hardware device implementations.
//!
//! This module defines types used by multiple device traits, such as
//! device information, captured camera frames, and feedback signals.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generic device information.
///
/// Contains metadata about a hardware device such as name, model,
/// serial number, and firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Front camera", "Mock NFC Reader").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional device serial number.
    pub serial_number: Option<String>,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            serial_number: None,
            firmware_version: None,
        }
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// A single camera frame handed to a decoder.
///
/// `data` is the raw luminance plane for real cameras. Decoders own the
/// interpretation; the optical channel never inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Frame pixel data.
    pub data: Bytes,

    /// When the frame was captured.
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Create a frame captured now.
    pub fn new(width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            captured_at: Utc::now(),
        }
    }

    /// Check if the frame carries no pixel data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Audible tones emitted by the kiosk speaker.
///
/// Each outcome class has its own tone so an operator can tell results
/// apart without looking at the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Tone {
    /// Short high beep: credential recognized.
    Success,

    /// Two low beeps: credential unknown or directory unavailable.
    Warning,

    /// Long low buzz: credential revoked.
    Denied,
}

impl Tone {
    /// Tone frequency in hertz.
    pub fn frequency_hz(&self) -> u32 {
        match self {
            Self::Success => 880,
            Self::Warning => 440,
            Self::Denied => 220,
        }
    }

    /// Tone duration.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Success => Duration::from_millis(150),
            Self::Warning => Duration::from_millis(250),
            Self::Denied => Duration::from_millis(400),
        }
    }
}

/// Haptic feedback patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum HapticPattern {
    /// A single pulse of the given length in milliseconds.
    Pulse(u16),
}

impl HapticPattern {
    /// Total vibration time of the pattern.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Pulse(ms) => Duration::from_millis(u64::from(*ms)),
        }
    }
}
