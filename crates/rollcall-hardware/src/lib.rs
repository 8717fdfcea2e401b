//! Hardware device abstraction layer for the Rollcall attendance kiosk.
//!
//! This crate provides trait-based abstractions for the peripherals a kiosk
//! scans credentials with and reports back through: the camera feeding QR
//! decoding, the near-field radio reader, and the speaker/vibration motor.
//! These traits allow mock implementations (for development and headless
//! testing) and real platform drivers to be swapped freely.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: Dynamic dispatch goes through the `Any*` wrappers in
//!   [`devices`] since async traits are not object-safe.
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>` with detailed error information.
//!
//! # Device Traits
//!
//! ## Cameras
//!
//! The [`CameraDevice`] trait represents a video source polled frame by frame:
//!
//! ```no_run
//! use rollcall_hardware::traits::CameraDevice;
//! use rollcall_hardware::error::Result;
//!
//! async fn frames_until_ready<C: CameraDevice>(camera: &mut C) -> Result<u32> {
//!     camera.open_stream().await?;
//!     let mut waited = 0;
//!     while camera.capture_frame().await?.is_none() {
//!         waited += 1;
//!     }
//!     Ok(waited)
//! }
//! ```
//!
//! ## Radio Readers
//!
//! The [`RadioDevice`] trait represents an event-driven near-field reader.
//! See [`traits::RadioDevice`] for a usage example.
//!
//! ## Frame Decoders
//!
//! The [`FrameDecoder`] trait turns a frame into a token.
//! [`DecoderChain`] pairs a preferred decoder with a fallback.
//!
//! ## Feedback
//!
//! The [`FeedbackDevice`] trait plays [`Tone`]s and [`HapticPattern`]s.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HardwareError`] error type.
//!
//! [`CameraDevice`]: traits::CameraDevice
//! [`RadioDevice`]: traits::RadioDevice
//! [`FrameDecoder`]: traits::FrameDecoder
//! [`FeedbackDevice`]: traits::FeedbackDevice

pub mod decoder;
pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use decoder::DecoderChain;
pub use devices::{AnyCameraDevice, AnyFeedbackDevice, AnyFrameDecoder, AnyRadioDevice};
pub use error::{HardwareError, Result};
pub use traits::{CameraDevice, FeedbackDevice, FrameDecoder, RadioDevice, RadioNotification};
pub use types::{DeviceInfo, Frame, HapticPattern, Tone};
