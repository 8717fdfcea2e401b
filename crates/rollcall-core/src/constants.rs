//! Core constants for the kiosk scan resolution engine.
//!
//! This module centralizes the timing defaults, credential limits and token
//! namespaces used by every Rollcall crate. Runtime configuration
//! (`rollcall_kiosk::KioskConfig`) starts from these values.
//!
//! # Timing model
//!
//! ```text
//!  admitted          admitted            resume timer fires
//!     │◄── debounce ──►│                         │
//! ────┼────────────────┼──── PROCESSING ─────────┼──── READY ────►
//!     t0            t0+500ms      ◄── resume delay (2000ms) ──►
//! ```
//!
//! # Usage
//!
//! ```
//! use rollcall_core::constants::*;
//! use std::time::Duration;
//!
//! let debounce = Duration::from_millis(DEFAULT_DEBOUNCE_WINDOW_MS);
//! assert!(debounce < Duration::from_millis(DEFAULT_RESUME_DELAY_MS));
//! ```

// ============================================================================
// Arbitration
// ============================================================================

/// Minimum time between two admitted scans (milliseconds).
///
/// Measured from the last *admitted* event. Rejected events never move the
/// window. Duplicate decodes of a single presentation (consecutive camera
/// frames, a tag re-broadcasting) collapse into one logical scan.
///
/// # Value: 500 ms
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 500;

/// Delay before the engine returns to `READY` after a non-success outcome
/// (milliseconds).
///
/// # Value: 2000 ms
pub const DEFAULT_RESUME_DELAY_MS: u64 = 2000;

// ============================================================================
// Channels
// ============================================================================

/// Interval between two optical decode ticks (milliseconds).
///
/// The optical channel decodes one frame per tick and yields in between.
///
/// # Value: 100 ms (10 frames per second)
pub const DEFAULT_OPTICAL_TICK_MS: u64 = 100;

/// Consecutive frame capture/decode failures tolerated before the optical
/// channel gives up and reports a channel fault.
///
/// # Value: 25 (2.5 s of failed frames at the default tick)
pub const DEFAULT_MAX_CONSECUTIVE_FRAME_ERRORS: u32 = 25;

/// Capacity of the queue feeding the arbitration gate.
///
/// # Value: 64 signals
pub const DEFAULT_EVENT_BUFFER: usize = 64;

// ============================================================================
// Resolution and Feedback
// ============================================================================

/// Upper bound on a single directory lookup (milliseconds).
///
/// A lookup exceeding this bound resolves as `LookupFailed`.
///
/// # Value: 5000 ms
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5000;

/// Upper bound on tone + haptic feedback before navigation proceeds anyway
/// (milliseconds).
///
/// # Value: 300 ms
pub const DEFAULT_FEEDBACK_TIMEOUT_MS: u64 = 300;

/// Maximum length of an operator-facing notice, in characters.
///
/// Kiosk banners are rendered on a single line.
pub const MAX_NOTICE_LENGTH: usize = 40;

// ============================================================================
// Credentials
// ============================================================================

/// Maximum accepted token length, in bytes.
///
/// Anything longer is not a credential (e.g. a URL QR code held up by
/// mistake) and is rejected before it reaches the directory.
pub const MAX_TOKEN_LENGTH: usize = 128;

/// Conventional prefix of tokens printed as QR codes.
///
/// Cosmetic only: resolution never looks at the prefix.
pub const OPTICAL_TOKEN_PREFIX: &str = "qr_";

/// Conventional prefix of tokens written to near-field tags.
///
/// Cosmetic only: resolution never looks at the prefix.
pub const RADIO_TOKEN_PREFIX: &str = "nfc_";

// ============================================================================
// Navigation
// ============================================================================

/// Route shown after a student credential resolves.
pub const STUDENT_ROUTE: &str = "/kiosk/student";

/// Route shown after a teacher credential resolves.
pub const TEACHER_ROUTE: &str = "/kiosk/teacher";
