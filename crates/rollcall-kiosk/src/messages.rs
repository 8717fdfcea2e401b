//! Operator-facing notices.
//!
//! Kiosk banners are a single line: every message is ASCII and at most
//! [`MAX_NOTICE_LENGTH`](rollcall_core::constants::MAX_NOTICE_LENGTH)
//! characters.
//!
//! ```
//! use rollcall_core::ResolutionResult;
//! use rollcall_kiosk::messages::KioskMessages;
//!
//! assert_eq!(
//!     KioskMessages::for_result(&ResolutionResult::Unknown),
//!     "Credential not recognized"
//! );
//! ```

use rollcall_core::ResolutionResult;

/// Notices shown on the kiosk banner.
pub struct KioskMessages;

impl KioskMessages {
    /// Shown while every armed channel is listening
    pub const READY: &'static str = "Scan your code or tag";

    /// Token not found in the directory
    pub const UNKNOWN: &'static str = "Credential not recognized";

    /// Credential exists but was revoked
    pub const REVOKED: &'static str = "Credential revoked - see office";

    /// Directory unreachable or too slow
    pub const LOOKUP_FAILED: &'static str = "Directory unavailable - try again";

    /// Student credential recognized
    pub const WELCOME_STUDENT: &'static str = "Welcome, student";

    /// Teacher credential recognized
    pub const WELCOME_TEACHER: &'static str = "Welcome, teacher";

    /// A tag entered the field but could not be read
    pub const TAG_READ_FAILED: &'static str = "Tag not read - hold it still";

    /// Camera could not be armed
    pub const CAMERA_UNAVAILABLE: &'static str = "Camera unavailable - use tag or keys";

    /// Radio could not be armed
    pub const RADIO_UNAVAILABLE: &'static str = "NFC unavailable - use code or keys";

    /// Notice for a classified outcome.
    pub fn for_result(result: &ResolutionResult) -> &'static str {
        match result {
            ResolutionResult::Unknown => Self::UNKNOWN,
            ResolutionResult::Revoked => Self::REVOKED,
            ResolutionResult::LookupFailed => Self::LOOKUP_FAILED,
            ResolutionResult::Student(_) => Self::WELCOME_STUDENT,
            ResolutionResult::Teacher(_) => Self::WELCOME_TEACHER,
        }
    }
}
