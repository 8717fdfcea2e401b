//! Runtime configuration for a kiosk session.

use rollcall_core::constants::{
    DEFAULT_DEBOUNCE_WINDOW_MS, DEFAULT_EVENT_BUFFER, DEFAULT_FEEDBACK_TIMEOUT_MS,
    DEFAULT_LOOKUP_TIMEOUT_MS, DEFAULT_MAX_CONSECUTIVE_FRAME_ERRORS, DEFAULT_OPTICAL_TICK_MS,
    DEFAULT_RESUME_DELAY_MS,
};
use rollcall_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and channel settings for a kiosk session.
///
/// Durations are stored as milliseconds so the structure maps one-to-one to
/// the JSON configuration file; use the accessors to get [`Duration`]s.
/// Missing fields take their defaults.
///
/// # Examples
///
/// ```
/// use rollcall_kiosk::KioskConfig;
/// use std::time::Duration;
///
/// let config = KioskConfig::default()
///     .resume_delay(Duration::from_secs(3))
///     .radio_on_start(true);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.resume_delay_duration(), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Minimum time between two admitted scans
    pub debounce_window_ms: u64,

    /// Time a non-success outcome stays on screen before the kiosk is ready again
    pub resume_delay_ms: u64,

    /// Interval between two optical decode ticks
    pub optical_tick_ms: u64,

    /// Upper bound on a single directory lookup
    pub lookup_timeout_ms: u64,

    /// Upper bound on success feedback before navigation proceeds anyway
    pub feedback_timeout_ms: u64,

    /// Consecutive failed frames before the optical channel gives up
    pub max_consecutive_frame_errors: u32,

    /// Capacity of the queue feeding the arbitration gate
    pub event_buffer: usize,

    /// Open the radio session at start instead of waiting for an operator gesture
    pub radio_on_start: bool,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW_MS,
            resume_delay_ms: DEFAULT_RESUME_DELAY_MS,
            optical_tick_ms: DEFAULT_OPTICAL_TICK_MS,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            feedback_timeout_ms: DEFAULT_FEEDBACK_TIMEOUT_MS,
            max_consecutive_frame_errors: DEFAULT_MAX_CONSECUTIVE_FRAME_ERRORS,
            event_buffer: DEFAULT_EVENT_BUFFER,
            radio_on_start: false,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl KioskConfig {
    /// Set the debounce window
    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window_ms = millis(window);
        self
    }

    /// Set the resume delay
    pub fn resume_delay(mut self, delay: Duration) -> Self {
        self.resume_delay_ms = millis(delay);
        self
    }

    /// Set the optical tick interval
    pub fn optical_tick(mut self, tick: Duration) -> Self {
        self.optical_tick_ms = millis(tick);
        self
    }

    /// Set the directory lookup timeout
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = millis(timeout);
        self
    }

    /// Set the success feedback timeout
    pub fn feedback_timeout(mut self, timeout: Duration) -> Self {
        self.feedback_timeout_ms = millis(timeout);
        self
    }

    /// Set the optical frame error budget
    pub fn max_consecutive_frame_errors(mut self, max: u32) -> Self {
        self.max_consecutive_frame_errors = max;
        self
    }

    /// Set the gate queue capacity
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Set whether the radio is armed at start
    pub fn radio_on_start(mut self, enabled: bool) -> Self {
        self.radio_on_start = enabled;
        self
    }

    pub fn debounce_window_duration(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    pub fn resume_delay_duration(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }

    pub fn optical_tick_duration(&self) -> Duration {
        Duration::from_millis(self.optical_tick_ms)
    }

    pub fn lookup_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn feedback_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_timeout_ms)
    }

    /// Check the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the optical tick, lookup timeout, frame
    /// error budget or event buffer is zero.
    pub fn validate(&self) -> Result<()> {
        if self.optical_tick_ms == 0 {
            return Err(Error::Config("optical_tick_ms must be positive".to_string()));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(Error::Config(
                "lookup_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_consecutive_frame_errors == 0 {
            return Err(Error::Config(
                "max_consecutive_frame_errors must be positive".to_string(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(Error::Config("event_buffer must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = KioskConfig::default();
        assert_eq!(config.debounce_window_duration(), Duration::from_millis(500));
        assert_eq!(config.resume_delay_duration(), Duration::from_millis(2000));
        assert_eq!(config.optical_tick_duration(), Duration::from_millis(100));
        assert_eq!(config.lookup_timeout_duration(), Duration::from_secs(5));
        assert_eq!(config.feedback_timeout_duration(), Duration::from_millis(300));
        assert!(!config.radio_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = KioskConfig::default()
            .debounce_window(Duration::from_millis(250))
            .optical_tick(Duration::from_millis(50))
            .event_buffer(8)
            .radio_on_start(true);

        assert_eq!(config.debounce_window_ms, 250);
        assert_eq!(config.optical_tick_ms, 50);
        assert_eq!(config.event_buffer, 8);
        assert!(config.radio_on_start);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: KioskConfig =
            serde_json::from_str(r#"{ "resume_delay_ms": 1500, "radio_on_start": true }"#)
                .unwrap();

        assert_eq!(config.resume_delay_ms, 1500);
        assert!(config.radio_on_start);
        assert_eq!(config.debounce_window_ms, DEFAULT_DEBOUNCE_WINDOW_MS);
    }

    #[rstest]
    #[case(KioskConfig::default().optical_tick(Duration::ZERO))]
    #[case(KioskConfig::default().lookup_timeout(Duration::ZERO))]
    #[case(KioskConfig::default().max_consecutive_frame_errors(0))]
    #[case(KioskConfig::default().event_buffer(0))]
    fn test_invalid_config(#[case] config: KioskConfig) {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_debounce_is_allowed() {
        let config = KioskConfig::default().debounce_window(Duration::ZERO);
        assert!(config.validate().is_ok());
    }
}
