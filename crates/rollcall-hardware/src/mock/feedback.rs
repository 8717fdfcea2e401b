//! Mock feedback device implementation for testing and development.
//!
//! Records every tone and haptic pulse so tests can assert which feedback an
//! outcome produced.

use crate::{
    HardwareError, Result,
    traits::FeedbackDevice,
    types::{DeviceInfo, HapticPattern, Tone},
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A feedback signal emitted by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSignal {
    Tone(Tone),
    Haptic(HapticPattern),
}

#[derive(Debug, Default)]
struct Shared {
    signals: Mutex<Vec<FeedbackSignal>>,
    failing: AtomicBool,
    latency_ms: AtomicU64,
}

impl Shared {
    fn record(&self, signal: FeedbackSignal) {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);
    }

    fn snapshot(&self) -> Vec<FeedbackSignal> {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn simulate(&self, operation: &str) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(HardwareError::unsupported(operation.to_string()));
        }
        Ok(())
    }
}

/// Mock speaker + vibration motor.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::mock::{FeedbackSignal, MockFeedback};
/// use rollcall_hardware::traits::FeedbackDevice;
/// use rollcall_hardware::types::Tone;
///
/// #[tokio::main]
/// async fn main() -> rollcall_hardware::Result<()> {
///     let (mut feedback, handle) = MockFeedback::new();
///     feedback.play_tone(Tone::Success).await?;
///     assert_eq!(handle.signals(), vec![FeedbackSignal::Tone(Tone::Success)]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockFeedback {
    shared: Arc<Shared>,
    name: String,
}

impl MockFeedback {
    /// Create a new mock feedback device.
    pub fn new() -> (Self, MockFeedbackHandle) {
        let shared = Arc::new(Shared::default());
        let name = "Mock Feedback".to_string();

        let device = Self {
            shared: Arc::clone(&shared),
            name,
        };

        (device, MockFeedbackHandle { shared })
    }
}

impl Default for MockFeedback {
    fn default() -> Self {
        Self::new().0
    }
}

impl FeedbackDevice for MockFeedback {
    async fn play_tone(&mut self, tone: Tone) -> Result<()> {
        self.shared.simulate("tone playback").await?;
        self.shared.record(FeedbackSignal::Tone(tone));
        Ok(())
    }

    async fn pulse(&mut self, pattern: HapticPattern) -> Result<()> {
        self.shared.simulate("haptic pulse").await?;
        self.shared.record(FeedbackSignal::Haptic(pattern));
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Feedback v1.0"))
    }
}

/// Handle for inspecting and controlling a mock feedback device.
#[derive(Debug, Clone)]
pub struct MockFeedbackHandle {
    shared: Arc<Shared>,
}

impl MockFeedbackHandle {
    /// All signals emitted so far, oldest first.
    pub fn signals(&self) -> Vec<FeedbackSignal> {
        self.shared.snapshot()
    }

    /// Tones emitted so far, oldest first.
    pub fn tones(&self) -> Vec<Tone> {
        self.signals()
            .into_iter()
            .filter_map(|signal| match signal {
                FeedbackSignal::Tone(tone) => Some(tone),
                FeedbackSignal::Haptic(_) => None,
            })
            .collect()
    }

    /// Make every future operation fail.
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every future operation by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.shared.latency_ms.store(ms, Ordering::SeqCst);
    }
}
