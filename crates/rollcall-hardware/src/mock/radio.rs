//! Mock near-field radio implementation for testing and development.
//!
//! Tags are "tapped" through [`MockRadioHandle`]. A tap only reaches the
//! reader while a session is open, mirroring platforms that drop reads when
//! nobody is listening.

use crate::{
    HardwareError, Result,
    traits::{RadioDevice, RadioNotification},
    types::DeviceInfo,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Shared {
    session_open: AtomicBool,
    permission_denied: AtomicBool,
    unsupported: AtomicBool,
    open_count: AtomicU32,
    /// Time an open takes, in milliseconds (a pending permission prompt)
    open_latency_ms: AtomicU64,
}

/// Mock near-field radio reader for testing and development.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::mock::MockRadio;
/// use rollcall_hardware::traits::{RadioDevice, RadioNotification};
///
/// #[tokio::main]
/// async fn main() -> rollcall_hardware::Result<()> {
///     let (mut radio, handle) = MockRadio::new();
///
///     radio.open_session().await?;
///     handle.tap("nfc_001").await?;
///
///     let notification = radio.next_notification().await?;
///     assert!(matches!(notification, RadioNotification::TagRead { .. }));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRadio {
    /// Channel receiver for tag notifications
    notification_rx: mpsc::Receiver<RadioNotification>,

    shared: Arc<Shared>,

    /// Device name
    name: String,
}

impl MockRadio {
    /// Create a new mock radio with the default name.
    pub fn new() -> (Self, MockRadioHandle) {
        Self::with_name("Mock NFC Reader".to_string())
    }

    /// Create a new mock radio with a custom name.
    pub fn with_name(name: String) -> (Self, MockRadioHandle) {
        let (notification_tx, notification_rx) = mpsc::channel(32);
        let shared = Arc::new(Shared::default());

        let radio = Self {
            notification_rx,
            shared: Arc::clone(&shared),
            name: name.clone(),
        };

        let handle = MockRadioHandle {
            notification_tx,
            shared,
            name,
        };

        (radio, handle)
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new().0
    }
}

impl RadioDevice for MockRadio {
    async fn open_session(&mut self) -> Result<()> {
        let latency = self.shared.open_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.shared.unsupported.load(Ordering::SeqCst) {
            return Err(HardwareError::unsupported("near-field radio"));
        }
        if self.shared.permission_denied.load(Ordering::SeqCst) {
            return Err(HardwareError::permission_denied(self.name.clone()));
        }

        self.shared.session_open.store(true, Ordering::SeqCst);
        self.shared.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_notification(&mut self) -> Result<RadioNotification> {
        if !self.shared.session_open.load(Ordering::SeqCst) {
            return Err(HardwareError::disconnected(format!(
                "{}: no open session",
                self.name
            )));
        }

        self.notification_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("Radio notification channel closed"))
    }

    async fn close_session(&mut self) -> Result<()> {
        self.shared.session_open.store(false, Ordering::SeqCst);
        // Reads queued for the closed session are never delivered.
        while self.notification_rx.try_recv().is_ok() {}
        Ok(())
    }

    fn is_session_open(&self) -> bool {
        self.shared.session_open.load(Ordering::SeqCst)
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock NFC v1.0").with_firmware_version("1.0.0"))
    }
}

/// Handle for controlling a mock radio.
#[derive(Debug, Clone)]
pub struct MockRadioHandle {
    notification_tx: mpsc::Sender<RadioNotification>,
    shared: Arc<Shared>,
    name: String,
}

impl MockRadioHandle {
    /// Tap a tag carrying `payload` on the reader.
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` if no session is open or the reader was
    /// dropped.
    pub async fn tap(&self, payload: &str) -> Result<()> {
        self.notify(RadioNotification::TagRead {
            payload: payload.to_string(),
            serial: None,
        })
        .await
    }

    /// Simulate a tag that entered the field but could not be read.
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` if no session is open or the reader was
    /// dropped.
    pub async fn fail_read(&self, message: &str) -> Result<()> {
        self.notify(RadioNotification::ReadError {
            message: message.to_string(),
        })
        .await
    }

    async fn notify(&self, notification: RadioNotification) -> Result<()> {
        if !self.shared.session_open.load(Ordering::SeqCst) {
            return Err(HardwareError::disconnected(format!(
                "{}: no open session",
                self.name
            )));
        }

        self.notification_tx
            .send(notification)
            .await
            .map_err(|_| HardwareError::disconnected("Radio notification channel closed"))
    }

    /// Make future session opens fail with a permission error.
    pub fn deny_permission(&self) {
        self.shared.permission_denied.store(true, Ordering::SeqCst);
    }

    /// Delay future session opens, as a permission prompt nobody answers
    /// yet would.
    pub fn set_open_latency(&self, latency: Duration) {
        self.shared
            .open_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make future session opens fail because the platform has no radio.
    pub fn set_unsupported(&self) {
        self.shared.unsupported.store(true, Ordering::SeqCst);
    }

    /// Check whether a session is open.
    pub fn is_session_open(&self) -> bool {
        self.shared.session_open.load(Ordering::SeqCst)
    }

    /// Number of times a session was opened.
    pub fn open_count(&self) -> u32 {
        self.shared.open_count.load(Ordering::SeqCst)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_radio_tap_and_read() {
        let (mut radio, handle) = MockRadio::new();
        radio.open_session().await.unwrap();

        handle.tap("nfc_001").await.unwrap();
        handle.fail_read("tag moved").await.unwrap();

        assert_eq!(
            radio.next_notification().await.unwrap(),
            RadioNotification::TagRead {
                payload: "nfc_001".to_string(),
                serial: None
            }
        );
        assert!(matches!(
            radio.next_notification().await.unwrap(),
            RadioNotification::ReadError { .. }
        ));
    }

    #[tokio::test]
    async fn test_mock_radio_tap_without_session() {
        let (_radio, handle) = MockRadio::new();
        assert!(handle.tap("nfc_001").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_radio_closed_session_drops_pending() {
        let (mut radio, handle) = MockRadio::new();
        radio.open_session().await.unwrap();
        handle.tap("nfc_001").await.unwrap();

        radio.close_session().await.unwrap();
        assert!(!handle.is_session_open());
        assert!(radio.next_notification().await.is_err());

        radio.open_session().await.unwrap();
        handle.tap("nfc_002").await.unwrap();
        assert_eq!(
            radio.next_notification().await.unwrap(),
            RadioNotification::TagRead {
                payload: "nfc_002".to_string(),
                serial: None
            }
        );
        assert_eq!(handle.open_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_radio_permission_and_support() {
        let (mut radio, handle) = MockRadio::new();
        handle.deny_permission();
        assert!(matches!(
            radio.open_session().await,
            Err(HardwareError::PermissionDenied { .. })
        ));

        let (mut radio, handle) = MockRadio::new();
        handle.set_unsupported();
        assert!(matches!(
            radio.open_session().await,
            Err(HardwareError::Unsupported { .. })
        ));
    }
}
