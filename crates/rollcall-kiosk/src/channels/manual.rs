//! Manual channel: operator-typed tokens.

use rollcall_core::{Channel, Token};
use tokio::sync::mpsc;
use tracing::debug;

use super::{ChannelSignal, SignalSender};
use crate::error::Result;

/// Keyboard entry point of a kiosk session.
///
/// Always available: it owns no device and cannot fail to arm. Whether a
/// submitted token is admitted is up to the arbitration gate.
#[derive(Debug, Clone)]
pub struct ManualChannel {
    signals: SignalSender,
}

impl ManualChannel {
    pub fn new(tx: mpsc::Sender<ChannelSignal>) -> Self {
        Self {
            signals: SignalSender::new(tx, Channel::Manual),
        }
    }

    /// Submit a typed token.
    ///
    /// # Errors
    ///
    /// - `Core(InvalidToken)` if `text` is not a valid token
    /// - `QueueFull` if the session is not keeping up
    /// - `SessionClosed` if the session has ended
    pub fn submit(&self, text: &str) -> Result<()> {
        let token = Token::new(text)?;
        debug!(token = %token, "Manual token submitted");
        self.signals.try_scan(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KioskError;

    #[tokio::test]
    async fn test_submit_trims_and_tags() {
        let (tx, mut rx) = mpsc::channel(4);
        let manual = ManualChannel::new(tx);

        manual.submit("  A1B2C3 \n").unwrap();
        match rx.recv().await.unwrap() {
            ChannelSignal::Scan(event) => {
                assert_eq!(event.token.as_str(), "A1B2C3");
                assert_eq!(event.channel, Channel::Manual);
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[test]
    fn test_submit_rejects_empty_input() {
        let (tx, _rx) = mpsc::channel(4);
        let manual = ManualChannel::new(tx);
        assert!(matches!(manual.submit("   "), Err(KioskError::Core(_))));
    }
}
