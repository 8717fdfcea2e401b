//! Input channel adapters.
//!
//! Each adapter normalizes its medium into [`ScanEvent`]s and pushes them,
//! together with faults and notices, into the one bounded queue the session
//! task drains. Adapters only *read* the scan state; they never change it.
//!
//! - [`optical`]: cooperative camera decode loop, one frame per tick, idle
//!   while the kiosk is not `READY`.
//! - [`radio`]: forwards tag reads from an open radio session.
//! - [`manual`]: synchronous submission of an operator-typed token.

pub mod manual;
pub mod optical;
pub mod radio;

pub use manual::ManualChannel;

use rollcall_core::{Channel, ScanEvent, ScanState, Token};
use tokio::sync::{mpsc, watch};
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{KioskError, Result};

/// Message from a channel adapter to the session task.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ChannelSignal {
    /// A credential was observed.
    Scan(ScanEvent),

    /// Something the operator should know about, not tied to a scan.
    Notice {
        channel: Channel,
        message: &'static str,
    },

    /// The adapter stopped because its device failed.
    ///
    /// The adapter task terminates right after sending this.
    Fault { channel: Channel, error: String },
}

/// Sending half of the gate queue, tagged with the adapter's channel.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::Sender<ChannelSignal>,
    channel: Channel,
}

impl SignalSender {
    pub fn new(tx: mpsc::Sender<ChannelSignal>, channel: Channel) -> Self {
        Self { tx, channel }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Emit a scan observed now.
    ///
    /// Returns `false` once the session task is gone.
    pub async fn scan(&self, token: Token) -> bool {
        let event = ScanEvent::new(token, self.channel);
        self.tx.send(ChannelSignal::Scan(event)).await.is_ok()
    }

    /// Emit a scan without waiting for queue capacity.
    ///
    /// # Errors
    ///
    /// - `QueueFull` if the session task is behind
    /// - `SessionClosed` if the session task is gone
    pub fn try_scan(&self, token: Token) -> Result<()> {
        let event = ScanEvent::new(token, self.channel);
        self.tx
            .try_send(ChannelSignal::Scan(event))
            .map_err(|e| match e {
                TrySendError::Full(_) => KioskError::QueueFull,
                TrySendError::Closed(_) => KioskError::SessionClosed,
            })
    }

    /// Surface an operator notice.
    pub async fn notice(&self, message: &'static str) -> bool {
        self.tx
            .send(ChannelSignal::Notice {
                channel: self.channel,
                message,
            })
            .await
            .is_ok()
    }

    /// Report that the adapter is stopping because of `error`.
    pub async fn fault(&self, error: &impl std::fmt::Display) {
        // The session may already be gone; nothing left to tell then.
        let _ = self
            .tx
            .send(ChannelSignal::Fault {
                channel: self.channel,
                error: error.to_string(),
            })
            .await;
    }
}

/// Wait until the kiosk is `READY`.
///
/// Returns `false` once the state publisher is gone, i.e. the session ended.
pub(crate) async fn wait_until_ready(state: &mut watch::Receiver<ScanState>) -> bool {
    if state.has_changed().is_err() {
        return false;
    }
    state.wait_for(ScanState::is_ready).await.is_ok()
}
