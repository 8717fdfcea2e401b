//! Radio channel: near-field tag reads to tokens.
//!
//! Event-driven, no polling. Tag reads are forwarded only while the kiosk
//! is `READY`; reads arriving while it processes are dropped here, before
//! they reach the queue. Read errors are logged and surfaced as a notice.

use rollcall_core::{ScanState, Token};
use rollcall_hardware::{AnyRadioDevice, RadioDevice, RadioNotification};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SignalSender;
use crate::messages::KioskMessages;

/// Forward notifications of an open radio session until cancelled or the
/// device fails. The session is closed on every exit path.
pub async fn run(
    mut radio: AnyRadioDevice,
    signals: SignalSender,
    state: watch::Receiver<ScanState>,
    cancel: CancellationToken,
) -> rollcall_hardware::Result<()> {
    info!("Radio channel armed");

    let outcome = loop {
        let notification = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Ok(()),
            notification = radio.next_notification() => notification,
        };

        match notification {
            Ok(RadioNotification::TagRead { payload, serial }) => {
                let ready = state.borrow().is_ready();
                if !ready {
                    debug!(serial = ?serial, "Tag read while processing, dropped");
                    continue;
                }

                match Token::new(&payload) {
                    Ok(token) => {
                        debug!(token = %token, serial = ?serial, "Radio tag read");
                        if !cancel
                            .run_until_cancelled(signals.scan(token))
                            .await
                            .unwrap_or(false)
                        {
                            break Ok(());
                        }
                    }
                    Err(e) => debug!(serial = ?serial, "Ignoring tag payload: {}", e),
                }
            }
            Ok(RadioNotification::ReadError { message }) => {
                warn!("Radio tag read error: {}", message);
                let notified = cancel
                    .run_until_cancelled(signals.notice(KioskMessages::TAG_READ_FAILED))
                    .await;
                if !notified.unwrap_or(false) {
                    break Ok(());
                }
            }
            Ok(other) => debug!(?other, "Unhandled radio notification"),
            Err(e) => {
                warn!("Radio channel failed: {}", e);
                cancel.run_until_cancelled(signals.fault(&e)).await;
                break Err(e);
            }
        }
    };

    if let Err(e) = radio.close_session().await {
        warn!("Failed to close radio session: {}", e);
    }
    info!("Radio channel stopped");
    outcome
}
