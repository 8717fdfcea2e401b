//! Optical channel: camera frames to tokens.
//!
//! The loop is cooperative and self-rescheduling. Each tick it waits until
//! the kiosk is `READY`, captures one frame, decodes it, emits any token and
//! sleeps for one tick. Nothing is captured while the kiosk is processing.
//!
//! Capture and decode failures are tolerated up to a budget of consecutive
//! failed frames; exhausting it reports a channel fault and stops the loop.

use std::time::Duration;

use rollcall_core::{ScanState, Token};
use rollcall_hardware::{AnyCameraDevice, CameraDevice, DecoderChain, HardwareError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{SignalSender, wait_until_ready};

/// Camera and decoders driving the optical channel.
#[derive(Debug)]
pub struct OpticalDevices {
    pub camera: AnyCameraDevice,
    pub decoder: DecoderChain,
}

impl OpticalDevices {
    pub fn new(camera: AnyCameraDevice, decoder: DecoderChain) -> Self {
        Self { camera, decoder }
    }
}

/// Loop settings.
#[derive(Debug, Clone, Copy)]
pub struct OpticalSettings {
    pub tick: Duration,
    pub max_consecutive_errors: u32,
}

/// Run the decode loop until cancelled, the session goes away or the error
/// budget is exhausted. The stream must already be open; it is closed on
/// every exit path.
pub async fn run(
    mut devices: OpticalDevices,
    signals: SignalSender,
    mut state: watch::Receiver<ScanState>,
    cancel: CancellationToken,
    settings: OpticalSettings,
) -> rollcall_hardware::Result<()> {
    info!(decoder = devices.decoder.active_decoder(), "Optical channel armed");
    let mut consecutive_errors = 0u32;

    let outcome = loop {
        let ready = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Ok(()),
            ready = wait_until_ready(&mut state) => ready,
        };
        if !ready {
            debug!("Scan state closed, stopping optical channel");
            break Ok(());
        }

        match capture_token(&mut devices).await {
            Ok(Some(token)) => {
                consecutive_errors = 0;
                debug!(token = %token, "Optical token decoded");
                if !cancel
                    .run_until_cancelled(signals.scan(token))
                    .await
                    .unwrap_or(false)
                {
                    break Ok(());
                }
            }
            Ok(None) => consecutive_errors = 0,
            Err(e) => {
                consecutive_errors += 1;
                trace!(consecutive_errors, "Optical frame failed: {}", e);
                if consecutive_errors >= settings.max_consecutive_errors {
                    warn!(
                        consecutive_errors,
                        "Optical frame error budget exhausted: {}", e
                    );
                    cancel.run_until_cancelled(signals.fault(&e)).await;
                    break Err(e);
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break Ok(()),
            _ = tokio::time::sleep(settings.tick) => {}
        }
    };

    if let Err(e) = devices.camera.close_stream().await {
        warn!("Failed to close camera stream: {}", e);
    }
    info!("Optical channel stopped");
    outcome
}

/// Capture one frame and decode it.
///
/// A frame that is not ready yet or carries no code yields `Ok(None)`, as
/// does a decoded payload that is not a valid token.
async fn capture_token(devices: &mut OpticalDevices) -> Result<Option<Token>, HardwareError> {
    let Some(frame) = devices.camera.capture_frame().await? else {
        return Ok(None);
    };

    let Some(text) = devices.decoder.decode(&frame)? else {
        return Ok(None);
    };

    match Token::new(&text) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            debug!("Ignoring decoded payload: {}", e);
            Ok(None)
        }
    }
}
