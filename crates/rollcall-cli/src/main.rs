//! Headless kiosk runner.
//!
//! Runs one kiosk session on mock devices and drives it from stdin. Session
//! events are printed to stdout as JSON lines; logs go to stderr.
//!
//! # Input
//!
//! - `qr:<token>`: hold a code in front of the camera
//! - `clear`: take the code away from the camera
//! - `nfc:<token>`: tap a tag on the radio reader
//! - `radio`: activate the radio reader (operator gesture)
//! - `quit`: tear the session down
//! - anything else: type it on the manual channel
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter (default `info`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rollcall_directory::InMemoryDirectory;
use rollcall_hardware::mock::{
    MockCamera, MockCameraHandle, MockDecoder, MockFeedback, MockRadio, MockRadioHandle,
};
use rollcall_hardware::{
    AnyCameraDevice, AnyFeedbackDevice, AnyFrameDecoder, AnyRadioDevice, DecoderChain,
};
use rollcall_kiosk::{KioskConfig, KioskDevices, KioskEngine, KioskHandle, Route, SessionEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directory used when no seed file is given.
const DEMO_DIRECTORY: &str = r#"{
    "entries": [
        {"token": "qr_011", "kind": "student", "entity_id": 11},
        {"token": "nfc_001", "kind": "student", "entity_id": 1},
        {"token": "qr_007", "kind": "teacher", "entity_id": 7},
        {"token": "nfc_042", "kind": "teacher", "entity_id": 42, "status": "revoked"}
    ]
}"#;

/// Rollcall kiosk - headless credential scan session
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(version, about, long_about = None)]
struct Args {
    /// Kiosk configuration file (JSON)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Token directory seed file (JSON); a small demo directory otherwise
    #[arg(short, long, value_name = "PATH")]
    directory: Option<PathBuf>,

    /// Arm the radio reader at start instead of waiting for `radio`
    #[arg(long)]
    radio_on_start: bool,

    /// Simulate a camera the platform refuses access to
    #[arg(long)]
    deny_camera: bool,
}

struct MockControls {
    camera: MockCameraHandle,
    radio: MockRadioHandle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = load_config(args.config.as_ref()).await?;
    if args.radio_on_start {
        config = config.radio_on_start(true);
    }

    let directory = load_directory(args.directory.as_ref()).await?;
    info!(entries = directory.len(), "Token directory loaded");

    let router = |route: Route| info!(route = %route, "Navigating away from kiosk");
    let engine = KioskEngine::new(config, Arc::new(directory), router)
        .context("Invalid kiosk configuration")?;
    let events = engine.subscribe();

    let (devices, controls) = mock_devices(args.deny_camera);
    let mut kiosk = engine.start(devices);
    info!(session = %kiosk.session_id(), "Kiosk session started");

    let mut printer = tokio::spawn(print_events(events));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = &mut printer => break,
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if !handle_line(line.trim(), &kiosk, &controls).await {
                    break;
                }
            }
        }
    }

    let summary = kiosk.teardown().await;
    println!(
        "{}",
        serde_json::to_string(&summary).context("Failed to encode session summary")?
    );
    Ok(())
}

/// Apply one input line. Returns `false` when the operator quits.
async fn handle_line(line: &str, kiosk: &KioskHandle, controls: &MockControls) -> bool {
    if line.is_empty() {
        return true;
    }

    if let Some(token) = line.strip_prefix("qr:") {
        controls.camera.present(token.trim());
    } else if let Some(token) = line.strip_prefix("nfc:") {
        if let Err(e) = controls.radio.tap(token.trim()).await {
            warn!("Tag not delivered: {}", e);
        }
    } else {
        match line {
            "quit" | "exit" => return false,
            "clear" => controls.camera.clear(),
            "radio" => {
                if let Err(e) = kiosk.activate_radio().await {
                    warn!("Radio not armed: {}", e);
                }
            }
            text => {
                if let Err(e) = kiosk.submit_manual(text) {
                    warn!("Manual entry rejected: {}", e);
                }
            }
        }
    }
    true
}

/// Print session events as JSON lines until the session closes.
async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                match serde_json::to_string(&event) {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!("Failed to encode session event: {}", e),
                }
                if matches!(event, SessionEvent::Closed { .. }) {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event printer lagging");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn load_config(path: Option<&PathBuf>) -> Result<KioskConfig> {
    let Some(path) = path else {
        return Ok(KioskConfig::default());
    };

    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

async fn load_directory(path: Option<&PathBuf>) -> Result<InMemoryDirectory> {
    match path {
        Some(path) => InMemoryDirectory::from_json_file(path)
            .await
            .with_context(|| format!("Failed to load directory {}", path.display())),
        None => InMemoryDirectory::from_json_str(DEMO_DIRECTORY)
            .context("Built-in demo directory is invalid"),
    }
}

fn mock_devices(deny_camera: bool) -> (KioskDevices, MockControls) {
    let (camera, camera_handle) = if deny_camera {
        MockCamera::denied()
    } else {
        MockCamera::new()
    };
    let (radio, radio_handle) = MockRadio::new();
    let (feedback, _feedback_handle) = MockFeedback::new();

    let devices = KioskDevices::new()
        .with_camera(
            AnyCameraDevice::Mock(camera),
            DecoderChain::new(
                AnyFrameDecoder::Mock(MockDecoder::unsupported("native")),
                AnyFrameDecoder::Mock(MockDecoder::payload("software")),
            ),
        )
        .with_radio(AnyRadioDevice::Mock(radio))
        .with_feedback(AnyFeedbackDevice::Mock(feedback));

    (
        devices,
        MockControls {
            camera: camera_handle,
            radio: radio_handle,
        },
    )
}
