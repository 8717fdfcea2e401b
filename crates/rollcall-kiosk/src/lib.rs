//! Rollcall kiosk engine.
//!
//! Turns credential scans from a camera, a near-field radio reader and a
//! keyboard into exactly one resolved identity per kiosk session. Scans
//! from every channel meet at one arbitration gate, are resolved against a
//! token directory, and either navigate away (a recognized student or
//! teacher) or show a message and return the kiosk to `READY`.

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod messages;
pub mod resolver;
pub mod session;
pub mod state_machine;

pub use channels::{ChannelSignal, ManualChannel, SignalSender};
pub use config::KioskConfig;
pub use dispatch::{Dispatcher, Route, Router};
pub use error::{AcquisitionError, KioskError, Result};
pub use gate::{Admission, ArbitrationGate};
pub use lifecycle::{KioskDevices, ReleaseReport, ResourceManager, TaskTermination};
pub use messages::KioskMessages;
pub use resolver::{Resolver, classify};
pub use session::{EndReason, KioskEngine, KioskHandle, SessionEvent, SessionSummary};
pub use state_machine::{ScanStateMachine, StateTransition};

// Scan state lives in core; re-exported so UI code needs one import.
pub use rollcall_core::ScanState;
