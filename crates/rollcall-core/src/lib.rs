//! Core domain types shared by the Rollcall kiosk crates.
//!
//! Everything the scan resolution engine passes between its components lives
//! here: credential [`Token`]s, the [`ScanEvent`] emitted by every input
//! channel, the read-only [`DirectoryEntry`] returned by the token directory,
//! and the classified [`ResolutionResult`].

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
