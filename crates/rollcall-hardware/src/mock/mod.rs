//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware.

pub mod camera;
pub mod decoder;
pub mod feedback;
pub mod radio;

// Re-export commonly used types
pub use camera::{MockCamera, MockCameraHandle};
pub use decoder::MockDecoder;
pub use feedback::{FeedbackSignal, MockFeedback, MockFeedbackHandle};
pub use radio::{MockRadio, MockRadioHandle};
