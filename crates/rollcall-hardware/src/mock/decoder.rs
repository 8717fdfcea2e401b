//! Mock frame decoders.
//!
//! Mock cameras put the code text directly into the frame data, so the
//! payload decoder simply reads it back. The other behaviours exist to
//! exercise [`DecoderChain`](crate::decoder::DecoderChain) fallback rules.

use crate::{HardwareError, Result, traits::FrameDecoder, types::Frame};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Behaviour {
    /// Read the frame data as UTF-8 text.
    Payload,
    /// Always report the given text.
    Fixed(String),
    /// Always report `Unsupported`.
    Unsupported,
    /// Always report a decode error.
    Failing,
}

/// Mock frame decoder.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::mock::MockDecoder;
/// use rollcall_hardware::traits::FrameDecoder;
/// use rollcall_hardware::types::Frame;
///
/// let mut decoder = MockDecoder::payload("software");
/// let frame = Frame::new(1, 1, &b"qr_011"[..]);
/// assert_eq!(decoder.decode(&frame).unwrap(), Some("qr_011".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct MockDecoder {
    name: String,
    behaviour: Behaviour,
    decode_calls: u64,
}

impl MockDecoder {
    fn with_behaviour(name: impl Into<String>, behaviour: Behaviour) -> Self {
        Self {
            name: name.into(),
            behaviour,
            decode_calls: 0,
        }
    }

    /// Decoder that reads the frame data back as text.
    pub fn payload(name: impl Into<String>) -> Self {
        Self::with_behaviour(name, Behaviour::Payload)
    }

    /// Decoder that reports `text` for every frame.
    pub fn fixed(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_behaviour(name, Behaviour::Fixed(text.into()))
    }

    /// Decoder that is not available on this platform.
    pub fn unsupported(name: impl Into<String>) -> Self {
        Self::with_behaviour(name, Behaviour::Unsupported)
    }

    /// Decoder that fails on every frame.
    pub fn failing(name: impl Into<String>) -> Self {
        Self::with_behaviour(name, Behaviour::Failing)
    }

    /// Number of frames handed to this decoder.
    pub fn decode_calls(&self) -> u64 {
        self.decode_calls
    }
}

impl FrameDecoder for MockDecoder {
    fn decode(&mut self, frame: &Frame) -> Result<Option<String>> {
        self.decode_calls += 1;

        match &self.behaviour {
            Behaviour::Payload => {
                if frame.is_empty() {
                    return Ok(None);
                }
                std::str::from_utf8(&frame.data)
                    .map(|text| Some(text.to_string()))
                    .map_err(|e| HardwareError::decode(format!("frame is not text: {e}")))
            }
            Behaviour::Fixed(text) => Ok(Some(text.clone())),
            Behaviour::Unsupported => Err(HardwareError::unsupported(format!(
                "{} decoder",
                self.name
            ))),
            Behaviour::Failing => Err(HardwareError::decode("simulated decode failure")),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
