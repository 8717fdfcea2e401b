//! Primary/fallback frame decoding.
//!
//! Kiosks prefer a platform-accelerated decoder when one exists and fall back
//! to a portable software decoder otherwise. [`DecoderChain`] encapsulates
//! that policy so the optical channel only ever sees a single decoder.
//!
//! # Fallback rules
//!
//! - Primary returns `Ok(_)`: its answer is final for this frame.
//! - Primary returns `Unsupported`: the primary is disabled for the rest of
//!   the chain's lifetime and the fallback decodes this frame.
//! - Primary returns any other error: the fallback decodes this frame; the
//!   primary is tried again on the next one.

use crate::devices::AnyFrameDecoder;
use crate::error::Result;
use crate::traits::FrameDecoder;
use crate::types::Frame;
use tracing::{debug, trace, warn};

/// A primary decoder with a fallback.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::decoder::DecoderChain;
/// use rollcall_hardware::devices::AnyFrameDecoder;
/// use rollcall_hardware::mock::MockDecoder;
/// use rollcall_hardware::types::Frame;
///
/// let mut chain = DecoderChain::new(
///     AnyFrameDecoder::Mock(MockDecoder::unsupported("native")),
///     AnyFrameDecoder::Mock(MockDecoder::payload("software")),
/// );
///
/// let frame = Frame::new(1, 1, &b"qr_011"[..]);
/// assert_eq!(chain.decode(&frame).unwrap(), Some("qr_011".to_string()));
/// assert!(!chain.primary_enabled());
/// ```
#[derive(Debug)]
pub struct DecoderChain {
    primary: Option<AnyFrameDecoder>,
    fallback: AnyFrameDecoder,
}

impl DecoderChain {
    /// Create a chain trying `primary` first.
    pub fn new(primary: AnyFrameDecoder, fallback: AnyFrameDecoder) -> Self {
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    /// Create a chain with a single decoder.
    pub fn single(decoder: AnyFrameDecoder) -> Self {
        Self {
            primary: None,
            fallback: decoder,
        }
    }

    /// Check whether the primary decoder is still in use.
    pub fn primary_enabled(&self) -> bool {
        self.primary.is_some()
    }

    /// Name of the decoder that will be tried first on the next frame.
    pub fn active_decoder(&self) -> &str {
        match &self.primary {
            Some(primary) => primary.name(),
            None => self.fallback.name(),
        }
    }

    /// Decode one frame, applying the fallback rules.
    ///
    /// # Errors
    ///
    /// Returns the fallback decoder's error when the fallback had to run and
    /// failed as well.
    pub fn decode(&mut self, frame: &Frame) -> Result<Option<String>> {
        if let Some(primary) = self.primary.as_mut() {
            match primary.decode(frame) {
                Ok(decoded) => return Ok(decoded),
                Err(e) if e.is_unsupported() => {
                    warn!(
                        decoder = primary.name(),
                        fallback = self.fallback.name(),
                        "Primary decoder unsupported, switching to fallback: {}",
                        e
                    );
                    self.primary = None;
                }
                Err(e) => {
                    trace!(decoder = primary.name(), "Primary decode failed: {}", e);
                }
            }
        }

        let decoded = self.fallback.decode(frame)?;
        if decoded.is_some() {
            debug!(decoder = self.fallback.name(), "Fallback decoder read a code");
        }
        Ok(decoded)
    }
}

impl FrameDecoder for DecoderChain {
    fn decode(&mut self, frame: &Frame) -> Result<Option<String>> {
        DecoderChain::decode(self, frame)
    }

    fn name(&self) -> &str {
        self.active_decoder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDecoder;

    fn frame(text: &str) -> Frame {
        Frame::new(1, 1, text.as_bytes().to_vec())
    }

    #[test]
    fn test_primary_answer_is_final() {
        let mut chain = DecoderChain::new(
            AnyFrameDecoder::Mock(MockDecoder::fixed("native", "from_primary")),
            AnyFrameDecoder::Mock(MockDecoder::payload("software")),
        );

        assert_eq!(
            chain.decode(&frame("qr_011")).unwrap(),
            Some("from_primary".to_string())
        );
        assert!(chain.primary_enabled());
        assert_eq!(chain.active_decoder(), "native");
    }

    #[test]
    fn test_unsupported_primary_is_disabled() {
        let mut chain = DecoderChain::new(
            AnyFrameDecoder::Mock(MockDecoder::unsupported("native")),
            AnyFrameDecoder::Mock(MockDecoder::payload("software")),
        );

        assert_eq!(
            chain.decode(&frame("qr_011")).unwrap(),
            Some("qr_011".to_string())
        );
        assert!(!chain.primary_enabled());
        assert_eq!(chain.active_decoder(), "software");
    }

    #[test]
    fn test_transient_primary_failure_keeps_primary() {
        let mut chain = DecoderChain::new(
            AnyFrameDecoder::Mock(MockDecoder::failing("native")),
            AnyFrameDecoder::Mock(MockDecoder::payload("software")),
        );

        assert_eq!(
            chain.decode(&frame("qr_011")).unwrap(),
            Some("qr_011".to_string())
        );
        assert!(chain.primary_enabled());
    }

    #[test]
    fn test_fallback_error_propagates() {
        let mut chain = DecoderChain::new(
            AnyFrameDecoder::Mock(MockDecoder::unsupported("native")),
            AnyFrameDecoder::Mock(MockDecoder::failing("software")),
        );

        assert!(chain.decode(&frame("qr_011")).is_err());
    }

    #[test]
    fn test_single_decoder_chain() {
        let mut chain = DecoderChain::single(AnyFrameDecoder::Mock(MockDecoder::payload("sw")));
        assert!(!chain.primary_enabled());
        assert_eq!(chain.decode(&frame("")).unwrap(), None);
    }
}
