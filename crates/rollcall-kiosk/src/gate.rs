//! Arbitration gate.
//!
//! Every channel feeds the same gate. An event gets through only while the
//! kiosk is `READY` and no other event was admitted within the debounce
//! window. The window is measured from the last *admitted* event, so a burst
//! of rejected duplicates never extends it. First arrival wins; the channel
//! an event came from plays no part.

use std::fmt;
use std::time::Duration;

use rollcall_core::{ScanEvent, ScanState};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

/// Verdict of the gate for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// The event goes to the resolver.
    Admitted,

    /// The kiosk is processing another scan.
    NotReady,

    /// Another event was admitted less than one window earlier.
    Debounced,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admitted => f.write_str("admitted"),
            Self::NotReady => f.write_str("not ready"),
            Self::Debounced => f.write_str("debounced"),
        }
    }
}

/// Single entry point between the channels and the resolver.
#[derive(Debug)]
pub struct ArbitrationGate {
    state: watch::Receiver<ScanState>,
    window: Duration,
    last_admitted_at: Option<Instant>,
}

impl ArbitrationGate {
    /// Create a gate reading the scan state from `state`.
    pub fn new(state: watch::Receiver<ScanState>, window: Duration) -> Self {
        Self {
            state,
            window,
            last_admitted_at: None,
        }
    }

    /// Observation time of the last admitted event.
    pub fn last_admitted_at(&self) -> Option<Instant> {
        self.last_admitted_at
    }

    /// Decide whether `event` may proceed.
    ///
    /// Only an admission has a side effect: it moves the debounce window.
    pub fn evaluate(&mut self, event: &ScanEvent) -> Admission {
        if !self.state.borrow().is_ready() {
            return Admission::NotReady;
        }

        if let Some(last) = self.last_admitted_at {
            // An event observed before the last admitted one is inside the window.
            if event.observed_at < last || event.observed_at.duration_since(last) < self.window {
                return Admission::Debounced;
            }
        }

        self.last_admitted_at = Some(event.observed_at);
        Admission::Admitted
    }

    /// Boolean form of [`evaluate`](Self::evaluate).
    pub fn admit(&mut self, event: &ScanEvent) -> bool {
        self.evaluate(event).is_admitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rollcall_core::{Channel, Token};
    use rstest::rstest;

    const WINDOW: Duration = Duration::from_millis(500);

    fn event_at(base: Instant, offset_ms: u64, channel: Channel) -> ScanEvent {
        ScanEvent::observed(
            Token::new("qr_011").unwrap(),
            channel,
            base + Duration::from_millis(offset_ms),
        )
    }

    fn ready_gate() -> (ArbitrationGate, watch::Sender<ScanState>) {
        let (tx, rx) = watch::channel(ScanState::Ready);
        (ArbitrationGate::new(rx, WINDOW), tx)
    }

    #[test]
    fn test_first_event_is_admitted() {
        let (mut gate, _tx) = ready_gate();
        let base = Instant::now();
        assert!(gate.admit(&event_at(base, 0, Channel::Optical)));
        assert_eq!(gate.last_admitted_at(), Some(base));
    }

    #[rstest]
    #[case(100, Admission::Debounced)]
    #[case(499, Admission::Debounced)]
    #[case(500, Admission::Admitted)]
    #[case(1200, Admission::Admitted)]
    fn test_debounce_window(#[case] offset_ms: u64, #[case] expected: Admission) {
        let (mut gate, _tx) = ready_gate();
        let base = Instant::now();
        assert!(gate.admit(&event_at(base, 0, Channel::Optical)));
        assert_eq!(gate.evaluate(&event_at(base, offset_ms, Channel::Radio)), expected);
    }

    #[test]
    fn test_rejections_do_not_move_the_window() {
        let (mut gate, _tx) = ready_gate();
        let base = Instant::now();
        assert!(gate.admit(&event_at(base, 0, Channel::Optical)));
        assert!(!gate.admit(&event_at(base, 300, Channel::Optical)));
        assert!(!gate.admit(&event_at(base, 450, Channel::Optical)));
        // 500 ms after the admitted event, not after the last rejected one.
        assert!(gate.admit(&event_at(base, 500, Channel::Optical)));
    }

    #[test]
    fn test_earlier_timestamp_is_inside_the_window() {
        let (mut gate, _tx) = ready_gate();
        let base = Instant::now();
        assert!(gate.admit(&event_at(base, 1000, Channel::Radio)));
        assert_eq!(
            gate.evaluate(&event_at(base, 0, Channel::Manual)),
            Admission::Debounced
        );
    }

    #[test]
    fn test_not_ready_rejects_without_side_effect() {
        let (mut gate, tx) = ready_gate();
        let base = Instant::now();
        tx.send_replace(ScanState::Processing);

        assert_eq!(
            gate.evaluate(&event_at(base, 0, Channel::Manual)),
            Admission::NotReady
        );
        assert_eq!(gate.last_admitted_at(), None);

        tx.send_replace(ScanState::Ready);
        assert!(gate.admit(&event_at(base, 0, Channel::Manual)));
    }

    #[test]
    fn test_zero_window_still_rejects_earlier_events() {
        let (tx, rx) = watch::channel(ScanState::Ready);
        let mut gate = ArbitrationGate::new(rx, Duration::ZERO);
        let base = Instant::now();

        assert!(gate.admit(&event_at(base, 10, Channel::Optical)));
        assert!(gate.admit(&event_at(base, 10, Channel::Optical)));
        assert!(!gate.admit(&event_at(base, 5, Channel::Optical)));
        drop(tx);
    }

    proptest! {
        /// No two admitted events are ever closer than one window,
        /// whatever the arrival order and channel mix.
        #[test]
        fn prop_admitted_events_are_a_window_apart(
            arrivals in prop::collection::vec((0u64..5_000, 0usize..3), 1..64)
        ) {
            let (mut gate, _tx) = ready_gate();
            let base = Instant::now();
            let mut admitted: Vec<Instant> = Vec::new();

            for (offset_ms, channel) in arrivals {
                let event = event_at(base, offset_ms, Channel::ALL[channel]);
                if gate.admit(&event) {
                    admitted.push(event.observed_at);
                }
            }

            prop_assert!(!admitted.is_empty());
            for pair in admitted.windows(2) {
                prop_assert!(pair[1] >= pair[0] + WINDOW);
            }
        }

        /// While the kiosk is processing, nothing is admitted.
        #[test]
        fn prop_processing_admits_nothing(
            offsets in prop::collection::vec(0u64..10_000, 1..32)
        ) {
            let (mut gate, tx) = ready_gate();
            tx.send_replace(ScanState::Processing);
            let base = Instant::now();

            for offset_ms in offsets {
                prop_assert_eq!(
                    gate.evaluate(&event_at(base, offset_ms, Channel::Optical)),
                    Admission::NotReady
                );
            }
        }
    }
}
