//! Scan state machine.
//!
//! Owns the session's [`ScanState`] and publishes it through a
//! `tokio::sync::watch` channel. The machine is the only writer; channel
//! adapters and the arbitration gate hold receivers and never mutate it.
//!
//! # Valid Transitions
//!
//! - `Ready` → `Processing` (an event was admitted)
//! - `Processing` → `Ready` (resume timer fired after a non-success outcome)
//!
//! A success outcome leaves the machine in `Processing`: the session ends
//! there and nothing listens any more.
//!
//! # Examples
//!
//! ```
//! use rollcall_core::ScanState;
//! use rollcall_kiosk::ScanStateMachine;
//!
//! let mut machine = ScanStateMachine::new();
//! let state = machine.subscribe();
//!
//! machine.begin_processing().unwrap();
//! assert_eq!(*state.borrow(), ScanState::Processing);
//!
//! // A second admission while processing is refused.
//! assert!(machine.begin_processing().is_err());
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use rollcall_core::{Error, Result, ScanState};

/// Maximum number of state transitions to keep in history.
///
/// A full scan cycle is two transitions, so this covers the last fifty
/// non-success scans of a session.
const MAX_HISTORY_SIZE: usize = 100;

/// A single state transition with timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: ScanState,

    /// The state transitioned to.
    pub to: ScanState,

    /// Wall-clock time of the transition, for diagnostics.
    pub at: DateTime<Utc>,

    /// Monotonic time of the transition.
    ///
    /// Not serialized; set to the deserialization time when read back.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    fn new(from: ScanState, to: ScanState) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
            timestamp: Instant::now(),
        }
    }

    /// Time elapsed since this transition.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Owner of the session's scan mode.
///
/// Not shareable: the session task owns it. Other components observe the
/// state through [`subscribe`](Self::subscribe).
#[derive(Debug)]
pub struct ScanStateMachine {
    state_tx: watch::Sender<ScanState>,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl ScanStateMachine {
    /// Create a machine in the `Ready` state.
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ScanState::Ready);
        Self {
            state_tx,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Get a receiver observing every state change.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// Get the current state.
    pub fn current_state(&self) -> ScanState {
        *self.state_tx.borrow()
    }

    /// Time spent in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// `Ready` → `Processing`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the machine is already
    /// processing.
    pub fn begin_processing(&mut self) -> Result<StateTransition> {
        self.transition_to(ScanState::Processing)
    }

    /// `Processing` → `Ready`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the machine is already
    /// ready.
    pub fn resume(&mut self) -> Result<StateTransition> {
        self.transition_to(ScanState::Ready)
    }

    /// Transition to `new_state`, validating the transition.
    ///
    /// On success the new state is published to every subscriber before
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not
    /// allowed from the current state. The state is left untouched.
    pub fn transition_to(&mut self, new_state: ScanState) -> Result<StateTransition> {
        let current = self.current_state();
        if !current.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(current, new_state);

        // send_replace publishes even when no receiver is alive.
        self.state_tx.send_replace(new_state);
        self.state_entered_at = transition.timestamp;
        self.add_to_history(transition.clone());

        debug!(from = %current, to = %new_state, "Scan state transition");
        Ok(transition)
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_ready() {
        let machine = ScanStateMachine::new();
        assert_eq!(machine.current_state(), ScanState::Ready);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_processing_cycle() {
        let mut machine = ScanStateMachine::new();

        let transition = machine.begin_processing().unwrap();
        assert_eq!(transition.from, ScanState::Ready);
        assert_eq!(transition.to, ScanState::Processing);

        machine.resume().unwrap();
        assert_eq!(machine.current_state(), ScanState::Ready);
        assert_eq!(machine.history().len(), 2);
    }

    #[test]
    fn test_admission_while_processing_is_refused() {
        let mut machine = ScanStateMachine::new();
        machine.begin_processing().unwrap();

        let err = machine.begin_processing().unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid state transition from PROCESSING to PROCESSING"
        );
        assert_eq!(machine.current_state(), ScanState::Processing);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn test_resume_while_ready_is_refused() {
        let mut machine = ScanStateMachine::new();
        assert!(machine.resume().is_err());
        assert_eq!(machine.current_state(), ScanState::Ready);
    }

    #[test]
    fn test_subscribers_observe_changes() {
        let mut machine = ScanStateMachine::new();
        let mut state = machine.subscribe();
        assert!(!state.has_changed().unwrap());

        machine.begin_processing().unwrap();
        assert!(state.has_changed().unwrap());
        assert_eq!(*state.borrow_and_update(), ScanState::Processing);
    }

    #[test]
    fn test_publishes_without_subscribers() {
        let mut machine = ScanStateMachine::new();
        machine.begin_processing().unwrap();
        assert_eq!(machine.subscribe().borrow().to_owned(), ScanState::Processing);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = ScanStateMachine::new();
        for _ in 0..(MAX_HISTORY_SIZE + 10) {
            machine.begin_processing().unwrap();
            machine.resume().unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        let last = machine.last_transitions(2);
        assert_eq!(last[0].to, ScanState::Processing);
        assert_eq!(last[1].to, ScanState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_in_current_state() {
        let mut machine = ScanStateMachine::new();
        machine.begin_processing().unwrap();

        tokio::time::advance(Duration::from_millis(750)).await;
        assert_eq!(machine.time_in_current_state(), Duration::from_millis(750));
    }

    #[test]
    fn test_transition_serialization() {
        let transition = StateTransition::new(ScanState::Ready, ScanState::Processing);
        let json = serde_json::to_string(&transition).unwrap();
        assert!(json.contains("\"from\":\"READY\""));
        assert!(json.contains("\"to\":\"PROCESSING\""));
        assert!(!json.contains("timestamp"));
    }
}
