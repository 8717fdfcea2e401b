//! Feedback and navigation.
//!
//! Success plays a short tone with a haptic pulse, then hands a [`Route`] to
//! the [`Router`]. Any other outcome plays its own tone and never navigates.
//! Feedback is best-effort and time-bounded: a slow or broken speaker never
//! holds up navigation.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rollcall_core::constants::{STUDENT_ROUTE, TEACHER_ROUTE};
use rollcall_core::{Channel, EntityId, EntityKind, ResolutionResult, ScanEvent, Token};
use rollcall_hardware::{AnyFeedbackDevice, FeedbackDevice, HapticPattern, Tone};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Length of the success vibration, in milliseconds.
const SUCCESS_PULSE_MS: u16 = 80;

/// Navigation target for a recognized credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub kind: EntityKind,
    pub entity_id: EntityId,
    /// Channel the credential arrived on.
    pub channel: Channel,
    pub token: Token,
    /// Wall-clock time the credential was observed.
    pub scanned_at: DateTime<Utc>,
}

impl Route {
    /// Route for a classified outcome, or `None` if it does not navigate.
    pub fn for_result(result: &ResolutionResult, event: &ScanEvent) -> Option<Self> {
        let (kind, entity_id) = result.entity()?;
        Some(Self {
            kind,
            entity_id,
            channel: event.channel,
            token: event.token.clone(),
            scanned_at: event.captured_at,
        })
    }

    /// Path without parameters, e.g. `/kiosk/student/11`.
    pub fn path(&self) -> String {
        let base = match self.kind {
            EntityKind::Student => STUDENT_ROUTE,
            EntityKind::Teacher => TEACHER_ROUTE,
        };
        format!("{base}/{}", self.entity_id)
    }

    /// Route parameters, in a stable order.
    pub fn params(&self) -> [(&'static str, String); 3] {
        [
            ("channel", self.channel.as_str().to_string()),
            ("token", self.token.as_str().to_string()),
            (
                "scanned_at",
                self.scanned_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ]
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())?;
        for (i, (key, value)) in self.params().iter().enumerate() {
            let separator = if i == 0 { '?' } else { '&' };
            write!(f, "{separator}{key}={value}")?;
        }
        Ok(())
    }
}

/// Page navigation collaborator.
///
/// Fire-and-forget: the engine calls it once per session, on success only.
/// Closures taking a [`Route`] are routers.
pub trait Router: Send + Sync + 'static {
    fn navigate(&self, route: Route);
}

impl<F> Router for F
where
    F: Fn(Route) + Send + Sync + 'static,
{
    fn navigate(&self, route: Route) {
        self(route)
    }
}

/// Issues feedback and navigation for classified outcomes.
pub struct Dispatcher<R> {
    router: R,
    feedback: Option<AnyFeedbackDevice>,
    feedback_timeout: Duration,
}

impl<R: Router> Dispatcher<R> {
    /// Create a dispatcher. Without a feedback device, outcomes are silent.
    pub fn new(router: R, feedback: Option<AnyFeedbackDevice>, feedback_timeout: Duration) -> Self {
        Self {
            router,
            feedback,
            feedback_timeout,
        }
    }

    /// Tone for a classified outcome.
    pub fn tone_for(result: &ResolutionResult) -> Tone {
        match result {
            ResolutionResult::Student(_) | ResolutionResult::Teacher(_) => Tone::Success,
            ResolutionResult::Revoked => Tone::Denied,
            ResolutionResult::Unknown | ResolutionResult::LookupFailed => Tone::Warning,
        }
    }

    /// Signal `result` to the operator and, on success, navigate.
    ///
    /// Returns the route handed to the router, if any.
    pub async fn dispatch(&mut self, result: &ResolutionResult, event: &ScanEvent) -> Option<Route> {
        self.feedback(result).await;

        let route = Route::for_result(result, event)?;
        info!(route = %route.path(), channel = %route.channel, "Navigating");
        self.router.navigate(route.clone());
        Some(route)
    }

    async fn feedback(&mut self, result: &ResolutionResult) {
        let Some(device) = self.feedback.as_mut() else {
            return;
        };

        let tone = Self::tone_for(result);
        let success = result.is_success();
        let signal = async {
            device.play_tone(tone).await?;
            if success {
                device.pulse(HapticPattern::Pulse(SUCCESS_PULSE_MS)).await?;
            }
            Ok::<_, rollcall_hardware::HardwareError>(())
        };

        match tokio::time::timeout(self.feedback_timeout, signal).await {
            Ok(Ok(())) => debug!(?tone, "Feedback played"),
            Ok(Err(e)) => warn!(?tone, error = %e, "Feedback failed, ignoring"),
            Err(_) => warn!(
                ?tone,
                timeout_ms = self.feedback_timeout.as_millis() as u64,
                "Feedback timed out, ignoring"
            ),
        }
    }
}
