//! Kiosk session: the engine task and its handle.
//!
//! One tokio task owns the scan state machine, the arbitration gate and the
//! in-flight lookup. Channel adapters feed it through a bounded queue; the
//! UI talks to it through [`KioskHandle`] and observes it through the
//! [`SessionEvent`] stream and the published [`ScanState`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rollcall_core::{Channel, ResolutionResult, ScanEvent, ScanState, Token};
use rollcall_directory::TokenDirectory;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::channels::optical::OpticalSettings;
use crate::channels::{ChannelSignal, ManualChannel};
use crate::config::KioskConfig;
use crate::dispatch::{Dispatcher, Route, Router};
use crate::error::{AcquisitionError, KioskError, Result};
use crate::gate::{Admission, ArbitrationGate};
use crate::lifecycle::{KioskDevices, ReleaseReport, ResourceManager, TaskTermination};
use crate::messages::KioskMessages;
use crate::resolver::Resolver;
use crate::state_machine::ScanStateMachine;

/// Capacity of the session event stream.
const EVENT_CAPACITY: usize = 256;

/// Capacity of the handle command queue.
const COMMAND_CAPACITY: usize = 8;

/// Observable step of a kiosk session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// A channel is listening.
    ChannelArmed { channel: Channel },

    /// A channel could not be armed, or stopped because its device failed.
    ChannelFault { channel: Channel, error: String },

    /// The gate accepted a scan; resolution started.
    Admitted { token: Token, channel: Channel },

    /// The gate dropped a scan.
    Rejected {
        token: Token,
        channel: Channel,
        reason: Admission,
    },

    /// An admitted scan was classified.
    Resolved {
        token: Token,
        channel: Channel,
        result: ResolutionResult,
    },

    /// Operator-facing message.
    Notice { message: &'static str },

    /// The router was asked to leave the kiosk view.
    Navigated { route: Route },

    /// The kiosk is `READY` again after a non-success outcome.
    Resumed,

    /// The session ended and its resources are released.
    Closed { reason: EndReason },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A credential was recognized and the router navigated away.
    Resolved,
    /// The kiosk view was torn down from outside.
    TornDown,
    /// The engine hit an internal error.
    Aborted,
}

/// Final account of a kiosk session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub reason: EndReason,
    /// Scans admitted by the gate.
    pub admitted: u64,
    /// Scans rejected by the gate.
    pub rejected: u64,
    /// Outcome of the last resolution, if any scan was resolved.
    pub last_result: Option<ResolutionResult>,
    /// How each channel task ended.
    pub channels: Vec<(Channel, TaskTermination)>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionSummary {
    fn aborted(session_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            reason: EndReason::Aborted,
            admitted: 0,
            rejected: 0,
            last_result: None,
            channels: Vec::new(),
            started_at,
            ended_at: Utc::now(),
        }
    }
}

enum Command {
    ActivateRadio {
        reply: oneshot::Sender<std::result::Result<(), AcquisitionError>>,
    },
}

type LookupFuture = Pin<Box<dyn Future<Output = ResolutionResult> + Send>>;

struct PendingLookup {
    event: ScanEvent,
    future: LookupFuture,
}

/// Kiosk engine, configured but not started.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use rollcall_core::{DirectoryEntry, EntityId, EntityKind, Token};
/// use rollcall_directory::InMemoryDirectory;
/// use rollcall_kiosk::{KioskConfig, KioskDevices, KioskEngine, Route};
///
/// #[tokio::main]
/// async fn main() -> rollcall_kiosk::Result<()> {
///     let directory = InMemoryDirectory::from_entries([DirectoryEntry::active(
///         Token::new("A1B2C3")?,
///         EntityKind::Student,
///         EntityId::new(11),
///     )]);
///
///     let engine = KioskEngine::new(
///         KioskConfig::default(),
///         Arc::new(directory),
///         |route: Route| println!("navigate to {route}"),
///     )?;
///     let mut kiosk = engine.start(KioskDevices::new());
///
///     kiosk.submit_manual("A1B2C3")?;
///     let summary = kiosk.wait().await;
///     assert_eq!(summary.admitted, 1);
///     Ok(())
/// }
/// ```
pub struct KioskEngine<D, R> {
    config: KioskConfig,
    directory: Arc<D>,
    router: R,
    events: broadcast::Sender<SessionEvent>,
}

impl<D, R> KioskEngine<D, R>
where
    D: TokenDirectory + 'static,
    R: Router,
{
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns `Core(Config)` if `config` is invalid.
    pub fn new(config: KioskConfig, directory: Arc<D>, router: R) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            config,
            directory,
            router,
            events,
        })
    }

    /// Subscribe to session events before the session starts, so channel
    /// arming is observed too.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start a session on `devices`.
    ///
    /// Must be called from within a tokio runtime. The session arms the
    /// optical and manual channels right away, and the radio channel too if
    /// `radio_on_start` is set.
    pub fn start(self, devices: KioskDevices) -> KioskHandle {
        let session_id = Uuid::new_v4();
        let started_at = Utc::now();

        let machine = ScanStateMachine::new();
        let state = machine.subscribe();
        let gate = ArbitrationGate::new(machine.subscribe(), self.config.debounce_window_duration());

        let (signal_tx, signal_rx) = mpsc::channel(self.config.event_buffer);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let cancel = CancellationToken::new();

        let KioskDevices {
            optical,
            radio,
            feedback,
        } = devices;

        let resources = ResourceManager::new(
            optical,
            radio,
            signal_tx.clone(),
            machine.subscribe(),
            cancel.clone(),
            OpticalSettings {
                tick: self.config.optical_tick_duration(),
                max_consecutive_errors: self.config.max_consecutive_frame_errors,
            },
        );

        let session = Session {
            radio_on_start: self.config.radio_on_start,
            resume_delay: self.config.resume_delay_duration(),
            machine,
            gate,
            resolver: Resolver::new(self.directory, self.config.lookup_timeout_duration()),
            dispatcher: Dispatcher::new(
                self.router,
                feedback,
                self.config.feedback_timeout_duration(),
            ),
            resources,
            events: self.events.clone(),
            cancel: cancel.clone(),
            pending: None,
            resume: None,
            session_id,
            started_at,
            admitted: 0,
            rejected: 0,
            last_result: None,
        };

        let span = info_span!("kiosk_session", session = %session_id);
        let task = tokio::spawn(
            session.run(signal_rx, command_rx).instrument(span),
        );

        KioskHandle {
            session_id,
            started_at,
            state,
            events: self.events,
            commands: command_tx,
            manual: ManualChannel::new(signal_tx),
            cancel,
            task: Some(task),
            summary: None,
        }
    }
}

/// Handle to a running kiosk session.
///
/// Dropping the handle tears the session down without waiting for it.
pub struct KioskHandle {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    state: watch::Receiver<ScanState>,
    events: broadcast::Sender<SessionEvent>,
    commands: mpsc::Sender<Command>,
    manual: ManualChannel,
    cancel: CancellationToken,
    task: Option<JoinHandle<SessionSummary>>,
    summary: Option<SessionSummary>,
}

impl KioskHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Current scan state.
    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Receiver following the scan state.
    pub fn watch_state(&self) -> watch::Receiver<ScanState> {
        self.state.clone()
    }

    /// Subscribe to session events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Check whether the session task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Open the radio session and arm the radio channel.
    ///
    /// Call this from an operator gesture on platforms that require one.
    /// Arming an already armed radio succeeds without reopening it.
    ///
    /// # Errors
    ///
    /// - `Acquisition` if the radio cannot be armed; other channels keep running
    /// - `SessionClosed` if the session has ended
    pub async fn activate_radio(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::ActivateRadio { reply })
            .await
            .map_err(|_| KioskError::SessionClosed)?;

        response
            .await
            .map_err(|_| KioskError::SessionClosed)?
            .map_err(KioskError::from)
    }

    /// Submit an operator-typed token through the manual channel.
    ///
    /// # Errors
    ///
    /// - `Core(InvalidToken)` if `text` is blank or too long
    /// - `QueueFull` if the session is not keeping up
    /// - `SessionClosed` if the session has ended
    pub fn submit_manual(&self, text: &str) -> Result<()> {
        self.manual.submit(text)
    }

    /// Tear the session down and release every resource.
    ///
    /// An in-flight lookup is dropped and its result never dispatched.
    /// Idempotent: later calls return the same summary. After a session
    /// ended on its own, returns that session's summary.
    pub async fn teardown(&mut self) -> SessionSummary {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for the session to end on its own.
    pub async fn wait(&mut self) -> SessionSummary {
        self.join().await
    }

    async fn join(&mut self) -> SessionSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        let summary = match self.task.take() {
            Some(task) => match task.await {
                Ok(summary) => summary,
                Err(e) => {
                    error!(session = %self.session_id, "Kiosk session task failed: {}", e);
                    SessionSummary::aborted(self.session_id, self.started_at)
                }
            },
            None => SessionSummary::aborted(self.session_id, self.started_at),
        };

        self.summary = Some(summary.clone());
        summary
    }
}

impl Drop for KioskHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// State owned by the session task.
struct Session<D, R> {
    radio_on_start: bool,
    resume_delay: std::time::Duration,
    machine: ScanStateMachine,
    gate: ArbitrationGate,
    resolver: Resolver<D>,
    dispatcher: Dispatcher<R>,
    resources: ResourceManager,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
    pending: Option<PendingLookup>,
    resume: Option<Pin<Box<Sleep>>>,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    admitted: u64,
    rejected: u64,
    last_result: Option<ResolutionResult>,
}

impl<D, R> Session<D, R>
where
    D: TokenDirectory + 'static,
    R: Router,
{
    async fn run(
        mut self,
        mut signals: mpsc::Receiver<ChannelSignal>,
        mut commands: mpsc::Receiver<Command>,
    ) -> SessionSummary {
        let cancel = self.cancel.clone();
        info!("Kiosk session started");
        self.arm_channels().await;

        let reason = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break EndReason::TornDown,

                Some(command) = commands.recv() => self.on_command(command).await,

                result = poll_lookup(&mut self.pending) => {
                    if let Some(reason) = self.on_resolved(result).await {
                        break reason;
                    }
                }

                _ = wait_resume(&mut self.resume) => {
                    if let Some(reason) = self.on_resume() {
                        break reason;
                    }
                }

                signal = signals.recv() => match signal {
                    Some(signal) => {
                        if let Some(reason) = self.on_signal(signal) {
                            break reason;
                        }
                    }
                    None => break EndReason::Aborted,
                },
            }
        };

        self.shut_down(reason).await
    }

    async fn arm_channels(&mut self) {
        match self.resources.acquire_optical().await {
            Ok(()) => self.publish(SessionEvent::ChannelArmed {
                channel: Channel::Optical,
            }),
            Err(AcquisitionError::Interrupted { .. }) => return,
            Err(e) => self.channel_unavailable(&e),
        }

        self.publish(SessionEvent::ChannelArmed {
            channel: Channel::Manual,
        });

        if self.radio_on_start {
            let _ = self.arm_radio().await;
        }

        if self.cancel.is_cancelled() {
            return;
        }
        self.publish(SessionEvent::Notice {
            message: KioskMessages::READY,
        });
    }

    async fn arm_radio(&mut self) -> std::result::Result<(), AcquisitionError> {
        if self.resources.is_armed(Channel::Radio) {
            return Ok(());
        }

        let result = self.resources.acquire_radio().await;
        match &result {
            Ok(()) => self.publish(SessionEvent::ChannelArmed {
                channel: Channel::Radio,
            }),
            Err(AcquisitionError::Interrupted { .. }) => {
                debug!("Radio arming interrupted by teardown");
            }
            Err(e) => self.channel_unavailable(e),
        }
        result
    }

    fn channel_unavailable(&self, error: &AcquisitionError) {
        let channel = error.channel();
        warn!(%channel, "Channel unavailable: {}", error);
        self.publish(SessionEvent::ChannelFault {
            channel,
            error: error.to_string(),
        });
        if let Some(message) = unavailable_message(channel) {
            self.publish(SessionEvent::Notice { message });
        }
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::ActivateRadio { reply } => {
                let result = self.arm_radio().await;
                // The caller may have given up waiting.
                let _ = reply.send(result);
            }
        }
    }

    fn on_signal(&mut self, signal: ChannelSignal) -> Option<EndReason> {
        match signal {
            ChannelSignal::Scan(event) => return self.on_scan(event),
            ChannelSignal::Notice { channel, message } => {
                debug!(%channel, notice = message, "Channel notice");
                self.publish(SessionEvent::Notice { message });
            }
            ChannelSignal::Fault { channel, error } => {
                warn!(%channel, "Channel stopped: {}", error);
                self.publish(SessionEvent::ChannelFault { channel, error });
                if let Some(message) = unavailable_message(channel) {
                    self.publish(SessionEvent::Notice { message });
                }
            }
        }
        None
    }

    fn on_scan(&mut self, event: ScanEvent) -> Option<EndReason> {
        let admission = self.gate.evaluate(&event);
        if !admission.is_admitted() {
            self.rejected += 1;
            debug!(token = %event.token, channel = %event.channel, %admission, "Scan rejected");
            self.publish(SessionEvent::Rejected {
                token: event.token,
                channel: event.channel,
                reason: admission,
            });
            return None;
        }

        if let Err(e) = self.machine.begin_processing() {
            error!(token = %event.token, "Admitted scan while processing: {}", e);
            debug_assert!(false, "admitted scan while processing: {e}");
            return Some(EndReason::Aborted);
        }

        self.admitted += 1;
        info!(token = %event.token, channel = %event.channel, "Scan admitted");
        self.publish(SessionEvent::Admitted {
            token: event.token.clone(),
            channel: event.channel,
        });

        let future = Box::pin(self.resolver.resolve(event.token.clone()));
        self.pending = Some(PendingLookup { event, future });
        None
    }

    async fn on_resolved(&mut self, result: ResolutionResult) -> Option<EndReason> {
        let event = self.pending.take()?.event;
        self.last_result = Some(result);
        info!(token = %event.token, channel = %event.channel, %result, "Scan resolved");
        self.publish(SessionEvent::Resolved {
            token: event.token.clone(),
            channel: event.channel,
            result,
        });

        let dispatched = self
            .cancel
            .run_until_cancelled(self.dispatcher.dispatch(&result, &event))
            .await;
        let Some(route) = dispatched else {
            debug!(token = %event.token, "Dispatch interrupted by teardown");
            return Some(EndReason::TornDown);
        };
        self.publish(SessionEvent::Notice {
            message: KioskMessages::for_result(&result),
        });

        match route {
            Some(route) => {
                self.publish(SessionEvent::Navigated { route });
                Some(EndReason::Resolved)
            }
            None => {
                debug!(delay_ms = self.resume_delay.as_millis() as u64, "Resume scheduled");
                self.resume = Some(Box::pin(tokio::time::sleep(self.resume_delay)));
                None
            }
        }
    }

    fn on_resume(&mut self) -> Option<EndReason> {
        self.resume = None;
        if let Err(e) = self.machine.resume() {
            error!("Resume timer fired outside processing: {}", e);
            debug_assert!(false, "resume timer fired outside processing: {e}");
            return Some(EndReason::Aborted);
        }

        info!("Kiosk ready");
        self.publish(SessionEvent::Resumed);
        self.publish(SessionEvent::Notice {
            message: KioskMessages::READY,
        });
        None
    }

    async fn shut_down(mut self, reason: EndReason) -> SessionSummary {
        self.resume = None;
        if let Some(lookup) = self.pending.take() {
            debug!(token = %lookup.event.token, "Dropping in-flight lookup");
        }

        let ReleaseReport { stopped } = self.resources.release().await;
        self.publish(SessionEvent::Closed { reason });

        let summary = SessionSummary {
            session_id: self.session_id,
            reason,
            admitted: self.admitted,
            rejected: self.rejected,
            last_result: self.last_result,
            channels: stopped,
            started_at: self.started_at,
            ended_at: Utc::now(),
        };
        info!(
            ?reason,
            admitted = summary.admitted,
            rejected = summary.rejected,
            "Kiosk session closed"
        );
        summary
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn unavailable_message(channel: Channel) -> Option<&'static str> {
    match channel {
        Channel::Optical => Some(KioskMessages::CAMERA_UNAVAILABLE),
        Channel::Radio => Some(KioskMessages::RADIO_UNAVAILABLE),
        Channel::Manual => None,
    }
}

async fn poll_lookup(pending: &mut Option<PendingLookup>) -> ResolutionResult {
    match pending {
        Some(lookup) => lookup.future.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn wait_resume(resume: &mut Option<Pin<Box<Sleep>>>) {
    match resume {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
