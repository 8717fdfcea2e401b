//! Common fixtures for kiosk integration tests.
//!
//! [`KioskFixture`] starts a session on mock devices and keeps every control
//! handle around, so tests can present codes, tap tags and inspect what the
//! kiosk signalled and where it navigated.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rollcall_core::{DirectoryEntry, EntityId, EntityKind, Token};
use rollcall_directory::InMemoryDirectory;
use rollcall_hardware::mock::{
    MockCamera, MockCameraHandle, MockDecoder, MockFeedback, MockFeedbackHandle, MockRadio,
    MockRadioHandle,
};
use rollcall_hardware::{
    AnyCameraDevice, AnyFeedbackDevice, AnyFrameDecoder, AnyRadioDevice, DecoderChain,
};
use rollcall_kiosk::{
    KioskConfig, KioskDevices, KioskEngine, KioskHandle, KioskMessages, Route, SessionEvent,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Directory used by most tests.
///
/// | token    | kind    | id | status  |
/// |----------|---------|----|---------|
/// | qr_011   | student | 11 | active  |
/// | nfc_001  | student | 1  | active  |
/// | A1B2C3   | student | 12 | active  |
/// | qr_007   | teacher | 7  | active  |
/// | nfc_042  | teacher | 42 | revoked |
pub fn school_directory() -> Arc<InMemoryDirectory> {
    let entry = |token: &str, kind, id| {
        DirectoryEntry::active(Token::new(token).unwrap(), kind, EntityId::new(id))
    };

    Arc::new(InMemoryDirectory::from_entries([
        entry("qr_011", EntityKind::Student, 11),
        entry("nfc_001", EntityKind::Student, 1),
        entry("A1B2C3", EntityKind::Student, 12),
        entry("qr_007", EntityKind::Teacher, 7),
        entry("nfc_042", EntityKind::Teacher, 42).revoked(),
    ]))
}

pub struct KioskFixture {
    pub kiosk: KioskHandle,
    pub events: broadcast::Receiver<SessionEvent>,
    pub camera: MockCameraHandle,
    pub radio: MockRadioHandle,
    pub feedback: MockFeedbackHandle,
    pub directory: Arc<InMemoryDirectory>,
    pub routes: Arc<Mutex<Vec<Route>>>,
}

impl KioskFixture {
    pub fn start() -> Self {
        Self::builder().start()
    }

    pub fn builder() -> KioskFixtureBuilder {
        KioskFixtureBuilder {
            config: KioskConfig::default(),
            directory: school_directory(),
            camera_denied: false,
        }
    }

    /// Routes handed to the router so far.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    /// Next session event.
    pub async fn next_event(&mut self) -> SessionEvent {
        next_event(&mut self.events).await
    }

    /// Skip events until one matches `predicate`, and return it.
    pub async fn wait_for(&mut self, predicate: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
        loop {
            let event = self.next_event().await;
            if predicate(&event) {
                return event;
            }
        }
    }

    /// Collect events until one matches `predicate`, inclusive.
    pub async fn collect_until(
        &mut self,
        predicate: impl Fn(&SessionEvent) -> bool,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        loop {
            let event = self.next_event().await;
            let done = predicate(&event);
            events.push(event);
            if done {
                return events;
            }
        }
    }

    /// Wait until the session has finished arming its start-up channels.
    pub async fn wait_until_listening(&mut self) {
        self.wait_for(is_ready_notice).await;
    }
}

pub struct KioskFixtureBuilder {
    config: KioskConfig,
    directory: Arc<InMemoryDirectory>,
    camera_denied: bool,
}

impl KioskFixtureBuilder {
    pub fn config(mut self, config: KioskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn directory(mut self, directory: Arc<InMemoryDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn camera_denied(mut self) -> Self {
        self.camera_denied = true;
        self
    }

    pub fn start(self) -> KioskFixture {
        let (camera, camera_handle) = if self.camera_denied {
            MockCamera::denied()
        } else {
            MockCamera::new()
        };
        let (radio, radio_handle) = MockRadio::new();
        let (feedback, feedback_handle) = MockFeedback::new();

        let routes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&routes);
        let router = move |route: Route| sink.lock().unwrap().push(route);

        let engine =
            KioskEngine::new(self.config, Arc::clone(&self.directory), router).unwrap();
        let events = engine.subscribe();

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

        KioskFixture {
            kiosk: engine.start(devices),
            events,
            camera: camera_handle,
            radio: radio_handle,
            feedback: feedback_handle,
            directory: self.directory,
            routes,
        }
    }
}

/// Next event on `events`, tolerating lag.
pub async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    loop {
        let received = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("timed out waiting for a session event");

        match received {
            Ok(event) => return event,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => panic!("session event stream closed"),
        }
    }
}

pub fn is_resolved(event: &SessionEvent) -> bool {
    matches!(event, SessionEvent::Resolved { .. })
}

pub fn is_closed(event: &SessionEvent) -> bool {
    matches!(event, SessionEvent::Closed { .. })
}

pub fn is_resumed(event: &SessionEvent) -> bool {
    matches!(event, SessionEvent::Resumed)
}

pub fn is_ready_notice(event: &SessionEvent) -> bool {
    matches!(event, SessionEvent::Notice { message } if *message == KioskMessages::READY)
}
