//! Controller harness

use serene_ap::controller::{AudioController, AudioHandle, ControllerParts, ControllerTimings};
use serene_ap::db;
use serene_ap::platform::{FileCaptureBackend, FixedPermission, SimulatedPlayer};
use serene_ap::playback::PlaylistItem;
use serene_ap::recording::{RecordingLimits, RecordingStore};
use serene_ap::session::{ActivationError, SessionBackend};
use serene_common::events::{AudioEvent, EventBus};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Shared record of backend transitions
#[derive(Clone, Default)]
pub struct SessionLog {
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_activation: Arc<Mutex<bool>>,
}

impl SessionLog {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn activations(&self) -> usize {
        self.calls().iter().filter(|c| **c == "activate").count()
    }

    pub fn deactivations(&self) -> usize {
        self.calls().iter().filter(|c| **c == "deactivate").count()
    }

    pub fn set_fail_activation(&self, fail: bool) {
        *self.fail_activation.lock().unwrap() = fail;
    }
}

struct RecordingSessionBackend(SessionLog);

impl SessionBackend for RecordingSessionBackend {
    fn activate(&mut self) -> Result<(), ActivationError> {
        self.0.calls.lock().unwrap().push("activate");
        if *self.0.fail_activation.lock().unwrap() {
            return Err(ActivationError::Failed("category conflict".to_string()));
        }
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), ActivationError> {
        self.0.calls.lock().unwrap().push("deactivate");
        Ok(())
    }
}

pub struct TestAudioBuilder {
    permission: bool,
    limits: RecordingLimits,
    timings: ControllerTimings,
}

impl Default for TestAudioBuilder {
    fn default() -> Self {
        Self {
            permission: true,
            limits: RecordingLimits::default(),
            timings: ControllerTimings::default(),
        }
    }
}

impl TestAudioBuilder {
    pub fn permission(mut self, granted: bool) -> Self {
        self.permission = granted;
        self
    }

    pub fn limits(mut self, limits: RecordingLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> TestAudio {
        let dir = TempDir::new().unwrap();
        let session = SessionLog::default();
        // Large enough that progress samples never lag a subscriber in long tests
        let events = EventBus::new(8192);
        let (handle, mailbox) =
            AudioHandle::channel(Arc::new(FixedPermission(self.permission)), events.clone());

        let parts = ControllerParts {
            session_backend: Box::new(RecordingSessionBackend(session.clone())),
            player: Box::new(SimulatedPlayer::new(handle.player_events())),
            capture: Box::new(FileCaptureBackend::new()),
            store: RecordingStore::new(dir.path().join("recordings")),
            limits: self.limits,
            timings: self.timings,
            events,
        };
        let task = AudioController::new(mailbox, parts).spawn();

        TestAudio {
            handle,
            session,
            dir,
            task,
        }
    }
}

/// Running controller plus the pieces tests inspect
pub struct TestAudio {
    pub handle: AudioHandle,
    pub session: SessionLog,
    pub dir: TempDir,
    pub task: JoinHandle<()>,
}

impl TestAudio {
    pub fn start() -> Self {
        TestAudioBuilder::default().build()
    }

    pub fn builder() -> TestAudioBuilder {
        TestAudioBuilder::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AudioEvent> {
        self.handle.subscribe()
    }
}

/// Drain everything currently buffered on a subscription
pub fn drain(rx: &mut broadcast::Receiver<AudioEvent>) -> Vec<AudioEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

pub fn item(id: &str, secs: Option<u64>) -> PlaylistItem {
    let item = PlaylistItem::new(id, format!("Title {}", id), format!("file:///{}.m4a", id));
    match secs {
        Some(secs) => item.with_duration(Duration::from_secs(secs)),
        None => item,
    }
}

/// Let the controller drain signals and player events
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// In-memory settings database with defaults
pub async fn test_db() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init::create_settings_table(&pool).await.unwrap();
    db::init_settings_defaults(&pool).await.unwrap();
    pool
}
