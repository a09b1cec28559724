use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{oneshot, Mutex};

use crate::config::TimerValues;
use crate::coordinator::{Event, TimerCoordinator};
use crate::playback::DisplayGrid;
use crate::types::{ClientMessage, ServerMessage, SyncKind};
use crate::utils::now_ms;

/// All sub-machines advance on this boundary.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("not connected to the relay")]
    Disconnected,
}

/// One full-screen display session: the timer coordinator plus the display
/// grid it drives. Created when the session opens, dropped when it closes.
pub struct KioskSession {
    coordinator: TimerCoordinator,
    grid: DisplayGrid,
    relay_connected: bool,
}

impl KioskSession {
    pub fn new(values: TimerValues, grid: DisplayGrid) -> Self {
        Self {
            coordinator: TimerCoordinator::new(values),
            grid,
            relay_connected: false,
        }
    }

    pub fn coordinator(&self) -> &TimerCoordinator {
        &self.coordinator
    }

    pub fn grid_mut(&mut self) -> &mut DisplayGrid {
        &mut self.grid
    }

    pub fn set_relay_connected(&mut self, connected: bool) {
        self.relay_connected = connected;
    }

    /// Feeds one event through the coordinator and executes the resulting
    /// effects on the grid, one slot at a time.
    pub fn handle(&mut self, event: Event) {
        for effect in self.coordinator.handle(event) {
            self.grid.apply(&effect);
        }
    }

    /// Applies durations changed by the configuration UI.
    pub fn update_values(&mut self, values: TimerValues) {
        self.coordinator.update_values(values);
    }

    /// Routes a relay command into the coordinator. Non-command messages are
    /// ignored here; the connection layer handles them.
    pub fn handle_server_message(&mut self, msg: &ServerMessage) {
        if let Some(event) = command_event(msg) {
            self.handle(event);
        }
    }

    /// Builds the sync command a control surface wants to send. Rejected at
    /// the point of intent while disconnected, so the UI can tell the
    /// operator; once connected, delivery is best-effort.
    pub fn sync_command(
        &self,
        kind: SyncKind,
        target_screens: Vec<String>,
    ) -> Result<ClientMessage, SessionError> {
        if !self.relay_connected {
            return Err(SessionError::Disconnected);
        }
        let timestamp = now_ms();
        Ok(match kind {
            SyncKind::Play => ClientMessage::SyncPlay { target_screens, timestamp },
            SyncKind::Pause => ClientMessage::SyncPause { target_screens, timestamp },
            SyncKind::Stop => ClientMessage::SyncStop { target_screens, timestamp },
        })
    }
}

/// The coordinator event a relay command maps to, if any.
pub fn command_event(msg: &ServerMessage) -> Option<Event> {
    match msg {
        ServerMessage::PlayCommand { .. } => Some(Event::RemotePlay),
        ServerMessage::PauseCommand { .. } => Some(Event::RemotePause),
        ServerMessage::StopCommand { .. } => Some(Event::RemoteStop),
        _ => None,
    }
}

/// Single monotonic ticker for a session: one interval advances every active
/// countdown, so sub-machines can never drift apart. Runs until the shutdown
/// signal fires.
pub async fn drive(session: Arc<Mutex<KioskSession>>, mut shutdown: oneshot::Receiver<()>) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    // The first tick of a tokio interval fires immediately; skip it.
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                session.lock().await.handle(Event::Tick);
            }
            _ = &mut shutdown => {
                log::info!("Session ticker stopped");
                return;
            }
        }
    }
}
