use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::registry::Registry;

/// Bounded per-connection sender. A full or closed buffer is a skipped
/// message, never a blocked relay (`try_send` only).
pub type Tx = mpsc::Sender<std::result::Result<warp::ws::Message, warp::Error>>;

pub type SharedRegistry = Arc<RwLock<Registry>>;

/// The kind of a sync command issued by a control surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Play,
    Pause,
    Stop,
}

/// Incoming WebSocket messages from screens and control panels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    RegisterScreen {
        screen_id: String,
    },
    RegisterControlPanel {},
    SyncPlay {
        target_screens: Vec<String>,
        timestamp: u64,
    },
    SyncPause {
        target_screens: Vec<String>,
        timestamp: u64,
    },
    SyncStop {
        target_screens: Vec<String>,
        timestamp: u64,
    },
    ScreenStatus {
        screen_id: String,
        status: String,
    },
}

impl ClientMessage {
    /// The sync command kind carried by this message, if any.
    pub fn sync_kind(&self) -> Option<SyncKind> {
        match self {
            ClientMessage::SyncPlay { .. } => Some(SyncKind::Play),
            ClientMessage::SyncPause { .. } => Some(SyncKind::Pause),
            ClientMessage::SyncStop { .. } => Some(SyncKind::Stop),
            _ => None,
        }
    }
}

/// Outgoing WebSocket messages from the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RegistrationSuccess {
        screen_id: String,
        connected_screens: Vec<String>,
    },
    ConnectedScreensUpdate {
        screens: Vec<String>,
    },
    ScreenConnected {
        screen_id: String,
    },
    ScreenDisconnected {
        screen_id: String,
    },
    PlayCommand {
        timestamp: u64,
    },
    PauseCommand {
        timestamp: u64,
    },
    StopCommand {
        timestamp: u64,
    },
    SyncCommandAck {
        action: SyncKind,
        target_screens: Vec<String>,
        timestamp: u64,
    },
    ScreenStatusUpdate {
        screen_id: String,
        status: String,
    },
}

impl ServerMessage {
    /// Builds the per-target command message for a sync kind.
    pub fn command(kind: SyncKind, timestamp: u64) -> ServerMessage {
        match kind {
            SyncKind::Play => ServerMessage::PlayCommand { timestamp },
            SyncKind::Pause => ServerMessage::PauseCommand { timestamp },
            SyncKind::Stop => ServerMessage::StopCommand { timestamp },
        }
    }
}
