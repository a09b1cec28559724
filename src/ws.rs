use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::messaging::{broadcast_to_panels, send};
use crate::types::{ClientMessage, ServerMessage, SharedRegistry, SyncKind, Tx};

// Channel buffer size for client message queues (prevents OOM from slow clients)
const CLIENT_CHANNEL_BUFFER: usize = 100;

// Payload validation
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Owns one WebSocket for its whole life: forwards the bounded outbound
/// queue, feeds inbound messages through the protocol handler, and cleans up
/// the registry when the transport closes.
pub async fn client_connection(ws: warp::ws::WebSocket, registry: SharedRegistry) {
    let (client_ws_sender, mut client_ws_rcv) = ws.split();
    let (sender, receiver) = mpsc::channel(CLIENT_CHANNEL_BUFFER);
    let receiver = ReceiverStream::new(receiver);

    tokio::task::spawn(async move {
        let _ = receiver.forward(client_ws_sender).await;
    });

    let conn_id = uuid::Uuid::new_v4().to_string();
    info!("Client connected: {}", conn_id);

    while let Some(result) = client_ws_rcv.next().await {
        match result {
            Ok(msg) => handle_raw_message(&conn_id, msg, &sender, &registry).await,
            Err(e) => {
                warn!("WebSocket error for {}: {}", conn_id, e);
                break;
            }
        }
    }

    handle_disconnect(&conn_id, &registry).await;
}

/// Transport closed: drop whatever the connection registered. Control panels
/// are told when a registered screen goes away.
pub async fn handle_disconnect(conn_id: &str, registry: &SharedRegistry) {
    let mut locked = registry.write().await;
    if let Some(screen_id) = locked.unregister(conn_id) {
        broadcast_to_panels(&locked, &ServerMessage::ScreenDisconnected { screen_id });
    }
}

async fn handle_raw_message(
    conn_id: &str,
    msg: warp::ws::Message,
    sender: &Tx,
    registry: &SharedRegistry,
) {
    if msg.as_bytes().len() > MAX_MESSAGE_SIZE {
        warn!("Message too large from {}: {} bytes", conn_id, msg.as_bytes().len());
        return;
    }
    // Pings, pongs and binary frames are not protocol messages.
    let text = match msg.to_str() {
        Ok(s) => s,
        Err(_) => return,
    };
    let parsed: ClientMessage = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparseable message from {}: {}", conn_id, e);
            return;
        }
    };
    handle_client_message(conn_id, parsed, sender, registry).await;
}

/// The relay protocol. Intentionally dumb: no timer logic, no command
/// history, every command independently idempotent at the receiver. Nothing
/// in here returns an error across the protocol boundary; failures are
/// logged and skipped.
pub async fn handle_client_message(
    conn_id: &str,
    msg: ClientMessage,
    sender: &Tx,
    registry: &SharedRegistry,
) {
    debug!("Message from {}: {:?}", conn_id, msg);
    match msg {
        ClientMessage::RegisterScreen { screen_id } => {
            let mut locked = registry.write().await;
            locked.register_screen(conn_id, &screen_id, sender.clone());
            broadcast_to_panels(
                &locked,
                &ServerMessage::ScreenConnected { screen_id: screen_id.clone() },
            );
            send(
                sender,
                &ServerMessage::RegistrationSuccess {
                    screen_id,
                    connected_screens: locked.screen_ids(),
                },
            );
        }
        ClientMessage::RegisterControlPanel {} => {
            let mut locked = registry.write().await;
            locked.register_control_panel(conn_id, sender.clone());
            send(
                sender,
                &ServerMessage::ConnectedScreensUpdate { screens: locked.screen_ids() },
            );
        }
        ClientMessage::SyncPlay { target_screens, timestamp } => {
            dispatch_sync(SyncKind::Play, target_screens, timestamp, sender, registry).await;
        }
        ClientMessage::SyncPause { target_screens, timestamp } => {
            dispatch_sync(SyncKind::Pause, target_screens, timestamp, sender, registry).await;
        }
        ClientMessage::SyncStop { target_screens, timestamp } => {
            dispatch_sync(SyncKind::Stop, target_screens, timestamp, sender, registry).await;
        }
        ClientMessage::ScreenStatus { screen_id, status } => {
            let locked = registry.read().await;
            broadcast_to_panels(
                &locked,
                &ServerMessage::ScreenStatusUpdate { screen_id, status },
            );
        }
    }
}

/// Delivers the command to every live target; ids with no connection are
/// skipped, not queued. The ack names the full original target set either
/// way: it means "command processed", not "command delivered".
async fn dispatch_sync(
    kind: SyncKind,
    target_screens: Vec<String>,
    timestamp: u64,
    sender: &Tx,
    registry: &SharedRegistry,
) {
    let locked = registry.read().await;
    for screen_id in &target_screens {
        match locked.screen_sender(screen_id) {
            Some(tx) => {
                send(tx, &ServerMessage::command(kind, timestamp));
                debug!("{:?} command sent to {}", kind, screen_id);
            }
            None => {
                info!("Screen {} not connected; skipping {:?} command", screen_id, kind);
            }
        }
    }
    send(
        sender,
        &ServerMessage::SyncCommandAck { action: kind, target_screens, timestamp },
    );
}
