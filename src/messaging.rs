use crate::registry::Registry;
use crate::types::{ServerMessage, Tx};

/// Serializes and queues a message on one connection. A full or closed
/// buffer is logged and skipped (`try_send`, never blocking the relay).
pub fn send(sender: &Tx, msg: &ServerMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            if let Err(e) = sender.try_send(Ok(warp::ws::Message::text(json))) {
                log::warn!("Failed to send message (buffer full or closed): {}", e);
            }
        }
        Err(e) => {
            log::error!("Failed to serialize message: {}", e);
        }
    }
}

/// Fans a message out to every control panel, serialized once.
pub fn broadcast_to_panels(registry: &Registry, msg: &ServerMessage) {
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(e) => {
            log::error!("Failed to serialize broadcast message: {}", e);
            return;
        }
    };
    let warp_msg = warp::ws::Message::text(json);
    for sender in registry.panel_senders() {
        if let Err(e) = sender.try_send(Ok(warp_msg.clone())) {
            log::warn!("Failed to broadcast to control panel (buffer full or closed): {}", e);
        }
    }
}
