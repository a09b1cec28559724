use std::collections::HashMap;

use log::{debug, info};

use crate::types::Tx;
use crate::utils::now_ms;

/// A registered screen transport.
#[derive(Debug, Clone)]
pub struct ScreenEntry {
    pub sender: Tx,
    /// Connection that registered this entry. A later registration for the
    /// same screen id replaces the entry; the stale connection's disconnect
    /// must then leave the replacement alone.
    pub conn_id: String,
    pub connected_at: u64,
}

/// In-memory map of live screen and control-panel connections.
///
/// Owned by the composition root and shared behind a lock; lives only for the
/// life of the relay process. Last registration for a screen id wins.
#[derive(Debug, Default)]
pub struct Registry {
    screens: HashMap<String, ScreenEntry>,
    panels: HashMap<String, Tx>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the mapping for `screen_id`. Reconnect churn is
    /// expected; no uniqueness enforcement beyond overwrite.
    pub fn register_screen(&mut self, conn_id: &str, screen_id: &str, sender: Tx) {
        let entry = ScreenEntry {
            sender,
            conn_id: conn_id.to_string(),
            connected_at: now_ms(),
        };
        if self.screens.insert(screen_id.to_string(), entry).is_some() {
            info!("Screen {} re-registered (replacing previous connection)", screen_id);
        } else {
            info!("Screen registered: {}", screen_id);
        }
    }

    pub fn register_control_panel(&mut self, conn_id: &str, sender: Tx) {
        info!("Control panel registered: {}", conn_id);
        self.panels.insert(conn_id.to_string(), sender);
    }

    /// Removes whatever `conn_id` registered. Idempotent; returns the screen
    /// id when a live screen entry was actually removed, so the caller can
    /// notify control panels.
    pub fn unregister(&mut self, conn_id: &str) -> Option<String> {
        if self.panels.remove(conn_id).is_some() {
            info!("Control panel disconnected: {}", conn_id);
            return None;
        }

        let screen_id = self
            .screens
            .iter()
            .find(|(_, entry)| entry.conn_id == conn_id)
            .map(|(id, _)| id.clone());

        if let Some(id) = screen_id {
            self.screens.remove(&id);
            info!("Screen disconnected: {}", id);
            Some(id)
        } else {
            debug!("Unregistered connection closed: {}", conn_id);
            None
        }
    }

    /// Current screen ids, order unspecified.
    pub fn screen_ids(&self) -> Vec<String> {
        self.screens.keys().cloned().collect()
    }

    pub fn screen_sender(&self, screen_id: &str) -> Option<&Tx> {
        self.screens.get(screen_id).map(|e| &e.sender)
    }

    pub fn connected_at(&self, screen_id: &str) -> Option<u64> {
        self.screens.get(screen_id).map(|e| e.connected_at)
    }

    pub fn panel_senders(&self) -> impl Iterator<Item = &Tx> {
        self.panels.values()
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }
}
