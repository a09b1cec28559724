use thiserror::Error;

use crate::config::{MIDDLE_SLOT, SLOT_COUNT};
use crate::coordinator::Effect;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("playback element rejected {op}: {reason}")]
    Failed { op: &'static str, reason: String },
}

/// Contract every display slot exposes to the coordinator. All operations
/// are best-effort side effects; a failure on one slot never blocks the
/// others.
pub trait PlaybackFacade {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self) -> Result<(), PlaybackError>;
    /// Seek to zero, keeping the current play/pause state.
    fn restart(&mut self) -> Result<(), PlaybackError>;
    fn mute(&mut self) -> Result<(), PlaybackError>;
    fn unmute(&mut self) -> Result<(), PlaybackError>;
    /// Remote play: force seek to zero, then play, with a brief visual
    /// acknowledgment on the slot.
    fn sync_play(&mut self) -> Result<(), PlaybackError>;
    /// Remote pause, with the same visual acknowledgment.
    fn sync_pause(&mut self) -> Result<(), PlaybackError>;
}

/// The six display slots of one screen and the effect executor over them.
/// Unassigned slots are skipped; a failing slot is logged and the loop
/// continues.
pub struct DisplayGrid {
    slots: Vec<Option<Box<dyn PlaybackFacade + Send>>>,
    all_muted: bool,
}

impl Default for DisplayGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayGrid {
    pub fn new() -> Self {
        Self {
            slots: (0..SLOT_COUNT).map(|_| None).collect(),
            all_muted: false,
        }
    }

    pub fn set_slot(&mut self, index: usize, facade: Box<dyn PlaybackFacade + Send>) {
        if index < self.slots.len() {
            self.slots[index] = Some(facade);
        }
    }

    pub fn clear_slot(&mut self, index: usize) {
        if index < self.slots.len() {
            self.slots[index] = None;
        }
    }

    pub fn all_muted(&self) -> bool {
        self.all_muted
    }

    pub fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::PlayAll => self.each(None, "play", |f| f.play()),
            Effect::PauseAll => self.each(None, "pause", |f| f.pause()),
            Effect::RestartAll => self.each(None, "restart", |f| f.restart()),
            Effect::RestartStations => {
                self.each(Some(MIDDLE_SLOT), "restart", |f| f.restart())
            }
            Effect::RestartMiddle => {
                if let Some(Some(facade)) = self.slots.get_mut(MIDDLE_SLOT) {
                    if let Err(e) = facade.restart() {
                        log::warn!("Restart failed on slot {}: {}", MIDDLE_SLOT, e);
                    }
                }
            }
            Effect::SyncPlayAll => self.each(None, "sync play", |f| f.sync_play()),
            Effect::SyncPauseAll => self.each(None, "sync pause", |f| f.sync_pause()),
        }
    }

    /// Toggles mute across every assigned slot.
    pub fn toggle_mute_all(&mut self) {
        if self.all_muted {
            self.each(None, "unmute", |f| f.unmute());
        } else {
            self.each(None, "mute", |f| f.mute());
        }
        self.all_muted = !self.all_muted;
    }

    fn each<F>(&mut self, skip: Option<usize>, op: &str, mut apply: F)
    where
        F: FnMut(&mut (dyn PlaybackFacade + Send)) -> Result<(), PlaybackError>,
    {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if Some(index) == skip {
                continue;
            }
            if let Some(facade) = slot {
                if let Err(e) = apply(facade.as_mut()) {
                    log::warn!("{} failed on slot {}: {}", op, index, e);
                }
            }
        }
    }
}
