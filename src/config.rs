use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of display slots on one screen.
pub const SLOT_COUNT: usize = 6;
/// Slot driven by the middle ("secondary") timer.
pub const MIDDLE_SLOT: usize = 1;

const DEFAULT_STATION_SECS: u32 = 60;
const DEFAULT_MIDDLE_SECS: u32 = 60;
const DEFAULT_CLASS_SECS: u32 = 2700;
const DEFAULT_PREROLL_SECS: u32 = 120;
const DEFAULT_DELAY_SECS: u32 = 30;
const DEFAULT_DELAY_TEXT: &str = "Move to the next station";
const MIDDLE_RESTART_TEXT: &str = "Restarting Video";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid config format. Expected {{videoAssignments, globalTimers}}")]
    InvalidShape,
    #[error("videoAssignments must be an array of {SLOT_COUNT} items")]
    BadSlotCount,
    #[error("Missing required timer: {0}")]
    MissingTimer(&'static str),
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// One display slot's assignment, as stored by the configuration UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoAssignment {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Per-slot override for the station countdown, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_text: Option<String>,
}

/// The six named timer fields every stored config carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTimers {
    /// Station timer, seconds.
    pub timer1: u32,
    /// Middle slot timer, seconds.
    pub timer2: u32,
    /// Class countdown, seconds.
    pub timer3: u32,
    /// Pre-roll countdown before play, seconds.
    pub timer4: u32,
    /// Station break duration, seconds.
    pub delay1: u32,
    pub delay_text1: String,
}

impl Default for GlobalTimers {
    fn default() -> Self {
        Self {
            timer1: DEFAULT_STATION_SECS,
            timer2: DEFAULT_MIDDLE_SECS,
            timer3: DEFAULT_CLASS_SECS,
            timer4: DEFAULT_PREROLL_SECS,
            delay1: DEFAULT_DELAY_SECS,
            delay_text1: DEFAULT_DELAY_TEXT.to_string(),
        }
    }
}

/// Per-screen configuration: exactly [`SLOT_COUNT`] assignment slots plus the
/// global timer fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConfig {
    pub video_assignments: Vec<Option<VideoAssignment>>,
    pub global_timers: GlobalTimers,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            video_assignments: vec![None; SLOT_COUNT],
            global_timers: GlobalTimers::default(),
        }
    }
}

impl ScreenConfig {
    /// Parses and validates a raw payload the way the configuration API
    /// accepts it: an object with `videoAssignments` (exactly six slots) and
    /// `globalTimers` carrying all six named fields. The stored config stays
    /// untouched if this rejects.
    pub fn from_json(value: &serde_json::Value) -> Result<ScreenConfig, ConfigError> {
        let obj = value.as_object().ok_or(ConfigError::InvalidShape)?;
        let assignments = obj
            .get("videoAssignments")
            .and_then(|v| v.as_array())
            .ok_or(ConfigError::InvalidShape)?;
        if assignments.len() != SLOT_COUNT {
            return Err(ConfigError::BadSlotCount);
        }
        let timers = obj
            .get("globalTimers")
            .and_then(|v| v.as_object())
            .ok_or(ConfigError::InvalidShape)?;
        for field in ["timer1", "timer2", "timer3", "timer4", "delay1", "delayText1"] {
            if !timers.contains_key(field) {
                return Err(ConfigError::MissingTimer(field));
            }
        }
        serde_json::from_value(value.clone()).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video_assignments.len() != SLOT_COUNT {
            return Err(ConfigError::BadSlotCount);
        }
        Ok(())
    }
}

/// Effective countdown durations for one screen, derived from its slot
/// assignments with fall-back to the global timer fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerValues {
    pub station_duration: u32,
    pub station_delay: u32,
    pub station_delay_text: String,
    pub middle_duration: u32,
    pub class_duration: u32,
    pub preroll_duration: u32,
}

impl TimerValues {
    /// Station values come from the first non-middle assignment carrying a
    /// duration; middle values from the middle slot. The middle timer never
    /// has a break phase (fixed zero delay, fixed restart message).
    pub fn derive(config: &ScreenConfig) -> TimerValues {
        let g = &config.global_timers;
        let station = config
            .video_assignments
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != MIDDLE_SLOT)
            .filter_map(|(_, a)| a.as_ref())
            .find(|a| a.timer_duration.is_some());
        let middle = config
            .video_assignments
            .get(MIDDLE_SLOT)
            .and_then(|a| a.as_ref());

        TimerValues {
            station_duration: station.and_then(|a| a.timer_duration).unwrap_or(g.timer1),
            station_delay: station.and_then(|a| a.delay_duration).unwrap_or(g.delay1),
            station_delay_text: station
                .and_then(|a| a.delay_text.clone())
                .unwrap_or_else(|| g.delay_text1.clone()),
            middle_duration: middle.and_then(|a| a.timer_duration).unwrap_or(g.timer2),
            class_duration: g.timer3,
            preroll_duration: g.timer4,
        }
    }

    /// Displayed while the middle slot restarts.
    pub fn middle_restart_text() -> &'static str {
        MIDDLE_RESTART_TEXT
    }
}

impl Default for TimerValues {
    fn default() -> Self {
        TimerValues::derive(&ScreenConfig::default())
    }
}

/// External key-value store for per-screen configs, keyed by screen id.
/// `get` returning `None` means the caller supplies [`ScreenConfig::default`].
pub trait ConfigStore {
    fn get(&self, screen_id: &str) -> Option<ScreenConfig>;
    fn set(&mut self, screen_id: &str, config: ScreenConfig) -> Result<(), ConfigError>;
}

/// Process-local store, used in tests and as the collaborator stand-in.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    configs: HashMap<String, ScreenConfig>,
}

impl ConfigStore for InMemoryConfigStore {
    fn get(&self, screen_id: &str) -> Option<ScreenConfig> {
        self.configs.get(screen_id).cloned()
    }

    fn set(&mut self, screen_id: &str, config: ScreenConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.configs.insert(screen_id.to_string(), config);
        Ok(())
    }
}

/// External provider of selectable video sources; opaque to the core.
pub trait VideoLibrary {
    fn list(&self) -> Vec<String>;
}
