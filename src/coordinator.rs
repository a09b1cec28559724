use crate::config::TimerValues;

/// Inputs to the coordinator: the shared one-second tick, local operator
/// intents, and commands arriving from the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Tick,
    PlayRequested,
    PauseRequested,
    PrerollSkipped,
    PrerollCancelled,
    ResetRequested,
    RemotePlay,
    RemotePause,
    RemoteStop,
}

/// Playback side effects a transition asks the display grid to execute.
/// The coordinator never touches displays itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    PlayAll,
    PauseAll,
    /// Seek every slot to zero, keeping its current play/pause state.
    RestartAll,
    /// Seek every slot except the middle one to zero.
    RestartStations,
    RestartMiddle,
    /// Remote play always restarts from the beginning and shows the sync
    /// indicator, unlike a local play which resumes.
    SyncPlayAll,
    SyncPauseAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandOrigin {
    Local,
    Remote,
}

/// Class countdown. Expiry is terminal until an explicit reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalTimer {
    pub time_left: u32,
    pub active: bool,
    pub expired: bool,
}

/// Station countdown with its break sub-phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationTimer {
    pub time_left: u32,
    pub delay_time_left: u32,
    pub in_delay: bool,
    pub active: bool,
}

/// Middle-slot countdown, single phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddleTimer {
    pub time_left: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PrerollGate {
    time_left: u32,
    origin: CommandOrigin,
}

/// Client-side state machine owning the four countdowns of one screen
/// session. Every transition is a pure function of the current state and one
/// [`Event`], returning the [`Effect`]s to execute; all active countdowns
/// advance on the same tick boundary so they cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerCoordinator {
    values: TimerValues,
    global: GlobalTimer,
    station: StationTimer,
    middle: MiddleTimer,
    preroll: Option<PrerollGate>,
    playing: bool,
}

impl TimerCoordinator {
    pub fn new(values: TimerValues) -> Self {
        let mut coordinator = Self {
            global: GlobalTimer { time_left: 0, active: false, expired: false },
            station: StationTimer {
                time_left: 0,
                delay_time_left: 0,
                in_delay: false,
                active: false,
            },
            middle: MiddleTimer { time_left: 0, active: false },
            preroll: None,
            playing: false,
            values,
        };
        coordinator.reset_to_base();
        coordinator
    }

    pub fn global(&self) -> &GlobalTimer {
        &self.global
    }

    pub fn station(&self) -> &StationTimer {
        &self.station
    }

    pub fn middle(&self) -> &MiddleTimer {
        &self.middle
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Seconds left on the pre-roll gate, while one is pending.
    pub fn preroll_remaining(&self) -> Option<u32> {
        self.preroll.as_ref().map(|g| g.time_left)
    }

    pub fn values(&self) -> &TimerValues {
        &self.values
    }

    /// Applies a config change. Durations refresh only for sub-machines not
    /// currently counting in the affected phase, so a running countdown is
    /// never yanked out from under the operator.
    pub fn update_values(&mut self, values: TimerValues) {
        if !self.station.active && !self.station.in_delay {
            self.station.time_left = values.station_duration;
        }
        if !self.station.in_delay {
            self.station.delay_time_left = values.station_delay;
        }
        if !self.middle.active {
            self.middle.time_left = values.middle_duration;
        }
        if !self.global.active && !self.global.expired {
            self.global.time_left = values.class_duration;
        }
        self.values = values;
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Tick => self.tick(),
            Event::PlayRequested => self.open_preroll(CommandOrigin::Local),
            Event::PauseRequested => {
                if !self.playing {
                    return Vec::new();
                }
                self.freeze();
                vec![Effect::PauseAll]
            }
            Event::PrerollSkipped => self.complete_preroll(),
            Event::PrerollCancelled => {
                // Leaves playback state untouched: still stopped.
                self.preroll = None;
                Vec::new()
            }
            Event::ResetRequested => {
                self.preroll = None;
                self.freeze();
                self.reset_to_base();
                vec![Effect::RestartAll, Effect::PauseAll]
            }
            Event::RemotePlay => self.open_preroll(CommandOrigin::Remote),
            Event::RemotePause => {
                self.preroll = None;
                if !self.playing {
                    return Vec::new();
                }
                self.freeze();
                vec![Effect::SyncPauseAll]
            }
            Event::RemoteStop => {
                self.preroll = None;
                self.freeze();
                self.reset_to_base();
                vec![Effect::SyncPauseAll, Effect::RestartAll]
            }
        }
    }

    fn tick(&mut self) -> Vec<Effect> {
        // The pre-roll gate counts down even though playback is stopped.
        if let Some(gate) = self.preroll.as_mut() {
            gate.time_left = gate.time_left.saturating_sub(1);
            if gate.time_left == 0 {
                return self.complete_preroll();
            }
            return Vec::new();
        }

        if !self.playing {
            return Vec::new();
        }

        let mut effects = Vec::new();

        // Class countdown first: its expiry freezes the siblings on this same
        // tick boundary, leaving their values exactly where they were.
        if self.global.active {
            self.global.time_left = self.global.time_left.saturating_sub(1);
            if self.global.time_left == 0 {
                self.global.active = false;
                self.global.expired = true;
                self.station.active = false;
                self.middle.active = false;
                self.playing = false;
                log::info!("Class timer expired; pausing all displays");
                effects.push(Effect::PauseAll);
                return effects;
            }
        }

        if self.station.active {
            if self.station.in_delay {
                self.station.delay_time_left = self.station.delay_time_left.saturating_sub(1);
                if self.station.delay_time_left == 0 {
                    effects.push(Effect::RestartStations);
                    self.station.in_delay = false;
                    self.station.time_left = self.values.station_duration;
                    self.station.delay_time_left = self.values.station_delay;
                }
            } else {
                self.station.time_left = self.station.time_left.saturating_sub(1);
                if self.station.time_left == 0 {
                    self.station.in_delay = true;
                    self.station.delay_time_left = self.values.station_delay;
                }
            }
        }

        if self.middle.active {
            self.middle.time_left = self.middle.time_left.saturating_sub(1);
            if self.middle.time_left == 0 {
                effects.push(Effect::RestartMiddle);
                self.middle.time_left = self.values.middle_duration;
            }
        }

        effects
    }

    fn open_preroll(&mut self, origin: CommandOrigin) -> Vec<Effect> {
        if self.playing || self.preroll.is_some() {
            return Vec::new();
        }
        if self.global.expired {
            log::info!("Class timer expired; ignoring play request");
            return Vec::new();
        }
        self.preroll = Some(PrerollGate {
            time_left: self.values.preroll_duration,
            origin,
        });
        Vec::new()
    }

    /// Stopped -> playing. Countdowns resume from their frozen values,
    /// break phase included.
    fn complete_preroll(&mut self) -> Vec<Effect> {
        let origin = match self.preroll.take() {
            Some(gate) => gate.origin,
            None => return Vec::new(),
        };
        self.playing = true;
        self.global.active = true;
        self.station.active = true;
        self.middle.active = true;
        match origin {
            CommandOrigin::Local => vec![Effect::PlayAll],
            CommandOrigin::Remote => vec![Effect::SyncPlayAll],
        }
    }

    fn freeze(&mut self) {
        self.playing = false;
        self.global.active = false;
        self.station.active = false;
        self.middle.active = false;
    }

    fn reset_to_base(&mut self) {
        self.global = GlobalTimer {
            time_left: self.values.class_duration,
            active: false,
            expired: false,
        };
        self.station = StationTimer {
            time_left: self.values.station_duration,
            delay_time_left: self.values.station_delay,
            in_delay: false,
            active: false,
        };
        self.middle = MiddleTimer {
            time_left: self.values.middle_duration,
            active: false,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(station: u32, delay: u32, middle: u32, class: u32) -> TimerValues {
        TimerValues {
            station_duration: station,
            station_delay: delay,
            station_delay_text: "Move to the next station".to_string(),
            middle_duration: middle,
            class_duration: class,
            preroll_duration: 120,
        }
    }

    fn start(coordinator: &mut TimerCoordinator) -> Vec<Effect> {
        assert!(coordinator.handle(Event::PlayRequested).is_empty());
        coordinator.handle(Event::PrerollSkipped)
    }

    /// Ticks n times, returning every effect emitted along the way.
    fn tick_n(coordinator: &mut TimerCoordinator, n: u32) -> Vec<Effect> {
        let mut effects = Vec::new();
        for _ in 0..n {
            effects.extend(coordinator.handle(Event::Tick));
        }
        effects
    }

    #[test]
    fn test_station_cycle_counts_delays_and_restarts() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 300, 2700));
        assert_eq!(start(&mut coordinator), vec![Effect::PlayAll]);

        // After 60 ticks the station timer is in its break phase.
        let effects = tick_n(&mut coordinator, 60);
        assert!(!effects.contains(&Effect::RestartStations));
        assert!(coordinator.station().in_delay);
        assert_eq!(coordinator.station().time_left, 0);
        assert_eq!(coordinator.station().delay_time_left, 30);

        // 30 more ticks: restart fires and counting resumes from the top.
        let effects = tick_n(&mut coordinator, 30);
        assert_eq!(effects, vec![Effect::RestartStations]);
        assert!(!coordinator.station().in_delay);
        assert_eq!(coordinator.station().time_left, 60);
        assert_eq!(coordinator.station().delay_time_left, 30);
    }

    #[test]
    fn test_station_cycle_repeats_indefinitely() {
        let mut coordinator = TimerCoordinator::new(values(10, 5, 300, 100_000));
        start(&mut coordinator);

        // Three full count/break cycles of 15 ticks each.
        for _ in 0..3 {
            let effects = tick_n(&mut coordinator, 15);
            assert_eq!(effects, vec![Effect::RestartStations]);
            assert_eq!(coordinator.station().time_left, 10);
            assert!(!coordinator.station().in_delay);
        }
    }

    #[test]
    fn test_middle_restarts_while_global_keeps_counting() {
        let mut coordinator = TimerCoordinator::new(values(300, 30, 60, 2700));
        start(&mut coordinator);

        let effects = tick_n(&mut coordinator, 60);
        assert_eq!(effects, vec![Effect::RestartMiddle]);
        assert_eq!(coordinator.middle().time_left, 60);
        assert_eq!(coordinator.global().time_left, 2640);
    }

    #[test]
    fn test_global_expiry_pauses_everything_once() {
        let mut coordinator = TimerCoordinator::new(values(300, 30, 300, 3));
        start(&mut coordinator);

        assert!(tick_n(&mut coordinator, 2).is_empty());
        let effects = coordinator.handle(Event::Tick);
        assert_eq!(effects, vec![Effect::PauseAll]);
        assert!(coordinator.global().expired);
        assert!(!coordinator.is_playing());

        // Idempotent: further ticks never go below zero or re-fire the pause.
        assert!(tick_n(&mut coordinator, 10).is_empty());
        assert_eq!(coordinator.global().time_left, 0);
    }

    #[test]
    fn test_global_expiry_freezes_delay_phase_values() {
        // Station enters its break at tick 5; by tick 30 the break reads 5;
        // the class countdown expires on tick 31 before anything else moves.
        let mut coordinator = TimerCoordinator::new(values(5, 30, 300, 31));
        start(&mut coordinator);

        tick_n(&mut coordinator, 30);
        assert!(coordinator.station().in_delay);
        assert_eq!(coordinator.station().delay_time_left, 5);

        let effects = coordinator.handle(Event::Tick);
        assert_eq!(effects, vec![Effect::PauseAll]);
        assert!(coordinator.station().in_delay);
        assert_eq!(coordinator.station().delay_time_left, 5);
        assert!(!coordinator.station().active);
        assert!(!coordinator.middle().active);
    }

    #[test]
    fn test_expired_global_blocks_play_until_reset() {
        let mut coordinator = TimerCoordinator::new(values(300, 30, 300, 1));
        start(&mut coordinator);
        coordinator.handle(Event::Tick);
        assert!(coordinator.global().expired);

        assert!(coordinator.handle(Event::PlayRequested).is_empty());
        assert!(coordinator.preroll_remaining().is_none());

        let effects = coordinator.handle(Event::ResetRequested);
        assert_eq!(effects, vec![Effect::RestartAll, Effect::PauseAll]);
        assert!(!coordinator.global().expired);
        assert_eq!(coordinator.global().time_left, 1);
        assert_eq!(start(&mut coordinator), vec![Effect::PlayAll]);
    }

    #[test]
    fn test_pause_resume_preserves_values_exactly() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 45, 2700));
        start(&mut coordinator);
        tick_n(&mut coordinator, 17);

        let effects = coordinator.handle(Event::PauseRequested);
        assert_eq!(effects, vec![Effect::PauseAll]);
        let frozen_station = coordinator.station().clone();
        let frozen_middle = coordinator.middle().clone();
        let frozen_global = coordinator.global().clone();

        // Nothing moves while paused.
        assert!(tick_n(&mut coordinator, 50).is_empty());
        assert_eq!(coordinator.station().time_left, frozen_station.time_left);
        assert_eq!(coordinator.middle().time_left, frozen_middle.time_left);
        assert_eq!(coordinator.global().time_left, frozen_global.time_left);

        // Resuming continues from the frozen point with no drift.
        start(&mut coordinator);
        coordinator.handle(Event::Tick);
        assert_eq!(coordinator.station().time_left, frozen_station.time_left - 1);
        assert_eq!(coordinator.global().time_left, frozen_global.time_left - 1);
    }

    #[test]
    fn test_resume_continues_break_phase() {
        let mut coordinator = TimerCoordinator::new(values(5, 30, 300, 2700));
        start(&mut coordinator);
        tick_n(&mut coordinator, 10); // 5 counting + 5 into the break

        coordinator.handle(Event::PauseRequested);
        assert!(coordinator.station().in_delay);
        assert_eq!(coordinator.station().delay_time_left, 25);

        start(&mut coordinator);
        coordinator.handle(Event::Tick);
        assert!(coordinator.station().in_delay);
        assert_eq!(coordinator.station().delay_time_left, 24);
    }

    #[test]
    fn test_preroll_gate_counts_down_to_play() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 60, 2700));
        assert!(coordinator.handle(Event::PlayRequested).is_empty());
        assert_eq!(coordinator.preroll_remaining(), Some(120));
        assert!(!coordinator.is_playing());

        let effects = tick_n(&mut coordinator, 119);
        assert!(effects.is_empty());
        assert_eq!(coordinator.preroll_remaining(), Some(1));
        // Countdowns hold still while the gate is pending.
        assert_eq!(coordinator.global().time_left, 2700);

        let effects = coordinator.handle(Event::Tick);
        assert_eq!(effects, vec![Effect::PlayAll]);
        assert!(coordinator.is_playing());
        assert!(coordinator.preroll_remaining().is_none());
    }

    #[test]
    fn test_preroll_cancel_has_no_side_effects() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 60, 2700));
        coordinator.handle(Event::PlayRequested);
        tick_n(&mut coordinator, 7);

        assert!(coordinator.handle(Event::PrerollCancelled).is_empty());
        assert!(!coordinator.is_playing());
        assert!(coordinator.preroll_remaining().is_none());
        assert!(tick_n(&mut coordinator, 10).is_empty());
        assert_eq!(coordinator.global().time_left, 2700);
    }

    #[test]
    fn test_remote_play_runs_gate_then_sync_plays() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 60, 2700));
        assert!(coordinator.handle(Event::RemotePlay).is_empty());
        assert_eq!(coordinator.preroll_remaining(), Some(120));

        // Another remote play mid-gate is a no-op.
        assert!(coordinator.handle(Event::RemotePlay).is_empty());
        assert_eq!(coordinator.preroll_remaining(), Some(120));

        let effects = coordinator.handle(Event::PrerollSkipped);
        assert_eq!(effects, vec![Effect::SyncPlayAll]);
        assert!(coordinator.is_playing());
    }

    #[test]
    fn test_remote_pause_freezes_and_cancels_gate() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 60, 2700));
        start(&mut coordinator);
        tick_n(&mut coordinator, 5);

        let effects = coordinator.handle(Event::RemotePause);
        assert_eq!(effects, vec![Effect::SyncPauseAll]);
        assert!(!coordinator.is_playing());
        assert_eq!(coordinator.station().time_left, 55);

        // A gate pending when the pause arrives is cancelled.
        coordinator.handle(Event::PlayRequested);
        assert!(coordinator.handle(Event::RemotePause).is_empty());
        assert!(coordinator.preroll_remaining().is_none());
    }

    #[test]
    fn test_remote_stop_restores_base_values_from_any_phase() {
        let mut coordinator = TimerCoordinator::new(values(5, 30, 60, 2700));
        start(&mut coordinator);
        tick_n(&mut coordinator, 12); // mid break phase
        assert!(coordinator.station().in_delay);

        let effects = coordinator.handle(Event::RemoteStop);
        assert_eq!(effects, vec![Effect::SyncPauseAll, Effect::RestartAll]);
        assert!(!coordinator.is_playing());
        assert!(!coordinator.station().in_delay);
        assert_eq!(coordinator.station().time_left, 5);
        assert_eq!(coordinator.station().delay_time_left, 30);
        assert_eq!(coordinator.middle().time_left, 60);
        assert_eq!(coordinator.global().time_left, 2700);
    }

    #[test]
    fn test_equal_durations_stay_independent_after_freeze() {
        // Station and middle share a duration but the middle was frozen at a
        // different offset, so they tick out of phase.
        let mut coordinator = TimerCoordinator::new(values(60, 30, 60, 2700));
        start(&mut coordinator);
        tick_n(&mut coordinator, 60); // station enters break, middle restarts

        assert!(coordinator.station().in_delay);
        assert_eq!(coordinator.middle().time_left, 60);
        tick_n(&mut coordinator, 10);
        assert_eq!(coordinator.station().delay_time_left, 20);
        assert_eq!(coordinator.middle().time_left, 50);
    }

    #[test]
    fn test_update_values_refreshes_only_idle_phases() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 60, 2700));
        start(&mut coordinator);
        tick_n(&mut coordinator, 10);

        coordinator.update_values(values(90, 40, 75, 1800));
        // Active countdowns keep their positions; the idle break refreshes.
        assert_eq!(coordinator.station().time_left, 50);
        assert_eq!(coordinator.station().delay_time_left, 40);
        assert_eq!(coordinator.middle().time_left, 50);
        assert_eq!(coordinator.global().time_left, 2690);

        // The new durations take over on the next cycle.
        tick_n(&mut coordinator, 50); // station reaches 0, enters break
        assert!(coordinator.station().in_delay);
        assert_eq!(coordinator.station().delay_time_left, 40);
        tick_n(&mut coordinator, 40);
        assert_eq!(coordinator.station().time_left, 90);
    }

    #[test]
    fn test_reset_while_playing_stops_and_restores() {
        let mut coordinator = TimerCoordinator::new(values(60, 30, 45, 2700));
        start(&mut coordinator);
        tick_n(&mut coordinator, 33);

        let effects = coordinator.handle(Event::ResetRequested);
        assert_eq!(effects, vec![Effect::RestartAll, Effect::PauseAll]);
        assert!(!coordinator.is_playing());
        assert_eq!(coordinator.station().time_left, 60);
        assert_eq!(coordinator.middle().time_left, 45);
        assert_eq!(coordinator.global().time_left, 2700);
    }
}
