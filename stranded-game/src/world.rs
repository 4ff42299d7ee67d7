//! Shared scenario flags and the repair job.
//!
//! `WorldState` is the small pile of globals the original scene carried:
//! who holds the axle pin, the weather, repair progress. Setters that the
//! whole camp should notice go through [`crate::events::apply_global_event`].

use std::time::Duration;

use stranded_core::MemoryStore;
use tracing::info;

use crate::events::{EventRecorder, GlobalEvent, apply_global_event};

/// Scenario-wide state outside any one NPC's memory.
#[derive(Debug, Clone)]
pub struct WorldState {
    /// Whether the player currently holds the axle pin.
    pub player_has_axle_pin: bool,
    /// Narrative clock label.
    pub time_of_day: String,
    /// Current weather label.
    pub weather: String,
    /// Repair stage, 0 = untouched.
    pub repair_progress: u32,
    /// Camp morale score.
    pub camp_morale: i32,
    /// Whether the carriage has been fixed.
    pub carriage_repaired: bool,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            player_has_axle_pin: false,
            time_of_day: "night-1".to_string(),
            weather: "rain".to_string(),
            repair_progress: 0,
            camp_morale: 0,
            carriage_repaired: false,
        }
    }
}

impl WorldState {
    /// Fresh scenario state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the repair stage and tell every NPC about it.
    pub fn update_repair_progress(&mut self, store: &mut MemoryStore, progress: u32) {
        self.repair_progress = progress;
        apply_global_event(store, &GlobalEvent::RepairProgress(progress));
    }

    /// Change the weather and tell every NPC about it.
    pub fn set_weather(&mut self, store: &mut MemoryStore, weather: &str) {
        self.weather = weather.to_string();
        apply_global_event(store, &GlobalEvent::Weather(weather.to_string()));
    }

    /// Try to begin repairing the carriage. Requires and consumes the
    /// axle pin; `None` if the pin is missing or the carriage is already
    /// fixed.
    pub fn start_repair(&mut self, duration: Duration) -> Option<RepairJob> {
        if self.carriage_repaired || !self.player_has_axle_pin {
            return None;
        }
        self.player_has_axle_pin = false;
        Some(RepairJob::new(duration))
    }

    /// Complete the repair: flag the carriage fixed and record the story
    /// beat for every NPC.
    pub fn finish_repair(&mut self, store: &mut MemoryStore, recorder: &EventRecorder) {
        self.carriage_repaired = true;
        recorder.record_carriage_repaired(store);
        info!("carriage repaired");
    }
}

/// A cancellable, tick-driven repair in progress.
///
/// The host drives it with [`RepairJob::advance`] each frame and reads
/// [`RepairJob::progress`] for its progress bar; dropping the job cancels
/// the repair (the pin stays consumed, as in the original scene).
#[derive(Debug)]
pub struct RepairJob {
    duration: Duration,
    elapsed: Duration,
}

impl RepairJob {
    fn new(duration: Duration) -> Self {
        Self {
            duration: duration.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
        }
    }

    /// Advance by one frame's delta. Returns `true` exactly once, on the
    /// tick that completes the repair.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.is_finished() {
            return false;
        }
        self.elapsed += dt;
        self.is_finished()
    }

    /// Completion fraction in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Whether the full duration has elapsed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
