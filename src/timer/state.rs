use serde::{Deserialize, Serialize};

use crate::config::TimerConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// In-memory countdown state. Ephemeral: never persisted, reset between
/// sessions, owned exclusively by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    /// Total seconds a full session runs for; adjustable only while idle.
    pub configured_secs: u32,
    /// Counts down from `configured_secs` to 0.
    pub remaining_secs: u32,
    /// Background transitions observed during the in-progress session.
    pub distraction_count: u32,
    pub category: String,
}

impl TimerState {
    pub fn new(config: &TimerConfig) -> Self {
        Self {
            status: TimerStatus::Idle,
            configured_secs: config.default_duration_secs,
            remaining_secs: config.default_duration_secs,
            distraction_count: 0,
            category: config
                .categories
                .first()
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Idle means not running with no elapsed time: duration and category
    /// may change. A pause before the first tick leaves the timer idle in
    /// this sense even though its status is `Paused`.
    pub fn is_idle(&self) -> bool {
        self.status != TimerStatus::Running && self.remaining_secs == self.configured_secs
    }

    /// A session is mid-flight once at least one second has elapsed and the
    /// countdown has not expired.
    pub fn session_in_progress(&self) -> bool {
        self.remaining_secs > 0 && self.remaining_secs < self.configured_secs
    }

    pub fn focused_secs(&self) -> u32 {
        self.configured_secs.saturating_sub(self.remaining_secs)
    }

    /// Transition into Running. A countdown that previously expired without
    /// a reset is reinitialized to the configured duration first.
    pub fn begin(&mut self) {
        if self.remaining_secs == 0 {
            self.remaining_secs = self.configured_secs;
        }
        self.status = TimerStatus::Running;
    }

    pub fn pause(&mut self) {
        self.status = TimerStatus::Paused;
    }

    /// Advance the countdown by one second. Returns true when the countdown
    /// just reached zero. Only meaningful while running.
    pub fn tick(&mut self) -> bool {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.remaining_secs == 0
    }

    /// Discard any in-progress session and return to a fresh idle state.
    /// Safe from any state.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.remaining_secs = self.configured_secs;
        self.distraction_count = 0;
    }

    /// Remaining time as `mm:ss` for display.
    pub fn formatted_remaining(&self) -> String {
        let minutes = self.remaining_secs / 60;
        let seconds = self.remaining_secs % 60;
        format!("{minutes:02}:{seconds:02}")
    }
}
