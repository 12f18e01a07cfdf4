use std::time::Duration;

/// Category labels offered to the user. `set_category` only accepts
/// members of the configured set.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Studying", "Coding", "Project", "Reading"];

/// Timer behavior with tunable thresholds.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Countdown length a fresh controller starts with.
    pub default_duration_secs: u32,

    /// Lower bound for `adjust_duration` (5 minutes).
    pub min_duration_secs: u32,

    /// Upper bound for `adjust_duration` (120 minutes).
    pub max_duration_secs: u32,

    /// Sessions with less focused time than this are discarded, never persisted.
    pub min_persist_secs: u32,

    /// Period of the countdown tick while running.
    pub tick_interval: Duration,

    /// The fixed set of selectable category labels.
    pub categories: Vec<String>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 25 * 60,
            min_duration_secs: 5 * 60,
            max_duration_secs: 120 * 60,
            min_persist_secs: 60,
            tick_interval: Duration::from_secs(1),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}
