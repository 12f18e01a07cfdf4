pub mod controller;
pub mod state;

pub use controller::{LifecyclePhase, TickOutcome, TimerController, TimerEvent, TimerSnapshot};
pub use state::{TimerState, TimerStatus};
