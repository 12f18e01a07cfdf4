mod app;
pub mod config;
pub mod db;
pub mod models;
pub mod reports;
pub mod timer;

pub use app::{init_logging, FocusApp};
pub use config::TimerConfig;
pub use db::SessionStore;
pub use models::{Session, SessionSummary};
pub use timer::{
    LifecyclePhase, TickOutcome, TimerController, TimerEvent, TimerSnapshot, TimerState,
    TimerStatus,
};
