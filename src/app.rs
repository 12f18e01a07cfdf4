use std::path::Path;

use anyhow::Result;
use chrono::Local;
use log::info;

use crate::{
    config::TimerConfig,
    db::SessionStore,
    reports::{build_report, Report},
    timer::TimerController,
};

const STORE_FILE: &str = "odak.sqlite3";

/// Wires the session store and timer controller together for a host
/// application. The host feeds lifecycle phases and user commands into the
/// controller and renders its event stream; this type only owns the pieces.
pub struct FocusApp {
    store: SessionStore,
    controller: TimerController,
}

impl FocusApp {
    pub fn new(data_dir: &Path) -> Result<Self> {
        Self::with_config(data_dir, TimerConfig::default())
    }

    pub fn with_config(data_dir: &Path, config: TimerConfig) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let store = SessionStore::new(data_dir.join(STORE_FILE))?;
        let controller = TimerController::new(store.clone(), config);
        info!("odak ready, session store at {}", store.path().display());
        Ok(Self { store, controller })
    }

    pub fn controller(&self) -> &TimerController {
        &self.controller
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Aggregate the stored history as of the local calendar day.
    pub async fn report(&self) -> Result<Report> {
        let sessions = self.store.list_sessions().await?;
        Ok(build_report(&sessions, Local::now().date_naive()))
    }

    /// Wipe the stored session history.
    pub async fn clear_history(&self) -> Result<()> {
        self.store.clear_sessions().await
    }
}

/// Initialize logging (reads RUST_LOG env var). Call once from the host's
/// entry point.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
