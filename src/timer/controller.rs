use std::sync::Arc;

use chrono::{Local, Utc};
use log::{debug, error, info};
use serde::Serialize;
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
    time,
};

use crate::{
    config::TimerConfig,
    db::SessionStore,
    models::{Session, SessionSummary},
};

use super::{TimerState, TimerStatus};

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    /// Remaining time pre-formatted as `mm:ss`.
    pub display: String,
}

/// Notifications for the presentation layer, delivered over a broadcast
/// channel obtained from [`TimerController::subscribe`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum TimerEvent {
    StateChanged(TimerSnapshot),
    /// A session was finalized; show the summary to the user. Emitted
    /// regardless of whether the background persistence succeeds.
    SessionFinalized(SessionSummary),
    /// The app returned to the foreground with a paused session mid-flight.
    /// The user decides: resume (`start`) or discard (`reset`).
    ResumePrompt(TimerSnapshot),
}

/// Outcome of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown advanced by one second and keeps running.
    Advanced,
    /// Countdown reached zero; the session was finalized and state reset.
    Completed,
    /// The timer was no longer running; nothing happened.
    Ignored,
}

/// Host application lifecycle phases. `Inactive` is treated as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Foreground,
    Background,
    Inactive,
}

impl LifecyclePhase {
    fn is_foreground(self) -> bool {
        matches!(self, LifecyclePhase::Foreground)
    }
}

/// The timer/session core: owns countdown state and the single ticker task,
/// counts distractions, and decides when a session becomes a persisted
/// [`Session`]. Commands that arrive in the wrong state are no-ops, not
/// errors.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    store: SessionStore,
    config: TimerConfig,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TimerController {
    pub fn new(store: SessionStore, config: TimerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(TimerState::new(&config))),
            store,
            config,
            events,
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        snapshot_of(&*self.state.lock().await)
    }

    /// Begin (or resume) the countdown. No-op while already running; a
    /// countdown that expired without a reset restarts from the configured
    /// duration. Arms the ticker, aborting any previous one first so two
    /// tick sources can never coexist.
    pub async fn start(&self) -> TimerSnapshot {
        {
            let mut state = self.state.lock().await;
            if state.status == TimerStatus::Running {
                debug!("start ignored: timer already running");
                return snapshot_of(&state);
            }
            if state.remaining_secs == 0 && state.configured_secs == 0 {
                debug!("start ignored: nothing to count down");
                return snapshot_of(&state);
            }
            state.begin();
        }
        self.spawn_ticker().await;
        self.emit_state_changed().await
    }

    /// Advance the countdown by one second. Called once per tick period by
    /// the ticker task; ignored whenever the timer is not running, so a
    /// tick racing a pause or background transition can never fire late.
    /// On expiry the session is auto-finalized as completed and state is
    /// reset for the next one.
    pub async fn tick(&self) -> TickOutcome {
        let expired = {
            let mut state = self.state.lock().await;
            if state.status != TimerStatus::Running {
                return TickOutcome::Ignored;
            }
            let expired = state.tick();
            if expired {
                state.status = TimerStatus::Idle;
            }
            expired
        };

        if expired {
            self.finalize(true).await;
            self.state.lock().await.reset();
            self.emit_state_changed().await;
            TickOutcome::Completed
        } else {
            self.emit_state_changed().await;
            TickOutcome::Advanced
        }
    }

    /// Stop ticking without finalizing or discarding progress.
    pub async fn pause(&self) -> TimerSnapshot {
        {
            let mut state = self.state.lock().await;
            if state.status != TimerStatus::Running {
                debug!("pause ignored: timer not running");
                return snapshot_of(&state);
            }
            state.pause();
        }
        self.cancel_ticker().await;
        self.emit_state_changed().await
    }

    /// Discard any in-progress session without persisting and return to a
    /// fresh idle state. Safe to call from any state.
    pub async fn reset(&self) -> TimerSnapshot {
        self.cancel_ticker().await;
        self.state.lock().await.reset();
        self.emit_state_changed().await
    }

    /// Finalize the paused in-progress session as manually ended, then
    /// reset. Focus time under the persistence threshold is discarded
    /// silently; either way the timer comes back idle. No-op unless paused
    /// with some elapsed time.
    pub async fn save_and_reset(&self) -> TimerSnapshot {
        {
            let state = self.state.lock().await;
            if state.status != TimerStatus::Paused || !state.session_in_progress() {
                debug!("saveAndReset ignored: no paused session in progress");
                return snapshot_of(&state);
            }
        }
        self.finalize(false).await;
        self.reset().await
    }

    /// The app left the foreground while the timer was running: count one
    /// distraction and pause. No-op otherwise.
    pub async fn on_app_backgrounded(&self) -> TimerSnapshot {
        {
            let mut state = self.state.lock().await;
            if state.status != TimerStatus::Running {
                return snapshot_of(&state);
            }
            state.distraction_count += 1;
            state.pause();
            info!(
                "backgrounded mid-session: distraction #{}, {} remaining",
                state.distraction_count,
                state.formatted_remaining()
            );
        }
        self.cancel_ticker().await;
        self.emit_state_changed().await
    }

    /// The app returned to the foreground. With a paused session mid-flight
    /// this emits [`TimerEvent::ResumePrompt`] and returns true: the
    /// presentation layer answers by calling [`start`](Self::start) or
    /// [`reset`](Self::reset). Deciding unilaterally here would either lose
    /// progress or restart a timer the user may no longer want.
    pub async fn on_app_foregrounded(&self) -> bool {
        let snapshot = {
            let state = self.state.lock().await;
            if state.status == TimerStatus::Running || !state.session_in_progress() {
                return false;
            }
            snapshot_of(&state)
        };
        let _ = self.events.send(TimerEvent::ResumePrompt(snapshot));
        true
    }

    /// Add `delta_secs` to the configured duration. Only while idle, and
    /// only when the result stays inside the configured bounds; anything
    /// else is a no-op. The new duration is mirrored into the remaining
    /// time.
    pub async fn adjust_duration(&self, delta_secs: i32) -> TimerSnapshot {
        {
            let mut state = self.state.lock().await;
            if !state.is_idle() {
                debug!("adjust_duration ignored: session in progress");
                return snapshot_of(&state);
            }
            let next = i64::from(state.configured_secs) + i64::from(delta_secs);
            if next < i64::from(self.config.min_duration_secs)
                || next > i64::from(self.config.max_duration_secs)
            {
                debug!("adjust_duration ignored: {next}s outside allowed range");
                return snapshot_of(&state);
            }
            state.configured_secs = next as u32;
            state.remaining_secs = state.configured_secs;
        }
        self.emit_state_changed().await
    }

    /// Select the category the next session will be recorded under. Only
    /// while idle, and only labels from the configured set.
    pub async fn set_category(&self, category: &str) -> TimerSnapshot {
        let mut state = self.state.lock().await;
        if !state.is_idle() {
            debug!("set_category ignored: session in progress");
            return snapshot_of(&state);
        }
        if !self.config.categories.iter().any(|c| c == category) {
            debug!("set_category ignored: unknown category '{category}'");
            return snapshot_of(&state);
        }
        state.category = category.to_string();
        let snapshot = snapshot_of(&state);
        drop(state);
        let _ = self.events.send(TimerEvent::StateChanged(snapshot.clone()));
        snapshot
    }

    /// Consume a host lifecycle stream for the life of the returned task,
    /// translating phase transitions into the background/foreground
    /// operations. The task ends when the sender side is dropped.
    pub fn watch_lifecycle(
        &self,
        mut phases: mpsc::UnboundedReceiver<LifecyclePhase>,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut previous = LifecyclePhase::Foreground;
            while let Some(next) = phases.recv().await {
                if previous.is_foreground() && !next.is_foreground() {
                    controller.on_app_backgrounded().await;
                } else if !previous.is_foreground() && next.is_foreground() {
                    controller.on_app_foregrounded().await;
                }
                previous = next;
            }
        })
    }

    /// Cancel any armed ticker. Call before dropping the controller's last
    /// clone so a recreated controller never inherits a stray tick source.
    pub async fn dispose(&self) {
        self.cancel_ticker().await;
    }

    /// Build a [`Session`] from the current state and hand it to the store.
    /// Persistence is fire-and-forget: a failure is logged, never retried,
    /// and never blocks the summary or the state reset. Focus time under
    /// the threshold produces no record on any path.
    async fn finalize(&self, is_completed: bool) {
        let session = {
            let state = self.state.lock().await;
            let focused_secs = state.focused_secs();
            if focused_secs < self.config.min_persist_secs {
                info!(
                    "discarding {focused_secs}s focus attempt: below the {}s persistence threshold",
                    self.config.min_persist_secs
                );
                return;
            }
            Session {
                id: Utc::now().timestamp_millis(),
                date: Local::now().date_naive(),
                duration: focused_secs.div_ceil(60),
                category: state.category.clone(),
                distraction_count: state.distraction_count,
                is_completed,
            }
        };

        let summary = SessionSummary::from(&session);
        info!(
            "finalized {} min '{}' session ({} distractions, completed: {})",
            summary.duration, summary.category, summary.distraction_count, is_completed
        );

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store.save_session(&session).await {
                error!("Failed to persist session {}: {err:#}", session.id);
            }
        });

        let _ = self.events.send(TimerEvent::SessionFinalized(summary));
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let tick_interval = self.config.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // The first interval tick completes immediately; burn it so the
            // countdown first advances one full period after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                if controller.tick().await != TickOutcome::Advanced {
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn emit_state_changed(&self) -> TimerSnapshot {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(TimerEvent::StateChanged(snapshot.clone()));
        snapshot
    }
}

fn snapshot_of(state: &TimerState) -> TimerSnapshot {
    TimerSnapshot {
        display: state.formatted_remaining(),
        state: state.clone(),
    }
}
