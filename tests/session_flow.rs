//! End-to-end flow through the public surface: commands into the
//! controller, sessions out of the store, totals out of the reports.

use std::time::Duration;

use odak::{FocusApp, TimerConfig, TimerEvent, TimerStatus};
use tempfile::TempDir;

/// Tests drive `tick` by hand; an hour-long interval keeps the armed
/// ticker from racing them.
fn test_config() -> TimerConfig {
    TimerConfig {
        tick_interval: Duration::from_secs(3600),
        ..TimerConfig::default()
    }
}

fn create_app() -> (FocusApp, TempDir) {
    let dir = TempDir::new().unwrap();
    let app = FocusApp::with_config(dir.path(), test_config()).unwrap();
    (app, dir)
}

async fn drive_ticks(app: &FocusApp, count: u32) {
    for _ in 0..count {
        app.controller().tick().await;
    }
}

async fn wait_for_sessions(app: &FocusApp, expected: usize) {
    for _ in 0..100 {
        if app.store().list_sessions().await.unwrap().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {expected} persisted sessions");
}

#[tokio::test]
async fn a_day_of_focus_shows_up_in_the_report() {
    let (app, _dir) = create_app();
    let controller = app.controller();

    // Session 1: a full 25-minute countdown under "Coding". Subscribe just
    // before the expiring tick to catch the finalize summary.
    controller.set_category("Coding").await;
    controller.start().await;
    drive_ticks(&app, 1499).await;
    let mut events = controller.subscribe();
    drive_ticks(&app, 1).await;

    let summary = loop {
        match events.recv().await.unwrap() {
            TimerEvent::SessionFinalized(summary) => break summary,
            _ => continue,
        }
    };
    assert!(summary.is_completed);
    assert_eq!(summary.duration, 25);

    // Session 2: 90 seconds of "Reading" with one distraction, saved
    // manually from pause.
    controller.set_category("Reading").await;
    controller.start().await;
    drive_ticks(&app, 60).await;
    controller.on_app_backgrounded().await;
    controller.start().await;
    drive_ticks(&app, 30).await;
    controller.pause().await;

    let mut events = controller.subscribe();
    controller.save_and_reset().await;
    let summary = loop {
        match events.recv().await.unwrap() {
            TimerEvent::SessionFinalized(summary) => break summary,
            _ => continue,
        }
    };
    assert_eq!(summary.category, "Reading");
    assert_eq!(summary.distraction_count, 1);
    assert!(!summary.is_completed);

    // Session 3: a half-minute attempt, discarded.
    controller.start().await;
    drive_ticks(&app, 30).await;
    controller.reset().await;

    wait_for_sessions(&app, 2).await;
    let sessions = app.store().list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].category, "Coding");
    assert_eq!(sessions[0].duration, 25);
    assert!(sessions[0].is_completed);
    assert_eq!(sessions[1].category, "Reading");
    assert_eq!(sessions[1].duration, 2);
    assert_eq!(sessions[1].distraction_count, 1);
    assert!(!sessions[1].is_completed);

    let report = app.report().await.unwrap();
    assert_eq!(report.today_minutes, 27);
    assert_eq!(report.all_time_minutes, 27);
    assert_eq!(report.total_distractions, 1);
    assert_eq!(report.last_seven_days.len(), 7);
    assert_eq!(report.last_seven_days.last().unwrap().minutes, 27);
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].category, "Coding");

    controller.dispose().await;
}

#[tokio::test]
async fn clearing_history_empties_the_report() {
    let (app, _dir) = create_app();
    let controller = app.controller();

    controller.start().await;
    drive_ticks(&app, 1500).await;
    wait_for_sessions(&app, 1).await;

    app.clear_history().await.unwrap();

    let report = app.report().await.unwrap();
    assert_eq!(report.all_time_minutes, 0);
    assert!(report.categories.is_empty());
}

#[tokio::test]
async fn controller_state_is_ephemeral_but_sessions_are_not() {
    let dir = TempDir::new().unwrap();

    {
        let app = FocusApp::with_config(dir.path(), test_config()).unwrap();
        app.controller().start().await;
        drive_ticks(&app, 1500).await;
        wait_for_sessions(&app, 1).await;
        app.controller().dispose().await;
    }

    // A fresh app over the same data dir sees the history with a fresh timer.
    let app = FocusApp::with_config(dir.path(), test_config()).unwrap();
    let snapshot = app.controller().snapshot().await;
    assert_eq!(snapshot.state.status, TimerStatus::Idle);
    assert_eq!(snapshot.display, "25:00");
    assert_eq!(app.store().list_sessions().await.unwrap().len(), 1);
}
