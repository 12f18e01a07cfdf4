use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Session;

/// All sessions live as one JSON array under this key.
const SESSIONS_KEY: &str = "sessions";

type StoreTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum StoreCommand {
    Execute(StoreTask),
    Shutdown,
}

struct SessionStoreInner {
    sender: mpsc::Sender<StoreCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionStoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(StoreCommand::Shutdown) {
                error!("Failed to send shutdown to store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join store thread: {join_err:?}");
            }
        }
    }
}

/// Append-only session persistence: a single serialized list of sessions
/// under one key in a local key/value table. All SQLite access happens on a
/// dedicated worker thread; callers await replies over a oneshot channel.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
    db_path: Arc<PathBuf>,
}

impl SessionStore {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create store directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<StoreCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("odak-store".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result = conn
                    .execute(
                        "CREATE TABLE IF NOT EXISTS kv_store (
                            key TEXT PRIMARY KEY,
                            value TEXT NOT NULL
                        )",
                        [],
                    )
                    .map(|_| ())
                    .context("failed to create kv_store table");
                if ready_tx.send(init_result).is_err() {
                    error!("Store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        StoreCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        StoreCommand::Shutdown => break,
                    }
                }

                info!("Session store thread shutting down");
            })
            .with_context(|| "failed to spawn store worker thread")?;

        ready_rx
            .recv()
            .context("store worker exited before signaling readiness")??;

        info!("Session store initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(SessionStoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

        let command = StoreCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Store caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to store thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("store thread terminated unexpectedly"))?
    }

    /// Append one session to the stored list.
    pub async fn save_session(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            let mut sessions = read_sessions(conn)?;
            sessions.push(record);
            write_sessions(conn, &sessions)
        })
        .await
    }

    /// All stored sessions in insertion order; empty when nothing was saved yet.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.execute(read_sessions).await
    }

    /// Drop the entire session history.
    pub async fn clear_sessions(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![SESSIONS_KEY])
                .with_context(|| "failed to clear sessions")?;
            Ok(())
        })
        .await
    }
}

fn read_sessions(conn: &mut Connection) -> Result<Vec<Session>> {
    let blob: Option<String> = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![SESSIONS_KEY],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| "failed to read session list")?;

    match blob {
        Some(json) => {
            serde_json::from_str(&json).with_context(|| "stored session list is not valid JSON")
        }
        None => Ok(Vec::new()),
    }
}

fn write_sessions(conn: &mut Connection, sessions: &[Session]) -> Result<()> {
    let json = serde_json::to_string(sessions)?;
    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![SESSIONS_KEY, json],
    )
    .with_context(|| "failed to write session list")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_store() -> (SessionStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("odak.sqlite3")).unwrap();
        (store, dir)
    }

    fn sample_session(id: i64, duration: u32) -> Session {
        Session {
            id,
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            duration,
            category: "Coding".to_string(),
            distraction_count: 0,
            is_completed: true,
        }
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let (store, _dir) = create_test_store();
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_sessions_come_back_in_insertion_order() {
        let (store, _dir) = create_test_store();

        store.save_session(&sample_session(1, 25)).await.unwrap();
        store.save_session(&sample_session(2, 10)).await.unwrap();
        store.save_session(&sample_session(3, 40)).await.unwrap();

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(
            sessions.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(sessions[0].duration, 25);
    }

    #[tokio::test]
    async fn sessions_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odak.sqlite3");

        {
            let store = SessionStore::new(path.clone()).unwrap();
            store.save_session(&sample_session(7, 12)).await.unwrap();
        }

        let reopened = SessionStore::new(path).unwrap();
        let sessions = reopened.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0], sample_session(7, 12));
    }

    #[tokio::test]
    async fn clear_removes_all_sessions() {
        let (store, _dir) = create_test_store();

        store.save_session(&sample_session(1, 25)).await.unwrap();
        store.clear_sessions().await.unwrap();

        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_blob_is_an_error_not_an_empty_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odak.sqlite3");
        let store = SessionStore::new(path.clone()).unwrap();
        store.save_session(&sample_session(1, 25)).await.unwrap();

        // Damage the stored list from a second connection.
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE kv_store SET value = 'not json' WHERE key = ?1",
            params![SESSIONS_KEY],
        )
        .unwrap();
        drop(conn);

        assert!(store.list_sessions().await.is_err());
        // An append must not silently replace the unreadable history either.
        assert!(store.save_session(&sample_session(2, 10)).await.is_err());
    }

    #[tokio::test]
    async fn session_fields_round_trip() {
        let (store, _dir) = create_test_store();

        let session = Session {
            id: 1756500000000,
            date: NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            duration: 2,
            category: "Reading".to_string(),
            distraction_count: 3,
            is_completed: false,
        };
        store.save_session(&session).await.unwrap();

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions, vec![session]);
    }
}
