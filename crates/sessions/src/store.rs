//! Session store, the persistence boundary.
//!
//! Holds one [`SessionRecord`] per session behind a `RwLock`. Reads take
//! a cloned snapshot of the whole aggregate (no torn reads across the
//! session and its child collections); mutating operations commit a whole
//! replacement record in one step. When a state path is configured, the
//! commit is written to disk before it becomes visible in memory, so a
//! failed write leaves both views on the pre-operation record.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use loom_domain::error::{Error, Result};
use loom_domain::model::{Session, SessionRecord};

/// In-process session store with optional JSON durability.
pub struct SessionStore {
    state_path: Option<PathBuf>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    /// A purely in-memory store (tests, ephemeral runs).
    pub fn in_memory() -> Self {
        Self {
            state_path: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Load or create the store at `state_path`.
    pub fn open(state_path: &Path) -> Result<Self> {
        if let Some(dir) = state_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let sessions: HashMap<String, SessionRecord> = if state_path.exists() {
            let raw = std::fs::read_to_string(state_path)?;
            serde_json::from_str(&raw).unwrap_or_default()
        } else {
            HashMap::new()
        };

        tracing::info!(
            sessions = sessions.len(),
            path = %state_path.display(),
            "session store loaded"
        );

        Ok(Self {
            state_path: Some(state_path.to_path_buf()),
            sessions: RwLock::new(sessions),
        })
    }

    /// Snapshot of one session's full aggregate.
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Snapshot of every session header, unordered.
    pub fn list(&self) -> Vec<Session> {
        self.sessions
            .read()
            .values()
            .map(|r| r.session.clone())
            .collect()
    }

    /// Commit a whole record, replacing whatever was stored for that
    /// session. All-or-nothing: if the durable write fails, the in-memory
    /// view is rolled back to the previous record and an error returned.
    pub fn commit(&self, record: SessionRecord) -> Result<()> {
        debug_assert!(
            !record.session.state.is_transient(),
            "transient states must never be committed"
        );

        let session_id = record.session.session_id.clone();
        let mut sessions = self.sessions.write();
        let previous = sessions.insert(session_id.clone(), record);

        if let Some(path) = &self.state_path {
            if let Err(e) = persist(path, &sessions) {
                match previous {
                    Some(p) => {
                        let _ = sessions.insert(session_id, p);
                    }
                    None => {
                        let _ = sessions.remove(&session_id);
                    }
                }
                return Err(e);
            }
        }

        Ok(())
    }
}

fn persist(path: &Path, sessions: &HashMap<String, SessionRecord>) -> Result<()> {
    let json = serde_json::to_string_pretty(sessions)
        .map_err(|e| Error::Persistence(format!("serializing sessions: {e}")))?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_domain::model::Event;

    #[test]
    fn commit_then_get_round_trips() {
        let store = SessionStore::in_memory();
        let mut record = SessionRecord::new();
        record.events.push(Event::user(1, "hi".into()));
        let id = record.session.session_id.clone();

        store.commit(record).unwrap();

        let loaded = store.get(&id).unwrap();
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.session.session_id, id);
    }

    #[test]
    fn get_unknown_session_is_none() {
        let store = SessionStore::in_memory();
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn snapshot_is_detached_from_later_commits() {
        let store = SessionStore::in_memory();
        let record = SessionRecord::new();
        let id = record.session.session_id.clone();
        store.commit(record).unwrap();

        let snapshot = store.get(&id).unwrap();

        let mut updated = store.get(&id).unwrap();
        updated.events.push(Event::user(1, "later".into()));
        store.commit(updated).unwrap();

        assert!(snapshot.events.is_empty());
        assert_eq!(store.get(&id).unwrap().events.len(), 1);
    }

    #[test]
    fn persist_failure_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        let store = SessionStore::open(&path).unwrap();

        let mut record = SessionRecord::new();
        let id = record.session.session_id.clone();
        store.commit(record.clone()).unwrap();

        // Occupy the state path with a directory so the next write fails.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        record.events.push(Event::user(1, "doomed".into()));
        let err = store.commit(record).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));

        // The in-memory view still holds the pre-operation record.
        assert!(store.get(&id).unwrap().events.is_empty());

        // A first-time commit rolls back to absence.
        let fresh = SessionRecord::new();
        let fresh_id = fresh.session.session_id.clone();
        store.commit(fresh).unwrap_err();
        assert!(store.get(&fresh_id).is_none());
    }

    #[test]
    fn open_reloads_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let record = SessionRecord::new();
        let id = record.session.session_id.clone();
        {
            let store = SessionStore::open(&path).unwrap();
            store.commit(record).unwrap();
        }

        let reopened = SessionStore::open(&path).unwrap();
        assert!(reopened.get(&id).is_some());
    }
}
