//! Whole-document session persistence.
//!
//! Each session is one JSON document under `sessions/`, keyed by
//! `session_id`. Every mutation is a full read-modify-write of that
//! document: atomic with respect to the session's own file, with no
//! cross-session or cross-process transaction guarantee. Two concurrent
//! writers to the same session race and the later write wins in full —
//! an accepted risk for a single interactive user.

use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::mirror::Mirror;
use crate::models::Session;
use crate::sandbox::{Sandbox, SESSIONS_DIR};

fn document_path(sandbox: &Sandbox, session_id: &Uuid) -> PathBuf {
    sandbox.sessions_dir().join(format!("{}.json", session_id))
}

fn relative_document_path(session_id: &Uuid) -> PathBuf {
    Path::new(SESSIONS_DIR).join(format!("{}.json", session_id))
}

/// Write the full session document, overwriting any previous version, and
/// mirror it best-effort.
pub fn save_session(sandbox: &Sandbox, mirror: &Mirror, session: &Session) -> Result<()> {
    let path = document_path(sandbox, &session.session_id);
    let json = serde_json::to_string_pretty(session)
        .map_err(|e| StoreError::ArtifactIo(format!("serialize session: {}", e)))?;
    std::fs::write(&path, &json)
        .map_err(|e| StoreError::io(format!("write {}", path.display()), e))?;
    mirror.write(&relative_document_path(&session.session_id), json.as_bytes());
    Ok(())
}

/// Load one session document. Both a missing and a corrupt document come
/// back as `Ok(None)` — a parse failure never escapes as an exception
/// across the contract.
pub fn load_session(sandbox: &Sandbox, session_id: &Uuid) -> Result<Option<Session>> {
    let path = document_path(sandbox, session_id);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
    match serde_json::from_str(&content) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "session document is corrupt");
            Ok(None)
        }
    }
}

/// Enumerate all session documents, newest first. A corrupt or unreadable
/// document is skipped with a warning rather than aborting the listing.
pub fn list_sessions(sandbox: &Sandbox) -> Result<Vec<Session>> {
    let dir = sandbox.sessions_dir();
    let entries = std::fs::read_dir(&dir)
        .map_err(|e| StoreError::io(format!("read {}", dir.display()), e))?;

    let mut sessions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(format!("read {}", dir.display()), e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable session document");
                continue;
            }
        };
        match serde_json::from_str::<Session>(&content) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping corrupt session document");
            }
        }
    }

    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(sessions)
}

/// Remove a session document from the private root and, best-effort, from
/// the mirror. Deleting a session that does not exist is a no-op: delete
/// is always honored, and any "must be empty" rule belongs to the caller.
pub fn delete_session(sandbox: &Sandbox, mirror: &Mirror, session_id: &Uuid) -> Result<()> {
    let path = document_path(sandbox, session_id);
    if path.exists() {
        std::fs::remove_file(&path)
            .map_err(|e| StoreError::io(format!("delete {}", path.display()), e))?;
    }
    mirror.remove(&relative_document_path(session_id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserIdentity;
    use crate::models::{GenerationRecord, StoredArtifactMeta};
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Sandbox, Mirror) {
        let tmp = TempDir::new().unwrap();
        let sandbox = Sandbox::resolve(tmp.path(), &UserIdentity::new("Ada", "u1")).unwrap();
        (tmp, sandbox, Mirror::disabled())
    }

    fn session_with_generation(title: &str) -> Session {
        let mut session = Session::new(title);
        session.push_generation(GenerationRecord::pending(
            "prompt",
            vec![StoredArtifactMeta::new("c1", "c.png")],
            vec![],
            json!({}),
        ));
        session
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_tmp, sandbox, mirror) = setup();
        let session = session_with_generation("round trip");
        save_session(&sandbox, &mirror, &session).unwrap();

        let loaded = load_session(&sandbox, &session.session_id).unwrap().unwrap();
        assert_eq!(loaded.title, "round trip");
        assert_eq!(loaded.generations.len(), 1);
    }

    #[test]
    fn test_load_missing_is_none() {
        let (_tmp, sandbox, _mirror) = setup();
        assert!(load_session(&sandbox, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_is_none() {
        let (_tmp, sandbox, _mirror) = setup();
        let id = Uuid::new_v4();
        std::fs::write(document_path(&sandbox, &id), "{ broken").unwrap();
        assert!(load_session(&sandbox, &id).unwrap().is_none());
    }

    #[test]
    fn test_list_skips_corrupt_documents() {
        let (_tmp, sandbox, mirror) = setup();
        save_session(&sandbox, &mirror, &session_with_generation("good one")).unwrap();
        std::fs::write(sandbox.sessions_dir().join("broken.json"), "not json").unwrap();
        std::fs::write(sandbox.sessions_dir().join("notes.txt"), "ignored").unwrap();

        let sessions = list_sessions(&sandbox).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "good one");
    }

    #[test]
    fn test_list_orders_newest_first() {
        let (_tmp, sandbox, mirror) = setup();
        let older = Session::new("older");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let newer = Session::new("newer");
        save_session(&sandbox, &mirror, &older).unwrap();
        save_session(&sandbox, &mirror, &newer).unwrap();

        let sessions = list_sessions(&sandbox).unwrap();
        assert_eq!(sessions[0].title, "newer");
        assert_eq!(sessions[1].title, "older");
    }

    #[test]
    fn test_delete_then_load_is_none() {
        let (_tmp, sandbox, mirror) = setup();
        let session = session_with_generation("doomed");
        save_session(&sandbox, &mirror, &session).unwrap();
        delete_session(&sandbox, &mirror, &session.session_id).unwrap();
        assert!(load_session(&sandbox, &session.session_id).unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_tmp, sandbox, mirror) = setup();
        delete_session(&sandbox, &mirror, &Uuid::new_v4()).unwrap();
    }

    #[test]
    fn test_last_writer_wins_on_same_document() {
        // Documented tolerated behavior: whole-document writes race and
        // the later write wins in full.
        let (_tmp, sandbox, mirror) = setup();
        let base = session_with_generation("base");

        let mut writer_a = base.clone();
        writer_a.title = "writer A".to_string();
        let mut writer_b = base.clone();
        writer_b.title = "writer B".to_string();

        save_session(&sandbox, &mirror, &writer_a).unwrap();
        save_session(&sandbox, &mirror, &writer_b).unwrap();

        let loaded = load_session(&sandbox, &base.session_id).unwrap().unwrap();
        assert_eq!(loaded.title, "writer B");
    }
}
