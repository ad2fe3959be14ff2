//! The per-user storage engine façade.
//!
//! A [`UserStore`] is opened for one explicit identity and owns the
//! resolved sandbox plus the mirror handle; identity is never ambient
//! state, so a context switch in the calling layer can't silently redirect
//! writes to a different root. Reads are served from the private root
//! only — the shared root is a derived, write-only copy.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`store_input`](UserStore::store_input) | Dedup-store an uploaded image |
//! | [`load_input`](UserStore::load_input) | Read an input back in embedded form |
//! | [`input_log`](UserStore::input_log) | Current dedup log entries |
//! | [`save_artifact`](UserStore::save_artifact) | Persist a named binary artifact |
//! | [`load_artifact`](UserStore::load_artifact) | Read an artifact back |
//! | [`export_artifact`](UserStore::export_artifact) | Copy an artifact to a destination |
//! | [`list_sessions`](UserStore::list_sessions) | Enumerate session documents |
//! | [`save_session`](UserStore::save_session) | Write a full session document |
//! | [`load_session`](UserStore::load_session) | Read one session document |
//! | [`delete_session`](UserStore::delete_session) | Remove a session document |
//! | [`sync_full_tree`](UserStore::sync_full_tree) | Recursive copy into the shared root |

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::artifacts;
use crate::config::Config;
use crate::error::Result;
use crate::identity::UserIdentity;
use crate::input_log;
use crate::mirror::{Mirror, SyncReport};
use crate::models::{InputLogEntry, Session};
use crate::sandbox::{ArtifactFolder, Sandbox};
use crate::sessions;

/// Storage engine scoped to a single user root.
#[derive(Debug)]
pub struct UserStore {
    sandbox: Sandbox,
    mirror: Mirror,
}

impl UserStore {
    /// Resolve the sandbox for `identity` and attach the mirror from
    /// config. Fails fast with a storage-unavailable error when the root
    /// cannot be created.
    pub fn open(config: &Config, identity: &UserIdentity) -> Result<Self> {
        let sandbox = Sandbox::resolve(&config.storage.root, identity)?;
        let mirror = Mirror::new(config.shared_root(), sandbox.folder_name());
        Ok(Self { sandbox, mirror })
    }

    /// Open against an explicit base directory with no replication.
    pub fn open_local(base: &Path, identity: &UserIdentity) -> Result<Self> {
        let sandbox = Sandbox::resolve(base, identity)?;
        Ok(Self {
            sandbox,
            mirror: Mirror::disabled(),
        })
    }

    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }

    pub fn mirror_enabled(&self) -> bool {
        self.mirror.is_enabled()
    }

    /// Store an uploaded image, deduplicated by `(original_name,
    /// size_bytes)`.
    pub fn store_input(
        &self,
        original_name: &str,
        size_bytes: u64,
        payload: &str,
    ) -> Result<InputLogEntry> {
        input_log::store_input(&self.sandbox, &self.mirror, original_name, size_bytes, payload)
    }

    /// Read a stored input back in embedded-encoded form.
    pub fn load_input(&self, filename: &str) -> Result<Option<String>> {
        input_log::load_input(&self.sandbox, filename)
    }

    /// The current input dedup log.
    pub fn input_log(&self) -> Result<Vec<InputLogEntry>> {
        input_log::load_log(&self.sandbox)
    }

    /// Persist a named binary artifact, returning the path written.
    pub fn save_artifact(
        &self,
        folder: ArtifactFolder,
        filename: &str,
        payload: &str,
    ) -> Result<PathBuf> {
        artifacts::save_artifact(&self.sandbox, &self.mirror, folder, filename, payload)
    }

    /// Read an artifact back in embedded-encoded form.
    pub fn load_artifact(&self, folder: ArtifactFolder, filename: &str) -> Result<Option<String>> {
        artifacts::load_artifact(&self.sandbox, folder, filename)
    }

    /// Copy an existing artifact to a caller-chosen destination.
    pub fn export_artifact(
        &self,
        folder: ArtifactFolder,
        filename: &str,
        destination: &Path,
    ) -> Result<()> {
        artifacts::export_artifact(&self.sandbox, folder, filename, destination)
    }

    /// Enumerate all session documents, newest first, skipping corrupt
    /// ones.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        sessions::list_sessions(&self.sandbox)
    }

    /// Write a full session document (whole-document, last writer wins).
    pub fn save_session(&self, session: &Session) -> Result<()> {
        sessions::save_session(&self.sandbox, &self.mirror, session)
    }

    /// Load one session document; missing or corrupt comes back as `None`.
    pub fn load_session(&self, session_id: &Uuid) -> Result<Option<Session>> {
        sessions::load_session(&self.sandbox, session_id)
    }

    /// Remove a session document from the private root and the mirror.
    pub fn delete_session(&self, session_id: &Uuid) -> Result<()> {
        sessions::delete_session(&self.sandbox, &self.mirror, session_id)
    }

    /// Recursively copy this user's private root into the shared root.
    pub fn sync_full_tree(&self) -> Result<SyncReport> {
        self.mirror.sync_full_tree(self.sandbox.root())
    }
}
