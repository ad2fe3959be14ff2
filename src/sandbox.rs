//! Per-user path sandbox.
//!
//! Resolves an identity pair to a private storage root and creates the
//! fixed subtree beneath it on first access. Determinism of the derived
//! path is the sole basis for per-user isolation; no further access
//! control happens at this layer.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::identity::UserIdentity;

/// The closed set of artifact folders beneath a user root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFolder {
    Outputs,
    Inputs,
    Controls,
    References,
    /// Chosen by the session store for generation thumbnails.
    Thumbnails,
}

impl ArtifactFolder {
    pub const ALL: [ArtifactFolder; 5] = [
        ArtifactFolder::Outputs,
        ArtifactFolder::Inputs,
        ArtifactFolder::Controls,
        ArtifactFolder::References,
        ArtifactFolder::Thumbnails,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactFolder::Outputs => "outputs",
            ArtifactFolder::Inputs => "inputs",
            ArtifactFolder::Controls => "controls",
            ArtifactFolder::References => "references",
            ArtifactFolder::Thumbnails => "thumbnails",
        }
    }

    /// Parse a folder literal, rejecting anything outside the closed set.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| StoreError::ArtifactIo(format!("unknown artifact folder: {}", name)))
    }
}

impl fmt::Display for ArtifactFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the sessions directory beneath a user root.
pub const SESSIONS_DIR: &str = "sessions";

/// Name of the input dedup log document at the user root.
pub const INPUT_LOG_NAME: &str = "input-image-log";

/// A resolved, created per-user storage root.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    folder_name: String,
}

impl Sandbox {
    /// Resolve `identity` under `base` and create the fixed subtree.
    ///
    /// Calling twice with the same identity yields the same path. Any
    /// creation failure is fatal for this identity and nothing is cached
    /// as successful.
    pub fn resolve(base: &Path, identity: &UserIdentity) -> Result<Self> {
        let folder_name = identity.folder_name();
        let root = base.join(&folder_name);

        std::fs::create_dir_all(&root).map_err(|e| StoreError::SandboxUnavailable {
            path: root.clone(),
            source: e,
        })?;

        for folder in ArtifactFolder::ALL {
            let dir = root.join(folder.as_str());
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::SandboxUnavailable {
                path: dir,
                source: e,
            })?;
        }
        let sessions = root.join(SESSIONS_DIR);
        std::fs::create_dir_all(&sessions).map_err(|e| StoreError::SandboxUnavailable {
            path: sessions,
            source: e,
        })?;

        Ok(Self { root, folder_name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder name relative to the storage base, used as the mirror-side
    /// prefix for every replicated path.
    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    pub fn artifact_dir(&self, folder: ArtifactFolder) -> PathBuf {
        self.root.join(folder.as_str())
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIR)
    }

    pub fn input_log_path(&self) -> PathBuf {
        self.root.join(INPUT_LOG_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_creates_subtree() {
        let tmp = TempDir::new().unwrap();
        let identity = UserIdentity::new("Ada", "u1");
        let sandbox = Sandbox::resolve(tmp.path(), &identity).unwrap();

        assert!(sandbox.root().is_dir());
        for folder in ArtifactFolder::ALL {
            assert!(sandbox.artifact_dir(folder).is_dir(), "missing {}", folder);
        }
        assert!(sandbox.sessions_dir().is_dir());
    }

    #[test]
    fn test_resolve_deterministic() {
        let tmp = TempDir::new().unwrap();
        let identity = UserIdentity::new("Ada Lovelace", "user-001");
        let a = Sandbox::resolve(tmp.path(), &identity).unwrap();
        let b = Sandbox::resolve(tmp.path(), &identity).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_hostile_identity_stays_under_base() {
        let tmp = TempDir::new().unwrap();
        let identity = UserIdentity::new("../../etc", "pass?wd*");
        let sandbox = Sandbox::resolve(tmp.path(), &identity).unwrap();
        assert!(sandbox.root().starts_with(tmp.path()));
        assert_eq!(sandbox.folder_name(), ".._.._etc_pass_wd_");
    }

    #[test]
    fn test_unwritable_base_fails_fast() {
        let err = Sandbox::resolve(
            Path::new("/proc/definitely/not/writable"),
            &UserIdentity::new("Ada", "u1"),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::SandboxUnavailable { .. }));
    }

    #[test]
    fn test_folder_parse_closed_set() {
        assert_eq!(
            ArtifactFolder::parse("outputs").unwrap(),
            ArtifactFolder::Outputs
        );
        assert!(ArtifactFolder::parse("secrets").is_err());
    }
}
