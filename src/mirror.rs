//! Best-effort replication into a shared network root.
//!
//! Every write the engine performs is first committed to the private user
//! root, then mirrored here. The shared location models an unreliable
//! network share: mirroring failures are logged and swallowed so that they
//! can never fail, block, or corrupt the authoritative private copy. Reads
//! are never served from the mirror.
//!
//! [`Mirror::sync_full_tree`] is the on-demand counterpart: a recursive
//! overwrite-copy of the whole private root, with its own success/failure
//! surface distinct from per-write mirroring.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, StoreError};

/// Outcome of a successful full-tree synchronization.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub files_copied: usize,
    pub shared_path: PathBuf,
}

/// Write-only handle on the shared replica of one user root.
#[derive(Debug, Clone)]
pub struct Mirror {
    /// `<shared_root>/<user folder>`; `None` when replication is disabled.
    target: Option<PathBuf>,
}

impl Mirror {
    pub fn new(shared_root: Option<PathBuf>, user_folder: &str) -> Self {
        Self {
            target: shared_root.map(|root| root.join(user_folder)),
        }
    }

    /// A mirror that never replicates. Used when no shared root is
    /// configured.
    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Mirror one file write. Best-effort: failures are downgraded to a
    /// warning and never surface to the caller.
    pub fn write(&self, relative: &Path, bytes: &[u8]) {
        let Some(target) = &self.target else {
            return;
        };
        let dest = target.join(relative);
        if let Err(e) = write_file(&dest, bytes) {
            warn!(
                path = %dest.display(),
                error = %e,
                "mirror write failed; primary copy is unaffected"
            );
        }
    }

    /// Mirror a deletion (e.g. a removed session document). Best-effort.
    pub fn remove(&self, relative: &Path) {
        let Some(target) = &self.target else {
            return;
        };
        let dest = target.join(relative);
        if !dest.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&dest) {
            warn!(
                path = %dest.display(),
                error = %e,
                "mirror delete failed; primary copy is unaffected"
            );
        }
    }

    /// Recursively copy the private root into the shared root, overwriting
    /// existing files. Unlike per-write mirroring this reports its own
    /// success or failure.
    pub fn sync_full_tree(&self, private_root: &Path) -> Result<SyncReport> {
        let target = self.target.as_ref().ok_or_else(|| {
            StoreError::ArtifactIo("no shared root configured; replication is disabled".into())
        })?;

        let mut files_copied = 0usize;
        for entry in WalkDir::new(private_root) {
            let entry =
                entry.map_err(|e| StoreError::ArtifactIo(format!("sync walk failed: {}", e)))?;
            let relative = entry
                .path()
                .strip_prefix(private_root)
                .unwrap_or(entry.path());
            let dest = target.join(relative);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest)
                    .map_err(|e| StoreError::io(format!("sync mkdir {}", dest.display()), e))?;
            } else {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::io(format!("sync mkdir {}", parent.display()), e)
                    })?;
                }
                std::fs::copy(entry.path(), &dest)
                    .map_err(|e| StoreError::io(format!("sync copy {}", dest.display()), e))?;
                files_copied += 1;
            }
        }

        debug!(files = files_copied, target = %target.display(), "full tree sync complete");
        Ok(SyncReport {
            files_copied,
            shared_path: target.clone(),
        })
    }
}

fn write_file(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_mirror_is_a_no_op() {
        let mirror = Mirror::disabled();
        assert!(!mirror.is_enabled());
        // Must not panic or create anything.
        mirror.write(Path::new("outputs/a.png"), b"bytes");
        mirror.remove(Path::new("outputs/a.png"));
    }

    #[test]
    fn test_write_lands_under_user_folder() {
        let shared = TempDir::new().unwrap();
        let mirror = Mirror::new(Some(shared.path().to_path_buf()), "Ada_u1");
        mirror.write(Path::new("outputs/a.png"), b"bytes");
        let copied = shared.path().join("Ada_u1/outputs/a.png");
        assert_eq!(std::fs::read(copied).unwrap(), b"bytes");
    }

    #[test]
    fn test_unreachable_target_swallowed() {
        // A file where a directory is expected makes every nested write fail.
        let shared = TempDir::new().unwrap();
        let blocker = shared.path().join("blocked");
        std::fs::write(&blocker, b"i am a file").unwrap();
        let mirror = Mirror::new(Some(blocker), "Ada_u1");
        mirror.write(Path::new("outputs/a.png"), b"bytes");
    }

    #[test]
    fn test_sync_full_tree_copies_and_overwrites() {
        let private = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        std::fs::create_dir_all(private.path().join("outputs")).unwrap();
        std::fs::write(private.path().join("outputs/a.png"), b"v2").unwrap();
        std::fs::write(private.path().join("input-image-log"), b"[]").unwrap();

        let mirror = Mirror::new(Some(shared.path().to_path_buf()), "Ada_u1");
        // Pre-existing stale copy must be overwritten.
        std::fs::create_dir_all(shared.path().join("Ada_u1/outputs")).unwrap();
        std::fs::write(shared.path().join("Ada_u1/outputs/a.png"), b"v1").unwrap();

        let report = mirror.sync_full_tree(private.path()).unwrap();
        assert_eq!(report.files_copied, 2);
        assert_eq!(
            std::fs::read(shared.path().join("Ada_u1/outputs/a.png")).unwrap(),
            b"v2"
        );
    }

    #[test]
    fn test_sync_without_shared_root_errors() {
        let private = TempDir::new().unwrap();
        let err = Mirror::disabled().sync_full_tree(private.path()).unwrap_err();
        assert!(matches!(err, StoreError::ArtifactIo(_)));
    }
}
