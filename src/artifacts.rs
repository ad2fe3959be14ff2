//! Named binary artifact storage under the fixed per-user folders.
//!
//! No deduplication happens here; callers supply filenames that are
//! already UUID-qualified. Save strips the embedded encoding prefix and
//! writes raw bytes; load re-attaches a prefix inferred from the
//! extension; export copies an existing artifact to a caller-chosen
//! destination and leaves the store untouched.

use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::mirror::Mirror;
use crate::payload;
use crate::sandbox::{ArtifactFolder, Sandbox};

/// Decode `payload_str` and write it to `<root>/<folder>/<filename>`,
/// returning the path written. The write is mirrored best-effort.
pub fn save_artifact(
    sandbox: &Sandbox,
    mirror: &Mirror,
    folder: ArtifactFolder,
    filename: &str,
    payload_str: &str,
) -> Result<PathBuf> {
    let bytes = payload::decode_payload(payload_str)?;
    let dir = sandbox.artifact_dir(folder);
    std::fs::create_dir_all(&dir)
        .map_err(|e| StoreError::io(format!("create {}", dir.display()), e))?;

    let path = dir.join(filename);
    std::fs::write(&path, &bytes)
        .map_err(|e| StoreError::io(format!("write {}", path.display()), e))?;
    mirror.write(&Path::new(folder.as_str()).join(filename), &bytes);

    Ok(path)
}

/// Read an artifact back in embedded-encoded form. `Ok(None)` when the
/// file does not exist.
pub fn load_artifact(
    sandbox: &Sandbox,
    folder: ArtifactFolder,
    filename: &str,
) -> Result<Option<String>> {
    let path = sandbox.artifact_dir(folder).join(filename);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path)
        .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
    Ok(Some(payload::encode_payload(&bytes, filename)))
}

/// Copy an existing artifact to `destination`. The destination path is
/// already chosen by the caller (the UI owns any prompting); a missing
/// artifact fails without touching the destination.
pub fn export_artifact(
    sandbox: &Sandbox,
    folder: ArtifactFolder,
    filename: &str,
    destination: &Path,
) -> Result<()> {
    let source = sandbox.artifact_dir(folder).join(filename);
    if !source.exists() {
        return Err(StoreError::ArtifactIo(format!(
            "artifact not found: {}/{}",
            folder, filename
        )));
    }
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::io(format!("create {}", parent.display()), e))?;
    }
    std::fs::copy(&source, destination)
        .map_err(|e| StoreError::io(format!("copy to {}", destination.display()), e))?;
    Ok(())
}
