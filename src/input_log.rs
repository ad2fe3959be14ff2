//! Content-deduplicated storage for uploaded source images.
//!
//! Uploads are deduplicated by `(original_name, size_bytes)`: the common
//! case is the same file re-dragged into the UI, and a name+size probe
//! avoids hashing every byte before an equality check. A sha256 of the
//! decoded payload is recorded as an after-the-fact integrity field. The
//! log itself is one JSON document at the user root, rewritten in full on
//! every append — there is no partial append.

use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::identity::sanitize_segment;
use crate::mirror::Mirror;
use crate::models::InputLogEntry;
use crate::payload;
use crate::sandbox::{ArtifactFolder, Sandbox, INPUT_LOG_NAME};

/// Store an uploaded image, reusing an existing log entry when the same
/// `(original_name, size_bytes)` pair was uploaded before.
///
/// On a duplicate hit the entry (id and filename included) is returned
/// verbatim and no second log entry is created; if the underlying file has
/// gone missing from disk it is rewritten from the supplied payload. On a
/// miss the payload is decoded, written under a freshly minted
/// UUID-qualified filename, and a new entry is appended to the log.
///
/// Decode or write failures abort the whole operation; the log is never
/// updated on a failed write.
pub fn store_input(
    sandbox: &Sandbox,
    mirror: &Mirror,
    original_name: &str,
    size_bytes: u64,
    payload_str: &str,
) -> Result<InputLogEntry> {
    let mut entries = load_log(sandbox)?;

    if let Some(existing) = entries
        .iter()
        .find(|e| e.original_name == original_name && e.size_bytes == size_bytes)
    {
        let path = sandbox
            .artifact_dir(ArtifactFolder::Inputs)
            .join(&existing.filename);
        if !path.exists() {
            // Deleted out-of-band; restore the bytes but keep the entry.
            let bytes = payload::decode_payload(payload_str)?;
            std::fs::write(&path, &bytes)
                .map_err(|e| StoreError::io(format!("rewrite {}", path.display()), e))?;
            mirror.write(&relative_input_path(&existing.filename), &bytes);
            debug!(filename = %existing.filename, "rewrote missing input file for existing entry");
        }
        return Ok(existing.clone());
    }

    let bytes = payload::decode_payload(payload_str)?;
    let id = Uuid::new_v4();
    let filename = synthesize_filename(original_name, &id);

    let path = sandbox
        .artifact_dir(ArtifactFolder::Inputs)
        .join(&filename);
    std::fs::write(&path, &bytes)
        .map_err(|e| StoreError::io(format!("write {}", path.display()), e))?;
    mirror.write(&relative_input_path(&filename), &bytes);

    let entry = InputLogEntry {
        id,
        filename,
        hash: sha256_hex(&bytes),
        original_name: original_name.to_string(),
        size_bytes,
    };
    entries.push(entry.clone());
    persist_log(sandbox, mirror, &entries)?;

    Ok(entry)
}

/// Read a stored input back in the embedded-encoded form the caller
/// originally supplied. `Ok(None)` when the file does not exist.
pub fn load_input(sandbox: &Sandbox, filename: &str) -> Result<Option<String>> {
    let path = sandbox.artifact_dir(ArtifactFolder::Inputs).join(filename);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path)
        .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
    Ok(Some(payload::encode_payload(&bytes, filename)))
}

/// Load the dedup log. A missing document is an empty log; a document
/// that exists but does not parse is surfaced as corrupt.
pub fn load_log(sandbox: &Sandbox) -> Result<Vec<InputLogEntry>> {
    let path = sandbox.input_log_path();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| StoreError::DocumentCorrupt {
        path,
        reason: e.to_string(),
    })
}

fn persist_log(sandbox: &Sandbox, mirror: &Mirror, entries: &[InputLogEntry]) -> Result<()> {
    let path = sandbox.input_log_path();
    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| StoreError::ArtifactIo(format!("serialize input log: {}", e)))?;
    std::fs::write(&path, &json)
        .map_err(|e| StoreError::io(format!("write {}", path.display()), e))?;
    mirror.write(std::path::Path::new(INPUT_LOG_NAME), json.as_bytes());
    Ok(())
}

/// `<sanitized stem>_<uuid><ext>`, extension defaulting to `.png`.
fn synthesize_filename(original_name: &str, id: &Uuid) -> String {
    let (stem, ext) = match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem, format!(".{}", ext.to_ascii_lowercase()))
        }
        _ => (original_name, ".png".to_string()),
    };
    format!("{}_{}{}", sanitize_segment(stem), id, ext)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn relative_input_path(filename: &str) -> std::path::PathBuf {
    std::path::Path::new(ArtifactFolder::Inputs.as_str()).join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserIdentity;
    use crate::payload::encode_payload;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Sandbox, Mirror) {
        let tmp = TempDir::new().unwrap();
        let sandbox = Sandbox::resolve(tmp.path(), &UserIdentity::new("Ada", "u1")).unwrap();
        (tmp, sandbox, Mirror::disabled())
    }

    #[test]
    fn test_first_upload_creates_entry_and_file() {
        let (_tmp, sandbox, mirror) = setup();
        let payload = encode_payload(b"cat bytes", "cat.png");
        let entry = store_input(&sandbox, &mirror, "cat.png", 9, &payload).unwrap();

        assert_eq!(entry.original_name, "cat.png");
        assert_eq!(entry.size_bytes, 9);
        assert!(entry.filename.starts_with("cat_"));
        assert!(entry.filename.ends_with(".png"));

        let stored = sandbox
            .artifact_dir(ArtifactFolder::Inputs)
            .join(&entry.filename);
        assert_eq!(std::fs::read(stored).unwrap(), b"cat bytes");
        assert_eq!(load_log(&sandbox).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_upload_reuses_entry() {
        let (_tmp, sandbox, mirror) = setup();
        let payload = encode_payload(b"cat bytes", "cat.png");
        let first = store_input(&sandbox, &mirror, "cat.png", 9, &payload).unwrap();
        let second = store_input(&sandbox, &mirror, "cat.png", 9, &payload).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.filename, second.filename);
        assert_eq!(load_log(&sandbox).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_rewritten_from_new_payload() {
        let (_tmp, sandbox, mirror) = setup();
        let payload_a = encode_payload(b"bytes A!!", "cat.png");
        let entry = store_input(&sandbox, &mirror, "cat.png", 9, &payload_a).unwrap();

        let path = sandbox
            .artifact_dir(ArtifactFolder::Inputs)
            .join(&entry.filename);
        std::fs::remove_file(&path).unwrap();

        // Same (name, size), different bytes, file missing on disk: the
        // file is rewritten but id/filename/log are reused verbatim.
        let payload_b = encode_payload(b"bytes B!!", "cat.png");
        let again = store_input(&sandbox, &mirror, "cat.png", 9, &payload_b).unwrap();
        assert_eq!(again.id, entry.id);
        assert_eq!(again.filename, entry.filename);
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes B!!");
        assert_eq!(load_log(&sandbox).unwrap().len(), 1);
        // The recorded hash still describes the original bytes: dedup is
        // by (name, size), hash is integrity-only.
        assert_eq!(again.hash, entry.hash);
    }

    #[test]
    fn test_same_name_size_different_bytes_dedups_silently() {
        // Accepted consequence of (name, size) dedup: with the file still
        // on disk, different bytes are treated as the same artifact.
        let (_tmp, sandbox, mirror) = setup();
        let entry =
            store_input(&sandbox, &mirror, "cat.png", 9, &encode_payload(b"bytes A!!", "cat.png"))
                .unwrap();
        let again =
            store_input(&sandbox, &mirror, "cat.png", 9, &encode_payload(b"bytes B!!", "cat.png"))
                .unwrap();
        assert_eq!(entry.id, again.id);
        let path = sandbox
            .artifact_dir(ArtifactFolder::Inputs)
            .join(&entry.filename);
        assert_eq!(std::fs::read(path).unwrap(), b"bytes A!!");
    }

    #[test]
    fn test_bad_payload_leaves_log_untouched() {
        let (_tmp, sandbox, mirror) = setup();
        let err = store_input(&sandbox, &mirror, "cat.png", 9, "!!! not base64 !!!").unwrap_err();
        assert!(matches!(err, StoreError::ArtifactIo(_)));
        assert!(load_log(&sandbox).unwrap().is_empty());
    }

    #[test]
    fn test_extension_defaults_to_png() {
        let (_tmp, sandbox, mirror) = setup();
        let payload = encode_payload(b"x", "noext");
        let entry = store_input(&sandbox, &mirror, "noext", 1, &payload).unwrap();
        assert!(entry.filename.ends_with(".png"));
    }

    #[test]
    fn test_load_input_round_trip() {
        let (_tmp, sandbox, mirror) = setup();
        let payload = encode_payload(b"jpeg-ish bytes", "photo.jpg");
        let entry = store_input(&sandbox, &mirror, "photo.jpg", 14, &payload).unwrap();

        let loaded = load_input(&sandbox, &entry.filename).unwrap().unwrap();
        assert!(loaded.starts_with("data:image/jpeg;base64,"));
        assert_eq!(
            crate::payload::decode_payload(&loaded).unwrap(),
            b"jpeg-ish bytes"
        );
    }

    #[test]
    fn test_load_input_missing_is_none() {
        let (_tmp, sandbox, _mirror) = setup();
        assert!(load_input(&sandbox, "nope.png").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_log_surfaces() {
        let (_tmp, sandbox, mirror) = setup();
        std::fs::write(sandbox.input_log_path(), "{ not json").unwrap();
        let err =
            store_input(&sandbox, &mirror, "cat.png", 9, &encode_payload(b"x", "cat.png"))
                .unwrap_err();
        assert!(matches!(err, StoreError::DocumentCorrupt { .. }));
    }

    #[test]
    fn test_hash_is_sha256_of_decoded_bytes() {
        let (_tmp, sandbox, mirror) = setup();
        let entry =
            store_input(&sandbox, &mirror, "cat.png", 3, &encode_payload(b"abc", "cat.png"))
                .unwrap();
        assert_eq!(
            entry.hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
