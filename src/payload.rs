//! Embedded payload codec.
//!
//! The UI layer hands artifacts to the engine as data-URL style strings
//! (`data:image/png;base64,<bytes>`); bare base64 without a prefix is also
//! accepted. The engine stores raw bytes on disk and re-attaches a prefix
//! inferred from the filename extension when a payload is read back.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{Result, StoreError};

/// Decode an embedded payload to raw bytes, stripping the
/// `data:<mime>;base64,` prefix when present.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    BASE64
        .decode(encoded.trim())
        .map_err(|e| StoreError::ArtifactIo(format!("invalid base64 payload: {}", e)))
}

/// Encode raw bytes as an embedded payload, with a data-URL prefix derived
/// from `filename`'s extension.
pub fn encode_payload(bytes: &[u8], filename: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_for_filename(filename),
        BASE64.encode(bytes)
    )
}

/// Map a filename extension to the mime type used in re-attached prefixes.
/// Unknown extensions fall back to `image/png`, matching the store's
/// default extension for uploads.
pub fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}
