//! User identity and filesystem-safe name derivation.
//!
//! Identity is an opaque, already-resolved pair of display name and stable
//! id; this engine performs no authentication. The pair is reduced to a
//! single folder name that is deterministic for the same pair and
//! collision-resistant across distinct pairs, which is the sole basis for
//! per-user isolation.

use serde::{Deserialize, Serialize};

/// An already-authenticated user, as supplied by the calling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub display_name: String,
    pub id: String,
}

impl UserIdentity {
    pub fn new(display_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            id: id.into(),
        }
    }

    /// Folder name for this identity: both segments sanitized
    /// independently, joined with `_`.
    pub fn folder_name(&self) -> String {
        format!(
            "{}_{}",
            sanitize_segment(&self.display_name),
            sanitize_segment(&self.id)
        )
    }
}

/// Characters that must never reach the filesystem in a folder name.
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '\'', '<', '>', '|'];

/// Reduce one identity segment to a filesystem-safe token.
///
/// Forbidden characters and control characters become `_`, runs of
/// whitespace collapse to a single `_`, and leading/trailing whitespace is
/// trimmed first. A segment that sanitizes to nothing becomes `anonymous`.
pub fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut in_whitespace = false;

    for ch in segment.trim().chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            out.push('_');
            in_whitespace = false;
        }
        if FORBIDDEN.contains(&ch) || ch.is_control() {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    if out.is_empty() {
        "anonymous".to_string()
    } else {
        out
    }
}
