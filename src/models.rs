//! Core data models of the provenance store.
//!
//! These types are what actually lands on disk: the input dedup log, the
//! artifact references embedded in generation records, and the session
//! documents that form the provenance chain (prompt → inputs → parameters
//! → outputs). Artifacts are always referenced by identifier, never by
//! embedding bytes in a document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One deduplicated uploaded artifact, as recorded in the per-user input
/// log. Dedup identity is `(original_name, size_bytes)`; `hash` is a
/// sha256 of the decoded payload kept as an integrity field, not a lookup
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLogEntry {
    pub id: Uuid,
    pub filename: String,
    pub hash: String,
    pub original_name: String,
    pub size_bytes: u64,
}

/// Reference to a persisted binary (output, control, reference, thumbnail)
/// carried inside a [`GenerationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifactMeta {
    pub id: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl StoredArtifactMeta {
    pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            hash: None,
            original_name: None,
            size_bytes: None,
        }
    }
}

impl From<&InputLogEntry> for StoredArtifactMeta {
    fn from(entry: &InputLogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            filename: entry.filename.clone(),
            hash: Some(entry.hash.clone()),
            original_name: Some(entry.original_name.clone()),
            size_bytes: Some(entry.size_bytes),
        }
    }
}

/// Lifecycle state of a generation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Completed,
    Failed,
}

/// A generation record transitions at most once out of `Pending`; a second
/// transition attempt is rejected with this error.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("generation {generation_id} is already {status:?} and cannot transition again")]
pub struct TransitionError {
    pub generation_id: Uuid,
    pub status: GenerationStatus,
}

/// Outputs attached when a generation completes.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutputs {
    pub output_image: Option<StoredArtifactMeta>,
    pub output_images: Option<Vec<StoredArtifactMeta>>,
    pub output_texts: Option<Vec<String>>,
    pub generation_time_ms: Option<u64>,
}

/// One link of the provenance chain: a prompt, the inputs and parameters it
/// ran with, and (once terminal) its outputs or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: GenerationStatus,
    pub prompt: String,
    #[serde(default)]
    pub control_images: Vec<StoredArtifactMeta>,
    #[serde(default)]
    pub reference_images: Vec<StoredArtifactMeta>,
    #[serde(default)]
    pub parameters: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_image: Option<StoredArtifactMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_images: Option<Vec<StoredArtifactMeta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_texts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationRecord {
    /// Create a pending record. Input artifacts must already be persisted;
    /// only their references are carried here.
    pub fn pending(
        prompt: impl Into<String>,
        control_images: Vec<StoredArtifactMeta>,
        reference_images: Vec<StoredArtifactMeta>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            generation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            status: GenerationStatus::Pending,
            prompt: prompt.into(),
            control_images,
            reference_images,
            parameters,
            output_image: None,
            output_images: None,
            output_texts: None,
            generation_time_ms: None,
            error: None,
        }
    }

    /// Transition `Pending` → `Completed`, attaching outputs.
    pub fn complete(&mut self, outputs: GenerationOutputs) -> Result<(), TransitionError> {
        self.ensure_pending()?;
        self.status = GenerationStatus::Completed;
        self.output_image = outputs.output_image;
        self.output_images = outputs.output_images;
        self.output_texts = outputs.output_texts;
        self.generation_time_ms = outputs.generation_time_ms;
        Ok(())
    }

    /// Transition `Pending` → `Failed` with an error message.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.ensure_pending()?;
        self.status = GenerationStatus::Failed;
        self.error = Some(error.into());
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), TransitionError> {
        if self.status == GenerationStatus::Pending {
            Ok(())
        } else {
            Err(TransitionError {
                generation_id: self.generation_id,
                status: self.status,
            })
        }
    }
}

/// A session document: title plus its ordered generation records.
/// `generations` is append-only in practice and `updated_at` never moves
/// backwards through [`Session::touch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub generations: Vec<GenerationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Session {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            generations: Vec::new(),
            user: None,
        }
    }

    /// Append a generation record and bump `updated_at`.
    pub fn push_generation(&mut self, record: GenerationRecord) {
        self.generations.push(record);
        self.touch();
    }

    /// Advance `updated_at`, never moving it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
