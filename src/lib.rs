//! # Atelier Store
//!
//! A local-first provenance storage engine for generative image sessions.
//!
//! Atelier Store persists generation sessions, deduplicates uploaded
//! source images by content, stores named binary artifacts under per-user
//! roots, and best-effort replicates every write into an optional shared
//! network location. The generation UI and the remote image model are
//! external collaborators: they call in through the artifact/session
//! contract and only ever exchange identifiers, never embedded bytes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────────────────┐   ┌──────────────┐
//! │ UI layer │──▶│  UserStore (per identity)      │──▶│ private root │
//! └──────────┘   │  sandbox · inputs · artifacts  │   └──────┬───────┘
//!                │  sessions                      │          │ best-effort
//!                └───────────────────────────────┘          ▼
//!                                                    ┌──────────────┐
//!                                                    │ shared mirror│
//!                                                    └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`identity`] | User identity and name sanitization |
//! | [`sandbox`] | Per-user storage root resolution |
//! | [`payload`] | Embedded (data-URL) payload codec |
//! | [`models`] | Sessions, generation records, artifact references |
//! | [`input_log`] | Content-deduplicated input storage |
//! | [`artifacts`] | Named binary artifact storage |
//! | [`sessions`] | Whole-document session persistence |
//! | [`mirror`] | Best-effort replication to a shared root |
//! | [`store`] | The [`UserStore`](store::UserStore) façade |

pub mod artifacts;
pub mod config;
pub mod error;
pub mod identity;
pub mod input_log;
pub mod mirror;
pub mod models;
pub mod payload;
pub mod sandbox;
pub mod sessions;
pub mod store;

pub use error::StoreError;
pub use identity::UserIdentity;
pub use sandbox::ArtifactFolder;
pub use store::UserStore;
