//! # Atelier Store CLI (`atelier`)
//!
//! The `atelier` binary exercises the storage engine end to end: sandbox
//! creation, deduplicated input import, artifact export, session
//! inspection, and full-tree replication.
//!
//! ## Usage
//!
//! ```bash
//! atelier --config ./config/atelier.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `atelier init` | Create the per-user storage root and subtree |
//! | `atelier import <file>` | Store an image with (name, size) dedup |
//! | `atelier export <folder> <filename> <dest>` | Copy an artifact out of the store |
//! | `atelier sessions list` | List session documents, newest first |
//! | `atelier sessions show <id>` | Print one session document |
//! | `atelier sessions delete <id>` | Remove a session document |
//! | `atelier sync` | Replicate the full private tree to the shared root |

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use atelier_store::config::{self, Config};
use atelier_store::payload;
use atelier_store::{ArtifactFolder, UserIdentity, UserStore};

/// Atelier Store CLI — a local-first provenance storage engine for
/// generative image sessions.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file, plus `--user`/`--user-id` overrides for the active identity.
#[derive(Parser)]
#[command(
    name = "atelier",
    about = "Atelier Store — a local-first provenance storage engine for generative image sessions",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/atelier.toml")]
    config: PathBuf,

    /// Display name of the active user; overrides `[user]` in the config.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Stable id of the active user; overrides `[user]` in the config.
    #[arg(long, global = true)]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the per-user storage root and its fixed subtree.
    ///
    /// Idempotent — running it against an existing root is safe.
    Init,

    /// Import an image into the deduplicated input store.
    ///
    /// Re-importing a file with the same name and size reuses the
    /// existing log entry instead of storing a second copy.
    Import {
        /// Path to the image file to import.
        file: PathBuf,
    },

    /// Copy an artifact out of the store to a destination path.
    Export {
        /// Artifact folder: outputs, inputs, controls, references, thumbnails.
        folder: String,
        /// Filename within the folder.
        filename: String,
        /// Destination path to copy to.
        dest: PathBuf,
    },

    /// Inspect and manage session documents.
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Replicate the full private tree into the shared root.
    ///
    /// Per-write mirroring is best-effort; this command is the explicit,
    /// on-demand full resynchronization with its own success surface.
    Sync,
}

/// Session subcommands.
#[derive(Subcommand)]
enum SessionAction {
    /// List all session documents, newest first.
    List,
    /// Print one session document as JSON.
    Show {
        /// Session UUID.
        id: Uuid,
    },
    /// Delete a session document from the private root and the mirror.
    Delete {
        /// Session UUID.
        id: Uuid,
    },
}

fn resolve_identity(cli: &Cli, config: &Config) -> Result<UserIdentity> {
    if let (Some(name), Some(id)) = (&cli.user, &cli.user_id) {
        return Ok(UserIdentity::new(name, id));
    }
    if let Some(user) = &config.user {
        return Ok(UserIdentity::new(&user.display_name, &user.id));
    }
    bail!("no user identity: pass --user and --user-id, or set [user] in the config")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_store=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let identity = resolve_identity(&cli, &cfg)?;
    let store = UserStore::open(&cfg, &identity)?;

    match cli.command {
        Commands::Init => {
            println!("Storage root ready at {}", store.root().display());
            if !store.mirror_enabled() {
                println!("Replication disabled (no shared root configured).");
            }
        }
        Commands::Import { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let embedded = payload::encode_payload(&bytes, &name);
            let entry = store.store_input(&name, bytes.len() as u64, &embedded)?;
            println!("imported {}", name);
            println!("  id:       {}", entry.id);
            println!("  filename: {}", entry.filename);
            println!("  sha256:   {}", entry.hash);
        }
        Commands::Export {
            folder,
            filename,
            dest,
        } => {
            let folder = ArtifactFolder::parse(&folder)?;
            store.export_artifact(folder, &filename, &dest)?;
            println!("exported {}/{} to {}", folder, filename, dest.display());
        }
        Commands::Sessions { action } => match action {
            SessionAction::List => {
                let sessions = store.list_sessions()?;
                if sessions.is_empty() {
                    println!("No sessions.");
                } else {
                    for s in sessions {
                        println!(
                            "{}  {:<30}  {} generations  updated {}",
                            s.session_id,
                            s.title,
                            s.generations.len(),
                            s.updated_at.format("%Y-%m-%dT%H:%M:%SZ")
                        );
                    }
                }
            }
            SessionAction::Show { id } => match store.load_session(&id)? {
                Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
                None => {
                    eprintln!("Error: session not found: {}", id);
                    std::process::exit(1);
                }
            },
            SessionAction::Delete { id } => {
                store.delete_session(&id)?;
                println!("deleted session {}", id);
            }
        },
        Commands::Sync => {
            let report = store.sync_full_tree()?;
            println!("sync complete");
            println!("  files copied: {}", report.files_copied);
            println!("  shared path:  {}", report.shared_path.display());
        }
    }

    Ok(())
}
