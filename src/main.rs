//! # gitcms CLI
//!
//! Operator front end for the content store: inspect, create, publish and
//! delete documents in the configured repository from a terminal.
//!
//! ## Usage
//!
//! ```bash
//! gitcms --config ./gitcms.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gitcms list` | List documents, optionally filtered |
//! | `gitcms show <id>` | Print a document's metadata and body |
//! | `gitcms new <kind>` | Create and save a new draft post or page |
//! | `gitcms publish <id>` | Mark a document published and save it |
//! | `gitcms delete <id>` | Delete a document from the repository |
//!
//! Without a `[remote]` section (or without a token) every command runs
//! against the built-in sample collection and nothing is written.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitcms::config::{self, Config};
use gitcms::models::{ContentKind, Document, Status};
use gitcms::store::{ContentStore, WriteOutcome};
use gitcms::view::{count_by_kind, CollectionFilter};

/// Manage markdown posts and pages stored in a git repository.
#[derive(Parser)]
#[command(name = "gitcms", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means sample mode.
    #[arg(long, global = true, default_value = "./gitcms.toml")]
    config: PathBuf,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List documents, most recently updated first.
    List {
        /// Only `post` or `page` documents.
        #[arg(long)]
        kind: Option<ContentKind>,

        /// Only `draft` or `published` documents.
        #[arg(long)]
        status: Option<Status>,

        /// Case-insensitive match on title or excerpt.
        #[arg(long)]
        search: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print a document.
    Show {
        id: String,

        /// Print the stored file text (metadata block + body).
        #[arg(long)]
        raw: bool,
    },

    /// Create a new draft and save it.
    New {
        /// `post` or `page`.
        kind: ContentKind,

        #[arg(long)]
        title: Option<String>,

        /// Read the body from this markdown file.
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Save as published instead of draft.
        #[arg(long)]
        publish: bool,
    },

    /// Mark a document published and save it.
    Publish { id: String },

    /// Delete a document.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::info!(
            "No config at {}; using defaults",
            cli.config.display()
        );
        Config::default()
    };

    let store = ContentStore::from_config(&cfg)?;
    store.load_all().await;
    if let Some(err) = store.error() {
        tracing::warn!("{}", err);
    }

    match cli.command {
        Commands::List {
            kind,
            status,
            search,
            json,
        } => {
            let filter = CollectionFilter {
                kind,
                status,
                term: search,
            };
            run_list(&store, &filter, json)?;
        }
        Commands::Show { id, raw } => {
            let doc = find(&store, &id)?;
            if raw {
                print!("{}", store.encode(&doc));
            } else {
                print_document(&doc);
            }
        }
        Commands::New {
            kind,
            title,
            body_file,
            publish,
        } => {
            let mut doc = store.create_draft(kind);
            if let Some(title) = title {
                doc.title = title;
            }
            if let Some(path) = body_file {
                doc.body = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read body file: {}", path.display()))?;
                doc.excerpt = String::new();
            }
            if publish {
                doc.status = Status::Published;
            }
            report(store.save_outcome(&doc).await, "save", &doc)?;
            println!("created {} {}", doc.kind, doc.id);
        }
        Commands::Publish { id } => {
            let mut doc = find(&store, &id)?;
            doc.status = Status::Published;
            report(store.save_outcome(&doc).await, "save", &doc)?;
            println!("published {}", doc.id);
        }
        Commands::Delete { id } => {
            let doc = find(&store, &id)?;
            report(store.delete_outcome(&doc).await, "delete", &doc)?;
            println!("deleted {}", doc.id);
        }
    }

    Ok(())
}

fn run_list(store: &ContentStore, filter: &CollectionFilter, json: bool) -> Result<()> {
    let docs = store.documents();
    let shown = filter.apply(&docs);

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let (posts, pages) = count_by_kind(&docs);
    let source = if store.is_connected() {
        "remote"
    } else {
        "sample data"
    };
    println!("{} posts, {} pages ({})", posts, pages, source);
    for doc in shown {
        println!(
            "{:<16} {:<5} {:<10} {}  {}",
            doc.id, doc.kind, doc.status, doc.updated_at, doc.title
        );
    }
    Ok(())
}

fn find(store: &ContentStore, id: &str) -> Result<Document> {
    store
        .get(id)
        .with_context(|| format!("No document with id '{}'", id))
}

fn print_document(doc: &Document) {
    println!("id:       {}", doc.id);
    println!("title:    {}", doc.title);
    println!("type:     {}", doc.kind);
    println!("status:   {}", doc.status);
    println!("created:  {}", doc.created_at);
    println!("updated:  {}", doc.updated_at);
    if let Some(filename) = &doc.filename {
        println!("file:     {}/{}", doc.kind.folder(), filename);
    }
    if let Some(revision) = &doc.revision {
        println!("revision: {}", revision);
    }
    println!("excerpt:  {}", doc.excerpt);
    println!();
    println!("{}", doc.body);
}

fn report(outcome: WriteOutcome, action: &str, doc: &Document) -> Result<()> {
    match outcome {
        WriteOutcome::Committed => Ok(()),
        WriteOutcome::Conflict => bail!(
            "Could not {} '{}': it was changed remotely. Reload and try again.",
            action,
            doc.id
        ),
        WriteOutcome::Failed => bail!("Could not {} '{}'; see log for details", action, doc.id),
    }
}
