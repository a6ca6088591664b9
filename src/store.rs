//! Content store: the in-memory document collection and its remote sync.
//!
//! The store is the single entry point for loading, saving, deleting and
//! creating documents. It owns the collection callers render from and
//! keeps it consistent with the remote file tree:
//!
//! ```text
//!  load_all ──▶ list posts ┐            ┌▶ read + decode ┐
//!              list pages ┘─▶ FileRefs ─┼▶ read + decode ┼─▶ publish collection
//!                                       └▶ read + decode ┘
//!  save     ──▶ encode ──▶ write(path, revision?) ──▶ load_all
//!  delete   ──▶ delete(path, revision) ──▶ drop from collection
//! ```
//!
//! Remote failures never cross this boundary as errors. Callers get `bool`
//! (or a [`WriteOutcome`] when a conflict must be told apart) and the
//! failure is logged.
//!
//! # Sample mode
//!
//! Without a remote, or when the remote holds no documents, the collection
//! is the built-in [`sample_documents`]. With no remote at all, saves and
//! deletes apply to the in-memory collection only.
//!
//! # Overlapping loads
//!
//! Each [`ContentStore::load_all`] takes a ticket when it starts. A load
//! that finishes after a later-started load has already published is
//! discarded, so the collection always reflects the newest request.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use tokio::task::JoinSet;

use crate::auth::{EnvToken, TokenProvider};
use crate::codec::Codec;
use crate::config::{Config, ContentConfig};
use crate::error::RemoteError;
use crate::models::{today, ContentKind, Document, FileRef, Status};
use crate::remote::{GitHubClient, RemoteFiles};
use crate::samples::sample_documents;

/// Result of a save or delete against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The change is recorded remotely (or locally, in sample mode).
    Committed,
    /// The document's revision is stale: someone else changed the file.
    Conflict,
    /// Any other failure, including a document that was never persisted.
    Failed,
}

impl WriteOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, WriteOutcome::Committed)
    }
}

#[derive(Default)]
struct State {
    documents: Vec<Document>,
    error: Option<String>,
    /// Ticket of the load whose result is currently published.
    published: u64,
}

pub struct ContentStore {
    remote: Option<Arc<dyn RemoteFiles>>,
    codec: Codec,
    extension: String,
    state: RwLock<State>,
    tickets: AtomicU64,
    in_flight: AtomicUsize,
}

impl ContentStore {
    /// Create a store over `remote`, or a sample-mode store when `None`.
    pub fn new(remote: Option<Arc<dyn RemoteFiles>>, content: &ContentConfig) -> Self {
        Self {
            remote,
            codec: Codec::new(content.excerpt_chars),
            extension: content.extension.clone(),
            state: RwLock::new(State::default()),
            tickets: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Store backed by `remote` with default content settings.
    pub fn with_remote(remote: Arc<dyn RemoteFiles>) -> Self {
        Self::new(Some(remote), &ContentConfig::default())
    }

    /// Store with no remote: sample data, local-only edits.
    pub fn unconfigured() -> Self {
        Self::new(None, &ContentConfig::default())
    }

    /// Build a store from configuration, reading the token from the
    /// environment variable named by `remote.token_env`.
    ///
    /// A missing `[remote]` section or an unset token yields a sample-mode
    /// store rather than an error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(remote) = &config.remote else {
            tracing::info!("Remote store: disabled (no [remote] configuration)");
            return Ok(Self::new(None, &config.content));
        };

        let tokens = EnvToken::new(remote.token_env.clone());
        if !tokens.is_present() {
            tracing::info!("Remote store: disabled (no token in {})", remote.token_env);
            return Ok(Self::new(None, &config.content));
        }

        Self::from_config_with_tokens(config, Arc::new(tokens))
    }

    /// Like [`from_config`](Self::from_config) with an explicit token provider.
    pub fn from_config_with_tokens(
        config: &Config,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let Some(remote) = &config.remote else {
            return Ok(Self::new(None, &config.content));
        };
        let client = GitHubClient::new(remote.clone(), &config.content.extension, tokens)?;
        tracing::info!(
            "Remote store: {}/{}@{} under '{}'",
            remote.owner,
            remote.repo,
            remote.branch,
            remote.content_root
        );
        Ok(Self::new(Some(Arc::new(client)), &config.content))
    }

    /// Whether a remote store is configured.
    pub fn is_connected(&self) -> bool {
        self.remote.is_some()
    }

    /// The configured remote, for callers that need the strict layer.
    pub fn remote(&self) -> Result<&Arc<dyn RemoteFiles>, RemoteError> {
        self.remote.as_ref().ok_or(RemoteError::NotConfigured)
    }

    /// Stored file text for `doc`, exactly as [`save`](Self::save) would
    /// write it with this store's content settings.
    pub fn encode(&self, doc: &Document) -> String {
        self.codec.encode(doc)
    }

    /// Whether any [`load_all`](Self::load_all) is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Error recorded by the most recent published load, if any.
    pub fn error(&self) -> Option<String> {
        self.read_state().error.clone()
    }

    /// Snapshot of the current collection.
    pub fn documents(&self) -> Vec<Document> {
        self.read_state().documents.clone()
    }

    /// Look up a document in the current collection.
    pub fn get(&self, id: &str) -> Option<Document> {
        self.read_state()
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Reload the whole collection and return it.
    ///
    /// Lists `posts` and `pages` concurrently, then reads and decodes every
    /// listed file concurrently. A file that fails to read is skipped; one
    /// that fails to parse still loads with default metadata. Falls back to
    /// the sample collection when nothing is found.
    pub async fn load_all(&self) -> Vec<Document> {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = InFlight::enter(&self.in_flight);

        let (documents, error) = match self.remote() {
            Ok(remote) => self.fetch_remote(remote).await,
            Err(e) => {
                tracing::debug!("{}; using sample content", e);
                (sample_documents(), None)
            }
        };

        drop(in_flight);
        self.publish(ticket, documents, error)
    }

    /// Save a document; `true` when the remote accepted it.
    pub async fn save(&self, doc: &Document) -> bool {
        self.save_outcome(doc).await.is_committed()
    }

    /// Save a document, telling stale-revision conflicts apart.
    ///
    /// Creates the file when `doc` has no revision, updates it otherwise.
    /// On success the collection is reloaded so every revision comes from
    /// the remote. On failure the collection is left as it was.
    ///
    /// `updated_at` is always replaced with today's date before encoding,
    /// in sample mode and against a remote alike; the caller's value is
    /// not written.
    pub async fn save_outcome(&self, doc: &Document) -> WriteOutcome {
        let mut doc = doc.clone();
        doc.updated_at = today();

        let Ok(remote) = self.remote() else {
            self.upsert_local(doc);
            return WriteOutcome::Committed;
        };

        let revision = doc.revision.as_deref().filter(|r| !r.is_empty());
        let path = doc.remote_path(&self.extension);
        let content = self.codec.encode(&doc);
        let verb = if revision.is_some() { "Update" } else { "Create" };
        let message = format!("{} {}: {}", verb, doc.kind, doc.title);

        match remote.try_write(&path, &content, &message, revision).await {
            Ok(new_revision) => {
                tracing::info!("{} {} (revision {})", verb, path, new_revision);
                self.load_all().await;
                WriteOutcome::Committed
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!("Save of {} rejected, revision is stale: {}", path, e);
                WriteOutcome::Conflict
            }
            Err(e) => {
                tracing::error!("Error saving {}: {}", path, e);
                WriteOutcome::Failed
            }
        }
    }

    /// Delete a document; `true` when the remote file is gone.
    pub async fn delete(&self, doc: &Document) -> bool {
        self.delete_outcome(doc).await.is_committed()
    }

    /// Delete a document, telling stale-revision conflicts apart.
    ///
    /// A document without a revision or filename was never persisted and
    /// fails without contacting the remote.
    pub async fn delete_outcome(&self, doc: &Document) -> WriteOutcome {
        let Ok(remote) = self.remote() else {
            self.remove_local(&doc.id);
            return WriteOutcome::Committed;
        };

        let revision = doc.revision.as_deref().filter(|r| !r.is_empty());
        let filename = doc.filename.as_deref().filter(|f| !f.is_empty());
        let (Some(revision), Some(filename)) = (revision, filename) else {
            tracing::warn!(
                "Cannot delete '{}': it has not been saved to the remote store",
                doc.id
            );
            return WriteOutcome::Failed;
        };

        let path = format!("{}/{}", doc.kind.folder(), filename);
        let message = format!("Delete {}: {}", doc.kind, doc.title);

        match remote.try_delete(&path, revision, &message).await {
            Ok(()) => {
                tracing::info!("Deleted {}", path);
                self.remove_local(&doc.id);
                WriteOutcome::Committed
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!("Delete of {} rejected, revision is stale: {}", path, e);
                WriteOutcome::Conflict
            }
            Err(e) => {
                tracing::error!("Error deleting {}: {}", path, e);
                WriteOutcome::Failed
            }
        }
    }

    /// A new, unsaved draft of `kind`. Does not touch the collection.
    pub fn create_draft(&self, kind: ContentKind) -> Document {
        let id = chrono::Utc::now().timestamp_millis().to_string();
        let date = today();
        let blurb = match kind {
            ContentKind::Post => {
                "This is a blog post. You can write about anything you want and publish it to your site."
            }
            ContentKind::Page => {
                "This is a page. Pages are typically used for static content like About, Contact, or other important information."
            }
        };

        Document {
            title: format!("New {}", kind.label()),
            kind,
            status: Status::Draft,
            body: format!(
                "# New {}\n\nStart writing your content here...\n\n{}",
                kind.label(),
                blurb
            ),
            excerpt: format!("A new {} ready for your content.", kind),
            created_at: date,
            updated_at: date,
            filename: Some(format!("{}.{}", id, self.extension)),
            revision: None,
            id,
        }
    }

    async fn fetch_remote(&self, remote: &Arc<dyn RemoteFiles>) -> (Vec<Document>, Option<String>) {
        let [first, second] = ContentKind::ALL;
        let listings = tokio::join!(
            remote.try_list(first.folder()),
            remote.try_list(second.folder()),
        );

        let mut failures = Vec::new();
        let mut files: Vec<FileRef> = Vec::new();
        for (kind, listed) in ContentKind::ALL.into_iter().zip([listings.0, listings.1]) {
            match listed {
                Ok(refs) => files.extend(refs),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("No {} directory in remote store", kind.folder());
                }
                Err(e) => {
                    tracing::error!("Error listing {}: {}", kind.folder(), e);
                    failures.push(format!("listing {}: {}", kind.folder(), e));
                }
            }
        }

        if files.is_empty() {
            tracing::info!("No remote content found; using sample content");
            return (sample_documents(), summarize(failures));
        }

        let total = files.len();
        let mut reads = JoinSet::new();
        for (idx, file) in files.into_iter().enumerate() {
            let remote = Arc::clone(remote);
            reads.spawn(async move {
                let raw = remote.try_read(&file.path).await;
                (idx, file, raw)
            });
        }

        let mut loaded: Vec<(usize, Document)> = Vec::with_capacity(total);
        while let Some(joined) = reads.join_next().await {
            match joined {
                Ok((idx, file, Ok(raw))) => {
                    let mut doc = self.codec.decode(&raw, &file.name);
                    doc.revision = Some(file.revision);
                    loaded.push((idx, doc));
                }
                Ok((_, file, Err(e))) => {
                    tracing::error!("Error reading {}: {}", file.path, e);
                    failures.push(read_failure(&file, &e));
                }
                Err(e) => {
                    tracing::error!("Read task failed: {}", e);
                    failures.push(format!("read task: {}", e));
                }
            }
        }
        loaded.sort_by_key(|(idx, _)| *idx);

        let mut documents: Vec<Document> = Vec::with_capacity(loaded.len());
        for (_, doc) in loaded {
            if documents.iter().any(|d| d.id == doc.id) {
                tracing::warn!(
                    "Duplicate document id '{}' ({} {}); keeping the first",
                    doc.id,
                    doc.kind,
                    doc.filename.as_deref().unwrap_or_default()
                );
                continue;
            }
            documents.push(doc);
        }

        tracing::info!("Loaded {} of {} documents", documents.len(), total);
        (documents, summarize(failures))
    }

    fn publish(&self, ticket: u64, documents: Vec<Document>, error: Option<String>) -> Vec<Document> {
        let mut state = self.write_state();
        if ticket < state.published {
            tracing::debug!(
                "Discarding load #{}; load #{} already published",
                ticket,
                state.published
            );
            return state.documents.clone();
        }
        state.published = ticket;
        state.documents = documents;
        state.error = error;
        state.documents.clone()
    }

    fn upsert_local(&self, doc: Document) {
        let mut state = self.write_state();
        match state.documents.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => *existing = doc,
            None => state.documents.insert(0, doc),
        }
    }

    fn remove_local(&self, id: &str) {
        self.write_state().documents.retain(|d| d.id != id);
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts a load as in flight until dropped, including on cancellation.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn read_failure(file: &FileRef, e: &RemoteError) -> String {
    format!("reading {}: {}", file.path, e)
}

fn summarize(failures: Vec<String>) -> Option<String> {
    if failures.is_empty() {
        None
    } else {
        Some(format!(
            "Failed to load content from remote store ({})",
            failures.join("; ")
        ))
    }
}
