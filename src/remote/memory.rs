//! In-memory [`RemoteFiles`] implementation for tests and offline demos.
//!
//! Files live in a `BTreeMap` behind `std::sync::RwLock`. Revisions are
//! content hashes, so writing identical content yields an identical token.
//! Optimistic concurrency follows the hosted store: creating an existing
//! file or presenting a stale revision is a [`RemoteError::Conflict`].
//!
//! Every call is recorded and can be inspected with [`InMemoryRemote::calls`].

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::RemoteError;
use crate::models::FileRef;

use super::{is_document, RemoteFiles};

/// A call observed by [`InMemoryRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    List {
        subpath: String,
    },
    Read {
        path: String,
    },
    Write {
        path: String,
        message: String,
        revision: Option<String>,
    },
    Delete {
        path: String,
        revision: String,
        message: String,
    },
}

struct StoredFile {
    content: String,
    revision: String,
}

/// In-memory remote store with revision checks.
pub struct InMemoryRemote {
    extension: String,
    files: RwLock<BTreeMap<String, StoredFile>>,
    calls: Mutex<Vec<RemoteCall>>,
    failing: RwLock<Vec<String>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::with_extension("md")
    }

    pub fn with_extension(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            files: RwLock::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            failing: RwLock::new(Vec::new()),
        }
    }

    /// Seed a file directly, bypassing revision checks. Returns its revision.
    pub fn insert(&self, path: &str, content: &str) -> String {
        let revision = content_revision(content);
        self.files.write().unwrap().insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision: revision.clone(),
            },
        );
        revision
    }

    /// Current content of a file, if present.
    pub fn content(&self, path: &str) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .map(|f| f.content.clone())
    }

    /// Current revision of a file, if present.
    pub fn revision(&self, path: &str) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .map(|f| f.revision.clone())
    }

    /// Paths of all stored files, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.read().unwrap().keys().cloned().collect()
    }

    /// Make every operation on paths under `prefix` fail with a transport error.
    pub fn fail_under(&self, prefix: &str) {
        self.failing.write().unwrap().push(prefix.to_string());
    }

    /// End every simulated outage.
    pub fn clear_failures(&self) {
        self.failing.write().unwrap().clear();
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of write and delete calls observed.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, RemoteCall::Write { .. } | RemoteCall::Delete { .. }))
            .count()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failing(&self, path: &str) -> Result<(), RemoteError> {
        let failing = self.failing.read().unwrap();
        if failing.iter().any(|p| path.starts_with(p.as_str())) {
            return Err(RemoteError::Transport(format!(
                "simulated outage for '{}'",
                path
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

/// Revision token for `content`: hash of a git-style blob header plus content.
pub fn content_revision(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())[..40].to_string()
}

#[async_trait]
impl RemoteFiles for InMemoryRemote {
    async fn try_list(&self, subpath: &str) -> Result<Vec<FileRef>, RemoteError> {
        self.record(RemoteCall::List {
            subpath: subpath.to_string(),
        });
        self.check_failing(subpath)?;

        let dir = format!("{}/", subpath.trim_end_matches('/'));
        let files = self.files.read().unwrap();
        let mut exists = false;
        let mut refs = Vec::new();
        for (path, file) in files.range(dir.clone()..) {
            let Some(rest) = path.strip_prefix(&dir) else {
                break;
            };
            exists = true;
            if rest.contains('/') || !is_document(rest, &self.extension) {
                continue;
            }
            refs.push(FileRef {
                name: rest.to_string(),
                path: path.clone(),
                revision: file.revision.clone(),
                download_url: Some(format!("memory://{}", path)),
            });
        }

        if !exists {
            return Err(RemoteError::NotFound(subpath.to_string()));
        }
        Ok(refs)
    }

    async fn try_read(&self, path: &str) -> Result<String, RemoteError> {
        self.record(RemoteCall::Read {
            path: path.to_string(),
        });
        self.check_failing(path)?;

        self.files
            .read()
            .unwrap()
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn try_write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        revision: Option<&str>,
    ) -> Result<String, RemoteError> {
        self.record(RemoteCall::Write {
            path: path.to_string(),
            message: message.to_string(),
            revision: revision.map(str::to_string),
        });
        self.check_failing(path)?;

        let mut files = self.files.write().unwrap();
        match (files.get(path), revision) {
            (Some(_), None) => {
                return Err(RemoteError::Conflict {
                    path: path.to_string(),
                    message: "file already exists; a revision is required to update it"
                        .to_string(),
                })
            }
            (Some(current), Some(expected)) if current.revision != expected => {
                return Err(RemoteError::Conflict {
                    path: path.to_string(),
                    message: format!("{} does not match {}", expected, current.revision),
                })
            }
            (None, Some(expected)) => {
                return Err(RemoteError::Conflict {
                    path: path.to_string(),
                    message: format!("{} does not match any existing file", expected),
                })
            }
            _ => {}
        }

        let new_revision = content_revision(content);
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision: new_revision.clone(),
            },
        );
        Ok(new_revision)
    }

    async fn try_delete(
        &self,
        path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), RemoteError> {
        self.record(RemoteCall::Delete {
            path: path.to_string(),
            revision: revision.to_string(),
            message: message.to_string(),
        });
        self.check_failing(path)?;

        let mut files = self.files.write().unwrap();
        let current = files
            .get(path)
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        if current.revision != revision {
            return Err(RemoteError::Conflict {
                path: path.to_string(),
                message: format!("{} does not match {}", revision, current.revision),
            });
        }
        files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_documents_and_subdirectories() {
        let remote = InMemoryRemote::new();
        remote.insert("posts/a.md", "a");
        remote.insert("posts/image.png", "png");
        remote.insert("posts/nested/b.md", "b");
        remote.insert("postscript/c.md", "c");

        let files = remote.try_list("posts").await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.md"]);
        assert_eq!(files[0].path, "posts/a.md");
        assert_eq!(files[0].revision, content_revision("a"));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let remote = InMemoryRemote::new();
        assert!(remote.try_list("pages").await.unwrap_err().is_not_found());
        assert!(remote.list("pages").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_then_update_with_revision() {
        let remote = InMemoryRemote::new();
        let rev1 = remote
            .try_write("posts/x.md", "one", "Create post: X", None)
            .await
            .unwrap();
        let rev2 = remote
            .try_write("posts/x.md", "two", "Update post: X", Some(&rev1))
            .await
            .unwrap();
        assert_ne!(rev1, rev2);
        assert_eq!(remote.content("posts/x.md").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let remote = InMemoryRemote::new();
        let rev1 = remote.insert("posts/x.md", "one");
        remote.insert("posts/x.md", "changed elsewhere");

        let err = remote
            .try_write("posts/x.md", "mine", "Update", Some(&rev1))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(!remote.write("posts/x.md", "mine", "Update", Some(&rev1)).await);
        assert!(remote
            .try_delete("posts/x.md", &rev1, "Delete")
            .await
            .unwrap_err()
            .is_conflict());
        assert_eq!(
            remote.content("posts/x.md").as_deref(),
            Some("changed elsewhere")
        );
    }

    #[tokio::test]
    async fn test_create_over_existing_conflicts() {
        let remote = InMemoryRemote::new();
        remote.insert("posts/x.md", "one");
        let err = remote
            .try_write("posts/x.md", "two", "Create", None)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_delete_requires_revision() {
        let remote = InMemoryRemote::new();
        remote.insert("posts/x.md", "one");
        assert!(!remote.delete("posts/x.md", "", "Delete").await);
        assert_eq!(remote.mutation_count(), 0);
        let rev = remote.revision("posts/x.md").unwrap();
        assert!(remote.delete("posts/x.md", &rev, "Delete").await);
        assert!(remote.paths().is_empty());
    }

    #[tokio::test]
    async fn test_simulated_outage() {
        let remote = InMemoryRemote::new();
        remote.insert("posts/x.md", "one");
        remote.fail_under("posts");
        assert!(matches!(
            remote.try_read("posts/x.md").await,
            Err(RemoteError::Transport(_))
        ));
        assert_eq!(remote.read("posts/x.md").await, "");
    }
}
