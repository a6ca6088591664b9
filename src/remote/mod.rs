//! Remote file client abstraction.
//!
//! [`RemoteFiles`] is the seam between the content store and wherever the
//! files actually live. All paths are relative to the configured content
//! root (e.g. `"posts"` or `"posts/welcome.md"`).
//!
//! The trait has two layers:
//!
//! | Layer | Methods | On failure |
//! |-------|---------|------------|
//! | strict | `try_list`, `try_read`, `try_write`, `try_delete` | `Err(RemoteError)` |
//! | best-effort | `list`, `read`, `write`, `delete` | logs, then empty / `false` |
//!
//! Implementors provide the strict layer; the best-effort layer is derived.
//! Writes and deletes are guarded by the revision token of the version being
//! replaced, so a stale token fails with [`RemoteError::Conflict`].

pub mod github;
pub mod memory;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::FileRef;

pub use github::GitHubClient;
pub use memory::InMemoryRemote;

#[async_trait]
pub trait RemoteFiles: Send + Sync {
    /// List document files directly under `subpath`.
    ///
    /// Only regular files with the document extension are returned.
    /// A missing directory is [`RemoteError::NotFound`].
    async fn try_list(&self, subpath: &str) -> Result<Vec<FileRef>, RemoteError>;

    /// Fetch the decoded text content of one file.
    async fn try_read(&self, path: &str) -> Result<String, RemoteError>;

    /// Create (`revision == None`) or update a file. Returns the new revision.
    async fn try_write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        revision: Option<&str>,
    ) -> Result<String, RemoteError>;

    /// Delete a file whose current revision is `revision`.
    async fn try_delete(&self, path: &str, revision: &str, message: &str)
        -> Result<(), RemoteError>;

    /// Best-effort listing: empty on a missing directory or any failure.
    async fn list(&self, subpath: &str) -> Vec<FileRef> {
        match self.try_list(subpath).await {
            Ok(files) => files,
            Err(e) if e.is_not_found() => {
                tracing::debug!("No content directory at '{}'", subpath);
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Error listing content files in '{}': {}", subpath, e);
                Vec::new()
            }
        }
    }

    /// Best-effort read: empty text on failure.
    async fn read(&self, path: &str) -> String {
        match self.try_read(path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Error reading '{}': {}", path, e);
                String::new()
            }
        }
    }

    /// Best-effort write: `false` on any failure, conflicts included.
    async fn write(&self, path: &str, content: &str, message: &str, revision: Option<&str>) -> bool {
        match self.try_write(path, content, message, revision).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Error writing '{}': {}", path, e);
                false
            }
        }
    }

    /// Best-effort delete: `false` if `revision` is empty, stale, or the call fails.
    async fn delete(&self, path: &str, revision: &str, message: &str) -> bool {
        if revision.is_empty() {
            tracing::warn!("Refusing to delete '{}' without a revision", path);
            return false;
        }
        match self.try_delete(path, revision, message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error deleting '{}': {}", path, e);
                false
            }
        }
    }
}

/// Whether `name` carries the document extension (`"md"` → `*.md`).
pub fn is_document(name: &str, extension: &str) -> bool {
    name.len() > extension.len() + 1
        && name
            .strip_suffix(extension)
            .is_some_and(|stem| stem.ends_with('.'))
}

/// Join path segments with `/`, skipping empty ones.
pub(crate) fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_document() {
        assert!(is_document("welcome.md", "md"));
        assert!(!is_document("welcome.markdown", "md"));
        assert!(!is_document("image.png", "md"));
        assert!(!is_document(".md", "md"));
        assert!(!is_document("readmemd", "md"));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["content", "posts"]), "content/posts");
        assert_eq!(join_path(&["/content/", "", "posts/a.md"]), "content/posts/a.md");
        assert_eq!(join_path(&["", "posts"]), "posts");
    }
}
