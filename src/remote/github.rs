//! GitHub repository contents client.
//!
//! Talks to the REST contents API of a single repository and branch, with
//! every path resolved under the configured `content_root`.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `GET /repos/{owner}/{repo}/contents/{dir}?ref={branch}` |
//! | read | `GET /repos/{owner}/{repo}/contents/{file}?ref={branch}` |
//! | write | `PUT /repos/{owner}/{repo}/contents/{file}` with `{message, content, branch, sha?}` |
//! | delete | `DELETE /repos/{owner}/{repo}/contents/{file}` with `{message, sha, branch}` |
//!
//! File content travels base64-encoded. The blob `sha` is the revision token;
//! GitHub rejects a write or delete whose `sha` is not the current one with
//! `409 Conflict` (or `422` when a create targets an existing file), which is
//! reported as [`RemoteError::Conflict`].
//!
//! Requests carry `Authorization: Bearer <token>` from the configured
//! [`TokenProvider`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::TokenProvider;
use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::models::FileRef;

use super::{is_document, join_path, RemoteFiles};

const API_VERSION: &str = "2022-11-28";

/// Remote file client backed by the GitHub contents API.
pub struct GitHubClient {
    http: reqwest::Client,
    config: RemoteConfig,
    extension: String,
    tokens: Arc<dyn TokenProvider>,
}

/// One entry of a directory listing.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// A single file's contents response.
#[derive(Debug, Deserialize)]
struct FileContent {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: Option<CommittedFile>,
}

#[derive(Debug, Deserialize)]
struct CommittedFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

impl GitHubClient {
    /// Build a client for `config`, treating files ending in `.{extension}`
    /// as documents.
    pub fn new(
        config: RemoteConfig,
        extension: &str,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("gitcms/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            extension: extension.to_string(),
            tokens,
        })
    }

    /// Repository path for a path relative to the content root.
    fn repo_path(&self, path: &str) -> String {
        join_path(&[&self.config.content_root, path])
    }

    /// Inverse of [`repo_path`](Self::repo_path) for paths returned by the API.
    fn relative_path<'a>(&self, repo_path: &'a str) -> &'a str {
        let root = self.config.content_root.trim_matches('/');
        if root.is_empty() {
            return repo_path;
        }
        repo_path
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(repo_path)
    }

    fn contents_url(&self, repo_path: &str) -> String {
        let encoded = repo_path
            .split('/')
            .map(uri_encode)
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            uri_encode(&self.config.owner),
            uri_encode(&self.config.repo),
            encoded
        )
    }

    /// Attach auth and API headers, then send.
    async fn send(&self, req: RequestBuilder) -> Result<Response, RemoteError> {
        let token = self
            .tokens
            .token(self.config.audience.as_deref())
            .await
            .map_err(|e| RemoteError::Auth(e.to_string()))?;

        let resp = req
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;
        Ok(resp)
    }

    async fn get_contents(&self, repo_path: &str) -> Result<serde_json::Value, RemoteError> {
        tracing::debug!("GET contents {}@{}", repo_path, self.config.branch);
        let req = self
            .http
            .get(self.contents_url(repo_path))
            .query(&[("ref", self.config.branch.as_str())]);
        let resp = self.send(req).await?;
        let resp = check_status(resp, repo_path).await?;
        resp.json().await.map_err(|e| RemoteError::Decode {
            path: repo_path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl RemoteFiles for GitHubClient {
    async fn try_list(&self, subpath: &str) -> Result<Vec<FileRef>, RemoteError> {
        let repo_path = self.repo_path(subpath);
        let value = self.get_contents(&repo_path).await?;

        if !value.is_array() {
            return Err(RemoteError::Decode {
                path: repo_path,
                message: "expected a directory listing".to_string(),
            });
        }
        let entries: Vec<ContentEntry> =
            serde_json::from_value(value).map_err(|e| RemoteError::Decode {
                path: repo_path.clone(),
                message: e.to_string(),
            })?;

        Ok(entries
            .into_iter()
            .filter(|e| e.entry_type == "file" && is_document(&e.name, &self.extension))
            .map(|e| FileRef {
                path: self.relative_path(&e.path).to_string(),
                name: e.name,
                revision: e.sha,
                download_url: e.download_url,
            })
            .collect())
    }

    async fn try_read(&self, path: &str) -> Result<String, RemoteError> {
        let repo_path = self.repo_path(path);
        let value = self.get_contents(&repo_path).await?;
        let file: FileContent = serde_json::from_value(value).map_err(|e| RemoteError::Decode {
            path: repo_path.clone(),
            message: e.to_string(),
        })?;
        decode_content(&file, &repo_path)
    }

    async fn try_write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        revision: Option<&str>,
    ) -> Result<String, RemoteError> {
        let repo_path = self.repo_path(path);
        tracing::debug!(
            "PUT contents {} ({})",
            repo_path,
            if revision.is_some() { "update" } else { "create" }
        );

        let body = PutRequest {
            message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.config.branch,
            sha: revision,
        };
        let req = self.http.put(self.contents_url(&repo_path)).json(&body);
        let resp = self.send(req).await?;
        let resp = check_status(resp, &repo_path).await?;

        let parsed: PutResponse = resp.json().await.map_err(|e| RemoteError::Decode {
            path: repo_path.clone(),
            message: e.to_string(),
        })?;
        parsed
            .content
            .map(|c| c.sha)
            .ok_or_else(|| RemoteError::Decode {
                path: repo_path,
                message: "response has no content sha".to_string(),
            })
    }

    async fn try_delete(
        &self,
        path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), RemoteError> {
        if revision.is_empty() {
            return Err(RemoteError::InvalidRequest(format!(
                "delete of '{}' requires a revision",
                path
            )));
        }
        let repo_path = self.repo_path(path);
        tracing::debug!("DELETE contents {}", repo_path);

        let body = DeleteRequest {
            message,
            sha: revision,
            branch: &self.config.branch,
        };
        let req = self.http.delete(self.contents_url(&repo_path)).json(&body);
        let resp = self.send(req).await?;
        check_status(resp, &repo_path).await?;
        Ok(())
    }
}

/// Map non-success responses onto [`RemoteError`].
async fn check_status(resp: Response, repo_path: &str) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.chars().take(500).collect());

    Err(match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(repo_path.to_string()),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::PRECONDITION_FAILED => {
            RemoteError::Conflict {
                path: repo_path.to_string(),
                message,
            }
        }
        _ => RemoteError::Status {
            status: status.as_u16(),
            path: repo_path.to_string(),
            message,
        },
    })
}

/// Decode a base64 file payload. GitHub wraps the encoding at 60 columns.
fn decode_content(file: &FileContent, repo_path: &str) -> Result<String, RemoteError> {
    let decode_err = |message: String| RemoteError::Decode {
        path: repo_path.to_string(),
        message,
    };

    match file.encoding.as_deref() {
        Some("base64") | None => {}
        Some(other) => return Err(decode_err(format!("unsupported encoding '{}'", other))),
    }
    let encoded = file
        .content
        .as_deref()
        .ok_or_else(|| decode_err("not a file".to_string()))?;

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| decode_err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| decode_err(e.to_string()))
}

/// Percent-encode a path segment, leaving RFC 3986 unreserved characters.
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    fn client(root: &str) -> GitHubClient {
        let mut config = RemoteConfig::new("acme", "site");
        config.content_root = root.to_string();
        GitHubClient::new(config, "md", Arc::new(StaticToken::new("t"))).unwrap()
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let c = client("content");
        assert_eq!(
            c.contents_url(&c.repo_path("posts/hello world.md")),
            "https://api.github.com/repos/acme/site/contents/content/posts/hello%20world.md"
        );
    }

    #[test]
    fn test_relative_path() {
        let c = client("content/");
        assert_eq!(c.relative_path("content/posts/a.md"), "posts/a.md");
        assert_eq!(c.relative_path("elsewhere/a.md"), "elsewhere/a.md");
        let bare = client("");
        assert_eq!(bare.relative_path("posts/a.md"), "posts/a.md");
        assert_eq!(bare.repo_path("posts/a.md"), "posts/a.md");
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let encoded = STANDARD.encode("---\ntitle: Hi\n---\n\nbody\n");
        let (a, b) = encoded.split_at(10);
        let file = FileContent {
            content: Some(format!("{}\n{}\n", a, b)),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(
            decode_content(&file, "x").unwrap(),
            "---\ntitle: Hi\n---\n\nbody\n"
        );
    }

    #[test]
    fn test_decode_rejects_other_encodings() {
        let file = FileContent {
            content: Some(String::new()),
            encoding: Some("none".to_string()),
        };
        assert!(decode_content(&file, "x").is_err());
    }
}
