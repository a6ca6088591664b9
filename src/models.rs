//! Core data models used throughout gitcms.
//!
//! These types represent the documents and remote file references that flow
//! between the codec, the remote file client, and the content store.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Classification of a document. Determines the remote subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Post,
    Page,
}

impl ContentKind {
    /// All kinds, in the order they are loaded.
    pub const ALL: [ContentKind; 2] = [ContentKind::Post, ContentKind::Page];

    /// Wire name used in the metadata block (`type: post`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Page => "page",
        }
    }

    /// Subdirectory under the content root holding documents of this kind.
    pub fn folder(&self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::Page => "pages",
        }
    }

    /// Capitalized label used in draft titles ("New Post").
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Post => "Post",
            ContentKind::Page => "Page",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" | "posts" => Ok(ContentKind::Post),
            "page" | "pages" => Ok(ContentKind::Page),
            other => Err(format!("unknown content kind '{}': must be post or page", other)),
        }
    }
}

/// Publication state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    #[default]
    Published,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            other => Err(format!(
                "unknown status '{}': must be draft or published",
                other
            )),
        }
    }
}

/// The unit of content.
///
/// A document without a `revision` has never been written to the remote
/// store. Once persisted, `revision` always holds the token returned by the
/// most recent successful read or write of its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub status: Status,
    pub body: String,
    pub excerpt: String,
    pub created_at: NaiveDate,
    pub updated_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl Document {
    /// Remote file name, synthesized from `id` when not yet assigned.
    pub fn file_name(&self, extension: &str) -> String {
        match &self.filename {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{}.{}", self.id, extension),
        }
    }

    /// Path of the document's file relative to the content root.
    pub fn remote_path(&self, extension: &str) -> String {
        format!("{}/{}", self.kind.folder(), self.file_name(extension))
    }

    /// Whether this document has been written to the remote store.
    pub fn is_persisted(&self) -> bool {
        self.revision.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// A file entry returned by a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// File name including extension (e.g. `"welcome.md"`).
    pub name: String,
    /// Path relative to the content root (e.g. `"posts/welcome.md"`).
    pub path: String,
    /// Revision token of the listed version.
    pub revision: String,
    /// Direct download location, when the remote provides one.
    pub download_url: Option<String>,
}

/// Today's calendar date in UTC.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(filename: Option<&str>) -> Document {
        Document {
            id: "1700000000000".to_string(),
            title: "T".to_string(),
            kind: ContentKind::Page,
            status: Status::Draft,
            body: String::new(),
            excerpt: String::new(),
            created_at: today(),
            updated_at: today(),
            filename: filename.map(str::to_string),
            revision: None,
        }
    }

    #[test]
    fn test_remote_path_uses_filename() {
        assert_eq!(doc(Some("about.md")).remote_path("md"), "pages/about.md");
    }

    #[test]
    fn test_remote_path_synthesized_from_id() {
        assert_eq!(doc(None).remote_path("md"), "pages/1700000000000.md");
        assert_eq!(doc(Some("")).remote_path("md"), "pages/1700000000000.md");
    }

    #[test]
    fn test_kind_and_status_parse() {
        assert_eq!("Page".parse::<ContentKind>().unwrap(), ContentKind::Page);
        assert_eq!("posts".parse::<ContentKind>().unwrap(), ContentKind::Post);
        assert!("note".parse::<ContentKind>().is_err());
        assert_eq!("draft".parse::<Status>().unwrap(), Status::Draft);
        assert!("archived".parse::<Status>().is_err());
    }

    #[test]
    fn test_empty_revision_is_not_persisted() {
        let mut d = doc(None);
        assert!(!d.is_persisted());
        d.revision = Some(String::new());
        assert!(!d.is_persisted());
        d.revision = Some("abc".to_string());
        assert!(d.is_persisted());
    }
}
