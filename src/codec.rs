//! Document codec: front-matter header plus markdown body.
//!
//! Every stored file is a YAML metadata block delimited by `---` lines,
//! followed by a blank line and the raw body:
//!
//! ```text
//! ---
//! title: Welcome
//! type: post
//! status: published
//! excerpt: A short summary.
//! date: 2025-01-14
//! updated: 2025-01-20
//! ---
//!
//! # Welcome
//! ```
//!
//! Decoding is best-effort: a malformed header never fails the caller. The
//! whole file becomes the body of a default-filled [`Document`] and a warning
//! is logged, so one bad file cannot stop a collection from loading. Use
//! [`Codec::try_decode`] when the failure must be observed.

use chrono::NaiveDate;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::CodecError;
use crate::models::{today, ContentKind, Document, Status};

/// Title given to documents whose header has none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Number of body characters used for a synthesized excerpt.
pub const DEFAULT_EXCERPT_CHARS: usize = 150;

const DELIMITER: &str = "---";

/// Encoder/decoder for the on-wire document format.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    excerpt_chars: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

/// Header fields as they appear on the wire, in emission order.
#[derive(Serialize)]
struct FrontMatter<'a> {
    title: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    status: &'a str,
    excerpt: &'a str,
    date: String,
    updated: String,
}

impl Codec {
    pub fn new(excerpt_chars: usize) -> Self {
        Self { excerpt_chars }
    }

    /// Decode a stored file into a [`Document`], never failing.
    ///
    /// `filename` supplies the document id (extension stripped) and is kept
    /// as the document's `filename`. The returned document has no revision;
    /// the caller attaches the one from the listing it read.
    pub fn decode(&self, raw: &str, filename: &str) -> Document {
        match self.try_decode(raw, filename) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Malformed metadata in {}: {}; using defaults", filename, e);
                self.fallback(raw, filename)
            }
        }
    }

    /// Decode a stored file, reporting a malformed metadata block as an error.
    ///
    /// Individual values that cannot be interpreted (unknown `type`, bad
    /// date) fall back to their defaults with a warning instead of failing.
    pub fn try_decode(&self, raw: &str, filename: &str) -> Result<Document, CodecError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let (header, body) = match split_front_matter(raw)? {
            Some((yaml, rest)) => (parse_header(yaml)?, rest.trim()),
            None => (Mapping::new(), raw.trim()),
        };

        let kind = match scalar(&header, "type") {
            Some(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!("{}: {}; defaulting to post", filename, e);
                ContentKind::default()
            }),
            None => ContentKind::default(),
        };
        let status = match scalar(&header, "status") {
            Some(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!("{}: {}; defaulting to published", filename, e);
                Status::default()
            }),
            None => Status::default(),
        };

        let created = date_field(&header, "date", filename);
        let updated = date_field(&header, "updated", filename).or(created);
        let created_at = created.unwrap_or_else(today);
        let updated_at = updated.unwrap_or_else(today);

        Ok(Document {
            id: strip_extension(filename).to_string(),
            title: scalar(&header, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            kind,
            status,
            excerpt: scalar(&header, "excerpt").unwrap_or_else(|| self.excerpt_of(body)),
            body: body.to_string(),
            created_at,
            updated_at,
            filename: Some(filename.to_string()),
            revision: None,
        })
    }

    /// Encode a [`Document`] into the stored file format.
    ///
    /// An empty excerpt is replaced by one synthesized from the body.
    pub fn encode(&self, doc: &Document) -> String {
        let synthesized;
        let excerpt = if doc.excerpt.trim().is_empty() {
            synthesized = self.excerpt_of(&doc.body);
            synthesized.as_str()
        } else {
            doc.excerpt.as_str()
        };

        let header = FrontMatter {
            title: &doc.title,
            kind: doc.kind.as_str(),
            status: doc.status.as_str(),
            excerpt,
            date: format_date(doc.created_at),
            updated: format_date(doc.updated_at),
        };

        let yaml = match serde_yaml::to_string(&header) {
            Ok(yaml) => yaml,
            Err(e) => {
                tracing::error!("Failed to serialize metadata for {}: {}", doc.id, e);
                basic_header(&header)
            }
        };

        let mut out = format!("{}\n{}", DELIMITER, yaml);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push_str("\n\n");
        out.push_str(&doc.body);
        if !doc.body.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// First `excerpt_chars` characters of `body`, followed by an ellipsis.
    pub fn excerpt_of(&self, body: &str) -> String {
        let mut excerpt: String = body.chars().take(self.excerpt_chars).collect();
        excerpt.push_str("...");
        excerpt
    }

    /// Default-filled document whose body is the whole file, normalized the
    /// same way as a decoded body so it survives an encode/decode cycle.
    fn fallback(&self, raw: &str, filename: &str) -> Document {
        let date = today();
        let body = raw.strip_prefix('\u{feff}').unwrap_or(raw).trim();
        Document {
            id: strip_extension(filename).to_string(),
            title: DEFAULT_TITLE.to_string(),
            kind: ContentKind::default(),
            status: Status::default(),
            body: body.to_string(),
            excerpt: self.excerpt_of(body),
            created_at: date,
            updated_at: date,
            filename: Some(filename.to_string()),
            revision: None,
        }
    }
}

/// Decode with the default codec settings.
pub fn decode(raw: &str, filename: &str) -> Document {
    Codec::default().decode(raw, filename)
}

/// Encode with the default codec settings.
pub fn encode(doc: &Document) -> String {
    Codec::default().encode(doc)
}

/// Markdown image reference for an uploaded media file.
pub fn image_link(name: &str, url: &str) -> String {
    format!("![{}]({})", name, url)
}

/// Append an image reference to a body as its own paragraph.
pub fn append_image_link(body: &str, name: &str, url: &str) -> String {
    let trimmed = body.trim_end();
    if trimmed.is_empty() {
        image_link(name, url)
    } else {
        format!("{}\n\n{}", trimmed, image_link(name, url))
    }
}

/// `welcome.md` → `welcome`. Only the last extension is removed.
pub fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(0) | None => filename,
        Some(idx) => &filename[..idx],
    }
}

/// Split `raw` into `(yaml, rest)` when it opens with a `---` line.
fn split_front_matter(raw: &str) -> Result<Option<(&str, &str)>, CodecError> {
    let Some(after) = raw.strip_prefix(DELIMITER) else {
        return Ok(None);
    };
    let after = match after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
    {
        Some(rest) => rest,
        None if after.trim().is_empty() => return Err(CodecError::Unterminated),
        None => return Ok(None),
    };

    let mut offset = 0;
    for line in after.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Ok(Some((&after[..offset], &after[offset + line.len()..])));
        }
        offset += line.len();
    }
    Err(CodecError::Unterminated)
}

fn parse_header(yaml: &str) -> Result<Mapping, CodecError> {
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(CodecError::NotAMapping),
    }
}

/// Non-empty scalar value for `key`, rendered as text.
fn scalar(map: &Mapping, key: &str) -> Option<String> {
    let text = match map.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn date_field(map: &Mapping, key: &str, filename: &str) -> Option<NaiveDate> {
    let value = scalar(map, key)?;
    let value = value.trim();
    let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d").or_else(|e| {
        // Timestamps such as 2025-01-14T09:30:00Z keep their date part.
        match value.get(..10) {
            Some(prefix) => NaiveDate::parse_from_str(prefix, "%Y-%m-%d"),
            None => Err(e),
        }
    });
    match parsed {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::warn!("{}: invalid {} '{}'; ignoring", filename, key, value);
            None
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Header written when YAML serialization fails. JSON strings are valid
/// YAML double-quoted scalars.
fn basic_header(h: &FrontMatter<'_>) -> String {
    let quote = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "title: {}\ntype: {}\nstatus: {}\nexcerpt: {}\ndate: {}\nupdated: {}\n",
        quote(h.title),
        h.kind,
        h.status,
        quote(h.excerpt),
        h.date,
        h.updated
    )
}
