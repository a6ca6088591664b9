//! Built-in sample collection.
//!
//! Shown whenever no remote store is configured, or the configured one has
//! no content yet, so a fresh install always has something to edit. Sample
//! documents carry no revision: saving one creates a new remote file.

use chrono::NaiveDate;

use crate::models::{ContentKind, Document, Status};

const WELCOME: &str = "# Welcome to your content editor

Every post and page you write here is stored as a markdown file in a git
repository. There is no database to run or back up.

## What you can do
- **Write** posts and pages in markdown
- **Save drafts** and publish when ready
- **Track history**: every save is a commit with a readable message

## Connecting a repository
Add a `[remote]` section to your configuration with the repository owner,
name and branch, and export a token with write access to its contents.

## Demo mode
You are looking at sample content. Connect a repository to manage real
documents.";

const GETTING_STARTED: &str = "# Getting started

## Configuration

```toml
[remote]
owner = \"your-name\"
repo = \"your-site\"
branch = \"main\"
content_root = \"content\"
token_env = \"GITHUB_TOKEN\"
```

Posts are stored under `content/posts/` and pages under `content/pages/`.

## Writing
- Create a post or page, give it a title, write the body
- Save it as a draft until it is ready, then publish it

## Concurrent edits
Each document remembers which version of its file it was loaded from. If
someone else changed the file in the meantime, your save is rejected
instead of silently overwriting their work. Reload and try again.";

const SAMPLE_POST: &str = "# A sample blog post

This post shows what a document looks like. Edit it, or delete it once
you are ready to write your own.

## Markdown
- **Bold** and *italic* text
- [Links](https://example.com)
- Lists, headings and code blocks

## Drafts
This post is a draft. Drafts are saved to the repository like any other
document but are marked so your site can skip them.

Happy writing!";

const ABOUT: &str = "# About

This editor keeps content as plain markdown files with a small metadata
header:

```yaml
---
title: Your Post Title
type: post
status: published
date: 2025-01-14
---

Your content here...
```

Because the files live in git, you get history, review and backups from
the tools you already use.";

fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 14).unwrap_or(NaiveDate::MIN)
}

fn sample(
    id: &str,
    title: &str,
    kind: ContentKind,
    status: Status,
    body: &str,
    excerpt: &str,
    filename: &str,
) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        kind,
        status,
        body: body.to_string(),
        excerpt: excerpt.to_string(),
        created_at: sample_date(),
        updated_at: sample_date(),
        filename: Some(filename.to_string()),
        revision: None,
    }
}

/// The four sample documents, in display order.
pub fn sample_documents() -> Vec<Document> {
    vec![
        sample(
            "1",
            "Welcome to your CMS",
            ContentKind::Post,
            Status::Published,
            WELCOME,
            "Learn how to use your new CMS and connect a repository.",
            "welcome.md",
        ),
        sample(
            "2",
            "Getting Started Guide",
            ContentKind::Page,
            Status::Published,
            GETTING_STARTED,
            "Complete guide to setting up and using your CMS.",
            "getting-started.md",
        ),
        sample(
            "3",
            "Sample Blog Post",
            ContentKind::Post,
            Status::Draft,
            SAMPLE_POST,
            "A sample blog post showing the CMS features and capabilities.",
            "sample-blog-post.md",
        ),
        sample(
            "4",
            "About Page",
            ContentKind::Page,
            Status::Published,
            ABOUT,
            "Learn about the technology and features powering this CMS.",
            "about.md",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_four_unique_unpersisted_samples() {
        let docs = sample_documents();
        assert_eq!(docs.len(), 4);
        let ids: HashSet<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert!(docs.iter().all(|d| d.revision.is_none()));
        assert_eq!(docs.iter().filter(|d| d.kind == ContentKind::Post).count(), 2);
    }

    #[test]
    fn test_samples_survive_codec() {
        for doc in sample_documents() {
            let filename = doc.filename.clone().unwrap();
            let back = crate::codec::decode(&crate::codec::encode(&doc), &filename);
            assert_eq!(back.title, doc.title);
            assert_eq!(back.body, doc.body);
            assert_eq!(back.excerpt, doc.excerpt);
            assert_eq!(back.status, doc.status);
        }
    }
}
