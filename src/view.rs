//! Filtering and ordering of the document collection for presentation.

use crate::models::{ContentKind, Document, Status};

/// Criteria for narrowing the collection. Unset fields match everything.
#[derive(Debug, Default, Clone)]
pub struct CollectionFilter {
    pub kind: Option<ContentKind>,
    pub status: Option<Status>,
    /// Case-insensitive substring of the title or excerpt.
    pub term: Option<String>,
}

impl CollectionFilter {
    pub fn matches(&self, doc: &Document) -> bool {
        if self.kind.is_some_and(|k| k != doc.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != doc.status) {
            return false;
        }
        match self.term.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                doc.title.to_lowercase().contains(&term)
                    || doc.excerpt.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }

    /// Matching documents, most recently updated first, then by title.
    pub fn apply<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        let mut out: Vec<&Document> = docs.iter().filter(|d| self.matches(d)).collect();
        out.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.title.cmp(&b.title))
        });
        out
    }
}

/// Number of `(posts, pages)` in `docs`.
pub fn count_by_kind(docs: &[Document]) -> (usize, usize) {
    docs.iter().fold((0, 0), |(posts, pages), d| match d.kind {
        ContentKind::Post => (posts + 1, pages),
        ContentKind::Page => (posts, pages + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample_documents;
    use chrono::NaiveDate;

    #[test]
    fn test_filter_by_kind_and_status() {
        let docs = sample_documents();
        let filter = CollectionFilter {
            kind: Some(ContentKind::Post),
            status: Some(Status::Draft),
            ..Default::default()
        };
        let out = filter.apply(&docs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Sample Blog Post");
    }

    #[test]
    fn test_term_matches_title_or_excerpt() {
        let docs = sample_documents();
        let by_title = CollectionFilter {
            term: Some("ABOUT".to_string()),
            ..Default::default()
        };
        assert_eq!(by_title.apply(&docs).len(), 1);

        let by_excerpt = CollectionFilter {
            term: Some("capabilities".to_string()),
            ..Default::default()
        };
        assert_eq!(by_excerpt.apply(&docs)[0].id, "3");

        let blank = CollectionFilter {
            term: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.apply(&docs).len(), 4);
    }

    #[test]
    fn test_sorted_newest_first() {
        let mut docs = sample_documents();
        docs[3].updated_at = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let out = CollectionFilter::default().apply(&docs);
        assert_eq!(out[0].id, "4");
        // Remaining ties break on title
        assert_eq!(out[1].title, "Getting Started Guide");
    }

    #[test]
    fn test_count_by_kind() {
        assert_eq!(count_by_kind(&sample_documents()), (2, 2));
    }
}
