//! # gitcms
//!
//! Content synchronization layer for a markdown CMS whose documents live as
//! files in a hosted git repository rather than in a database.
//!
//! Documents are stored one file each under `posts/` and `pages/` of a
//! content root, as a YAML metadata block followed by a markdown body.
//! Every write is a commit guarded by the blob revision it replaces, so
//! concurrent edits are detected instead of overwritten.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │  UI / CLI  │──▶│ ContentStore │──▶│   RemoteFiles   │
//! │            │◀──│  collection  │   │ GitHub | memory │
//! └────────────┘   └──────┬───────┘   └─────────────────┘
//!                         │
//!                    ┌────▼────┐
//!                    │  Codec  │  front matter + body
//!                    └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gitcms::models::ContentKind;
//! use gitcms::store::ContentStore;
//!
//! # async fn example() {
//! let store = ContentStore::unconfigured();
//! let docs = store.load_all().await; // four sample documents
//! let draft = store.create_draft(ContentKind::Post);
//! assert!(store.save(&draft).await);
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`codec`] | Document ⇄ front matter + body text |
//! | [`remote`] | Remote file client trait, GitHub and in-memory implementations |
//! | [`store`] | In-memory collection, load/save/delete orchestration |
//! | [`samples`] | Built-in sample collection |
//! | [`view`] | Collection filtering and ordering |
//! | [`auth`] | Bearer token providers |
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed errors for remote and codec failures |

pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod samples;
pub mod store;
pub mod view;
