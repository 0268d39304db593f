//! Video Catalog - polymorphic entity store for movies, their sources and plans
//!
//! Three entity tables share one row shape `(id, kind, body)`:
//!
//! - **Works** - what the catalog describes (`movie`, `movieEdition`)
//! - **Sources** - where the media comes from (`file`, `disc`)
//! - **Plans** - how a source becomes a work (`direct`, `chapter_range`)
//!
//! A row's kind is fixed when it is created. Plans additionally keep one
//! input-source row and one output-work row in relation tables, written in the
//! same transaction as the plan body, and can be listed by either with opaque
//! page tokens.
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/video-catalog/
//! ├── catalog.db             # SQLite database
//! └── config.toml            # Configuration
//! ```

pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod http;
pub mod model;
pub mod services;
pub mod validate;
pub mod views;

// Re-exports
pub use config::Config;
pub use db::CatalogDb;
pub use error::CatalogError;
pub use http::HttpServer;
pub use services::CatalogService;
