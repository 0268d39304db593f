//! Service layer for video-catalog
//!
//! Services sit between HTTP handlers and the repository functions in
//! `db/*.rs` and own the transaction boundaries.
//!
//! ```text
//! HTTP Handlers (thin)
//!     ↓
//! Service Layer (transactions)
//!     ↓
//! Repository Layer (db/*.rs)
//!     ↓
//! SQLite Database
//! ```

pub mod catalog;
pub mod response;

pub use catalog::CatalogService;
pub use response::*;
