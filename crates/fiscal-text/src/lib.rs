//! fiscal-text
//!
//! Embedded lexical collections on tantivy. Each collection lives in its own
//! index directory under a common root and stores the full source document
//! next to the declared searchable fields.
pub mod collection;
pub mod schema;
pub mod store;

pub use collection::TextCollection;
pub use store::TextStore;
