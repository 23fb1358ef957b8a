//! fiscal-vector
//!
//! Embedded vector collections on LanceDB: one table per collection holding
//! the document id, the stored source document and a named dense column.
pub mod schema;
pub mod store;

pub use store::{VectorRow, VectorStore};
