//! fiscal-elastic
//!
//! `ElasticBackend` speaks the Elasticsearch REST API directly: `HEAD /{index}`
//! for existence, `POST /{index}/_search` with a `bool.should` multi-match and
//! an optional top-level `knn` clause for hybrid queries.
pub mod client;
pub mod dsl;

pub use client::{decode_cloud_id, ElasticBackend};
pub use dsl::render_search;
