//! Multi-channel hybrid retrieval for tax questions.
//!
//! A query fans out to one backend collection per channel. Each channel gets
//! a hybrid lexical + vector query when an embedding is available and a
//! lexical one otherwise; hits are normalised, deduplicated, filtered and
//! optionally merged into one cross-channel view.

pub mod aggregate;
pub mod callback;
pub mod channels;
pub mod dedup;
pub mod engine;
pub mod filters;
pub mod searcher;
pub mod translator;

pub use callback::CallbackNotifier;
pub use channels::{BuiltQuery, ChannelProfile, ChannelQueryBuilder};
pub use engine::{ComponentHealth, HealthReport, RetrievalEngine};
pub use searcher::ChannelSearcher;
pub use translator::QueryTranslator;
