pub mod config;
pub mod error;
pub mod keys;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Capability, EmbeddingProvider, SearchBackend};
pub use types::{ChannelResult, ChannelType, Filters, Hit, Metadata, Query, SearchManyResult};
