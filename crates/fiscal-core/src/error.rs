use thiserror::Error;

use crate::types::ChannelType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Channel {0} cannot be searched on its own")]
    UnsupportedChannel(ChannelType),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
