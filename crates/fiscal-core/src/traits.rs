use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::types::{BackendHit, BackendQuery};

/// A search backend holding one collection per channel.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short label used in logs and health reports.
    fn name(&self) -> &str;
    async fn collection_exists(&self, collection: &str) -> anyhow::Result<bool>;
    /// Execute a query and return hits in backend relevance order.
    async fn search(&self, query: &BackendQuery) -> anyhow::Result<Vec<BackendHit>>;
    /// Liveness probe; embedded backends are always reachable.
    async fn ping(&self) -> bool {
        true
    }
}

/// Produces a fixed-length vector for a query string.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Availability of a shared collaborator, decided once at construction.
pub enum Capability<T: ?Sized> {
    Available(Arc<T>),
    Unavailable(String),
}

impl<T: ?Sized> Capability<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Capability::Unavailable(reason.into())
    }

    /// Wrap a construction result, logging why the collaborator is missing.
    pub fn from_result(what: &str, result: anyhow::Result<Arc<T>>) -> Self {
        match result {
            Ok(inner) => Capability::Available(inner),
            Err(e) => {
                tracing::warn!(collaborator = what, error = %e, "collaborator unavailable");
                Capability::Unavailable(e.to_string())
            }
        }
    }

    pub fn get(&self) -> Option<&Arc<T>> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Capability::Available(_) => None,
            Capability::Unavailable(reason) => Some(reason),
        }
    }
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        match self {
            Capability::Available(inner) => Capability::Available(Arc::clone(inner)),
            Capability::Unavailable(reason) => Capability::Unavailable(reason.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Available(_) => f.write_str("Available"),
            Capability::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}
