//! Builds the engine's collaborators from settings. Anything that cannot be
//! built is handed over as unavailable rather than aborting.

use anyhow::Result;
use std::sync::Arc;

use fiscal_core::config::{BackendKind, LocalSettings, Settings};
use fiscal_core::{Capability, SearchBackend};
use fiscal_elastic::ElasticBackend;
use fiscal_hybrid::LocalHybridBackend;
use fiscal_retrieval::RetrievalEngine;
use fiscal_text::TextStore;
use fiscal_vector::VectorStore;

pub async fn engine(settings: &Settings) -> RetrievalEngine {
    RetrievalEngine::new(
        backend(settings).await,
        fiscal_embed::build_provider(&settings.embedding),
        settings.collections.clone(),
        settings.search.clone(),
    )
}

async fn backend(settings: &Settings) -> Capability<dyn SearchBackend> {
    let built: Result<Arc<dyn SearchBackend>> = match settings.backend.kind {
        BackendKind::Elastic => ElasticBackend::from_settings(&settings.backend.elastic)
            .map(|b| Arc::new(b) as Arc<dyn SearchBackend>)
            .map_err(Into::into),
        BackendKind::Local => Ok(Arc::new(local_backend(&settings.backend.local).await) as Arc<dyn SearchBackend>),
    };
    Capability::from_result("backend", built)
}

pub async fn local_backend(local: &LocalSettings) -> LocalHybridBackend {
    let text = TextStore::new(local.text_root());
    let vector_root = local.vector_root();
    // Lexical search still works without the vector store.
    let vectors = if vector_root.exists() {
        match VectorStore::open(&vector_root.to_string_lossy()).await {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!(root = %vector_root.display(), error = %e, "vector store unavailable");
                None
            }
        }
    } else {
        None
    };
    LocalHybridBackend::new(text, vectors)
}
