//! fiscal-hybrid
//!
//! `LocalHybridBackend` answers backend queries from the embedded stores:
//! the lexical arm runs against a tantivy collection, the vector arm against
//! the LanceDB table of the same name, and the two are merged by document id.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use fiscal_core::types::{BackendHit, BackendQuery};
use fiscal_core::SearchBackend;
use fiscal_text::TextStore;
use fiscal_vector::VectorStore;

pub struct LocalHybridBackend {
    text: Arc<TextStore>,
    vectors: Option<VectorStore>,
}

impl LocalHybridBackend {
    pub fn new(text: TextStore, vectors: Option<VectorStore>) -> Self {
        Self { text: Arc::new(text), vectors }
    }

    /// Tantivy searches block, so they run off the async task where a channel
    /// timeout can still fire.
    async fn text_arm(&self, query: &BackendQuery) -> Result<Vec<BackendHit>> {
        let text = Arc::clone(&self.text);
        let collection = query.collection.clone();
        let clause = query.lexical.clone();
        let size = query.size;
        tokio::task::spawn_blocking(move || text.open(&collection)?.search(&clause, size)).await?
    }

    async fn vector_arm(&self, query: &BackendQuery) -> Result<Vec<BackendHit>> {
        let Some(clause) = &query.vector else { return Ok(Vec::new()) };
        let store = self.vectors.as_ref().ok_or_else(|| anyhow!("no vector store configured"))?;
        if !store.has_collection(&query.collection).await? {
            return Err(anyhow!("vector collection '{}' not found", query.collection));
        }
        store.nearest(&query.collection, &clause.field, &clause.vector, clause.k).await
    }
}

#[async_trait]
impl SearchBackend for LocalHybridBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        if self.text.exists(collection) {
            return Ok(true);
        }
        match &self.vectors {
            Some(store) => store.has_collection(collection).await,
            None => Ok(false),
        }
    }

    async fn search(&self, query: &BackendQuery) -> Result<Vec<BackendHit>> {
        let text_hits = self.text_arm(query).await?;
        let dense_hits = self.vector_arm(query).await?;
        tracing::debug!(
            collection = %query.collection,
            text = text_hits.len(),
            dense = dense_hits.len(),
            "local hybrid arms returned"
        );
        let mut merged = merge_by_id(dense_hits, text_hits);
        merged.truncate(query.size);
        if !query.source_fields.is_empty() {
            for hit in &mut merged {
                hit.source.retain(|key, _| query.source_fields.iter().any(|f| f == key));
            }
        }
        Ok(merged)
    }
}

/// Merge unique ids keeping the better score, then order by score descending.
/// Ties keep first-seen order.
fn merge_by_id(dense: Vec<BackendHit>, text: Vec<BackendHit>) -> Vec<BackendHit> {
    let mut merged: Vec<BackendHit> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for hit in dense.into_iter().chain(text) {
        match by_id.get(&hit.id) {
            Some(&idx) => {
                if hit.score > merged[idx].score {
                    merged[idx] = hit;
                }
            }
            None => {
                by_id.insert(hit.id.clone(), merged.len());
                merged.push(hit);
            }
        }
    }
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged
}
