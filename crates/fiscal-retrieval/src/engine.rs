//! Fan-out over channels: one embedding per request, one concurrent search
//! per channel, each bounded by its own timeout.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

use fiscal_core::config::{CollectionNames, SearchSettings};
use fiscal_core::types::{ChannelResult, ChannelType, Hit, Query, SearchManyResult, SearchRequest, SearchResponse};
use fiscal_core::{Capability, EmbeddingProvider, Error, Result, SearchBackend};

use crate::aggregate;
use crate::callback::CallbackNotifier;
use crate::channels::ChannelQueryBuilder;
use crate::searcher::ChannelSearcher;
use crate::translator::QueryTranslator;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub backend: ComponentHealth,
    pub embedding: ComponentHealth,
}

impl HealthReport {
    /// Searches can run, possibly lexical-only.
    pub fn is_serving(&self) -> bool {
        self.backend.available && self.backend.reachable != Some(false)
    }
}

/// The retrieval engine. Built once at startup and shared by reference; holds
/// no per-request state.
pub struct RetrievalEngine {
    backend: Capability<dyn SearchBackend>,
    embedder: Capability<dyn EmbeddingProvider>,
    builder: ChannelQueryBuilder,
    translator: QueryTranslator,
    settings: SearchSettings,
    notifier: CallbackNotifier,
}

impl RetrievalEngine {
    pub fn new(
        backend: Capability<dyn SearchBackend>,
        embedder: Capability<dyn EmbeddingProvider>,
        collections: CollectionNames,
        settings: SearchSettings,
    ) -> Self {
        if let Some(reason) = backend.reason() {
            tracing::warn!(reason, "search backend unavailable, every channel will be empty");
        }
        if let Some(reason) = embedder.reason() {
            tracing::info!(reason, "embeddings unavailable, searches are lexical-only");
        }
        let notifier = CallbackNotifier::new(settings.callback_timeout());
        Self { backend, embedder, builder: ChannelQueryBuilder::new(collections), translator: QueryTranslator::new(), settings, notifier }
    }

    /// Search one concrete channel. Filters apply only when the query has them.
    pub async fn search(&self, channel: ChannelType, query: &Query) -> Result<ChannelResult> {
        query.validate()?;
        if !channel.is_concrete() {
            return Err(Error::UnsupportedChannel(channel));
        }
        let (translated, embedding) = self.prepare(query).await;
        let hits = self.run_channel(channel, &translated, embedding.as_deref(), query.top_k_per_channel).await;
        let hits = aggregate::merged(vec![hits], query.filters.as_ref(), query.top_k_per_channel);
        Ok(ChannelResult { source_type: channel, hits })
    }

    /// Search every requested channel concurrently. `per_channel` holds exactly
    /// the requested channels, in request order; `aggregated` is the deduped
    /// union when asked for.
    pub async fn search_many(&self, query: &Query, aggregate_results: bool) -> Result<SearchManyResult> {
        query.validate()?;
        let channels = query.channels();
        let (translated, embedding) = self.prepare(query).await;
        let top_k = query.top_k_per_channel;

        let searches = channels.iter().map(|&channel| {
            let translated = translated.as_str();
            let embedding = embedding.as_deref();
            async move {
                let hits = self.run_channel(channel, translated, embedding, top_k).await;
                let filters = aggregate::channel_filters(query.filters.as_ref(), channel);
                aggregate::per_channel(channel, hits, &filters, top_k)
            }
        });
        let per_channel = join_all(searches).await;

        let aggregated = aggregate_results.then(|| aggregate::aggregate(&per_channel));
        tracing::info!(
            channels = per_channel.len(),
            hits = per_channel.iter().map(|r| r.hits.len()).sum::<usize>(),
            aggregated = aggregated.as_ref().map(Vec::len),
            "multi-channel search finished"
        );
        Ok(SearchManyResult { per_channel, aggregated })
    }

    /// One ordered list across every requested channel, in request order,
    /// deduped and capped at `top_k_per_channel`.
    pub async fn search_merged(&self, query: &Query) -> Result<Vec<Hit>> {
        query.validate()?;
        let (translated, embedding) = self.prepare(query).await;
        let top_k = query.top_k_per_channel;
        let searches = query
            .channels()
            .into_iter()
            .map(|channel| self.run_channel(channel, &translated, embedding.as_deref(), top_k));
        let groups = join_all(searches).await;
        Ok(aggregate::merged(groups, query.filters.as_ref(), top_k))
    }

    /// Handle a multi-source request end to end, delivering the response to
    /// the callback URL when one was given. Delivery never fails the request.
    pub async fn respond(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let query = request.to_query()?;
        let result = self.search_many(&query, request.aggregate_results).await?;
        let mut response = SearchResponse {
            success: true,
            query_text: query.text,
            request_id: request.request_id.clone(),
            metadata: request.metadata.clone(),
            aggregated_results: result.aggregated,
            sources: result.per_channel,
            callback_status: None,
        };
        if let Some(url) = request.callback_url.as_deref().filter(|u| !u.trim().is_empty()) {
            response.callback_status = Some(self.notifier.deliver(url, &response).await);
        }
        Ok(response)
    }

    pub async fn health(&self) -> HealthReport {
        let backend = match &self.backend {
            Capability::Available(b) => ComponentHealth {
                available: true,
                name: Some(b.name().to_string()),
                reachable: Some(b.ping().await),
                reason: None,
            },
            Capability::Unavailable(reason) => unavailable(reason),
        };
        let embedding = match &self.embedder {
            Capability::Available(e) => ComponentHealth {
                available: true,
                name: Some(e.embedder_id().to_string()),
                reachable: None,
                reason: None,
            },
            Capability::Unavailable(reason) => unavailable(reason),
        };
        HealthReport { backend, embedding }
    }

    /// Translated text for the lexical arm and, when possible, an embedding
    /// of the original text for the vector arm.
    async fn prepare(&self, query: &Query) -> (String, Option<Vec<f32>>) {
        let translated = self.translator.translate(&query.text);
        if translated != query.text {
            tracing::debug!(original = %query.text, translated = %translated, "query translated");
        }
        (translated, self.embed_query(&query.text).await)
    }

    async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.get()?;
        match tokio::time::timeout(self.settings.embedding_timeout(), embedder.embed(text)).await {
            Ok(Ok(vector)) if !vector.is_empty() => Some(vector),
            Ok(Ok(_)) => {
                tracing::warn!(embedder = embedder.embedder_id(), "empty embedding, falling back to lexical-only");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(embedder = embedder.embedder_id(), error = %e, "embedding failed, falling back to lexical-only");
                None
            }
            Err(_) => {
                tracing::warn!(
                    embedder = embedder.embedder_id(),
                    timeout_ms = self.settings.embedding_timeout_ms,
                    "embedding timed out, falling back to lexical-only"
                );
                None
            }
        }
    }

    /// Raw, normalised hits for one channel. Never fails.
    async fn run_channel(&self, channel: ChannelType, translated: &str, embedding: Option<&[f32]>, top_k: usize) -> Vec<Hit> {
        let Some(backend) = self.backend.get() else {
            return Vec::new();
        };
        let built = match self.builder.build(channel, translated, embedding, top_k) {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "could not build channel query");
                return Vec::new();
            }
        };
        let searcher = ChannelSearcher::new(Arc::clone(backend));
        match tokio::time::timeout(self.settings.channel_timeout(), searcher.search(&built)).await {
            Ok(hits) => hits,
            Err(_) => {
                tracing::warn!(channel = %channel, timeout_ms = self.settings.channel_timeout_ms, "channel search timed out");
                Vec::new()
            }
        }
    }
}

fn unavailable(reason: &str) -> ComponentHealth {
    ComponentHealth { available: false, name: None, reachable: None, reason: Some(reason.to_string()) }
}
