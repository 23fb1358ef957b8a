//! fiscal-embed
//!
//! Query embedding providers. `build_provider` turns the `embedding` config
//! section into a [`Capability`]: a provider that cannot be built is reported
//! as unavailable and search degrades to lexical-only.
use std::sync::Arc;

use fiscal_core::config::{EmbeddingProviderKind, EmbeddingSettings};
use fiscal_core::{Capability, EmbeddingProvider};

pub mod hashing;
pub mod http;
#[cfg(feature = "local-model")]
pub mod device;
#[cfg(feature = "local-model")]
pub mod local;
#[cfg(feature = "local-model")]
pub mod pool;
#[cfg(feature = "local-model")]
pub mod tokenize;

pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;
#[cfg(feature = "local-model")]
pub use local::LocalEmbedder;
#[cfg(feature = "local-model")]
pub use pool::masked_mean_l2;

pub fn build_provider(settings: &EmbeddingSettings) -> Capability<dyn EmbeddingProvider> {
    match settings.provider {
        EmbeddingProviderKind::Disabled => Capability::unavailable("embedding provider disabled"),
        EmbeddingProviderKind::Hashing => {
            Capability::Available(Arc::new(HashingEmbedder::new(settings.dimension)) as Arc<dyn EmbeddingProvider>)
        }
        EmbeddingProviderKind::OpenAi => Capability::from_result(
            "embedding",
            HttpEmbedder::from_settings(settings).map(|e| Arc::new(e) as Arc<dyn EmbeddingProvider>),
        ),
        EmbeddingProviderKind::Local => Capability::from_result("embedding", local_provider(settings)),
    }
}

#[cfg(feature = "local-model")]
fn local_provider(settings: &EmbeddingSettings) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let embedder = LocalEmbedder::load(settings.model_dir.as_deref())?;
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "local-model"))]
fn local_provider(_settings: &EmbeddingSettings) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    anyhow::bail!("built without the `local-model` feature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_and_misconfigured_providers_are_unavailable() {
        let disabled = build_provider(&EmbeddingSettings::default());
        assert!(!disabled.is_available());

        let settings = EmbeddingSettings { provider: EmbeddingProviderKind::OpenAi, api_key: None, ..Default::default() };
        let openai = build_provider(&settings);
        assert!(openai.reason().is_some_and(|r| r.contains("api_key")));
    }

    #[test]
    fn hashing_provider_reports_configured_dimension() {
        let settings = EmbeddingSettings { provider: EmbeddingProviderKind::Hashing, dimension: 32, ..Default::default() };
        let provider = build_provider(&settings);
        assert_eq!(provider.get().map(|p| p.dim()), Some(32));
    }
}
