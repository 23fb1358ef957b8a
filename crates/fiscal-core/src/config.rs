//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_SEARCH__CHANNEL_TIMEOUT_MS`). Local collection roots go through
//! [`expand_path`] so `~` and `${VAR}` work in config files.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::types::ChannelType;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub collections: CollectionNames,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.backend.kind == BackendKind::Elastic
            && self.backend.elastic.url.is_none()
            && self.backend.elastic.cloud_id.is_none()
        {
            return Err(Error::InvalidConfig("backend.elastic needs either `url` or `cloud_id`".to_string()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be positive".to_string()));
        }
        if self.search.channel_timeout_ms == 0 {
            return Err(Error::InvalidConfig("search.channel_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Elastic,
    #[default]
    Local,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub kind: BackendKind,
    pub elastic: ElasticSettings,
    pub local: LocalSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticSettings {
    pub url: Option<String>,
    pub cloud_id: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ElasticSettings {
    fn default() -> Self {
        Self { url: None, cloud_id: None, api_key: None, request_timeout_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    pub root: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self { root: "data/collections".to_string() }
    }
}

impl LocalSettings {
    pub fn text_root(&self) -> PathBuf {
        expand_path(&self.root).join("text")
    }

    pub fn vector_root(&self) -> PathBuf {
        expand_path(&self.root).join("vectors")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    OpenAi,
    Hashing,
    Local,
    #[default]
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
    pub model_dir: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Disabled,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            model_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub channel_timeout_ms: u64,
    pub embedding_timeout_ms: u64,
    pub callback_timeout_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { channel_timeout_ms: 8_000, embedding_timeout_ms: 5_000, callback_timeout_ms: 10_000 }
    }
}

impl SearchSettings {
    pub fn channel_timeout(&self) -> Duration {
        Duration::from_millis(self.channel_timeout_ms)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_millis(self.callback_timeout_ms)
    }
}

/// Backend collection backing each channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub chat_threads: String,
    pub pdf_docs: String,
    pub calendar: String,
    pub news: String,
    pub agency_resources: String,
    pub reference: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            chat_threads: "telegram_threads".to_string(),
            pdf_docs: "pdf_documents".to_string(),
            calendar: "calendar_deadlines".to_string(),
            news: "news_articles".to_string(),
            agency_resources: "aeat_resources".to_string(),
            reference: "reference_materials".to_string(),
        }
    }
}

impl CollectionNames {
    /// `None` for the `All` sentinel, which has no collection.
    pub fn for_channel(&self, channel: ChannelType) -> Option<&str> {
        match channel {
            ChannelType::ChatThreads => Some(&self.chat_threads),
            ChannelType::PdfDocs => Some(&self.pdf_docs),
            ChannelType::Calendar => Some(&self.calendar),
            ChannelType::News => Some(&self.news),
            ChannelType::AgencyResources => Some(&self.agency_resources),
            ChannelType::Reference => Some(&self.reference),
            ChannelType::All => None,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
