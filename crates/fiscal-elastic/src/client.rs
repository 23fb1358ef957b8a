use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use fiscal_core::config::ElasticSettings;
use fiscal_core::types::{BackendHit, BackendQuery, Metadata};
use fiscal_core::{Error, SearchBackend};

use crate::dsl::render_search;

pub struct ElasticBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: Metadata,
}

/// Decode an Elastic Cloud id (`name:base64(host$es_uuid$kibana_uuid)`) into
/// the Elasticsearch endpoint URL.
pub fn decode_cloud_id(cloud_id: &str) -> fiscal_core::Result<String> {
    let invalid = || Error::InvalidConfig(format!("cannot decode cloud_id '{cloud_id}'"));
    let encoded = cloud_id.rsplit_once(':').map_or(cloud_id, |(_, payload)| payload);
    let decoded = STANDARD.decode(encoded).map_err(|_| invalid())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;
    let mut parts = decoded.split('$');
    let host = parts.next().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
    let es_uuid = parts.next().filter(|u| !u.is_empty()).ok_or_else(invalid)?;
    let (host, port) = match host.rsplit_once(':') {
        Some((h, p)) if p != "443" => (h, Some(p)),
        Some((h, _)) => (h, None),
        None => (host, None),
    };
    Ok(match port {
        Some(port) => format!("https://{es_uuid}.{host}:{port}"),
        None => format!("https://{es_uuid}.{host}"),
    })
}

impl ElasticBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> fiscal_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), api_key })
    }

    /// Build from config; an explicit `url` wins over `cloud_id`.
    pub fn from_settings(settings: &ElasticSettings) -> fiscal_core::Result<Self> {
        let base_url = match (&settings.url, &settings.cloud_id) {
            (Some(url), _) => url.clone(),
            (None, Some(cloud_id)) => decode_cloud_id(cloud_id)?,
            (None, None) => return Err(Error::InvalidConfig("backend.elastic needs either `url` or `cloud_id`".to_string())),
        };
        let api_key = settings.api_key.clone().filter(|k| !k.is_empty());
        Self::new(base_url, api_key, Duration::from_millis(settings.request_timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, format!("{}/{}", self.base_url, path.trim_start_matches('/')));
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("ApiKey {key}")),
            None => builder,
        }
    }
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let response = self.request(reqwest::Method::HEAD, collection).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => bail!("index existence check for '{}' returned {}", collection, status.as_u16()),
        }
    }

    async fn search(&self, query: &BackendQuery) -> Result<Vec<BackendHit>> {
        let body = render_search(query);
        let response = self
            .request(reqwest::Method::POST, &format!("{}/_search", query.collection))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("search on '{}' returned {}: {}", query.collection, status.as_u16(), text.chars().take(300).collect::<String>());
        }
        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|raw| BackendHit { id: raw.id, score: raw.score.unwrap_or(0.0), source: raw.source })
            .collect())
    }

    async fn ping(&self) -> bool {
        match self.request(reqwest::Method::GET, "/").send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "elasticsearch ping failed");
                false
            }
        }
    }
}
