//! Domain types used by the retrieval engine, its backends and front ends.
//!
//! Everything here is created per request and discarded once the response
//! has been produced. Field names are part of the wire vocabulary and
//! serialize in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Free-form per-source metadata attached to a hit.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

pub const MAX_QUERY_CHARS: usize = 1000;
pub const MAX_TOP_K: usize = 20;

/// A logical knowledge corpus.
///
/// `All` is a request-side sentinel: it expands to every concrete channel
/// and never labels a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum ChannelType {
    ChatThreads,
    PdfDocs,
    Calendar,
    News,
    AgencyResources,
    Reference,
    All,
}

impl ChannelType {
    /// Every concrete channel, in expansion order.
    pub const CONCRETE: [ChannelType; 6] = [
        ChannelType::ChatThreads,
        ChannelType::PdfDocs,
        ChannelType::Calendar,
        ChannelType::News,
        ChannelType::AgencyResources,
        ChannelType::Reference,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::ChatThreads => "CHAT_THREADS",
            ChannelType::PdfDocs => "PDF_DOCS",
            ChannelType::Calendar => "CALENDAR",
            ChannelType::News => "NEWS",
            ChannelType::AgencyResources => "AGENCY_RESOURCES",
            ChannelType::Reference => "REFERENCE",
            ChannelType::All => "ALL",
        }
    }

    pub fn is_concrete(self) -> bool {
        self != ChannelType::All
    }

    /// Expand a requested channel list into concrete channels.
    ///
    /// An empty list or one containing `All` yields [`ChannelType::CONCRETE`];
    /// otherwise duplicates are dropped and first-seen order is kept.
    pub fn expand(requested: &[ChannelType]) -> Vec<ChannelType> {
        if requested.is_empty() || requested.contains(&ChannelType::All) {
            return Self::CONCRETE.to_vec();
        }
        let mut ordered = Vec::with_capacity(requested.len());
        for channel in requested {
            if !ordered.contains(channel) {
                ordered.push(*channel);
            }
        }
        ordered
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat_threads" | "telegram" => Ok(ChannelType::ChatThreads),
            "pdf_docs" | "pdf" => Ok(ChannelType::PdfDocs),
            "calendar" => Ok(ChannelType::Calendar),
            "news" => Ok(ChannelType::News),
            "agency_resources" | "aeat" => Ok(ChannelType::AgencyResources),
            "reference" => Ok(ChannelType::Reference),
            "all" => Ok(ChannelType::All),
            _ => Err(Error::UnknownChannel(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChannelType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Serialize for ChannelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn default_only_tax_related() -> bool {
    true
}

fn default_min_quality_score() -> Option<f64> {
    Some(2.0)
}

/// Declarative post-search filters. An unset field places no constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default)]
    pub source_types: Option<Vec<ChannelType>>,
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tax_types: Option<Vec<String>>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default = "default_only_tax_related")]
    pub only_tax_related: bool,
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: Option<f64>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            source_types: None,
            date_from: None,
            date_to: None,
            tax_types: None,
            regions: None,
            only_tax_related: default_only_tax_related(),
            min_quality_score: default_min_quality_score(),
        }
    }
}

/// A single retrieved passage.
///
/// `score` is the backend relevance score as returned; scores from
/// different channels are not comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub score: f32,
    pub source_type: ChannelType,
}

/// Hits produced for one channel. Empty on failure or when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub source_type: ChannelType,
    pub hits: Vec<Hit>,
}

impl ChannelResult {
    pub fn empty(source_type: ChannelType) -> Self {
        Self { source_type, hits: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Output of a multi-channel search: one group per requested channel, in
/// request order, plus the optional cross-channel de-duplicated union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchManyResult {
    pub per_channel: Vec<ChannelResult>,
    pub aggregated: Option<Vec<Hit>>,
}

impl SearchManyResult {
    pub fn channel(&self, channel: ChannelType) -> Option<&ChannelResult> {
        self.per_channel.iter().find(|r| r.source_type == channel)
    }

    pub fn channels(&self) -> Vec<ChannelType> {
        self.per_channel.iter().map(|r| r.source_type).collect()
    }
}

/// A validated search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub text: String,
    pub requested_channels: Vec<ChannelType>,
    pub top_k_per_channel: usize,
    #[serde(default)]
    pub filters: Option<Filters>,
}

impl Query {
    /// Build a query, trimming the text and expanding the channel list.
    pub fn new(text: impl Into<String>, channels: &[ChannelType], top_k_per_channel: usize) -> Result<Self> {
        let query = Self {
            text: text.into().trim().to_string(),
            requested_channels: ChannelType::expand(channels),
            top_k_per_channel,
            filters: None,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Check the invariants a deserialized query may not satisfy.
    pub fn validate(&self) -> Result<()> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(Error::InvalidQuery("query text is empty".to_string()));
        }
        let chars = text.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(Error::InvalidQuery(format!("query text has {chars} characters, limit is {MAX_QUERY_CHARS}")));
        }
        if !(1..=MAX_TOP_K).contains(&self.top_k_per_channel) {
            return Err(Error::InvalidQuery(format!("topKPerChannel must be within 1..={MAX_TOP_K}, got {}", self.top_k_per_channel)));
        }
        Ok(())
    }

    /// The concrete channels this query targets.
    pub fn channels(&self) -> Vec<ChannelType> {
        ChannelType::expand(&self.requested_channels)
    }
}

fn default_top_k_per_source() -> usize {
    3
}

fn default_aggregate() -> bool {
    true
}

/// Multi-source request envelope as received from an upstream workflow.
///
/// Channel names stay raw strings here so that an unknown name surfaces as
/// [`Error::UnknownChannel`] from [`SearchRequest::to_query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query_text: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default = "default_top_k_per_source")]
    pub top_k_per_source: usize,
    #[serde(default = "default_aggregate")]
    pub aggregate_results: bool,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub filters: Option<Filters>,
}

impl SearchRequest {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            sources: None,
            top_k_per_source: default_top_k_per_source(),
            aggregate_results: default_aggregate(),
            callback_url: None,
            request_id: None,
            metadata: None,
            filters: None,
        }
    }

    pub fn to_query(&self) -> Result<Query> {
        let channels = self
            .sources
            .iter()
            .flatten()
            .map(|s| s.parse::<ChannelType>())
            .collect::<Result<Vec<_>>>()?;
        let query = Query::new(self.query_text.clone(), &channels, self.top_k_per_source)?;
        Ok(match &self.filters {
            Some(filters) => query.with_filters(filters.clone()),
            None => query,
        })
    }
}

/// Response envelope for a multi-source request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub query_text: String,
    pub request_id: Option<String>,
    pub metadata: Option<Metadata>,
    pub aggregated_results: Option<Vec<Hit>>,
    pub sources: Vec<ChannelResult>,
    pub callback_status: Option<String>,
}

/// One lexical field and its boost weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    pub name: String,
    pub boost: f32,
}

impl FieldBoost {
    pub fn new(name: impl Into<String>, boost: f32) -> Self {
        Self { name: name.into(), boost }
    }
}

/// Multi-field keyword match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalClause {
    pub text: String,
    pub fields: Vec<FieldBoost>,
}

/// Nearest-neighbour search against a named dense field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorClause {
    pub field: String,
    pub vector: Vec<f32>,
    pub k: usize,
    pub num_candidates: usize,
}

/// Backend-neutral description of one channel search.
///
/// A query with a vector clause is hybrid; without one it is lexical-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendQuery {
    pub collection: String,
    pub size: usize,
    pub lexical: LexicalClause,
    pub vector: Option<VectorClause>,
    /// Stored fields the backend should return; empty means everything.
    pub source_fields: Vec<String>,
}

impl BackendQuery {
    pub fn is_hybrid(&self) -> bool {
        self.vector.is_some()
    }

    pub fn lexical_only(&self) -> Self {
        Self { vector: None, ..self.clone() }
    }
}

/// A backend-native hit before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendHit {
    pub id: String,
    pub score: f32,
    pub source: Metadata,
}
