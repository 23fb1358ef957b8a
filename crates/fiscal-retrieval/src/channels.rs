//! Per-channel search profiles and the query builder.
//!
//! Each channel maps to one backend collection with its own schema. The
//! profile names the boosted lexical fields, the dense field, how many
//! candidates to ask for, where the hit text lives and which source fields
//! are worth carrying as metadata.

use fiscal_core::config::CollectionNames;
use fiscal_core::keys;
use fiscal_core::types::{BackendQuery, ChannelType, FieldBoost, LexicalClause, VectorClause};
use fiscal_core::{Error, Result};

/// Nearest-neighbour pool shared by every hybrid query.
pub const KNN_K: usize = 10;
pub const KNN_NUM_CANDIDATES: usize = 50;

#[derive(Debug)]
pub struct ChannelProfile {
    pub channel: ChannelType,
    pub lexical_fields: &'static [(&'static str, f32)],
    pub vector_field: &'static str,
    /// Candidates requested from the backend; noisier corpora ask for more.
    pub candidates: usize,
    pub text_field: &'static str,
    /// Tried in order when `text_field` is missing or blank.
    pub fallback_fields: &'static [&'static str],
    pub metadata_keys: &'static [&'static str],
    /// The collection is optional in deployments; check it exists first.
    pub check_collection: bool,
}

const CHAT_THREADS: ChannelProfile = ChannelProfile {
    channel: ChannelType::ChatThreads,
    lexical_fields: &[("content", 2.0), ("first_message", 1.0), ("last_message", 1.0), ("topics", 1.0), ("keywords", 1.0)],
    vector_field: "content_embedding",
    candidates: 10,
    text_field: "content",
    fallback_fields: &["first_message"],
    metadata_keys: &[
        "thread_id", "group_name", "topics", "keywords", "message_count", keys::TAX_TYPE, keys::REGION,
        keys::QUALITY_SCORE, keys::TAX_RELATED, keys::LAST_UPDATED, keys::DATE,
    ],
    check_collection: false,
};

const PDF_DOCS: ChannelProfile = ChannelProfile {
    channel: ChannelType::PdfDocs,
    lexical_fields: &[("content", 2.0), ("document_title", 1.5), ("categories", 1.0)],
    vector_field: "content_embedding",
    candidates: 10,
    text_field: "content",
    fallback_fields: &["document_title"],
    metadata_keys: &[
        keys::DOCUMENT_ID, "document_title", "document_number", "categories", "chunk_index", keys::SOURCE_URL,
        keys::TAX_TYPE, keys::REGION, keys::QUALITY_SCORE, keys::TAX_RELATED, keys::PUBLISHED_AT, keys::LAST_UPDATED,
    ],
    check_collection: false,
};

// Calendar and reference entries share a `source_url` per feed, so it is left
// out of their metadata or every entry would collapse into one during dedup.
const CALENDAR: ChannelProfile = ChannelProfile {
    channel: ChannelType::Calendar,
    lexical_fields: &[("description", 2.0), (keys::TAX_MODEL, 1.5), (keys::TAX_TYPE, 1.0), ("applies_to", 1.0)],
    vector_field: "description_embedding",
    candidates: 5,
    text_field: "description",
    fallback_fields: &[keys::TAX_MODEL],
    metadata_keys: &[
        keys::UID, keys::DEADLINE_DATE, keys::TAX_MODEL, keys::TAX_TYPE, "applies_to", "period", keys::REGION,
        keys::QUALITY_SCORE, keys::TAX_RELATED,
    ],
    check_collection: false,
};

const NEWS: ChannelProfile = ChannelProfile {
    channel: ChannelType::News,
    lexical_fields: &[("title", 3.0), ("summary", 2.0), ("content", 1.0), ("keywords", 1.0)],
    vector_field: "content_embedding",
    candidates: 5,
    text_field: "content",
    fallback_fields: &["summary", "title"],
    metadata_keys: &[
        keys::ARTICLE_URL, "title", "news_source", "keywords", keys::PUBLISHED_AT, keys::TAX_TYPE, keys::REGION,
        keys::QUALITY_SCORE, keys::TAX_RELATED,
    ],
    check_collection: false,
};

const AGENCY_RESOURCES: ChannelProfile = ChannelProfile {
    channel: ChannelType::AgencyResources,
    lexical_fields: &[("resource_title", 3.0), ("summary", 2.0), ("content", 1.0)],
    vector_field: "content_embedding",
    candidates: 5,
    text_field: "content",
    fallback_fields: &["summary", "resource_title"],
    metadata_keys: &[
        keys::RESOURCE_URL, "resource_title", "resource_type", keys::LAST_UPDATED, keys::TAX_TYPE, keys::REGION,
        keys::QUALITY_SCORE, keys::TAX_RELATED,
    ],
    check_collection: true,
};

const REFERENCE: ChannelProfile = ChannelProfile {
    channel: ChannelType::Reference,
    lexical_fields: &[("title", 3.0), ("content", 2.0), ("keywords", 1.0), ("category", 1.0)],
    vector_field: "content_embedding",
    candidates: 5,
    text_field: "content",
    fallback_fields: &["title"],
    metadata_keys: &[
        "title", "category", "keywords", keys::LAST_UPDATED, keys::TAX_TYPE, keys::REGION, keys::QUALITY_SCORE,
        keys::TAX_RELATED,
    ],
    check_collection: true,
};

/// Profile for a concrete channel; `None` for `All`.
pub fn profile(channel: ChannelType) -> Option<&'static ChannelProfile> {
    match channel {
        ChannelType::ChatThreads => Some(&CHAT_THREADS),
        ChannelType::PdfDocs => Some(&PDF_DOCS),
        ChannelType::Calendar => Some(&CALENDAR),
        ChannelType::News => Some(&NEWS),
        ChannelType::AgencyResources => Some(&AGENCY_RESOURCES),
        ChannelType::Reference => Some(&REFERENCE),
        ChannelType::All => None,
    }
}

/// A backend query ready for one channel.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub channel: ChannelType,
    pub query: BackendQuery,
    pub check_collection: bool,
}

pub struct ChannelQueryBuilder {
    collections: CollectionNames,
}

impl ChannelQueryBuilder {
    pub fn new(collections: CollectionNames) -> Self {
        Self { collections }
    }

    /// Hybrid when `embedding` is present, lexical-only otherwise. `translated`
    /// feeds the keyword match; the embedding comes from the original text.
    pub fn build(&self, channel: ChannelType, translated: &str, embedding: Option<&[f32]>, top_k: usize) -> Result<BuiltQuery> {
        let profile = profile(channel).ok_or(Error::UnsupportedChannel(channel))?;
        let collection = self.collections.for_channel(channel).ok_or(Error::UnsupportedChannel(channel))?;

        let lexical = LexicalClause {
            text: translated.to_string(),
            fields: profile.lexical_fields.iter().map(|(name, boost)| FieldBoost::new(*name, *boost)).collect(),
        };
        let vector = embedding.map(|v| VectorClause {
            field: profile.vector_field.to_string(),
            vector: v.to_vec(),
            k: KNN_K,
            num_candidates: KNN_NUM_CANDIDATES,
        });

        let mut source_fields: Vec<String> = Vec::new();
        for name in std::iter::once(&profile.text_field).chain(profile.fallback_fields).chain(profile.metadata_keys) {
            if !source_fields.iter().any(|f| f == name) {
                source_fields.push((*name).to_string());
            }
        }

        Ok(BuiltQuery {
            channel,
            query: BackendQuery {
                collection: collection.to_string(),
                size: profile.candidates.max(top_k),
                lexical,
                vector,
                source_fields,
            },
            check_collection: profile.check_collection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ChannelQueryBuilder {
        ChannelQueryBuilder::new(CollectionNames::default())
    }

    #[test]
    fn every_concrete_channel_has_a_profile() {
        for channel in ChannelType::CONCRETE {
            let p = profile(channel).expect("profile");
            assert_eq!(p.channel, channel);
            assert!((2..=5).contains(&p.lexical_fields.len()));
        }
        assert!(profile(ChannelType::All).is_none());
    }

    #[test]
    fn hybrid_when_embedding_available() {
        let built = builder().build(ChannelType::Calendar, "modelo 303", Some(&[0.1, 0.2]), 3).expect("build");
        assert_eq!(built.query.collection, "calendar_deadlines");
        assert!(built.query.is_hybrid());
        let knn = built.query.vector.as_ref().expect("knn");
        assert_eq!((knn.field.as_str(), knn.k, knn.num_candidates), ("description_embedding", 10, 50));
        assert_eq!(built.query.lexical.fields[0], FieldBoost::new("description", 2.0));
        assert_eq!(built.query.size, 5);
        assert!(!built.check_collection);
    }

    #[test]
    fn lexical_only_without_embedding() {
        let built = builder().build(ChannelType::AgencyResources, "modelo 303", None, 12).expect("build");
        assert!(!built.query.is_hybrid());
        assert_eq!(built.query.size, 12, "requested top k above the profile default wins");
        assert!(built.check_collection);
    }

    #[test]
    fn chat_threads_request_more_candidates_than_news() {
        let chat = builder().build(ChannelType::ChatThreads, "iva", None, 1).expect("build");
        let news = builder().build(ChannelType::News, "iva", None, 1).expect("build");
        assert!(chat.query.size > news.query.size);
    }

    #[test]
    fn source_fields_are_curated_and_unique() {
        let built = builder().build(ChannelType::Calendar, "x", None, 3).expect("build");
        let fields = &built.query.source_fields;
        assert_eq!(fields[0], "description");
        assert!(fields.contains(&"tax_model".to_string()));
        assert!(!fields.contains(&"source_url".to_string()));
        let mut unique = fields.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), fields.len());
    }

    #[test]
    fn all_cannot_be_built() {
        assert!(matches!(builder().build(ChannelType::All, "x", None, 3), Err(Error::UnsupportedChannel(ChannelType::All))));
    }
}
