//! Metadata key names shared by the channel profiles, the deduplicator and
//! the filter engine.
//!
//! Hit metadata is an open map because every source has its own schema, but
//! the keys the engine actually reads live here so a typo cannot silently
//! disable a rule.

pub const SOURCE_TYPE: &str = "source_type";
/// Backend document id. Only unique within one collection, so it is never an
/// identity key.
pub const DOC_ID: &str = "doc_id";

// Identity keys, in the priority order used for deduplication.
pub const DOCUMENT_ID: &str = "document_id";
pub const ARTICLE_URL: &str = "article_url";
pub const RESOURCE_URL: &str = "resource_url";
pub const SOURCE_URL: &str = "source_url";
pub const UID: &str = "uid";
pub const ID: &str = "id";

pub const IDENTITY_KEYS: [&str; 6] = [DOCUMENT_ID, ARTICLE_URL, RESOURCE_URL, SOURCE_URL, UID, ID];

// Date-like keys, scanned in this order by the date range filter.
pub const PUBLISHED_AT: &str = "published_at";
pub const LAST_UPDATED: &str = "last_updated";
pub const DEADLINE_DATE: &str = "deadline_date";
pub const DATE: &str = "date";

pub const DATE_KEYS: [&str; 4] = [PUBLISHED_AT, LAST_UPDATED, DEADLINE_DATE, DATE];

pub const TAX_TYPE: &str = "tax_type";
pub const TAX_MODEL: &str = "tax_model";
pub const REGION: &str = "region";
pub const QUALITY_SCORE: &str = "quality_score";
pub const TAX_RELATED: &str = "tax_related";
