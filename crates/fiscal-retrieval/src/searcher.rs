use serde_json::Value;
use std::sync::Arc;

use fiscal_core::keys;
use fiscal_core::types::{BackendHit, Hit, Metadata};
use fiscal_core::SearchBackend;

use crate::channels::{profile, BuiltQuery, ChannelProfile};

/// Runs one built query against the backend and normalises the hits.
///
/// Never fails: a missing optional collection or a backend error yields an
/// empty list and a log line.
pub struct ChannelSearcher {
    backend: Arc<dyn SearchBackend>,
}

impl ChannelSearcher {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub async fn search(&self, built: &BuiltQuery) -> Vec<Hit> {
        let channel = built.channel;
        let Some(profile) = profile(channel) else { return Vec::new() };
        let collection = &built.query.collection;

        if built.check_collection {
            match self.backend.collection_exists(collection).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(channel = %channel, collection = %collection, "collection missing, skipping channel");
                    return Vec::new();
                }
                Err(e) => {
                    tracing::warn!(channel = %channel, collection = %collection, error = %e, "collection check failed");
                    return Vec::new();
                }
            }
        }

        let raw = match self.backend.search(&built.query).await {
            Ok(raw) => raw,
            Err(e) if built.query.is_hybrid() => {
                tracing::warn!(channel = %channel, collection = %collection, error = %e, "hybrid search failed, retrying lexical-only");
                match self.backend.search(&built.query.lexical_only()).await {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(channel = %channel, collection = %collection, error = %e, "lexical search failed");
                        return Vec::new();
                    }
                }
            }
            Err(e) => {
                tracing::warn!(channel = %channel, collection = %collection, error = %e, "search failed");
                return Vec::new();
            }
        };

        let hits: Vec<Hit> = raw.into_iter().map(|h| to_hit(profile, h)).collect();
        tracing::debug!(channel = %channel, hits = hits.len(), "channel search finished");
        hits
    }
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

/// Map a backend hit: text from the profile's text field or its fallbacks,
/// metadata restricted to the profile's keys plus `source_type` and `doc_id`.
pub fn to_hit(profile: &ChannelProfile, raw: BackendHit) -> Hit {
    let text = std::iter::once(profile.text_field)
        .chain(profile.fallback_fields.iter().copied())
        .find_map(|field| non_blank(raw.source.get(field)))
        .unwrap_or_default()
        .to_string();

    let mut metadata = Metadata::new();
    for key in profile.metadata_keys {
        if let Some(value) = raw.source.get(*key).filter(|v| !v.is_null()) {
            metadata.insert((*key).to_string(), value.clone());
        }
    }
    metadata.insert(keys::SOURCE_TYPE.to_string(), Value::String(profile.channel.as_str().to_string()));
    if !raw.id.is_empty() {
        metadata.insert(keys::DOC_ID.to_string(), Value::String(raw.id));
    }

    Hit { text, metadata, score: raw.score, source_type: profile.channel }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiscal_core::ChannelType;
    use serde_json::json;

    fn raw(id: &str, source: Value) -> BackendHit {
        BackendHit { id: id.to_string(), score: 2.5, source: source.as_object().cloned().unwrap_or_default() }
    }

    #[test]
    fn text_falls_back_when_primary_is_blank() {
        let p = profile(ChannelType::ChatThreads).expect("profile");
        let hit = to_hit(p, raw("t1", json!({"content": "   ", "first_message": "¿Cuándo se paga el IVA?"})));
        assert_eq!(hit.text, "¿Cuándo se paga el IVA?");
        assert_eq!(hit.score, 2.5);
        assert_eq!(hit.source_type, ChannelType::ChatThreads);
    }

    #[test]
    fn metadata_is_curated_and_labelled() {
        let p = profile(ChannelType::Calendar).expect("profile");
        let hit = to_hit(
            p,
            raw(
                "cal-1",
                json!({
                    "description": "Declaración trimestral del IVA",
                    "tax_model": "Modelo 303",
                    "source_url": "https://sede.agenciatributaria.gob.es/calendario.ics",
                    "description_embedding": [0.1, 0.2],
                    "region": null
                }),
            ),
        );
        assert_eq!(hit.metadata["tax_model"], "Modelo 303");
        assert_eq!(hit.metadata["source_type"], "CALENDAR");
        assert_eq!(hit.metadata["doc_id"], "cal-1");
        assert!(!hit.metadata.contains_key("id"), "backend ids are not identity keys");
        assert!(!hit.metadata.contains_key("source_url"));
        assert!(!hit.metadata.contains_key("description_embedding"));
        assert!(!hit.metadata.contains_key("region"));
    }

    #[test]
    fn missing_text_yields_empty_string() {
        let p = profile(ChannelType::Reference).expect("profile");
        let hit = to_hit(p, raw("", json!({"category": "guía"})));
        assert_eq!(hit.text, "");
        assert!(!hit.metadata.contains_key("doc_id"));
    }

    #[test]
    fn backend_id_does_not_drive_dedup() {
        let p = profile(ChannelType::ChatThreads).expect("profile");
        let a = to_hit(p, raw("1", json!({"content": "Hilo: cómo presentar el modelo 303"})));
        let b = to_hit(profile(ChannelType::Reference).expect("profile"), raw("1", json!({"content": "Guía oficial del IVA"})));
        assert!(crate::dedup::dedup_key(&a).starts_with("text:"));
        assert_ne!(crate::dedup::dedup_key(&a), crate::dedup::dedup_key(&b));
    }
}
