use serde_json::Value;
use std::collections::HashSet;
use std::hash::Hasher;
use twox_hash::XxHash64;

use fiscal_core::keys::IDENTITY_KEYS;
use fiscal_core::Hit;

fn identity_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `"<key>:<value>"` for the first identity key with a non-empty value,
/// otherwise `"text:<hash>"` of the lowercased, whitespace-collapsed text.
pub fn dedup_key(hit: &Hit) -> String {
    for key in IDENTITY_KEYS {
        if let Some(value) = hit.metadata.get(key).and_then(identity_value) {
            return format!("{key}:{value}");
        }
    }
    let normalized = hit.text.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ");
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(normalized.as_bytes());
    format!("text:{:016x}", hasher.finish())
}

/// Drop repeated hits, keeping the first occurrence of each key.
pub fn dedupe(hits: Vec<Hit>) -> Vec<Hit> {
    let mut seen = HashSet::with_capacity(hits.len());
    hits.into_iter().filter(|hit| seen.insert(dedup_key(hit))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiscal_core::ChannelType;
    use serde_json::json;

    fn hit(text: &str, metadata: Value) -> Hit {
        Hit {
            text: text.to_string(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            score: 1.0,
            source_type: ChannelType::News,
        }
    }

    #[test]
    fn document_id_collapses_regardless_of_text() {
        let hits = vec![hit("chunk one", json!({"document_id": "X"})), hit("chunk two", json!({"document_id": "X"}))];
        let out = dedupe(hits);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "chunk one");
    }

    #[test]
    fn key_priority_follows_identity_order() {
        let h = hit("t", json!({"id": "7", "source_url": "https://a", "article_url": "https://b"}));
        assert_eq!(dedup_key(&h), "article_url:https://b");
        let h = hit("t", json!({"document_id": "", "uid": 42}));
        assert_eq!(dedup_key(&h), "uid:42", "empty values are skipped, numbers count");
    }

    #[test]
    fn text_fallback_normalizes_case_and_whitespace() {
        let a = hit("Plazo  del IVA\n", json!({}));
        let b = hit("plazo del iva", json!({"document_id": null}));
        assert!(dedup_key(&a).starts_with("text:"));
        assert_eq!(dedup_key(&a), dedup_key(&b));
        assert_ne!(dedup_key(&a), dedup_key(&hit("plazo del irpf", json!({}))));
    }

    #[test]
    fn dedupe_is_idempotent_and_order_preserving() {
        let hits = vec![
            hit("a", json!({"uid": "1"})),
            hit("b", json!({})),
            hit("c", json!({"uid": "1"})),
            hit("B", json!({})),
            hit("d", json!({"resource_url": "r"})),
        ];
        let once = dedupe(hits);
        assert_eq!(once.iter().map(|h| h.text.as_str()).collect::<Vec<_>>(), vec!["a", "b", "d"]);
        assert_eq!(dedupe(once.clone()), once);
    }
}
