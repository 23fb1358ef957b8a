use serde_json::{json, Value};

use fiscal_core::types::{BackendQuery, FieldBoost};

/// `name` or `name^boost`; a boost of 1 is left implicit.
fn field_spec(field: &FieldBoost) -> String {
    if (field.boost - 1.0).abs() < f32::EPSILON {
        field.name.clone()
    } else {
        format!("{}^{}", field.name, field.boost)
    }
}

/// Render the `_search` request body for a backend query.
pub fn render_search(query: &BackendQuery) -> Value {
    let fields: Vec<String> = query.lexical.fields.iter().map(field_spec).collect();
    let mut body = json!({
        "size": query.size,
        "query": {
            "bool": {
                "should": [{
                    "multi_match": {
                        "query": query.lexical.text,
                        "fields": fields,
                        "type": "best_fields"
                    }
                }]
            }
        }
    });
    if let Some(knn) = &query.vector {
        body["knn"] = json!({
            "field": knn.field,
            "query_vector": knn.vector,
            "k": knn.k,
            "num_candidates": knn.num_candidates
        });
    }
    if !query.source_fields.is_empty() {
        body["_source"] = json!(query.source_fields);
    }
    body
}
