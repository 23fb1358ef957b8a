//! Declarative post-search filters.
//!
//! Each rule is a total function over the survivors of the previous one, in
//! this order: source types, date range, tax types, regions, minimum quality,
//! tax relevance. An unset rule keeps everything.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use fiscal_core::keys;
use fiscal_core::types::{ChannelType, Filters, Hit, Metadata};

/// Quality assumed for hits the sources did not score.
pub const DEFAULT_QUALITY_SCORE: f64 = 5.0;

pub fn apply(mut hits: Vec<Hit>, filters: &Filters) -> Vec<Hit> {
    if let Some(types) = filters.source_types.as_deref() {
        if !types.is_empty() && !types.contains(&ChannelType::All) {
            hits.retain(|h| types.contains(&hit_channel(h)));
        }
    }
    if filters.date_from.is_some() || filters.date_to.is_some() {
        hits.retain(|h| within_dates(&h.metadata, filters.date_from, filters.date_to));
    }
    if let Some(wanted) = non_empty(filters.tax_types.as_deref()) {
        hits.retain(|h| matches_any(h.metadata.get(keys::TAX_TYPE), wanted));
    }
    if let Some(wanted) = non_empty(filters.regions.as_deref()) {
        hits.retain(|h| matches_any(h.metadata.get(keys::REGION), wanted));
    }
    if let Some(min) = filters.min_quality_score {
        hits.retain(|h| quality_score(&h.metadata) >= min);
    }
    if filters.only_tax_related {
        hits.retain(|h| h.metadata.get(keys::TAX_RELATED) != Some(&Value::Bool(false)));
    }
    hits
}

fn non_empty(values: Option<&[String]>) -> Option<&[String]> {
    values.filter(|v| !v.is_empty())
}

fn hit_channel(hit: &Hit) -> ChannelType {
    hit.metadata
        .get(keys::SOURCE_TYPE)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(hit.source_type)
}

/// The first present date key decides. Missing or unparsable dates keep the hit.
fn within_dates(metadata: &Metadata, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    let Some(raw) = keys::DATE_KEYS.iter().find_map(|k| metadata.get(*k).filter(|v| !v.is_null())) else {
        return true;
    };
    let Some(date) = raw.as_str().and_then(parse_date) else {
        return true;
    };
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

/// RFC 3339, a naive `YYYY-MM-DD[T ]HH:MM:SS` taken as UTC, or a bare date at
/// UTC midnight.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc())
}

/// String or array-of-strings field against a wanted set, ignoring ASCII case.
/// A missing field never matches.
fn matches_any(value: Option<&Value>, wanted: &[String]) -> bool {
    let hit = |s: &str| wanted.iter().any(|w| w.eq_ignore_ascii_case(s.trim()));
    match value {
        Some(Value::String(s)) => hit(s.as_str()),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).any(hit),
        _ => false,
    }
}

fn quality_score(metadata: &Metadata) -> f64 {
    match metadata.get(keys::QUALITY_SCORE) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_QUALITY_SCORE),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_QUALITY_SCORE),
        _ => DEFAULT_QUALITY_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn hit(channel: ChannelType, metadata: Value) -> Hit {
        Hit { text: String::new(), metadata: metadata.as_object().cloned().unwrap_or_default(), score: 1.0, source_type: channel }
    }

    fn open() -> Filters {
        Filters { only_tax_related: false, min_quality_score: None, ..Filters::default() }
    }

    #[test]
    fn composition_example_keeps_only_good_iva() {
        let hits = vec![
            hit(ChannelType::News, json!({"tax_type": "IVA", "quality_score": 4.0})),
            hit(ChannelType::News, json!({"tax_type": "IVA", "quality_score": 1.0})),
            hit(ChannelType::News, json!({"tax_type": "IRPF", "quality_score": 5.0})),
        ];
        let filters = Filters { tax_types: Some(vec!["IVA".into()]), min_quality_score: Some(3.0), ..Filters::default() };
        let out = apply(hits.clone(), &filters);
        assert_eq!(out, vec![hits[0].clone()]);
    }

    #[test]
    fn undated_and_unparsable_hits_survive_date_filters() {
        let hits = vec![
            hit(ChannelType::News, json!({"title": "no date"})),
            hit(ChannelType::News, json!({"published_at": "last tuesday"})),
            hit(ChannelType::News, json!({"published_at": "2020-01-01T00:00:00Z"})),
            hit(ChannelType::Calendar, json!({"deadline_date": "2025-04-20"})),
        ];
        let filters = Filters {
            date_from: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            date_to: Some(Utc.with_ymd_and_hms(2025, 4, 20, 0, 0, 0).unwrap()),
            ..open()
        };
        let out = apply(hits, &filters);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|h| h.metadata.get("published_at") != Some(&json!("2020-01-01T00:00:00Z"))));
    }

    #[test]
    fn first_present_date_key_decides() {
        let h = hit(ChannelType::News, json!({"published_at": null, "last_updated": "2019-05-01", "date": "2025-05-01"}));
        let filters = Filters { date_from: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()), ..open() };
        assert!(apply(vec![h], &filters).is_empty());
    }

    #[test]
    fn tax_type_requires_the_field_and_accepts_arrays() {
        let hits = vec![
            hit(ChannelType::ChatThreads, json!({})),
            hit(ChannelType::ChatThreads, json!({"tax_type": ["IRPF", "iva"]})),
            hit(ChannelType::ChatThreads, json!({"tax_type": "Sociedades"})),
        ];
        let filters = Filters { tax_types: Some(vec!["IVA".into()]), ..open() };
        assert_eq!(apply(hits.clone(), &filters), vec![hits[1].clone()]);

        let unconstrained = Filters { tax_types: Some(vec![]), ..open() };
        assert_eq!(apply(hits.clone(), &unconstrained).len(), 3);
    }

    #[test]
    fn regions_follow_the_same_pattern() {
        let hits = vec![hit(ChannelType::News, json!({"region": "Cataluña"})), hit(ChannelType::News, json!({"region": "Madrid"}))];
        let filters = Filters { regions: Some(vec!["Madrid".into()]), ..open() };
        assert_eq!(apply(hits.clone(), &filters), vec![hits[1].clone()]);
    }

    #[test]
    fn source_types_use_metadata_and_all_disables() {
        let hits = vec![
            hit(ChannelType::News, json!({"source_type": "NEWS"})),
            hit(ChannelType::Calendar, json!({})),
            hit(ChannelType::News, json!({"source_type": "PDF_DOCS"})),
        ];
        let news = Filters { source_types: Some(vec![ChannelType::News]), ..open() };
        assert_eq!(apply(hits.clone(), &news), vec![hits[0].clone()]);

        let all = Filters { source_types: Some(vec![ChannelType::All, ChannelType::News]), ..open() };
        assert_eq!(apply(hits.clone(), &all).len(), 3);
    }

    #[test]
    fn unscored_hits_count_as_good_quality() {
        let hits = vec![
            hit(ChannelType::News, json!({})),
            hit(ChannelType::News, json!({"quality_score": "1.5"})),
            hit(ChannelType::News, json!({"quality_score": "n/a"})),
        ];
        let filters = Filters { min_quality_score: Some(4.0), ..open() };
        assert_eq!(apply(hits.clone(), &filters), vec![hits[0].clone(), hits[2].clone()]);
    }

    #[test]
    fn only_tax_related_drops_explicit_false() {
        let hits = vec![
            hit(ChannelType::ChatThreads, json!({"tax_related": false})),
            hit(ChannelType::ChatThreads, json!({"tax_related": true})),
            hit(ChannelType::ChatThreads, json!({})),
        ];
        let out = apply(hits.clone(), &Filters::default());
        assert_eq!(out, vec![hits[1].clone(), hits[2].clone()]);
    }

    #[test]
    fn parse_date_accepts_common_shapes() {
        let midnight = Utc.with_ymd_and_hms(2025, 1, 30, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2025-01-30"), Some(midnight));
        assert_eq!(parse_date("2025-01-30T00:00:00"), Some(midnight));
        assert_eq!(parse_date("2025-01-30 00:00:00"), Some(midnight));
        assert_eq!(parse_date("2025-01-30T01:00:00+01:00"), Some(midnight));
        assert_eq!(parse_date("30/01/2025"), None);
    }
}
