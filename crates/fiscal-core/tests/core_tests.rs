use fiscal_core::config::{BackendKind, Config, EmbeddingProviderKind};
use fiscal_core::types::{ChannelType, Filters, Hit, Query, SearchRequest};
use fiscal_core::Error;

#[test]
fn all_expands_to_every_concrete_channel_in_order() {
    let explicit = ChannelType::expand(&[
        ChannelType::ChatThreads,
        ChannelType::PdfDocs,
        ChannelType::Calendar,
        ChannelType::News,
        ChannelType::AgencyResources,
        ChannelType::Reference,
    ]);
    assert_eq!(ChannelType::expand(&[ChannelType::All]), explicit);
    assert_eq!(ChannelType::expand(&[]), explicit, "empty list means all channels");
    assert!(!ChannelType::expand(&[ChannelType::All]).contains(&ChannelType::All));
}

#[test]
fn expand_drops_duplicates_and_keeps_first_seen_order() {
    let channels = ChannelType::expand(&[ChannelType::News, ChannelType::Calendar, ChannelType::News]);
    assert_eq!(channels, vec![ChannelType::News, ChannelType::Calendar]);
}

#[test]
fn channel_names_round_trip_and_accept_legacy_aliases() {
    for channel in ChannelType::CONCRETE {
        let json = serde_json::to_string(&channel).expect("serialize");
        let back: ChannelType = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, channel);
    }
    assert_eq!(serde_json::to_string(&ChannelType::AgencyResources).expect("ser"), "\"AGENCY_RESOURCES\"");
    assert_eq!("telegram".parse::<ChannelType>().expect("alias"), ChannelType::ChatThreads);
    assert_eq!("aeat".parse::<ChannelType>().expect("alias"), ChannelType::AgencyResources);
    assert!(matches!("whatsapp".parse::<ChannelType>(), Err(Error::UnknownChannel(name)) if name == "whatsapp"));
}

#[test]
fn query_validation_rejects_bad_input() {
    assert!(matches!(Query::new("   ", &[], 3), Err(Error::InvalidQuery(_))));
    assert!(matches!(Query::new("iva", &[], 0), Err(Error::InvalidQuery(_))));
    assert!(matches!(Query::new("iva", &[], 21), Err(Error::InvalidQuery(_))));
    assert!(matches!(Query::new("x".repeat(1001), &[], 3), Err(Error::InvalidQuery(_))));

    let query = Query::new("  modelo 303 ", &[ChannelType::Calendar], 5).expect("valid query");
    assert_eq!(query.text, "modelo 303");
    assert_eq!(query.requested_channels, vec![ChannelType::Calendar]);
}

#[test]
fn request_with_unknown_channel_is_a_validation_error() {
    let request: SearchRequest = serde_json::from_value(serde_json::json!({
        "queryText": "IVA trimestral",
        "sources": ["calendar", "fax"]
    }))
    .expect("envelope parses");
    assert!(matches!(request.to_query(), Err(Error::UnknownChannel(name)) if name == "fax"));
}

#[test]
fn request_defaults_match_the_envelope_contract() {
    let request: SearchRequest = serde_json::from_value(serde_json::json!({ "queryText": "renta" })).expect("parse");
    assert_eq!(request.top_k_per_source, 3);
    assert!(request.aggregate_results);
    let query = request.to_query().expect("query");
    assert_eq!(query.requested_channels, ChannelType::CONCRETE.to_vec());
    assert!(query.filters.is_none());
}

#[test]
fn filter_defaults_and_explicit_null_quality() {
    let filters: Filters = serde_json::from_value(serde_json::json!({ "taxTypes": ["IVA"] })).expect("parse");
    assert!(filters.only_tax_related);
    assert_eq!(filters.min_quality_score, Some(2.0));
    assert_eq!(filters.tax_types.as_deref(), Some(&["IVA".to_string()][..]));

    let unbounded: Filters = serde_json::from_value(serde_json::json!({ "minQualityScore": null })).expect("parse");
    assert_eq!(unbounded.min_quality_score, None);
}

#[test]
fn hit_serializes_with_camel_case_wire_names() {
    let hit = Hit { text: "t".into(), metadata: Default::default(), score: 1.5, source_type: ChannelType::PdfDocs };
    let value = serde_json::to_value(&hit).expect("serialize");
    assert_eq!(value["sourceType"], "PDF_DOCS");
    assert!(value.get("metadata").is_some());
}

#[test]
fn config_layers_file_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [backend]
            kind = "elastic"
            [backend.elastic]
            url = "http://localhost:9200"
            [embedding]
            provider = "hashing"
            dimension = 64
            "#,
        )?;
        jail.set_env("APP_SEARCH__CHANNEL_TIMEOUT_MS", "1500");
        jail.set_env("APP_COLLECTIONS__CALENDAR", "deadlines_2025");

        let config = Config::load_for_env("test").expect("config loads");
        let settings = config.settings().expect("settings");
        assert_eq!(settings.backend.kind, BackendKind::Elastic);
        assert_eq!(settings.embedding.provider, EmbeddingProviderKind::Hashing);
        assert_eq!(settings.embedding.dimension, 64);
        assert_eq!(settings.search.channel_timeout_ms, 1500);
        assert_eq!(settings.collections.calendar, "deadlines_2025");
        assert_eq!(settings.collections.news, "news_articles", "untouched keys keep defaults");
        let timeout: u64 = config.get("search.embedding_timeout_ms").expect("nested key");
        assert_eq!(timeout, 5_000);
        Ok(())
    });
}

#[test]
fn elastic_backend_without_endpoint_is_rejected() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[backend]\nkind = \"elastic\"\n")?;
        let err = Config::load_for_env("test").err().expect("missing endpoint must fail");
        assert!(err.to_string().contains("url"));
        Ok(())
    });
}
