use std::time::Duration;

use fiscal_core::config::ElasticSettings;
use fiscal_core::types::{BackendQuery, FieldBoost, LexicalClause, VectorClause};
use fiscal_core::SearchBackend;
use fiscal_elastic::ElasticBackend;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn news_query(vector: Option<Vec<f32>>) -> BackendQuery {
    BackendQuery {
        collection: "news_articles".to_string(),
        size: 5,
        lexical: LexicalClause { text: "iva".to_string(), fields: vec![FieldBoost::new("title", 3.0), FieldBoost::new("content", 1.0)] },
        vector: vector.map(|v| VectorClause { field: "content_embedding".to_string(), vector: v, k: 10, num_candidates: 50 }),
        source_fields: vec![],
    }
}

#[tokio::test]
async fn search_posts_dsl_and_maps_hits() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/news_articles/_search"))
        .and(header("Authorization", "ApiKey secret"))
        .and(body_partial_json(json!({
            "size": 5,
            "knn": {"field": "content_embedding", "k": 10, "num_candidates": 50}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 3,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_index": "news_articles", "_id": "a1", "_score": 7.5, "_source": {"title": "IVA", "article_url": "https://e.es/1"}},
                    {"_index": "news_articles", "_id": "a2", "_score": null, "_source": {"title": "Renta"}}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = ElasticBackend::new(server.uri(), Some("secret".to_string()), Duration::from_secs(5))?;
    let hits = backend.search(&news_query(Some(vec![0.1, 0.2]))).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "a1");
    assert_eq!(hits[0].score, 7.5);
    assert_eq!(hits[0].source["article_url"], "https://e.es/1");
    assert_eq!(hits[1].score, 0.0);
    Ok(())
}

#[tokio::test]
async fn search_error_status_is_an_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/news_articles/_search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": {"type": "search_phase_execution_exception"}})))
        .mount(&server)
        .await;

    let backend = ElasticBackend::new(server.uri(), None, Duration::from_secs(5))?;
    let err = backend.search(&news_query(Some(vec![0.1]))).await.expect_err("400 must fail");
    assert!(err.to_string().contains("400"));
    Ok(())
}

#[tokio::test]
async fn collection_exists_uses_head() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("HEAD")).and(path("/aeat_resources")).respond_with(ResponseTemplate::new(200)).mount(&server).await;
    Mock::given(method("HEAD")).and(path("/reference_materials")).respond_with(ResponseTemplate::new(404)).mount(&server).await;
    Mock::given(method("HEAD")).and(path("/broken")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

    let backend = ElasticBackend::new(server.uri(), None, Duration::from_secs(5))?;
    assert!(backend.collection_exists("aeat_resources").await?);
    assert!(!backend.collection_exists("reference_materials").await?);
    assert!(backend.collection_exists("broken").await.is_err());
    Ok(())
}

#[tokio::test]
async fn ping_reflects_cluster_reachability() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cluster_name": "fiscal"})))
        .mount(&server)
        .await;

    let settings = ElasticSettings { url: Some(format!("{}/", server.uri())), request_timeout_ms: 2_000, ..Default::default() };
    let backend = ElasticBackend::from_settings(&settings)?;
    assert!(backend.ping().await);

    let unreachable = ElasticBackend::new("http://127.0.0.1:9", None, Duration::from_millis(500))?;
    assert!(!unreachable.ping().await);
    Ok(())
}
