use fiscal_core::types::Metadata;
use fiscal_vector::{VectorRow, VectorStore};
use serde_json::json;

fn row(id: &str, vector: Vec<f32>, source: serde_json::Value) -> VectorRow {
    let source: Metadata = source.as_object().cloned().expect("fixture must be an object");
    VectorRow { id: id.to_string(), source, vector }
}

#[tokio::test]
async fn nearest_returns_closest_rows_with_their_source() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = VectorStore::open(dir.path().to_string_lossy().as_ref()).await?;
    assert!(!store.has_collection("pdf_documents").await?);

    store
        .upsert(
            "pdf_documents",
            "content_embedding",
            &[
                row("d1", vec![1.0, 0.0, 0.0], json!({"document_id": "ley-37-1992", "content": "IVA"})),
                row("d2", vec![0.0, 1.0, 0.0], json!({"document_id": "ley-35-2006", "content": "IRPF"})),
                row("d3", vec![0.7, 0.7, 0.0], json!({"document_id": "rd-1624-1992", "content": "Reglamento"})),
            ],
        )
        .await?;
    assert!(store.has_collection("pdf_documents").await?);

    let hits = store.nearest("pdf_documents", "content_embedding", &[1.0, 0.1, 0.0], 2).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "d1");
    assert_eq!(hits[0].source["document_id"], "ley-37-1992");
    assert!(hits[0].score > hits[1].score);
    Ok(())
}

#[tokio::test]
async fn upsert_replaces_existing_ids() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = VectorStore::open(dir.path().to_string_lossy().as_ref()).await?;
    store.upsert("news_articles", "content_embedding", &[row("a", vec![1.0, 0.0], json!({"title": "old"}))]).await?;
    store.upsert("news_articles", "content_embedding", &[row("a", vec![1.0, 0.0], json!({"title": "new"}))]).await?;

    let hits = store.nearest("news_articles", "content_embedding", &[1.0, 0.0], 5).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source["title"], "new");
    Ok(())
}

#[tokio::test]
async fn mismatched_dimensions_are_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = VectorStore::open(dir.path().to_string_lossy().as_ref()).await?;
    let rows = [row("a", vec![1.0, 0.0], json!({})), row("b", vec![1.0], json!({}))];
    assert!(store.upsert("news_articles", "content_embedding", &rows).await.is_err());
    assert_eq!(store.upsert("news_articles", "content_embedding", &[]).await?, 0);
    Ok(())
}
