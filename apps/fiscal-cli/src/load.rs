//! `fiscal load`: JSONL documents into the local text store, and optionally
//! one embedded field into the vector store.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use fiscal_core::config::{BackendKind, Settings};
use fiscal_core::types::{ChannelType, Metadata};
use fiscal_retrieval::channels::{profile, ChannelProfile};
use fiscal_text::TextStore;
use fiscal_vector::{VectorRow, VectorStore};

use crate::cli::LoadArgs;

const BATCH_SIZE: usize = 500;

pub async fn run(settings: &Settings, args: LoadArgs) -> Result<()> {
    if settings.backend.kind != BackendKind::Local {
        bail!("load writes local collections, but backend.kind is not `local`");
    }
    let channel_profile = args.target.parse::<ChannelType>().ok().and_then(profile);
    let collection = match channel_profile {
        Some(p) => settings.collections.for_channel(p.channel).unwrap_or(args.target.as_str()).to_string(),
        None => args.target.clone(),
    };
    let text_fields = text_fields(&args.text_fields, channel_profile)?;

    let docs = read_documents(&args.path)?;
    if docs.is_empty() {
        println!("No documents found under {}", args.path.display());
        return Ok(());
    }
    println!("Loading {} documents into '{}'", docs.len(), collection);

    let store = TextStore::new(settings.backend.local.text_root());
    let texts = if store.exists(&collection) { store.open(&collection)? } else { store.create(&collection, &text_fields)? };
    let pb = progress(docs.len(), "documents")?;
    let mut indexed = 0usize;
    for batch in docs.chunks(BATCH_SIZE) {
        indexed += texts.upsert(batch)?;
        pb.set_position(indexed as u64);
    }
    pb.finish_with_message("text collection updated");
    println!("📊 Indexed {indexed} documents ({} searchable fields)", texts.text_fields().len());

    if let Some(embed_field) = args.embed_field.as_deref() {
        let vector_field = match (args.vector_field.as_deref(), channel_profile) {
            (Some(field), _) => field.to_string(),
            (None, Some(p)) => p.vector_field.to_string(),
            (None, None) => bail!("--vector-field is required for a raw collection name"),
        };
        embed_documents(settings, &collection, embed_field, &vector_field, docs).await?;
    }
    Ok(())
}

fn text_fields(requested: &[String], channel_profile: Option<&ChannelProfile>) -> Result<Vec<String>> {
    if !requested.is_empty() {
        return Ok(requested.to_vec());
    }
    match channel_profile {
        Some(p) => Ok(p.lexical_fields.iter().map(|(name, _)| (*name).to_string()).collect()),
        None => bail!("--text-field is required for a raw collection name"),
    }
}

async fn embed_documents(
    settings: &Settings,
    collection: &str,
    embed_field: &str,
    vector_field: &str,
    docs: Vec<(String, Metadata)>,
) -> Result<()> {
    let provider = fiscal_embed::build_provider(&settings.embedding);
    let Some(embedder) = provider.get() else {
        bail!("cannot embed: {}", provider.reason().unwrap_or("embedding provider unavailable"));
    };

    let pb = progress(docs.len(), "embeddings")?;
    let mut rows = Vec::with_capacity(docs.len());
    let mut skipped = 0usize;
    for (id, source) in docs {
        let text = source.get(embed_field).and_then(Value::as_str).map(str::trim).unwrap_or_default();
        if text.is_empty() {
            skipped += 1;
        } else {
            let vector = embedder.embed(text).await.with_context(|| format!("embedding document {id}"))?;
            rows.push(VectorRow { id, source, vector });
        }
        pb.inc(1);
    }
    pb.finish_with_message("embeddings ready");

    let root = settings.backend.local.vector_root();
    fs::create_dir_all(&root)?;
    let store = VectorStore::open(&root.to_string_lossy()).await?;
    let written = store.upsert(collection, vector_field, &rows).await?;
    println!("📊 Wrote {written} vectors to '{collection}.{vector_field}' using {}", embedder.embedder_id());
    if skipped > 0 {
        println!("⚠️  {skipped} documents had no '{embed_field}' text and were not embedded");
    }
    Ok(())
}

fn progress(len: usize, unit: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} {{msg}}"))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Every `.jsonl` file under `path` (or `path` itself), one object per line.
/// The `id` field becomes the document id; lines without one get
/// `<file stem>-<line>`.
pub fn read_documents(path: &Path) -> Result<Vec<(String, Metadata)>> {
    let files: Vec<PathBuf> = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("jsonl"))
            .collect();
        files.sort();
        files
    };

    let mut docs = Vec::new();
    for file in files {
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("doc").to_string();
        let content = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).with_context(|| format!("{}:{}", file.display(), line_no + 1))?;
            let Value::Object(mut source) = value else {
                bail!("{}:{}: expected a JSON object", file.display(), line_no + 1);
            };
            let id = match source.remove("id") {
                Some(Value::String(s)) if !s.trim().is_empty() => s,
                Some(Value::Number(n)) => n.to_string(),
                _ => format!("{stem}-{}", line_no + 1),
            };
            docs.push((id, source));
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_jsonl_and_assigns_ids() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("q1"))?;
        fs::write(
            dir.path().join("q1/calendar.jsonl"),
            "{\"id\": \"303-q1\", \"description\": \"Modelo 303\"}\n\n{\"id\": 7, \"description\": \"Modelo 111\"}\n{\"description\": \"Modelo 130\"}\n",
        )?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;

        let docs = read_documents(dir.path())?;
        let ids: Vec<_> = docs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["303-q1", "7", "calendar-4"]);
        assert!(!docs[0].1.contains_key("id"));
        Ok(())
    }

    #[test]
    fn rejects_non_object_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("bad.jsonl");
        fs::write(&file, "[1, 2]\n")?;
        assert!(read_documents(&file).is_err());
        Ok(())
    }

    #[test]
    fn channel_profiles_supply_default_text_fields() -> Result<()> {
        let fields = text_fields(&[], profile(ChannelType::Calendar))?;
        assert_eq!(fields, vec!["description", "tax_model", "tax_type", "applies_to"]);
        assert!(text_fields(&[], None).is_err());
        Ok(())
    }
}
