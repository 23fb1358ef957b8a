use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{Index, IndexWriter, TantivyDocument, Term};

use fiscal_core::types::{BackendHit, LexicalClause, Metadata};

use crate::schema::{build_schema, register_tokenizer, text_field_names, ID_FIELD, SOURCE_FIELD};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// One tantivy index holding the documents of a single collection.
pub struct TextCollection {
	name: String,
	index: Index,
	id_field: Field,
	source_field: Field,
	text_fields: Vec<(String, Field)>,
}

impl TextCollection {
	/// Create an empty collection, replacing whatever was in `dir`.
	pub fn create(dir: &Path, name: &str, text_fields: &[String]) -> Result<Self> {
		if dir.exists() {
			std::fs::remove_dir_all(dir)?;
		}
		std::fs::create_dir_all(dir)?;
		let index = Index::create_in_dir(dir, build_schema(text_fields))?;
		Self::from_index(name, index)
	}

	pub fn open(dir: &Path, name: &str) -> Result<Self> {
		let index = Index::open_in_dir(dir).with_context(|| format!("opening text collection at {}", dir.display()))?;
		Self::from_index(name, index)
	}

	fn from_index(name: &str, index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let id_field = schema.get_field(ID_FIELD)?;
		let source_field = schema.get_field(SOURCE_FIELD)?;
		let mut text_fields = Vec::new();
		for field_name in text_field_names(&schema) {
			let field = schema.get_field(&field_name)?;
			text_fields.push((field_name, field));
		}
		Ok(Self { name: name.to_string(), index, id_field, source_field, text_fields })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn text_fields(&self) -> Vec<&str> {
		self.text_fields.iter().map(|(name, _)| name.as_str()).collect()
	}

	/// Add or replace documents keyed by id. Returns the number written.
	pub fn upsert(&self, documents: &[(String, Metadata)]) -> Result<usize> {
		let mut writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES)?;
		for (id, source) in documents {
			writer.delete_term(Term::from_field_text(self.id_field, id));
			let mut doc = TantivyDocument::default();
			doc.add_text(self.id_field, id);
			doc.add_text(self.source_field, serde_json::to_string(source)?);
			for (field_name, field) in &self.text_fields {
				for text in field_texts(source.get(field_name)) {
					doc.add_text(*field, text);
				}
			}
			writer.add_document(doc)?;
		}
		writer.commit()?;
		tracing::debug!(collection = %self.name, documents = documents.len(), "text collection committed");
		Ok(documents.len())
	}

	pub fn num_docs(&self) -> Result<u64> {
		Ok(self.index.reader()?.searcher().num_docs())
	}

	/// Boosted multi-field match. Fields the collection does not index are
	/// ignored; a clause naming none of them matches nothing.
	pub fn search(&self, clause: &LexicalClause, limit: usize) -> Result<Vec<BackendHit>> {
		let mut fields = Vec::new();
		let mut boosts = Vec::new();
		for wanted in &clause.fields {
			if let Some((_, field)) = self.text_fields.iter().find(|(name, _)| *name == wanted.name) {
				fields.push(*field);
				boosts.push((*field, wanted.boost));
			}
		}
		if fields.is_empty() || clause.text.trim().is_empty() || limit == 0 {
			return Ok(Vec::new());
		}

		let mut parser = QueryParser::for_index(&self.index, fields);
		for (field, boost) in boosts {
			parser.set_field_boost(field, boost);
		}
		// User text is not query syntax; stray quotes or colons must not fail the search.
		let (query, errors) = parser.parse_query_lenient(&clause.text);
		if !errors.is_empty() {
			tracing::debug!(collection = %self.name, errors = errors.len(), "lenient query parse dropped terms");
		}

		let reader = self.index.reader()?;
		let searcher = reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let id = doc.get_first(self.id_field).and_then(|v| v.as_str()).unwrap_or("").to_string();
			let source = doc
				.get_first(self.source_field)
				.and_then(|v| v.as_str())
				.map(serde_json::from_str::<Metadata>)
				.transpose()?
				.unwrap_or_default();
			hits.push(BackendHit { id, score, source });
		}
		Ok(hits)
	}
}

/// Strings to index for one source value: text as-is, numbers and booleans
/// rendered, arrays flattened.
fn field_texts(value: Option<&JsonValue>) -> Vec<String> {
	match value {
		Some(JsonValue::String(s)) => vec![s.clone()],
		Some(JsonValue::Number(n)) => vec![n.to_string()],
		Some(JsonValue::Bool(b)) => vec![b.to_string()],
		Some(JsonValue::Array(items)) => items.iter().flat_map(|item| field_texts(Some(item))).collect(),
		_ => Vec::new(),
	}
}

pub(crate) fn collection_dir(root: &Path, name: &str) -> PathBuf {
	root.join(name)
}
