use anyhow::{anyhow, bail, Result};
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use std::sync::Arc;

use fiscal_core::types::{BackendHit, Metadata};

use crate::schema::{build_arrow_schema, DISTANCE_COLUMN, ID_COLUMN, SOURCE_COLUMN};

/// A document destined for a vector collection.
#[derive(Debug, Clone)]
pub struct VectorRow {
	pub id: String,
	pub source: Metadata,
	pub vector: Vec<f32>,
}

/// A LanceDB database with one table per collection.
pub struct VectorStore {
	db: Connection,
}

impl VectorStore {
	pub async fn open(uri: &str) -> Result<Self> {
		let db = connect(uri).execute().await?;
		Ok(Self { db })
	}

	pub async fn has_collection(&self, name: &str) -> Result<bool> {
		Ok(self.db.table_names().execute().await?.iter().any(|t| t == name))
	}

	/// Insert rows, replacing existing ids. All vectors must share one length.
	pub async fn upsert(&self, collection: &str, vector_field: &str, rows: &[VectorRow]) -> Result<usize> {
		let Some(first) = rows.first() else { return Ok(0) };
		let dim = first.vector.len();
		if dim == 0 {
			bail!("empty embedding for '{}'", first.id);
		}
		if let Some(bad) = rows.iter().find(|r| r.vector.len() != dim) {
			bail!("embedding for '{}' has {} dimensions, expected {}", bad.id, bad.vector.len(), dim);
		}

		let batch = rows_to_record_batch(vector_field, dim as i32, rows)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		if self.has_collection(collection).await? {
			let table = self.db.open_table(collection).execute().await?;
			let mut merge = table.merge_insert(&[ID_COLUMN]);
			merge.when_matched_update_all(None).when_not_matched_insert_all();
			merge.execute(reader).await?;
		} else {
			self.db.create_table(collection, reader).execute().await?;
		}
		tracing::debug!(collection, rows = rows.len(), dim, "vector collection updated");
		Ok(rows.len())
	}

	/// Cosine nearest neighbours of `vector` in `vector_field`; score is `1 - distance`.
	pub async fn nearest(&self, collection: &str, vector_field: &str, vector: &[f32], k: usize) -> Result<Vec<BackendHit>> {
		let table = self.db.open_table(collection).execute().await?;
		let mut stream = table
			.vector_search(vector.to_vec())?
			.column(vector_field)
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.execute()
			.await?;

		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let ids = string_column(&batch, ID_COLUMN)?;
			let sources = string_column(&batch, SOURCE_COLUMN)?;
			let distances = batch.column_by_name(DISTANCE_COLUMN).and_then(|c| c.as_any().downcast_ref::<Float32Array>());
			for i in 0..batch.num_rows() {
				let score = distances.map_or(0.5, |d| 1.0 - d.value(i));
				let source: Metadata = serde_json::from_str(sources.value(i))?;
				hits.push(BackendHit { id: ids.value(i).to_string(), score, source });
			}
		}
		Ok(hits)
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("{} column missing", name))
}

fn rows_to_record_batch(vector_field: &str, dim: i32, rows: &[VectorRow]) -> Result<RecordBatch> {
	let mut ids = Vec::with_capacity(rows.len());
	let mut sources = Vec::with_capacity(rows.len());
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(rows.len());
	for row in rows {
		ids.push(row.id.clone());
		sources.push(serde_json::to_string(&row.source)?);
		vectors.push(Some(row.vector.iter().map(|&x| Some(x)).collect()));
	}
	let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors.into_iter(), dim);
	let record_batch = RecordBatch::try_new(
		build_arrow_schema(vector_field, dim),
		vec![Arc::new(StringArray::from(ids)), Arc::new(StringArray::from(sources)), Arc::new(vector_array)],
	)?;
	Ok(record_batch)
}
