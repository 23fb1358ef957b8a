use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const SOURCE_COLUMN: &str = "source";
pub const DISTANCE_COLUMN: &str = "_distance";

/// Arrow schema for a collection whose dense column is `vector_field`.
pub fn build_arrow_schema(vector_field: &str, dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID_COLUMN, DataType::Utf8, false),
		Field::new(SOURCE_COLUMN, DataType::Utf8, false),
		Field::new(vector_field, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
