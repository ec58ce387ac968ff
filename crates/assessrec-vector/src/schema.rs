use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Index table layout: catalog row position, url (for debugging), vector.
pub fn build_index_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("row", DataType::UInt32, false),
		Field::new("url", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
