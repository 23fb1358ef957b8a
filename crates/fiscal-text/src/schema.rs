use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const ID_FIELD: &str = "_id";
pub const SOURCE_FIELD: &str = "_source";
pub const TOKENIZER: &str = "fiscal_text";

/// Build a collection schema: the document id, the stored source document
/// and one indexed (not stored) text field per declared name.
pub fn build_schema(text_fields: &[String]) -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field(ID_FIELD, STRING | STORED);
	schema_builder.add_text_field(SOURCE_FIELD, STORED);
	let indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(indexing);
	for name in text_fields {
		schema_builder.add_text_field(name, text_options.clone());
	}
	schema_builder.build()
}

/// Declared text fields of an existing schema, i.e. everything except the
/// reserved `_`-prefixed fields.
pub fn text_field_names(schema: &Schema) -> Vec<String> {
	schema
		.fields()
		.map(|(_, entry)| entry.name().to_string())
		.filter(|name| !name.starts_with('_'))
		.collect()
}

/// Accent-insensitive analyzer; Spanish and English stop words are dropped
/// after folding, so the list is written without accents.
pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","al","algo","ante","como","con","de","del","desde","el","en","entre","es","esta","este","esto","ha","hay","la","las","le","les","lo","los","mas","me","mi","muy","no","o","para","pero","por","que","se","si","sin","sobre","su","sus","te","tu","un","una","uno","y","ya",
		"an","and","are","as","at","be","by","for","from","has","in","is","it","its","of","on","or","that","the","to","was","with",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(AsciiFoldingFilter)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}
