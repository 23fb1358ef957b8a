use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::collection::{collection_dir, TextCollection};

/// Root directory holding one tantivy index per collection.
///
/// Opened collections are cached so repeated searches share one `Index`.
pub struct TextStore {
	root: PathBuf,
	open: RwLock<HashMap<String, Arc<TextCollection>>>,
}

impl TextStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into(), open: RwLock::new(HashMap::new()) }
	}

	pub fn exists(&self, name: &str) -> bool {
		collection_dir(&self.root, name).join("meta.json").is_file()
	}

	/// Names of every collection found under the root, sorted.
	pub fn collection_names(&self) -> Result<Vec<String>> {
		if !self.root.is_dir() {
			return Ok(Vec::new());
		}
		let mut names = Vec::new();
		for entry in std::fs::read_dir(&self.root)? {
			let entry = entry?;
			let name = entry.file_name().to_string_lossy().to_string();
			if self.exists(&name) {
				names.push(name);
			}
		}
		names.sort();
		Ok(names)
	}

	pub fn open(&self, name: &str) -> Result<Arc<TextCollection>> {
		if let Some(collection) = self.read_cache()?.get(name) {
			return Ok(Arc::clone(collection));
		}
		if !self.exists(name) {
			return Err(anyhow!("text collection '{}' not found under {}", name, self.root.display()));
		}
		let collection = Arc::new(TextCollection::open(&collection_dir(&self.root, name), name)?);
		self.write_cache()?.insert(name.to_string(), Arc::clone(&collection));
		Ok(collection)
	}

	/// Create (or recreate) a collection with the given indexed text fields.
	pub fn create(&self, name: &str, text_fields: &[String]) -> Result<Arc<TextCollection>> {
		let collection = Arc::new(TextCollection::create(&collection_dir(&self.root, name), name, text_fields)?);
		self.write_cache()?.insert(name.to_string(), Arc::clone(&collection));
		tracing::info!(collection = name, fields = ?text_fields, "text collection created");
		Ok(collection)
	}

	fn read_cache(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Arc<TextCollection>>>> {
		self.open.read().map_err(|_| anyhow!("text collection cache poisoned"))
	}

	fn write_cache(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<TextCollection>>>> {
		self.open.write().map_err(|_| anyhow!("text collection cache poisoned"))
	}
}
