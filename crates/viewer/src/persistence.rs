//! Local key-value storage for the slot configuration.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ntl_common::{ProductType, ViewerError, ViewerResult};
use tracing::{debug, warn};

/// String key-value storage that survives between sessions.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> ViewerResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ViewerResult<()>;
}

/// Store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ViewerResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ViewerResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// The file is read on every `get` and rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> ViewerResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Ignoring unreadable store file");
                Ok(BTreeMap::new())
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ViewerResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ViewerResult<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        debug!(path = ?self.path, key = key, "Store updated");
        Ok(())
    }
}

/// Slot types as a JSON array of product ids.
pub fn serialize_slots(slots: &[ProductType]) -> String {
    let ids: Vec<&str> = slots.iter().map(ProductType::id).collect();
    serde_json::Value::from(ids).to_string()
}

/// Parse a stored slot list. Accepts product ids and variant names.
pub fn try_deserialize_slots(raw: &str) -> ViewerResult<Vec<ProductType>> {
    let names: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| ViewerError::ConfigDeserialization(e.to_string()))?;
    let mut slots = Vec::with_capacity(names.len());
    for name in names {
        let product: ProductType = name
            .parse()
            .map_err(|e| ViewerError::ConfigDeserialization(format!("{}", e)))?;
        if slots.contains(&product) {
            return Err(ViewerError::ConfigDeserialization(format!(
                "product '{}' appears twice",
                name
            )));
        }
        slots.push(product);
    }
    Ok(slots)
}

/// Parse a stored slot list, falling back to `default` when it is corrupt.
pub fn deserialize_slots(raw: &str, default: &[ProductType]) -> Vec<ProductType> {
    match try_deserialize_slots(raw) {
        Ok(slots) => slots,
        Err(e) => {
            warn!(error = %e, "Stored slot configuration is corrupt, using default");
            default.to_vec()
        }
    }
}
