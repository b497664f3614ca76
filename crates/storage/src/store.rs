use saldo_core::CategoryRuleset;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid ruleset file: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Where the category ruleset lives between sessions.
///
/// `load` returns `Ok(None)` when nothing has been saved yet, so callers can
/// seed the defaults. A `save` that fails must leave the previous contents
/// readable.
pub trait RulesetStore: Send {
    fn load(&self) -> Result<Option<CategoryRuleset>, StoreError>;
    fn save(&mut self, ruleset: &CategoryRuleset) -> Result<(), StoreError>;
}

/// Loads the stored ruleset, or the defaults when the store is empty. The
/// defaults are not written back until the first change.
pub fn load_or_seed(store: &dyn RulesetStore) -> Result<CategoryRuleset, StoreError> {
    match store.load()? {
        Some(ruleset) => Ok(ruleset),
        None => {
            tracing::info!("no saved categories, using defaults");
            Ok(CategoryRuleset::default())
        }
    }
}

// ── JSON file ─────────────────────────────────────────────────────────────────

/// Ruleset as a JSON object of category name to keyword list, key order
/// being match order.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RulesetStore for JsonFileStore {
    fn load(&self) -> Result<Option<CategoryRuleset>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let ruleset: CategoryRuleset = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), categories = ruleset.len(), "loaded ruleset");
        Ok(Some(ruleset))
    }

    fn save(&mut self, ruleset: &CategoryRuleset) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        ruleset.serialize(&mut ser)?;
        buf.push(b'\n');

        // Write beside the target and rename over it.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &buf)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "saved ruleset");
        Ok(())
    }
}

// ── In memory ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<CategoryRuleset>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ruleset(ruleset: CategoryRuleset) -> Self {
        Self {
            saved: Some(ruleset),
            fail_saves: false,
        }
    }

    /// Every later `save` fails with an IO error. For exercising error paths.
    pub fn failing() -> Self {
        Self {
            saved: None,
            fail_saves: true,
        }
    }

    pub fn saved(&self) -> Option<&CategoryRuleset> {
        self.saved.as_ref()
    }
}

impl RulesetStore for MemoryStore {
    fn load(&self) -> Result<Option<CategoryRuleset>, StoreError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, ruleset: &CategoryRuleset) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "store is read-only").into());
        }
        self.saved = Some(ruleset.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none_and_seeds_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("categorias.json"));
        assert!(store.load().unwrap().is_none());
        assert_eq!(load_or_seed(&store).unwrap(), CategoryRuleset::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("categorias.json"));

        let mut ruleset = CategoryRuleset::default();
        ruleset.add_category("Pets", "petshop, ração").unwrap();
        ruleset.remove_category("Educação").unwrap();
        store.save(&ruleset).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, ruleset);
        let names: Vec<&str> = loaded.names().collect();
        assert_eq!(names.last(), Some(&"Pets"));
    }

    #[test]
    fn file_is_a_plain_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorias.json");
        let mut store = JsonFileStore::new(&path);
        store.save(&CategoryRuleset::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"Alimentação\": ["));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Outros"], serde_json::json!([]));
        assert_eq!(value["Transporte"][0], "uber");
    }

    #[test]
    fn hand_written_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorias.json");
        std::fs::write(&path, r#"{"Mercado": ["Pão de Açúcar", "carrefour"]}"#).unwrap();

        let ruleset = JsonFileStore::new(&path).load().unwrap().unwrap();
        let names: Vec<&str> = ruleset.names().collect();
        assert_eq!(names, ["Mercado", "Outros"]);
        assert_eq!(ruleset.get("Mercado").unwrap().keywords, ["pao de acucar", "carrefour"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorias.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileStore::new(&path).load(), Err(StoreError::JsonError(_))));
    }

    #[test]
    fn memory_store_roundtrip_and_failure() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&CategoryRuleset::default()).unwrap();
        assert!(store.saved().is_some());

        let mut failing = MemoryStore::failing();
        assert!(matches!(
            failing.save(&CategoryRuleset::default()),
            Err(StoreError::IoError(_))
        ));
        assert!(failing.saved().is_none());
    }
}
