//! Named, reusable layer fragments.
//!
//! The whole library is one JSON object (`name → layer`) stored under a
//! single key of a [`KeyValueStore`]. Every operation reads the stored
//! value and writes it back, so the store is the only source of truth.
//! Library contents are independent of document history.

use lc_core::{Document, Layer};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub use crate::config::LIBRARY_KEY;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Minimal string key-value storage, shaped like browser `localStorage`.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and native hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LibraryError {
    #[error("a library asset named `{0}` already exists")]
    DuplicateName(String),
    #[error("no library asset named `{0}`")]
    NotFound(String),
    #[error("asset name must not be empty")]
    InvalidName,
    #[error("stored library is unreadable: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Library<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Library<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, LIBRARY_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn load(&self) -> Result<BTreeMap<String, Layer>, LibraryError> {
        let Some(raw) = self.store.get_item(&self.key)? else {
            return Ok(BTreeMap::new());
        };
        serde_json::from_str(&raw).map_err(|e| {
            log::warn!("library under `{}` is corrupt: {e}", self.key);
            LibraryError::Corrupt(e.to_string())
        })
    }

    fn persist(&mut self, assets: &BTreeMap<String, Layer>) -> Result<(), LibraryError> {
        let raw = serde_json::to_string(assets).map_err(|e| LibraryError::Corrupt(e.to_string()))?;
        self.store.set_item(&self.key, &raw)?;
        Ok(())
    }

    /// Store `fragment` under `name`. An existing name is only replaced
    /// when `overwrite` is set.
    pub fn save(&mut self, name: &str, fragment: &Layer, overwrite: bool) -> Result<(), LibraryError> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(LibraryError::InvalidName);
        }
        let mut assets = self.load()?;
        if assets.contains_key(name) && !overwrite {
            return Err(LibraryError::DuplicateName(name.to_string()));
        }
        assets.insert(name.to_string(), fragment.clone());
        self.persist(&assets)?;
        log::info!("saved `{}` to the library as `{name}`", fragment.id);
        Ok(())
    }

    /// All assets, ordered by name.
    pub fn list(&self) -> Result<BTreeMap<String, Layer>, LibraryError> {
        self.load()
    }

    pub fn get(&self, name: &str) -> Result<Layer, LibraryError> {
        let name = normalize(name);
        self.load()?
            .remove(name)
            .ok_or_else(|| LibraryError::NotFound(name.to_string()))
    }

    /// Delete `name`, returning the removed fragment.
    pub fn remove(&mut self, name: &str) -> Result<Layer, LibraryError> {
        let name = normalize(name);
        let mut assets = self.load()?;
        let fragment = assets
            .remove(name)
            .ok_or_else(|| LibraryError::NotFound(name.to_string()))?;
        self.persist(&assets)?;
        Ok(fragment)
    }
}

/// Asset names are compared without surrounding whitespace.
fn normalize(name: &str) -> &str {
    name.trim()
}

/// Copy of `fragment` ready for insertion into `doc`: a fresh id no layer
/// of `doc` uses, every other attribute verbatim.
pub fn instantiate(fragment: &Layer, doc: &Document) -> Layer {
    let mut layer = fragment.clone();
    layer.id = doc.fresh_id(&format!("lib_{}", fragment.kind.type_name()));
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_core::{DEFAULT_VIEW_BOX, LayerId};
    use pretty_assertions::assert_eq;

    fn rect() -> Layer {
        Layer::path("layer1_rect", "M 0 0 L 10 0 L 10 10 L 0 10 Z", "#f06").unwrap()
    }

    #[test]
    fn save_list_get_remove() {
        let mut lib = Library::new(MemoryStore::new());
        lib.save("MyRect", &rect(), false).unwrap();
        assert_eq!(lib.list().unwrap().keys().collect::<Vec<_>>(), vec!["MyRect"]);
        assert_eq!(lib.get("MyRect").unwrap(), rect());

        assert_eq!(lib.remove("MyRect").unwrap(), rect());
        assert!(lib.list().unwrap().is_empty());
        assert_eq!(lib.get("MyRect"), Err(LibraryError::NotFound("MyRect".into())));
    }

    #[test]
    fn duplicate_name_needs_overwrite() {
        let mut lib = Library::new(MemoryStore::new());
        lib.save("A", &rect(), false).unwrap();
        assert_eq!(
            lib.save("A", &rect(), false),
            Err(LibraryError::DuplicateName("A".into()))
        );
        let other = Layer::path("x", "M 0 0 L 1 0 L 1 1 Z", "#000").unwrap();
        lib.save("A", &other, true).unwrap();
        assert_eq!(lib.get("A").unwrap(), other);
    }

    #[test]
    fn stored_as_single_json_object() {
        let mut lib = Library::new(MemoryStore::new());
        lib.save("MyRect", &rect(), false).unwrap();
        let raw = lib.store().get_item("svg_library").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["MyRect"]["id"], "layer1_rect");
        assert_eq!(value["MyRect"]["attributes"]["fill"], "#f06");
    }

    #[test]
    fn corrupt_storage_is_reported() {
        let mut store = MemoryStore::new();
        store.set_item(LIBRARY_KEY, "{ nope").unwrap();
        let lib = Library::new(store);
        assert!(matches!(lib.list(), Err(LibraryError::Corrupt(_))));
    }

    #[test]
    fn names_are_trimmed_on_every_lookup() {
        let mut lib = Library::new(MemoryStore::new());
        lib.save(" MyRect ", &rect(), false).unwrap();
        assert_eq!(lib.list().unwrap().keys().collect::<Vec<_>>(), vec!["MyRect"]);
        assert_eq!(lib.get(" MyRect ").unwrap(), rect());
        assert_eq!(
            lib.save("MyRect", &rect(), false),
            Err(LibraryError::DuplicateName("MyRect".into()))
        );
        assert_eq!(lib.remove(" MyRect ").unwrap(), rect());
        assert!(lib.list().unwrap().is_empty());
    }

    #[test]
    fn blank_name_rejected() {
        let mut lib = Library::new(MemoryStore::new());
        assert_eq!(lib.save("  ", &rect(), false), Err(LibraryError::InvalidName));
    }

    #[test]
    fn instantiate_assigns_unused_id() {
        let doc = Document::from_layers(DEFAULT_VIEW_BOX, vec![rect()]).unwrap();
        let copy = instantiate(&rect(), &doc);
        assert_ne!(copy.id, LayerId::intern("layer1_rect"));
        assert!(!doc.contains(copy.id));
        assert_eq!(copy.kind, rect().kind);
    }
}
