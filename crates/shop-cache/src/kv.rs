//! Key-Value store wrapper with automatic serialization.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::backend::{FileBackend, KvBackend, MemoryBackend};
use crate::{CacheError, Slot};

/// Type-safe cache over a [`KvBackend`].
///
/// Values are stored as JSON. Cloning a `Cache` yields another handle to
/// the same backend.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn KvBackend>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Wrap an existing backend.
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Open a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open a directory-backed store.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open_dir("/var/lib/shop")?;
    /// ```
    pub fn open_dir(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let backend = FileBackend::open(dir)?;
        tracing::debug!(dir = %backend.dir().display(), "opened file store");
        Ok(Self::new(backend))
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist, and an error if the stored
    /// document does not deserialize as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.backend.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache, replacing whatever was there.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, &bytes)
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.backend.delete(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.backend.exists(key)
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.backend.keys()
    }

    /// Bind a single key to a value type.
    pub fn slot<T>(&self, key: impl Into<String>) -> Slot<T>
    where
        T: Serialize + DeserializeOwned,
    {
        Slot::new(self.clone(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Line {
        id: String,
        quantity: u32,
    }

    #[test]
    fn test_typed_roundtrip() {
        let cache = Cache::in_memory();
        let lines = vec![Line {
            id: "p1_Black_128GB".to_string(),
            quantity: 2,
        }];
        cache.set("cart", &lines).unwrap();

        let loaded: Option<Vec<Line>> = cache.get("cart").unwrap();
        assert_eq!(loaded, Some(lines));
    }

    #[test]
    fn test_get_missing_is_none() {
        let cache = Cache::in_memory();
        let loaded: Option<String> = cache.get("nothing").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_get_wrong_shape_is_error() {
        let cache = Cache::in_memory();
        cache.set("cart", "not a list").unwrap();
        let loaded: Result<Option<Vec<Line>>, _> = cache.get("cart");
        assert!(matches!(loaded, Err(CacheError::SerializeError(_))));
    }

    #[test]
    fn test_clones_share_backend() {
        let a = Cache::in_memory();
        let b = a.clone();
        a.set("k", &1u32).unwrap();
        assert_eq!(b.get::<u32>("k").unwrap(), Some(1));
        b.delete("k").unwrap();
        assert!(!a.exists("k").unwrap());
    }

    #[test]
    fn test_open_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open_dir(dir.path()).unwrap();
        cache.set("token", "cs_1").unwrap();
        assert_eq!(cache.keys().unwrap(), vec!["token"]);
    }
}
