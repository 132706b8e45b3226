//! A single cache key bound to a value type.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::{Cache, CacheError};

/// Typed handle on one key of a [`Cache`].
///
/// # Example
///
/// ```rust,ignore
/// let token: Slot<String> = cache.slot("stripe_checkout_session_id");
/// token.set(&"cs_1".to_string())?;
///
/// // Read-and-clear, so the value is consumed exactly once
/// let once = token.take()?;
/// assert!(token.get()?.is_none());
/// ```
pub struct Slot<T> {
    cache: Cache,
    key: String,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot").field("key", &self.key).finish()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> Slot<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(cache: Cache, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
            _phantom: PhantomData,
        }
    }

    /// The key this slot is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored value.
    pub fn get(&self) -> Result<Option<T>, CacheError> {
        self.cache.get(&self.key)
    }

    /// Read the stored value, treating an unreadable document as absent.
    ///
    /// Returns `T::default()` when the key is missing or its contents do not
    /// parse. Backend failures are still reported.
    pub fn get_or_default(&self) -> Result<T, CacheError>
    where
        T: Default,
    {
        match self.cache.get(&self.key) {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(CacheError::SerializeError(e)) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable value");
                Ok(T::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Read the stored value, deleting it if it does not parse.
    pub fn get_or_discard(&self) -> Result<Option<T>, CacheError> {
        match self.cache.get(&self.key) {
            Err(CacheError::SerializeError(e)) => {
                tracing::warn!(key = %self.key, error = %e, "removing unreadable value");
                self.clear()?;
                Ok(None)
            }
            other => other,
        }
    }

    /// Overwrite the stored value.
    pub fn set(&self, value: &T) -> Result<(), CacheError> {
        self.cache.set(&self.key, value)
    }

    /// Remove the stored value.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.cache.delete(&self.key)
    }

    /// Read the stored value and remove it.
    pub fn take(&self) -> Result<Option<T>, CacheError> {
        let value = self.get()?;
        if value.is_some() {
            self.clear()?;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_set_get_clear() {
        let cache = Cache::in_memory();
        let slot: Slot<String> = cache.slot("token");
        assert_eq!(slot.key(), "token");
        assert_eq!(slot.get().unwrap(), None);

        slot.set(&"cs_1".to_string()).unwrap();
        assert_eq!(slot.get().unwrap().as_deref(), Some("cs_1"));

        slot.clear().unwrap();
        assert_eq!(slot.get().unwrap(), None);
    }

    #[test]
    fn test_slot_take_consumes() {
        let cache = Cache::in_memory();
        let slot: Slot<String> = cache.slot("token");
        slot.set(&"cs_2".to_string()).unwrap();

        assert_eq!(slot.take().unwrap().as_deref(), Some("cs_2"));
        assert_eq!(slot.take().unwrap(), None);
    }

    #[test]
    fn test_get_or_default_tolerates_garbage() {
        let cache = Cache::in_memory();
        cache.set("cart", &serde_json::json!({"not": "a list"})).unwrap();
        let slot: Slot<Vec<u32>> = cache.slot("cart");
        assert!(slot.get().is_err());
        assert_eq!(slot.get_or_default().unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_get_or_discard_removes_garbage() {
        let cache = Cache::in_memory();
        cache.set("token", &serde_json::json!({"unexpected": 1})).unwrap();
        let slot: Slot<Vec<u32>> = cache.slot("token");

        assert_eq!(slot.get_or_discard().unwrap(), None);
        assert!(!cache.exists("token").unwrap());

        slot.set(&vec![7]).unwrap();
        assert_eq!(slot.get_or_discard().unwrap(), Some(vec![7]));
    }

    #[test]
    fn test_get_or_default_missing() {
        let cache = Cache::in_memory();
        let slot: Slot<Vec<u32>> = cache.slot("cart");
        assert!(slot.get_or_default().unwrap().is_empty());
    }
}
