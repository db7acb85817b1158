use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::StatePort;

/// In-memory [`StatePort`] implementation.
///
/// Backs engine unit tests that need deterministic storage without touching
/// SQLite. Not used in production.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl StatePort for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("feeds.version").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_remove_roundtrip() {
        let store = MemoryStore::new();
        store.set("feeds.version", "2.0.0").await.unwrap();
        assert_eq!(
            store.get("feeds.version").await.unwrap(),
            Some("2.0.0".to_string())
        );

        store.remove("feeds.version").await.unwrap();
        assert_eq!(store.get("feeds.version").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::new();
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("two".to_string()));
    }
}
