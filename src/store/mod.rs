//! Key-value storage port for the migration engine.
//!
//! The engine only ever needs three operations over opaque strings, so the
//! port is a small trait rather than a concrete database handle. [`Database`]
//! is the SQLite-backed production store; [`MemoryStore`] backs deterministic,
//! storage-free unit tests.

mod db;
mod memory;

use anyhow::Result;

pub use db::{Database, DatabaseError};
pub use memory::MemoryStore;

/// Key-value storage as seen by the migration engine.
///
/// Keys use the dotted convention (`feeds.list`, `feeds.version`). A missing
/// key is `Ok(None)`, never an error — absence is a legitimate state.
#[allow(async_fn_in_trait)]
pub trait StatePort {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

impl<S: StatePort + Sync> StatePort for &S {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }
}
