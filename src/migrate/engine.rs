use anyhow::{Context, Result};

use super::categorize::Categorizer;
use super::defaults::{default_feeds, CURRENT_FEEDS_VERSION, FEEDS_KEY, FEEDS_VERSION_KEY};
use super::types::{
    FeedSource, MigrationReason, MigrationResult, MigrationState, MigrationStatus,
};
use crate::store::StatePort;

/// Encode a feed collection into the stored wire format (a JSON array).
pub fn encode_feeds(feeds: &[FeedSource]) -> Result<String> {
    serde_json::to_string(feeds).context("failed to encode feed collection")
}

/// Decode a stored feed collection.
///
/// A decode failure means the stored blob is corrupt; the engine propagates
/// the error and leaves the blob untouched, so the caller decides whether to
/// substitute an empty collection.
pub fn decode_feeds(raw: &str) -> Result<Vec<FeedSource>> {
    serde_json::from_str(raw).context("stored feed collection is not valid JSON")
}

/// Runs the feed-collection migration state machine against a storage port.
///
/// Reads the version marker and feed collection, performs at most one
/// transition per run, and writes back the migrated collection plus the
/// current version marker. The marker only ever advances to the single
/// current constant; there is no rollback path.
pub struct MigrationEngine<S, C> {
    store: S,
    categorizer: C,
}

impl<S: StatePort, C: Categorizer> MigrationEngine<S, C> {
    pub fn new(store: S, categorizer: C) -> Self {
        Self { store, categorizer }
    }

    /// The stored version marker, `None` when the install is unversioned.
    pub async fn stored_version(&self) -> Result<Option<String>> {
        self.store.get(FEEDS_VERSION_KEY).await
    }

    /// Load and decode the stored feed collection. `Ok(None)` when nothing is
    /// stored; a decode error propagates (see [`decode_feeds`]).
    pub async fn load_feeds(&self) -> Result<Option<Vec<FeedSource>>> {
        match self.store.get(FEEDS_KEY).await? {
            None => Ok(None),
            Some(raw) => decode_feeds(&raw).map(Some),
        }
    }

    /// Persist a feed collection under the feeds key.
    pub async fn store_feeds(&self, feeds: &[FeedSource]) -> Result<()> {
        let encoded = encode_feeds(feeds)?;
        self.store.set(FEEDS_KEY, &encoded).await
    }

    /// Load the stored collection and run the state machine on it.
    pub async fn migrate(&self) -> Result<MigrationResult> {
        let current = self.load_feeds().await?.unwrap_or_default();
        self.migrate_collection(current).await
    }

    /// Run the state machine on a collection the caller already loaded (or
    /// substituted, after a decode failure).
    ///
    /// Idempotent: a second run with no intervening edits observes `Current`
    /// and returns `migrated = false` without touching storage.
    pub async fn migrate_collection(&self, current: Vec<FeedSource>) -> Result<MigrationResult> {
        let stored_version = self.stored_version().await?;
        let state = MigrationState::detect(stored_version.as_deref(), &current);
        tracing::debug!(?state, feeds = current.len(), "evaluated stored feed collection");

        let result = match state {
            MigrationState::Current => {
                return Ok(MigrationResult {
                    feeds: current,
                    migrated: false,
                    reason: MigrationReason::AlreadyCurrent,
                });
            }
            // Never-customized install: the legacy pair carries no user
            // preference, so the richer curated set replaces it wholesale.
            MigrationState::UnversionedLegacyOnly => MigrationResult {
                feeds: default_feeds(),
                migrated: true,
                reason: MigrationReason::LegacyDefaultsUpgraded,
            },
            // Any deviation from the legacy defaults is user customization:
            // keep the collection verbatim, only assign topical tags.
            MigrationState::UnversionedCustom => MigrationResult {
                feeds: self.categorizer.categorize(current),
                migrated: true,
                reason: MigrationReason::CustomFeedsCategorized,
            },
            // Fallback for every future version bump without a specific rule.
            // New rules keyed on the stored version slot in above this arm.
            MigrationState::Stale(_) => MigrationResult {
                feeds: self.categorizer.categorize(current),
                migrated: true,
                reason: MigrationReason::VersionRefreshed,
            },
        };

        self.store_feeds(&result.feeds).await?;
        self.store.set(FEEDS_VERSION_KEY, CURRENT_FEEDS_VERSION).await?;
        tracing::info!(
            reason = %result.reason,
            feeds = result.feeds.len(),
            "migrated feed collection"
        );
        Ok(result)
    }

    /// First-load entry point used by the application bootstrap.
    ///
    /// A store with nothing under the feeds key is a fresh install: when
    /// `seed_defaults` is enabled the curated default set is stored outright,
    /// otherwise an empty collection goes through the state machine. A stored
    /// blob that fails to decode is logged and replaced by an empty collection
    /// here, and only here — [`migrate`](Self::migrate) itself propagates the
    /// decode error.
    pub async fn bootstrap(&self, seed_defaults: bool) -> Result<MigrationResult> {
        match self.store.get(FEEDS_KEY).await? {
            None if seed_defaults => {
                let feeds = self.reset_to_defaults().await?;
                Ok(MigrationResult {
                    feeds,
                    migrated: true,
                    reason: MigrationReason::DefaultsSeeded,
                })
            }
            stored => {
                let collection = match stored.as_deref() {
                    None => Vec::new(),
                    Some(raw) => match decode_feeds(raw) {
                        Ok(feeds) => feeds,
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "stored feed collection is unreadable, continuing with an empty collection"
                            );
                            Vec::new()
                        }
                    },
                };
                self.migrate_collection(collection).await
            }
        }
    }

    /// User-invoked escape hatch: unconditionally store the curated default
    /// set and the current version marker, and return the defaults. Not part
    /// of the automatic state machine.
    pub async fn reset_to_defaults(&self) -> Result<Vec<FeedSource>> {
        let feeds = default_feeds();
        self.store_feeds(&feeds).await?;
        self.store.set(FEEDS_VERSION_KEY, CURRENT_FEEDS_VERSION).await?;
        tracing::info!(feeds = feeds.len(), "reset feed collection to curated defaults");
        Ok(feeds)
    }

    /// Read-only diagnostics projection; never mutates state.
    pub async fn status(&self) -> Result<MigrationStatus> {
        let stored_version = self.stored_version().await?;
        let needs_migration = stored_version.as_deref() != Some(CURRENT_FEEDS_VERSION);
        Ok(MigrationStatus {
            stored_version,
            current_version: CURRENT_FEEDS_VERSION,
            needs_migration,
        })
    }
}
