//! Versioned migration of the persisted feed collection.
//!
//! On every application load the engine inspects the stored version marker and
//! feed collection, decides which of four states it is looking at, and performs
//! at most one transition to bring the collection to the current schema. The
//! guiding invariant: a customization the user made is never silently
//! discarded — only the known legacy default pair may be replaced wholesale.

mod categorize;
mod defaults;
mod engine;
mod types;

pub use categorize::{Categorizer, KeywordCategorizer};
pub use defaults::{
    default_feeds, has_only_legacy_feeds, CURRENT_FEEDS_VERSION, FEEDS_KEY, FEEDS_VERSION_KEY,
    LEGACY_DEFAULT_FEED_URLS,
};
pub use engine::{decode_feeds, encode_feeds, MigrationEngine};
pub use types::{
    add_feeds_to_collection, FeedSource, MigrationReason, MigrationResult, MigrationState,
    MigrationStatus,
};
