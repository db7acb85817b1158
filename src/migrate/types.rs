use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::defaults::{has_only_legacy_feeds, CURRENT_FEEDS_VERSION};

/// A single feed subscription. `url` is the identity; no two entries of a
/// collection share one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Topical tag assigned by the categorization collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            category: None,
        }
    }

    pub fn with_category(url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            category: Some(category.into()),
        }
    }
}

/// The four logical states the stored (version marker, feed collection) pair
/// can be in at load time. Computed once, up front, so future version-bump
/// rules stay additive match arms instead of nested conditionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationState {
    /// No version marker and the collection is exactly the two legacy default
    /// feeds — the user never customized anything.
    UnversionedLegacyOnly,
    /// No version marker but the collection deviates from the legacy defaults
    /// (including being empty): treated as deliberate customization.
    UnversionedCustom,
    /// The stored marker equals the current version constant.
    Current,
    /// A marker is present but differs from the current constant. Any
    /// mismatch counts; no semantic-version ordering is attempted.
    Stale(String),
}

impl MigrationState {
    pub fn detect(stored_version: Option<&str>, feeds: &[FeedSource]) -> Self {
        match stored_version {
            None if has_only_legacy_feeds(feeds) => MigrationState::UnversionedLegacyOnly,
            None => MigrationState::UnversionedCustom,
            Some(v) if v == CURRENT_FEEDS_VERSION => MigrationState::Current,
            Some(v) => MigrationState::Stale(v.to_owned()),
        }
    }
}

/// Why a migration run produced the result it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationReason {
    DefaultsSeeded,
    LegacyDefaultsUpgraded,
    CustomFeedsCategorized,
    VersionRefreshed,
    AlreadyCurrent,
}

impl MigrationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationReason::DefaultsSeeded => {
                "Stored curated default feeds for a new installation"
            }
            MigrationReason::LegacyDefaultsUpgraded => {
                "Upgraded from legacy default feeds to new curated collection"
            }
            MigrationReason::CustomFeedsCategorized => {
                "Applied automatic categorization to existing custom feeds"
            }
            MigrationReason::VersionRefreshed => "Updated feeds version and applied categorization",
            MigrationReason::AlreadyCurrent => "Feeds are already up to date",
        }
    }
}

impl fmt::Display for MigrationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one migration run. Only `feeds` (and the new version marker) are
/// persisted; the record itself is a value type for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    pub feeds: Vec<FeedSource>,
    pub migrated: bool,
    pub reason: MigrationReason,
}

/// Read-only projection of the engine's version state, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub stored_version: Option<String>,
    pub current_version: &'static str,
    pub needs_migration: bool,
}

/// Set-union of two collections keyed by `url`.
///
/// Entries already present are never duplicated or overwritten; new entries
/// are appended in their incoming order after all existing entries. This is
/// where the collection's URL-uniqueness invariant is enforced.
pub fn add_feeds_to_collection(
    existing: Vec<FeedSource>,
    incoming: Vec<FeedSource>,
) -> Vec<FeedSource> {
    let mut seen: HashSet<String> = existing.iter().map(|f| f.url.clone()).collect();
    let mut merged = existing;
    for feed in incoming {
        if seen.insert(feed.url.clone()) {
            merged.push(feed);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn urls(feeds: &[FeedSource]) -> Vec<&str> {
        feeds.iter().map(|f| f.url.as_str()).collect()
    }

    #[test]
    fn test_detect_legacy_only() {
        let feeds = vec![
            FeedSource::new("https://www.wired.com/feed/rss"),
            FeedSource::new("https://www.theverge.com/rss/index.xml"),
        ];
        assert_eq!(
            MigrationState::detect(None, &feeds),
            MigrationState::UnversionedLegacyOnly
        );
    }

    #[test]
    fn test_detect_custom_when_extra_feed() {
        let feeds = vec![
            FeedSource::new("https://www.theverge.com/rss/index.xml"),
            FeedSource::new("https://www.wired.com/feed/rss"),
            FeedSource::new("https://example.com/feed"),
        ];
        assert_eq!(
            MigrationState::detect(None, &feeds),
            MigrationState::UnversionedCustom
        );
    }

    #[test]
    fn test_detect_custom_when_empty() {
        assert_eq!(
            MigrationState::detect(None, &[]),
            MigrationState::UnversionedCustom
        );
    }

    #[test]
    fn test_detect_current() {
        assert_eq!(
            MigrationState::detect(Some(CURRENT_FEEDS_VERSION), &[]),
            MigrationState::Current
        );
    }

    #[test]
    fn test_detect_stale_any_mismatch() {
        // String inequality only; "newer" versions are stale too.
        assert_eq!(
            MigrationState::detect(Some("1.0.0"), &[]),
            MigrationState::Stale("1.0.0".to_owned())
        );
        assert_eq!(
            MigrationState::detect(Some("99.0.0"), &[]),
            MigrationState::Stale("99.0.0".to_owned())
        );
    }

    #[test]
    fn test_version_marker_beats_feed_contents() {
        // A marked store is never "legacy only", whatever the feeds look like.
        let feeds = vec![
            FeedSource::new("https://www.theverge.com/rss/index.xml"),
            FeedSource::new("https://www.wired.com/feed/rss"),
        ];
        assert_eq!(
            MigrationState::detect(Some("1.0.0"), &feeds),
            MigrationState::Stale("1.0.0".to_owned())
        );
    }

    #[test]
    fn test_union_dedup_keeps_existing_order() {
        let existing = vec![FeedSource::new("a")];
        let incoming = vec![FeedSource::new("a"), FeedSource::new("b")];
        let merged = add_feeds_to_collection(existing, incoming);
        assert_eq!(urls(&merged), vec!["a", "b"]);
    }

    #[test]
    fn test_union_never_overwrites_existing_entry() {
        let mut customized = FeedSource::new("a");
        customized.title = Some("My title".to_owned());
        let incoming = vec![FeedSource {
            url: "a".to_owned(),
            title: Some("Incoming title".to_owned()),
            category: None,
        }];

        let merged = add_feeds_to_collection(vec![customized.clone()], incoming);
        assert_eq!(merged, vec![customized]);
    }

    #[test]
    fn test_union_dedups_within_incoming() {
        let merged = add_feeds_to_collection(
            vec![],
            vec![FeedSource::new("x"), FeedSource::new("x"), FeedSource::new("y")],
        );
        assert_eq!(urls(&merged), vec!["x", "y"]);
    }

    #[test]
    fn test_feed_source_json_roundtrip_skips_absent_fields() {
        let feed = FeedSource::new("https://example.com/feed");
        let json = serde_json::to_string(&feed).unwrap();
        assert_eq!(json, r#"{"url":"https://example.com/feed"}"#);

        let parsed: FeedSource = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, feed);
    }

    #[test]
    fn test_reason_strings_are_stable() {
        assert_eq!(
            MigrationReason::AlreadyCurrent.to_string(),
            "Feeds are already up to date"
        );
        assert_eq!(
            MigrationReason::LegacyDefaultsUpgraded.to_string(),
            "Upgraded from legacy default feeds to new curated collection"
        );
    }
}
