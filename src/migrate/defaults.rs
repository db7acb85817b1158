use super::types::FeedSource;

/// Version of the curated default feeds. Bump when the default set changes.
pub const CURRENT_FEEDS_VERSION: &str = "2.0.0";

/// Storage key holding the JSON-encoded feed collection.
pub const FEEDS_KEY: &str = "feeds.list";

/// Storage key holding the feed-collection version marker.
pub const FEEDS_VERSION_KEY: &str = "feeds.version";

/// The two default feeds shipped by v1 installations. An unversioned store
/// containing exactly these (in any order) is a never-customized install.
pub const LEGACY_DEFAULT_FEED_URLS: [&str; 2] = [
    "https://www.theverge.com/rss/index.xml",
    "https://www.wired.com/feed/rss",
];

/// The curated default collection for the current version, topical tags
/// included.
pub fn default_feeds() -> Vec<FeedSource> {
    [
        ("https://www.theverge.com/rss/index.xml", "Tech"),
        ("https://www.wired.com/feed/rss", "Tech"),
        ("https://techcrunch.com/feed/", "Tech"),
        ("https://www.cnet.com/rss/all/", "Tech"),
        ("https://tecnoblog.net/feed/", "Tech"),
        ("https://meiobit.com/feed/", "Tech"),
        ("https://www.xda-developers.com/feed/", "Tech"),
        ("https://itsfoss.com/rss/", "Tech"),
        ("https://arstechnica.com/feed/", "Tech"),
        ("https://www.omgubuntu.co.uk/feed", "Tech"),
        ("https://www.omglinux.com/feed/", "Tech"),
        ("https://diolinux.com.br/feed", "Tech"),
        ("https://www.polygon.com/feed/", "Entertainment"),
        ("https://jogabilida.de/feed/", "Entertainment"),
        ("https://news.mit.edu/rss/feed", "Science"),
        ("https://www.tomsguide.com/feeds.xml", "Reviews"),
    ]
    .into_iter()
    .map(|(url, category)| FeedSource::with_category(url, category))
    .collect()
}

/// True when the collection is exactly the two legacy default feeds, compared
/// as an order-independent set.
pub fn has_only_legacy_feeds(feeds: &[FeedSource]) -> bool {
    if feeds.len() != 2 {
        return false;
    }
    let mut urls: Vec<&str> = feeds.iter().map(|f| f.url.as_str()).collect();
    urls.sort_unstable();
    let mut legacy = LEGACY_DEFAULT_FEED_URLS;
    legacy.sort_unstable();
    urls == legacy
}
