use super::types::FeedSource;

/// The categorization collaborator: assigns topical tags to feeds.
///
/// Contract: pure, same-length output, order-preserving, touches only the
/// `category` field — URLs and titles pass through untouched. The engine
/// treats the implementation as opaque; tests pass plain closures.
pub trait Categorizer {
    fn categorize(&self, feeds: Vec<FeedSource>) -> Vec<FeedSource>;
}

impl<F> Categorizer for F
where
    F: Fn(Vec<FeedSource>) -> Vec<FeedSource>,
{
    fn categorize(&self, feeds: Vec<FeedSource>) -> Vec<FeedSource> {
        self(feeds)
    }
}

/// URL-keyword table behind [`KeywordCategorizer`]. First match wins, so the
/// specific site names come before the generic fallbacks.
const KEYWORD_CATEGORIES: &[(&str, &str)] = &[
    ("theverge", "Tech"),
    ("wired", "Tech"),
    ("techcrunch", "Tech"),
    ("cnet", "Tech"),
    ("tecnoblog", "Tech"),
    ("meiobit", "Tech"),
    ("xda-developers", "Tech"),
    ("itsfoss", "Tech"),
    ("arstechnica", "Tech"),
    ("omgubuntu", "Tech"),
    ("omglinux", "Tech"),
    ("diolinux", "Tech"),
    ("polygon", "Entertainment"),
    ("jogabilida", "Entertainment"),
    ("news.mit.edu", "Science"),
    ("tomsguide", "Reviews"),
    ("linux", "Tech"),
    ("game", "Entertainment"),
    ("science", "Science"),
    ("review", "Reviews"),
    ("tech", "Tech"),
];

/// Keyword-based categorizer used by the application bootstrap.
///
/// Feeds whose URL matches no keyword keep whatever category they already
/// have.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordCategorizer;

impl Categorizer for KeywordCategorizer {
    fn categorize(&self, feeds: Vec<FeedSource>) -> Vec<FeedSource> {
        feeds
            .into_iter()
            .map(|mut feed| {
                let lower = feed.url.to_lowercase();
                if let Some((_, category)) = KEYWORD_CATEGORIES
                    .iter()
                    .find(|(keyword, _)| lower.contains(keyword))
                {
                    feed.category = Some((*category).to_owned());
                }
                feed
            })
            .collect()
    }
}
