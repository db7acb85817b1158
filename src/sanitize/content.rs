use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::url::sanitize_url;

// Script and iframe blocks are removed first, content included, so no later
// pass ever sees a partially dismantled payload. Non-greedy match stops at the
// first closing tag and tolerates stray `<` inside the block.
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("valid script block regex"));
static IFRAME_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<iframe\b.*?</iframe>").expect("valid iframe block regex"));
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)on\w+\s*=\s*["'][^"']*["']"#).expect("valid event handler regex")
});
static DANGEROUS_PROTOCOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)javascript:|vbscript:|data:text/html").expect("valid protocol regex")
});
static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup tag regex"));

type StepFn = for<'a> fn(&'a str) -> Cow<'a, str>;

struct PipelineStep {
    name: &'static str,
    run: StepFn,
}

/// The sanitization passes, in the only order that is safe.
///
/// Entity decoding must run after tag stripping: a doubly-encoded payload like
/// `&amp;lt;script&amp;gt;` then degrades to literal angle brackets as text
/// instead of re-forming a tag a later pass would have to catch. Protocol
/// deletion runs before tag stripping so occurrences buried in attribute
/// values are caught even when the handler regex misses them.
const PIPELINE: &[PipelineStep] = &[
    PipelineStep {
        name: "strip_script_blocks",
        run: strip_script_blocks,
    },
    PipelineStep {
        name: "strip_iframe_blocks",
        run: strip_iframe_blocks,
    },
    PipelineStep {
        name: "strip_event_handlers",
        run: strip_event_handlers,
    },
    PipelineStep {
        name: "strip_dangerous_protocols",
        run: strip_dangerous_protocols,
    },
    PipelineStep {
        name: "strip_markup_tags",
        run: strip_markup_tags,
    },
    PipelineStep {
        name: "decode_entities",
        run: decode_entities,
    },
    PipelineStep {
        name: "strip_control_chars",
        run: strip_control_chars,
    },
    PipelineStep {
        name: "trim_edges",
        run: trim_edges,
    },
];

fn strip_script_blocks(s: &str) -> Cow<'_, str> {
    SCRIPT_BLOCK.replace_all(s, "")
}

fn strip_iframe_blocks(s: &str) -> Cow<'_, str> {
    IFRAME_BLOCK.replace_all(s, "")
}

fn strip_event_handlers(s: &str) -> Cow<'_, str> {
    EVENT_HANDLER.replace_all(s, "")
}

/// Deletes (not replaces) the protocol substrings wherever they appear, which
/// also catches occurrences inside attribute values the handler pass missed.
fn strip_dangerous_protocols(s: &str) -> Cow<'_, str> {
    DANGEROUS_PROTOCOL.replace_all(s, "")
}

fn strip_markup_tags(s: &str) -> Cow<'_, str> {
    MARKUP_TAG.replace_all(s, "")
}

/// Decodes the fixed entity whitelist. Order matters: `&amp;` before
/// `&lt;`/`&gt;` so a doubly-encoded payload degrades to plain text.
fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let decoded = s
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/");
    Cow::Owned(decoded)
}

/// ASCII control characters that must not survive sanitization. Tab, newline,
/// and carriage return are kept; the final trim removes them at the edges.
fn is_stripped_control(b: u8) -> bool {
    b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}

fn strip_control_chars(s: &str) -> Cow<'_, str> {
    // Fast path: feed text is almost always clean.
    if !s.bytes().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .filter(|&c| !(c.is_ascii() && is_stripped_control(c as u8)))
            .collect(),
    )
}

fn trim_edges(s: &str) -> Cow<'_, str> {
    Cow::Borrowed(s.trim())
}

/// Sanitizes text that may contain HTML markup, script content, or dangerous
/// protocol substrings, leaving only plain text safe to store and render.
///
/// Runs the ordered [`PIPELINE`] of pure passes; see the pipeline docs for why
/// the order is load-bearing. Empty input yields an empty string; the function
/// never fails.
pub fn sanitize_html_content(text: &str) -> String {
    let mut current = text.to_owned();
    for step in PIPELINE {
        let out = (step.run)(current.as_str());
        if matches!(out, Cow::Owned(_)) {
            tracing::trace!(step = step.name, "sanitizer pass rewrote content");
        }
        current = out.into_owned();
    }
    current
}

/// Default character limit for article descriptions.
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 300;

const ELLIPSIS: &str = "...";

/// Sanitizes an article description and truncates it to `max_len` characters.
///
/// If the sanitized text is longer than `max_len`, it is cut at `max_len`
/// characters; when the last space in that prefix sits at or after 80% of the
/// limit, the cut backs up to the space so no word is split. Either way the
/// ellipsis marker is appended, so the result never exceeds `max_len + 3`
/// characters.
pub fn sanitize_article_description(text: &str, max_len: usize) -> String {
    let sanitized = sanitize_html_content(text);

    let Some((cut_byte, _)) = sanitized.char_indices().nth(max_len) else {
        return sanitized;
    };

    let hard_cut = &sanitized[..cut_byte];
    if let Some(space_byte) = hard_cut.rfind(' ') {
        let space_pos = hard_cut[..space_byte].chars().count();
        // Back up to the space only when it lands in the trailing 20%.
        if space_pos * 5 >= max_len * 4 {
            return format!("{}{}", &hard_cut[..space_byte], ELLIPSIS);
        }
    }
    format!("{hard_cut}{ELLIPSIS}")
}

/// Sanitizes a feed or article title. Titles get no truncation.
pub fn sanitize_title(title: &str) -> String {
    sanitize_html_content(title)
}

/// Sanitizes the known untrusted fields of an arbitrary keyed record.
///
/// Applies the field-specific sanitizers to `title`, `description`, `link`,
/// `author`, and `source_title` when present as strings. Every other key, and
/// any non-string value, passes through untouched. Returns a new map; the
/// input is not mutated.
pub fn sanitize_feed_content(record: &Map<String, Value>) -> Map<String, Value> {
    let mut out = record.clone();
    for (key, value) in out.iter_mut() {
        let Value::String(text) = value else { continue };
        let cleaned = match key.as_str() {
            "title" | "source_title" => sanitize_title(text),
            "description" => sanitize_article_description(text, DEFAULT_DESCRIPTION_LIMIT),
            "link" => sanitize_url(text),
            "author" => sanitize_html_content(text),
            _ => continue,
        };
        *value = Value::String(cleaned);
    }
    out
}
