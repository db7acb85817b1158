//! Sanitization of untrusted feed content.
//!
//! Everything a third-party feed hands the application — titles, descriptions,
//! author names, links — passes through this module before it is stored or
//! rendered. Two surfaces:
//!
//! - **Text**: an ordered pipeline of pure passes that removes script/iframe
//!   blocks, inline event handlers, dangerous protocol substrings, and markup
//!   tags, then decodes a small whitelist of HTML entities and strips control
//!   characters.
//! - **URLs**: a scheme allow-list that rejects executable protocols and
//!   normalizes scheme-less input to `https://`.
//!
//! All functions are pure, synchronous, and infallible: unusable input degrades
//! to an empty string rather than an error, so malformed feed data can never
//! propagate unsanitized.
//!
//! # Examples
//!
//! ```
//! use feedguard::sanitize::{sanitize_html_content, sanitize_url};
//!
//! assert_eq!(sanitize_html_content("<b>Breaking</b> news"), "Breaking news");
//! assert_eq!(sanitize_url("javascript:alert(1)"), "");
//! assert_eq!(sanitize_url("example.com/feed"), "https://example.com/feed");
//! ```

mod content;
mod url;

pub use content::{
    sanitize_article_description, sanitize_feed_content, sanitize_html_content, sanitize_title,
    DEFAULT_DESCRIPTION_LIMIT,
};
pub use url::sanitize_url;
