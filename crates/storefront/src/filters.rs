//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

/// Matches any HTML tag.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Remove HTML tags and decode the common entities.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    TAG_RE
        .replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Plain text from Wix rich-text copy.
///
/// Usage in templates: `{{ product.short_description|strip_html }}`
#[askama::filter_fn]
pub fn strip_html(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(strip_tags(&value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Gold <b>hoops</b></p>"), "Gold hoops");
        assert_eq!(strip_tags("Silver&nbsp;&amp;&nbsp;pearl"), "Silver & pearl");
        assert_eq!(strip_tags("&amp;lt;"), "&lt;");
        assert_eq!(strip_tags(""), "");
    }
}
