//! URL extraction from free-form tool output.
//!
//! Search tools print results as `URL: ...` lines, JSON objects with `url`
//! fields, or plain text with links; all of them are matched by one pattern.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>\)\]\}]+"#).expect("valid URL pattern"));

/// All http(s) URLs in `text`, in order of appearance, without duplicates.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(&['.', ',', ';', ':'][..]);
        if !out.iter().any(|u| u == url) {
            out.push(url.to_string());
        }
    }
    out
}

pub fn first_url(text: &str) -> Option<String> {
    extract_urls(text).into_iter().next()
}

pub fn is_absolute_url(s: &str) -> bool {
    let s = s.trim();
    s.starts_with("http://") || s.starts_with("https://")
}
