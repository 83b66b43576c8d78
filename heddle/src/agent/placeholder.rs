//! Resolution of step arguments that refer to earlier step outputs.
//!
//! Two forms are recognized in string arguments:
//! - `#E<k>` anywhere in the value is replaced with the output of step `k`;
//! - a `url` argument that is not an absolute URL is replaced with the first URL
//!   found in the upstream output (the planner usually writes "result from step 1").
//!
//! Unresolvable references are left as written; the tool reports the problem.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::links::{first_url, is_absolute_url};

static STEP_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#E(\d+)").expect("valid step reference pattern"));

/// Resolves `args` given a lookup from step id to output and an optional
/// upstream output used for the URL heuristic.
pub fn resolve_args<'a>(
    args: &Map<String, Value>,
    output_of: impl Fn(u32) -> Option<&'a str>,
    upstream: Option<&str>,
) -> Map<String, Value> {
    args.iter()
        .map(|(key, value)| {
            let resolved = match value {
                Value::String(s) => Value::String(resolve_str(key, s, &output_of, upstream)),
                other => other.clone(),
            };
            (key.clone(), resolved)
        })
        .collect()
}

fn resolve_str<'a>(
    key: &str,
    s: &str,
    output_of: &impl Fn(u32) -> Option<&'a str>,
    upstream: Option<&str>,
) -> String {
    if key == "url" && !is_absolute_url(s) {
        let from_ref = STEP_REF_RE
            .captures(s)
            .and_then(|c| c[1].parse::<u32>().ok())
            .and_then(|id| output_of(id))
            .and_then(first_url);
        if let Some(url) = from_ref.or_else(|| upstream.and_then(first_url)) {
            return url;
        }
    }
    STEP_REF_RE
        .replace_all(s, |c: &Captures| {
            c[1].parse::<u32>()
                .ok()
                .and_then(|id| output_of(id))
                .map(str::to_string)
                .unwrap_or_else(|| c[0].to_string())
        })
        .into_owned()
}
