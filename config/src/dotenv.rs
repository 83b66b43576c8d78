//! Project `.env` reader.
//!
//! Accepted line forms: `KEY=value`, `export KEY=value`, `KEY="quoted"` and
//! `KEY='quoted'`. Blank lines and `#` comment lines are skipped, and an unquoted
//! value ends at ` #`. Lines without `=` or with an empty key are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DOTENV_FILE: &str = ".env";

fn dotenv_file(dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let path = dir.join(DOTENV_FILE);
    path.is_file().then_some(path)
}

/// Value with quotes removed. Double quotes honour `\"`; single quotes are literal.
fn unquote(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return inner.replace("\\\"", "\"");
    }
    if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        return inner.to_string();
    }
    match raw.find(" #") {
        Some(i) => raw[..i].trim_end().to_string(),
        None => raw.to_string(),
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unquote(value.trim())))
}

pub(crate) fn parse(content: &str) -> HashMap<String, String> {
    content.lines().filter_map(parse_line).collect()
}

/// Reads `.env` from `dir` (or the working directory). No file means no entries.
pub(crate) fn read(dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match dotenv_file(dir) {
        Some(path) => Ok(parse(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}
