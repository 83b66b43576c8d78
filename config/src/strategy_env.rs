//! Strategy config patches from environment variables.
//!
//! `<APP>__<STRATEGY>__<KEY>=<value>` sets one key of one strategy's config, e.g.
//! `HEDDLE__PLAN_EXECUTE__MAX_REPLANS=1` patches `max_replans` of `plan-execute`.
//! Strategy segments map `_` to `-`; keys are lowercased. Values are read as JSON
//! when they parse (`4`, `false`, `["a"]`) and as plain strings otherwise.

use std::collections::HashMap;

use serde_json::{Map, Value};

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Splits `key` into `(strategy, config key)` when it has the `<APP>__` prefix.
fn split_key(prefix: &str, key: &str) -> Option<(String, String)> {
    let rest = key.strip_prefix(prefix)?;
    let (strategy, field) = rest.split_once("__")?;
    if strategy.is_empty() || field.is_empty() {
        return None;
    }
    Some((
        strategy.to_ascii_lowercase().replace('_', "-"),
        field.to_ascii_lowercase(),
    ))
}

/// Collects patches from `vars`. Later duplicates of the same key win.
pub(crate) fn patches(
    app_name: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, Map<String, Value>> {
    let prefix = format!("{}__", app_name.to_ascii_uppercase());
    let mut out: HashMap<String, Map<String, Value>> = HashMap::new();
    for (key, raw) in vars {
        if let Some((strategy, field)) = split_key(&prefix, &key) {
            out.entry(strategy).or_default().insert(field, parse_value(&raw));
        }
    }
    out
}
