//! Startup configuration for Heddle.
//!
//! Two things are loaded:
//!
//! - **Environment**: `load_and_apply` fills process variables that are not set yet,
//!   first from the project `.env`, then from the `[env]` table of
//!   `$XDG_CONFIG_HOME/<app>/config.toml`. A variable already in the environment is
//!   never replaced.
//! - **Strategy patches**: `strategy_patches` returns one JSON object per strategy,
//!   built from the `[strategies.<name>]` tables of the same file and overlaid with
//!   `<APP>__<STRATEGY>__<KEY>` variables (so `.env` and the shell can patch single
//!   keys). Call it after `load_and_apply` to see `.env` entries.

mod dotenv;
mod strategy_env;
mod xdg_toml;

pub use xdg_toml::load_strategy_tables;

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
    #[error("strategy table: {0}")]
    StrategyTable(String),
}

/// Entries to set: `.env` first, XDG second, skipping keys `is_set` reports. Sorted by key.
fn missing_entries(
    dotenv: HashMap<String, String>,
    xdg: HashMap<String, String>,
    is_set: impl Fn(&str) -> bool,
) -> Vec<(String, String)> {
    let mut merged = xdg;
    merged.extend(dotenv);
    let mut out: Vec<(String, String)> =
        merged.into_iter().filter(|(k, _)| !is_set(k)).collect();
    out.sort();
    out
}

/// Sets missing variables from `.env` (in `override_dir` or the working directory)
/// and the XDG `[env]` table. Returns the keys it set, sorted.
pub fn load_and_apply(
    app_name: &str,
    override_dir: Option<&Path>,
) -> Result<Vec<String>, LoadError> {
    let xdg = xdg_toml::load_env_map(app_name)?;
    let dotenv = dotenv::read(override_dir).map_err(LoadError::DotenvRead)?;
    let entries = missing_entries(dotenv, xdg, |k| std::env::var_os(k).is_some());
    let mut applied = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        std::env::set_var(&key, value);
        applied.push(key);
    }
    Ok(applied)
}

/// Config patches per strategy name: XDG `[strategies.*]` tables with
/// `<APP>__<STRATEGY>__<KEY>` variables applied on top.
pub fn strategy_patches(app_name: &str) -> Result<HashMap<String, Value>, LoadError> {
    let mut tables = xdg_toml::load_strategy_tables(app_name)?;
    for (strategy, fields) in strategy_env::patches(app_name, std::env::vars()) {
        let entry = tables
            .entry(strategy)
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(map) = entry {
            map.extend(fields);
        }
    }
    Ok(tables)
}

/// Serializes tests that mutate the process environment.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Writes `config.toml` for app `heddle` under a fresh XDG dir.
    fn xdg_with(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("heddle");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), content).unwrap();
        dir
    }

    /// Runs `f` with `vars` set, restoring the previous values afterwards.
    fn with_vars<T>(vars: &[(&str, Option<PathBuf>)], f: impl FnOnce() -> T) -> T {
        let prev: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (k.to_string(), env::var(k).ok()))
            .collect();
        for (k, v) in vars {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
        let out = f();
        for (k, v) in prev {
            match v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
        out
    }

    #[test]
    fn dotenv_beats_xdg_and_set_keys_are_skipped() {
        let out = missing_entries(
            map(&[("HEDDLE_STRATEGY", "rewoo"), ("HEDDLE_LATS_MAX_DEPTH", "2")]),
            map(&[("HEDDLE_STRATEGY", "lats"), ("HEDDLE_REWOO_MAX_STEPS", "4")]),
            |k| k == "HEDDLE_LATS_MAX_DEPTH",
        );
        assert_eq!(
            out,
            vec![
                ("HEDDLE_REWOO_MAX_STEPS".to_string(), "4".to_string()),
                ("HEDDLE_STRATEGY".to_string(), "rewoo".to_string()),
            ]
        );
    }

    #[test]
    fn load_and_apply_reports_applied_keys() {
        let _guard = env_lock();
        let xdg = xdg_with("[env]\nCONFIG_TEST_FROM_XDG = \"x\"\nCONFIG_TEST_SHARED = \"xdg\"\n");
        let project = tempfile::tempdir().unwrap();
        std::fs::write(
            project.path().join(".env"),
            "CONFIG_TEST_SHARED=dotenv\nCONFIG_TEST_PRESET=dotenv\n",
        )
        .unwrap();

        let (applied, shared, preset) = with_vars(
            &[
                ("XDG_CONFIG_HOME", Some(xdg.path().to_path_buf())),
                ("CONFIG_TEST_PRESET", Some(PathBuf::from("shell"))),
                ("CONFIG_TEST_FROM_XDG", None),
                ("CONFIG_TEST_SHARED", None),
            ],
            || {
                let applied = load_and_apply("heddle", Some(project.path())).unwrap();
                let shared = env::var("CONFIG_TEST_SHARED").unwrap();
                let preset = env::var("CONFIG_TEST_PRESET").unwrap();
                env::remove_var("CONFIG_TEST_FROM_XDG");
                env::remove_var("CONFIG_TEST_SHARED");
                (applied, shared, preset)
            },
        );

        assert_eq!(applied, vec!["CONFIG_TEST_FROM_XDG", "CONFIG_TEST_SHARED"]);
        assert_eq!(shared, "dotenv");
        assert_eq!(preset, "shell");
    }

    #[test]
    fn missing_sources_apply_nothing() {
        let _guard = env_lock();
        let xdg = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let applied = with_vars(&[("XDG_CONFIG_HOME", Some(xdg.path().to_path_buf()))], || {
            load_and_apply("heddle", Some(project.path()))
        })
        .unwrap();
        assert!(applied.is_empty());
    }

    #[test]
    fn invalid_xdg_toml_is_a_parse_error() {
        let _guard = env_lock();
        let xdg = xdg_with("invalid [[[\n");
        let result = with_vars(&[("XDG_CONFIG_HOME", Some(xdg.path().to_path_buf()))], || {
            load_and_apply("heddle", None)
        });
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn strategy_patches_overlay_env_on_tables() {
        let _guard = env_lock();
        let xdg = xdg_with(
            "[strategies.react]\nmax_iterations = 8\nfollow_links = false\n\n\
             [strategies.rewoo]\nmax_steps = 6\n",
        );
        let patches = with_vars(
            &[
                ("XDG_CONFIG_HOME", Some(xdg.path().to_path_buf())),
                ("HEDDLE__REACT__MAX_ITERATIONS", Some(PathBuf::from("3"))),
                ("HEDDLE__LATS__ENABLE_REFLECTION", Some(PathBuf::from("false"))),
            ],
            || strategy_patches("heddle"),
        )
        .unwrap();

        assert_eq!(patches.len(), 3);
        assert_eq!(
            patches["react"],
            serde_json::json!({"max_iterations": 3, "follow_links": false})
        );
        assert_eq!(patches["rewoo"], serde_json::json!({"max_steps": 6}));
        assert_eq!(patches["lats"], serde_json::json!({"enable_reflection": false}));
    }
}
