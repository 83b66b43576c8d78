//! Load `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` table and the
//! `[strategies.<name>]` tables.
//!
//! ```toml
//! [env]
//! HEDDLE_STRATEGY = "rewoo"
//!
//! [strategies.react]
//! max_iterations = 8
//! follow_links = false
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

/// `$XDG_CONFIG_HOME` when set, else the platform config dir.
fn config_home() -> Result<PathBuf, LoadError> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into())),
    }
}

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    if path.exists() {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    strategies: HashMap<String, toml::Value>,
}

fn read_config(app_name: &str) -> Result<ConfigFile, LoadError> {
    let path = match xdg_config_path(app_name)? {
        Some(p) => p,
        None => return Ok(ConfigFile::default()),
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    Ok(toml::from_str(&content)?)
}

/// Returns env key-value pairs from `[env]` section. Missing file or empty section returns empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    Ok(read_config(app_name)?.env)
}

/// Returns each `[strategies.<name>]` table as a JSON object keyed by strategy name.
pub fn load_strategy_tables(
    app_name: &str,
) -> Result<HashMap<String, serde_json::Value>, LoadError> {
    read_config(app_name)?
        .strategies
        .into_iter()
        .map(|(name, table)| {
            if !table.is_table() {
                return Err(LoadError::StrategyTable(format!(
                    "[strategies.{}] must be a table",
                    name
                )));
            }
            serde_json::to_value(table)
                .map(|v| (name.clone(), v))
                .map_err(|e| LoadError::StrategyTable(format!("{}: {}", name, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn with_xdg<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let _guard = crate::env_lock();
        let prev = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", dir);
        let out = f();
        match prev {
            Some(p) => std::env::set_var("XDG_CONFIG_HOME", p),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        out
    }

    fn write_config(dir: &Path, app: &str, content: &str) {
        let app_dir = dir.join(app);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn missing_config_returns_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let map = with_xdg(dir.path(), || load_env_map("nothing-here")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn env_table_is_read_beside_strategy_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "heddle",
            r#"
[env]
HEDDLE_STRATEGY = "plan-execute"
HEDDLE_PLAN_EXECUTE_MAX_REPLANS = "1"

[strategies.react]
max_iterations = 8
"#,
        );
        let map = with_xdg(dir.path(), || load_env_map("heddle")).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["HEDDLE_STRATEGY"], "plan-execute");
        assert_eq!(map["HEDDLE_PLAN_EXECUTE_MAX_REPLANS"], "1");
    }

    #[test]
    fn strategy_tables_only_returns_empty_env() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "heddle", "[strategies.lats]\nmax_depth = 2\n");
        let map = with_xdg(dir.path(), || load_env_map("heddle")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn invalid_toml_returns_xdg_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "heddle", "[strategies.react\nmax_iterations = 8\n");
        let result = with_xdg(dir.path(), || load_strategy_tables("heddle"));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn strategy_tables_become_json_objects() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "heddle",
            r#"
[strategies.react]
max_iterations = 8
follow_links = false

[strategies.lats]
hedge_words = ["perhaps"]
"#,
        );
        let tables = with_xdg(dir.path(), || load_strategy_tables("heddle")).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(
            tables["react"],
            serde_json::json!({"max_iterations": 8, "follow_links": false})
        );
        assert_eq!(tables["lats"]["hedge_words"][0], "perhaps");
    }

    #[test]
    fn non_table_strategy_entry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "heddle", "[strategies]\nreact = 3\n");
        let result = with_xdg(dir.path(), || load_strategy_tables("heddle"));
        assert!(matches!(result, Err(LoadError::StrategyTable(_))));
    }
}
