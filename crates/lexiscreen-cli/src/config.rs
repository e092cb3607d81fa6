//! CLI configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lexiscreen_core::aggregate::AggregationPolicy;

/// Top-level lexiscreen configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiscreenConfig {
    /// JSON file holding every recorded result.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Where `report` writes its files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Aggregation thresholds and weighting.
    #[serde(default)]
    pub policy: AggregationPolicy,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./lexiscreen-data/results.json")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./lexiscreen-reports")
}

impl Default for LexiscreenConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            output_dir: default_output_dir(),
            policy: AggregationPolicy::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `lexiscreen.toml` in the current directory
/// 2. `~/.config/lexiscreen/config.toml`
///
/// `LEXISCREEN_STORE` overrides the store path.
pub fn load_config_from(path: Option<&Path>) -> Result<LexiscreenConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("lexiscreen.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<LexiscreenConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => LexiscreenConfig::default(),
    };

    if let Ok(store) = std::env::var("LEXISCREEN_STORE") {
        if !store.trim().is_empty() {
            config.store_path = PathBuf::from(store);
        }
    }

    config.store_path = resolve_path(&config.store_path);
    config.output_dir = resolve_path(&config.output_dir);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("lexiscreen"))
}
