//! Subcommand implementations.

use std::path::PathBuf;

use anyhow::Result;

use lexiscreen_core::store::{JsonFileStore, ResultStore};

use crate::config::{load_config_from, LexiscreenConfig};

pub mod checklist;
pub mod handwriting;
pub mod init;
pub mod profile;
pub mod record;
pub mod report;
pub mod results;

/// Paths given on the command line that apply to every subcommand.
pub struct Paths {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
}

impl Paths {
    /// Load the config, applying a `--store` override.
    pub fn load_config(&self) -> Result<LexiscreenConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        Ok(config)
    }

    /// Load the config and open the result store it names.
    pub fn open(&self) -> Result<(LexiscreenConfig, ResultStore<JsonFileStore>)> {
        let config = self.load_config()?;
        let store = ResultStore::new(JsonFileStore::open(&config.store_path)?);
        Ok((config, store))
    }
}

/// Parse a comma-separated list of outcomes such as `1,0,1` or `y,n,y`.
pub fn parse_outcomes(s: &str) -> Result<Vec<bool>> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| match t.to_lowercase().as_str() {
            "1" | "y" | "yes" | "true" | "correct" => Ok(true),
            "0" | "n" | "no" | "false" | "wrong" => Ok(false),
            _ => Err(anyhow::anyhow!("invalid outcome: '{t}' (use 1/0 or y/n)")),
        })
        .collect()
}
