//! CLI command implementations.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};

use docid_core::DocidConfig;

/// `<config_dir>/docid/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docid")
        .join("config.json")
}

/// The explicit `--config` file, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocidConfig> {
    if let Some(path) = config_path {
        return Ok(DocidConfig::from_file(Path::new(path))?);
    }
    let default_path = default_config_path();
    if default_path.exists() {
        Ok(DocidConfig::from_file(&default_path)?)
    } else {
        Ok(DocidConfig::default())
    }
}
