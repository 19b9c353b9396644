use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Optional settings file, looked up in the working directory.
pub const CONFIG_FILE: &str = "natality-dashboard.json";

/// Dataset read when nothing else is configured.
pub const DEFAULT_DATA_PATH: &str = "Provisional_Natality_2025_CDC.csv";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Start-up settings.  Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Dataset file, relative to the working directory.
    pub data_path: PathBuf,
    pub window_title: String,
    /// Initial `[width, height]` of the window.
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            window_title: "Provisional Natality Data Dashboard".to_string(),
            window_size: [1200.0, 800.0],
        }
    }
}

impl DashboardConfig {
    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// [`DashboardConfig::load`] on [`CONFIG_FILE`], logging and ignoring
    /// any error.
    pub fn load_or_default() -> Self {
        match Self::load(Path::new(CONFIG_FILE)) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("Ignoring config file: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn absent_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let cfg = DashboardConfig::load(&dir.path().join(CONFIG_FILE))?;
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        Ok(())
    }

    #[test]
    fn partial_file_overrides_named_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "data_path": "data/births.tsv" }"#)?;

        let cfg = DashboardConfig::load(&path)?;
        assert_eq!(cfg.data_path, PathBuf::from("data/births.tsv"));
        assert_eq!(cfg.window_size, [1200.0, 800.0]);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "data_pth": "x.csv" }"#)?;

        assert!(DashboardConfig::load(&path).is_err());
        Ok(())
    }
}
