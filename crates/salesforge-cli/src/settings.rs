use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use salesforge_generate::GenerateOptions;
use salesforge_store::StoreOptions;

pub const DEFAULT_SETTINGS_FILE: &str = "salesforge.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `salesforge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: StoreOptions,
    pub generation: GenerateOptions,
    pub runs: RunSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Directory that receives one folder per `init` or `audit` run.
    pub dir: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("runs"),
        }
    }
}

/// Load settings from `path`; a missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use salesforge_generate::LocaleKey;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&dir.path().join(DEFAULT_SETTINGS_FILE)).expect("defaults");
        assert_eq!(settings.database.database, "sales_data.db");
        assert_eq!(settings.generation.counts.customers, 500);
        assert_eq!(settings.runs.dir, PathBuf::from("runs"));
    }

    #[test]
    fn partial_file_overrides_selected_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"
[database]
database = "data/sales.db"
foreign_keys = false

[generation]
seed = 7
base_date = "2025-02-28"
locale = "pt_BR"

[generation.counts]
sales = 10
"#,
        )
        .expect("write settings");

        let settings = load_settings(&path).expect("parse");
        assert_eq!(settings.database.database, "data/sales.db");
        assert!(!settings.database.foreign_keys);
        assert_eq!(settings.database.max_connections, 4);
        assert_eq!(settings.generation.seed, 7);
        assert_eq!(settings.generation.base_date, NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(settings.generation.locale, LocaleKey::PtBr);
        assert_eq!(settings.generation.counts.sales, 10);
        assert_eq!(settings.generation.counts.products, 200);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(&path, "[generation]\nseed = \"many\"\n").expect("write settings");
        assert!(matches!(load_settings(&path), Err(SettingsError::Parse { .. })));
    }
}
