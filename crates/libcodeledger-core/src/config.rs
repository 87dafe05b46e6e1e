use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Session configuration, loaded from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// File names created when a session starts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seed_files: Vec<String>,
    /// Directory rendered reports are written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub report: ReportConfig,
}

/// Report layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Page margin in points, all four sides
    pub margin: f32,
    pub body_font_size: f32,
    pub code_font_size: f32,
    /// Code lines longer than this many characters are broken
    pub code_wrap_width: usize,
    /// Gap after each history entry
    pub entry_spacing: f32,
    /// Gap after the details table
    pub section_spacing: f32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            margin: 36.0,
            body_font_size: 10.0,
            code_font_size: 8.0,
            code_wrap_width: 65,
            entry_spacing: 10.0,
            section_spacing: 20.0,
        }
    }
}

/// Load config from a TOML file
pub fn load_config(path: &Path) -> Result<LedgerConfig, LedgerError> {
    if !path.exists() {
        return Err(LedgerError::NotFound(format!(
            "Config not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    let config: LedgerConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save config to a TOML file, creating parent directories
pub fn save_config(path: &Path, config: &LedgerConfig) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: LedgerConfig = toml::from_str("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.report.code_wrap_width, 65);
        assert_eq!(config.report.margin, 36.0);
    }

    #[test]
    fn test_partial_report_section() {
        let config: LedgerConfig = toml::from_str(
            r#"
seed_files = ["app1.py"]

[report]
code_wrap_width = 80
"#,
        )
        .unwrap();
        assert_eq!(config.seed_files, vec!["app1.py"]);
        assert_eq!(config.report.code_wrap_width, 80);
        assert_eq!(config.report.code_font_size, 8.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("codeledger.toml");
        let config = LedgerConfig {
            seed_files: vec!["a.py".to_string()],
            output_dir: Some(PathBuf::from("reports")),
            report: ReportConfig::default(),
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_config_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert_eq!(err.error_code(), "not_found");
    }

    #[test]
    fn test_bad_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "seed_files = 3").unwrap();
        let err = load_config(&path).unwrap_err();
        assert_eq!(err.error_code(), "invalid_config");
    }
}
