//! Optional TOML configuration file, overridable from the command line.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default first dataset year.
pub const DEFAULT_START_YEAR: i32 = 2016;
/// Default last dataset year.
pub const DEFAULT_END_YEAR: i32 = 2024;
/// Default directory holding the yearly source files.
pub const DEFAULT_DATA_DIR: &str = "data/raw";
/// Default directory for exported files.
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";
/// Default district boundary file.
pub const DEFAULT_BOUNDARY_FILE: &str = "data/raw/Stadtbezirke_Leipzig_UTM33N.json";

/// File-level configuration. Every field is optional; command-line flags
/// win over file values, which win over the defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub boundary_file: Option<PathBuf>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

impl FileConfig {
    /// Loads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        toml::de::from_str(&content).map_err(|e| format!("cannot parse {}: {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config: FileConfig = toml::de::from_str(
            r#"
            data_dir = "input"
            start_year = 2018
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, Some(PathBuf::from("input")));
        assert_eq!(config.start_year, Some(2018));
        assert_eq!(config.end_year, None);
        assert_eq!(config.boundary_file, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = toml::de::from_str::<FileConfig>("data_directory = \"input\"");
        assert!(result.is_err());
    }
}
