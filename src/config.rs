//! Project configuration loader for the bundler plugins.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use crate::assets::{HtmlHashEmitter, HtmlHashOptions};
use crate::error::ConfigError;
use crate::units::{UnitOptions, UnitRewriter};

/// File name searched for in the project directory.
pub const DEFAULT_CONFIG_FILE: &str = "px2remvw.config.json";

/// Plugin options for a build, as written in `px2remvw.config.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundlerConfig {
    /// Options for the pixel unit rewriter.
    pub px2remvw: UnitOptions,
    /// Options for the hashed HTML emitter.
    pub html_hash: HtmlHashOptions,
}

impl BundlerConfig {
    /// Load configuration from `project_dir`, falling back to defaults when no file exists.
    pub fn discover(project_dir: &Path) -> Result<Self, ConfigError> {
        let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
        match fs::read_to_string(&candidate) {
            Ok(content) => Self::from_str(&candidate, &content),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: candidate,
                source,
            }),
        }
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(path, &content)
    }

    fn from_str(path: &Path, content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate and compile the unit rewriter.
    pub fn unit_rewriter(&self) -> Result<UnitRewriter, ConfigError> {
        self.px2remvw.build()
    }

    /// Validate and compile the hashed HTML emitter.
    pub fn html_hash_emitter(&self) -> Result<HtmlHashEmitter, ConfigError> {
        self.html_hash.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = BundlerConfig::discover(dir.path()).unwrap();
        assert_eq!(config, BundlerConfig::default());
    }

    #[test]
    fn reads_partial_configuration() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{
                "px2remvw": { "viewportWidth": 0, "remRoot": 100, "exclude": "node_modules" },
                "htmlHash": { "digestLength": 6 }
            }"#,
        )
        .unwrap();

        let config = BundlerConfig::discover(dir.path()).unwrap();
        assert_eq!(config.px2remvw.viewport_width, Some(0.0));
        assert_eq!(config.px2remvw.exclude.as_deref(), Some("node_modules"));
        assert_eq!(config.html_hash.digest_length, 6);
        assert_eq!(config.html_hash.marker, "<!-- take hash -->");

        let rewriter = config.unit_rewriter().unwrap();
        assert!(!rewriter.admits(Some(Path::new("node_modules/a.css"))));
    }

    #[test]
    fn reports_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            BundlerConfig::from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn reports_missing_explicit_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            BundlerConfig::from_path(&dir.path().join("absent.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
