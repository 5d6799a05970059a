//! Errors raised while resolving plugin configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Setup time failures. Runtime transforms never fail once configuration is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A pattern option is not a valid regular expression.
    #[error("option `{option}` is not a valid pattern: {source}")]
    InvalidPattern {
        /// Name of the offending option.
        option: &'static str,
        /// Underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A numeric option is outside its accepted range.
    #[error("option `{option}` is out of range, got {value}")]
    InvalidNumber {
        /// Name of the offending option.
        option: &'static str,
        /// Value that was rejected.
        value: f64,
    },

    /// The configuration file could not be read.
    #[error("failed to read config file `{}`", path.display())]
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("failed to parse config file `{}`", path.display())]
    Parse {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        #[source]
        source: serde_json::Error,
    },
}
