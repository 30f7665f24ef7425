//! Error types for the layered configuration engine.

use thiserror::Error;

/// Errors raised by normalization, merging, section resolution and
/// application.
///
/// All errors are raised synchronously at the point of detection and
/// propagate unmodified, except that each recursive normalization or
/// application frame prefixes the error path with `.field` or `[index]` so
/// the surfaced error carries the full path from the section root.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{property}' is not a property of {model}")]
    UnknownProperty { model: String, property: String },

    #[error("failed to convert configuration value for {path}: {cause}")]
    ConversionFailed { path: String, cause: String },

    #[error("sequence too big for {path}: got {got} elements for a maximum of {max}")]
    ArrayTooLarge { path: String, got: usize, max: usize },

    #[error("cannot merge configuration: conflict in {key} between {left} and {right}")]
    MergeConflict {
        key: String,
        left: String,
        right: String,
    },

    #[error("cannot merge configuration sections [{}]: {source}", sections.join(", "))]
    SectionMergeConflict {
        sections: Vec<String>,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("'{0}' is not a known configuration section")]
    UnknownSection(String),

    #[error("no configuration available for {0}")]
    UnknownModel(String),

    #[error("does not know how to convert '{0}' to SI")]
    UnknownUnit(String),

    #[error("section {index} has no name; only the first section of a document may omit it")]
    UnnamedSection { index: usize },

    #[error("cannot apply a {found} onto a {expected} at {path}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid logging configuration: {0}")]
    InvalidLogConfig(String),
}

impl ConfigError {
    /// Prepend a path segment to the error's reported path, if it has one.
    ///
    /// Each recursive frame of the normalizer and applier calls this on the
    /// way out, so the path is accumulated from the section root down to the
    /// offending leaf.
    pub(crate) fn prefix_path(self, prefix: &str) -> Self {
        match self {
            ConfigError::ConversionFailed { path, cause } => ConfigError::ConversionFailed {
                path: format!("{}{}", prefix, path),
                cause,
            },
            ConfigError::ArrayTooLarge { path, got, max } => ConfigError::ArrayTooLarge {
                path: format!("{}{}", prefix, path),
                got,
                max,
            },
            ConfigError::ShapeMismatch {
                path,
                expected,
                found,
            } => ConfigError::ShapeMismatch {
                path: format!("{}{}", prefix, path),
                expected,
                found,
            },
            other => other,
        }
    }
}
