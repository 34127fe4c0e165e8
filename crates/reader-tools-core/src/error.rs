//! Error types for reader-tools-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur when loading or saving reader settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings document could not be read or written.
    #[error("failed to access settings file {path}: {source}")]
    Io {
        /// Path of the settings document.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings document is not valid JSON for the settings model.
    #[error("invalid settings document {path}: {source}")]
    Parse {
        /// Path of the settings document.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A stage's allowed-words file could not be read.
    #[error("failed to read allowed words for stage {stage} from {path}: {source}")]
    AllowedWordsFile {
        /// One-based stage number.
        stage: usize,
        /// Resolved path of the word list.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`SettingsError`].
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors that can occur when gathering sample text for the corpus.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// A corpus glob pattern did not compile.
    #[error("invalid corpus pattern {pattern:?}: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// The corpus directory or one of its files could not be read.
    #[error("failed to read corpus source {path}: {source}")]
    Io {
        /// Path that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A corpus path is not valid UTF-8.
    #[error("corpus path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}

/// Result type alias using [`CorpusError`].
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Errors surfaced by the progression controller.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Sample text could not be gathered.
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// Result type alias using [`ControllerError`].
pub type ControllerResult<T> = Result<T, ControllerError>;
