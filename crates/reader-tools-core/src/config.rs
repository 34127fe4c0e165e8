//! Application configuration loading and discovery.
//!
//! This is the tool's own configuration (logging, where the settings
//! document and sample texts live, input limits). The reader settings
//! document itself is described in [`crate::model`].
//!
//! # Supported formats
//!
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `READER_TOOLS_*` environment variables
//! - files passed explicitly (`--config`)
//! - `reader-tools.<ext>` in current directory or any parent
//! - `.reader-tools.<ext>` in current directory or any parent
//! - `~/.config/reader-tools/config.<ext>` (user config)
//!
//! When multiple files exist in the same directory, all are merged via figment.
//! Later extensions override earlier: toml < yaml < yml < json.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use reader_tools_core::config::ConfigLoader;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("settings: {:?}", config.settings_file);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_MAX_INPUT_BYTES;
use crate::corpus::DEFAULT_MAX_WORDS_PER_INGEST;
use crate::decodability::DEFAULT_VOCABULARY_GROUPS;
use crate::error::{ConfigError, ConfigResult};
use crate::sorting::SortMode;

/// The configuration for reader-tools.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files. No log file is written when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// Reader settings document (JSON). Relative paths resolve against the
    /// directory of the highest-precedence config file.
    pub settings_file: Option<Utf8PathBuf>,
    /// Directory of sample texts for the word corpus. Relative paths
    /// resolve like `settings_file`.
    pub corpus_dir: Option<Utf8PathBuf>,
    /// File-name globs selecting sample texts inside `corpus_dir`.
    pub corpus_globs: Vec<String>,
    /// Most words counted from a single sample text. 0 removes the ceiling.
    pub max_words_per_ingest: usize,
    /// Word list ordering (alphabetic, length, frequency).
    pub sort: SortMode,
    /// Number of frequency bands used by vocabulary-group filters.
    pub vocabulary_groups: usize,
    /// Maximum input size in bytes (default: 5 MiB).
    ///
    /// Omit to use the default. Use `disable_input_limit` to remove the
    /// limit entirely.
    pub max_input_bytes: Option<usize>,
    /// Disable the input size limit entirely.
    ///
    /// When `true`, `max_input_bytes` is ignored and no size check is performed.
    pub disable_input_limit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            settings_file: None,
            corpus_dir: None,
            corpus_globs: vec!["*.txt".to_string(), "*.md".to_string()],
            max_words_per_ingest: DEFAULT_MAX_WORDS_PER_INGEST,
            sort: SortMode::default(),
            vocabulary_groups: DEFAULT_VOCABULARY_GROUPS,
            max_input_bytes: None,
            disable_input_limit: false,
        }
    }
}

impl Config {
    /// The input size limit in effect, or `None` when disabled.
    pub fn input_limit(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES))
        }
    }

    /// `settings_file`, resolved against `base_dir` when relative.
    pub fn settings_path(&self, base_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        self.settings_file.as_deref().map(|p| resolve(base_dir, p))
    }

    /// `corpus_dir`, resolved against `base_dir` when relative.
    pub fn corpus_path(&self, base_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        self.corpus_dir.as_deref().map(|p| resolve(base_dir, p))
    }
}

fn resolve(base_dir: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Metadata about which configuration sources were loaded.
///
/// Returned alongside [`Config`] from [`ConfigLoader::load()`] so commands
/// can report the actual config files without re-discovering them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project config files found by walking up, ordered low→high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file from XDG config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit config files loaded (e.g., from `--config` flag).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// Returns the highest-precedence config file that was loaded.
    ///
    /// Precedence: explicit files > project files > user file.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .map(Utf8PathBuf::as_path)
            .or_else(|| self.project_files.last().map(Utf8PathBuf::as_path))
            .or(self.user_file.as_deref())
    }

    /// Directory that relative paths in the config resolve against: the
    /// primary file's directory, else `fallback`.
    pub fn base_dir<'a>(&'a self, fallback: &'a Utf8Path) -> &'a Utf8Path {
        self.primary_file()
            .and_then(Utf8Path::parent)
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or(fallback)
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "reader-tools";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    ///
    /// The loader will walk up from this directory looking for config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/reader-tools/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set a boundary marker to stop directory traversal.
    ///
    /// When walking up directories, stop if we find a directory containing
    /// this file or directory name. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. `READER_TOOLS_*` environment variables
    /// 2. Explicit files (in order added via `with_file`)
    /// 3. Project config (closest to search root)
    /// 4. User config (`~/.config/reader-tools/config.<ext>`)
    /// 5. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(ref root) = self.project_search_root {
            let project_configs = self.find_project_configs(root);
            for pc in &project_configs {
                figment = Self::merge_file(figment, pc);
            }
            sources.project_files = project_configs;
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        // READER_TOOLS_SORT=frequency, READER_TOOLS_LOG_LEVEL=debug, etc.
        figment = figment.merge(Env::prefixed("READER_TOOLS_").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            sort = config.sort.as_str(),
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Load configuration, returning an error if no config file is found.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        let has_user = self.include_user_config && self.find_user_config().is_some();
        let has_project = self
            .project_search_root
            .as_ref()
            .is_some_and(|root| !self.find_project_configs(root).is_empty());
        let has_explicit = !self.explicit_files.is_empty();

        if !has_user && !has_project && !has_explicit {
            return Err(ConfigError::NotFound);
        }

        self.load()
    }

    /// Find project config files by walking up from the given directory.
    ///
    /// Returns all matching config files from the closest directory that has
    /// any match, dotfiles before regular files (low→high precedence).
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let mut found = Vec::new();

            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    found.push(dotfile);
                }
            }
            for ext in CONFIG_EXTENSIONS {
                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    found.push(regular);
                }
            }

            if !found.is_empty() {
                return found;
            }

            // Checked after the config files so a config beside the marker is found.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
                && dir != start
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        Vec::new()
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Get the user config directory path.
///
/// Returns `~/.config/reader-tools/` on Linux,
/// `~/Library/Application Support/reader-tools/` on macOS, and equivalent
/// on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes tests that mutate environment variables via `set_var`/`remove_var`.
    static TEST_ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::try_from(path).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert_eq!(config.corpus_globs, vec!["*.txt", "*.md"]);
        assert_eq!(config.max_words_per_ingest, 10_000);
        assert_eq!(config.vocabulary_groups, 6);
        assert_eq!(config.sort, SortMode::Alphabetic);
    }

    #[test]
    fn test_loader_builds_with_defaults() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(sources.primary_file().is_none());
    }

    #[test]
    fn test_single_file_overrides_default() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let tmp = TempDir::new().unwrap();
        let config_path = utf8(tmp.path().join("config.toml"));
        fs::write(
            &config_path,
            r#"log_level = "debug"
settings_file = "books/settings.json"
sort = "frequency"
corpus_globs = ["*.txt"]
"#,
        )
        .unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&config_path)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.sort, SortMode::ByFrequency);
        assert_eq!(config.corpus_globs, vec!["*.txt"]);
        assert_eq!(config.max_words_per_ingest, 10_000);

        let base = sources.base_dir(Utf8Path::new("/elsewhere"));
        assert_eq!(base, config_path.parent().unwrap());
        assert_eq!(
            config.settings_path(base),
            Some(base.join("books/settings.json"))
        );
    }

    #[test]
    fn test_yaml_and_json_files() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let tmp = TempDir::new().unwrap();
        let yaml = utf8(tmp.path().join("config.yaml"));
        fs::write(&yaml, "vocabulary_groups: 4\nsort: length\n").unwrap();
        let json = utf8(tmp.path().join("config.json"));
        fs::write(&json, r#"{"vocabulary_groups": 3}"#).unwrap();

        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&yaml)
            .with_file(&json)
            .load()
            .unwrap();
        assert_eq!(config.vocabulary_groups, 3);
        assert_eq!(config.sort, SortMode::ByLength);
    }

    #[test]
    fn test_project_config_discovery() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        let sub_dir = project_dir.join("src").join("deep");
        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(
            project_dir.join(".reader-tools.toml"),
            r#"log_level = "debug""#,
        )
        .unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(utf8(sub_dir))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(sources.project_files.len(), 1);
    }

    #[test]
    fn test_boundary_marker_stops_search() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        let work = child.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(parent.join(".reader-tools.toml"), r#"log_level = "warn""#).unwrap();
        fs::create_dir(child.join(".git")).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_boundary_marker(".git")
            .with_project_search(utf8(work))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
        assert!(sources.project_files.is_empty());
    }

    #[test]
    fn test_explicit_file_overrides_project_config() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("reader-tools.toml"), r#"log_level = "warn""#).unwrap();
        let override_config = utf8(tmp.path().join("override.toml"));
        fs::write(&override_config, r#"log_level = "error""#).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(utf8(tmp.path().to_path_buf()))
            .with_file(&override_config)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
        assert!(!sources.project_files.is_empty());
        assert_eq!(sources.primary_file(), Some(override_config.as_path()));
    }

    #[test]
    fn test_load_or_error_fails_when_no_config() {
        let result = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load_or_error();
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_invalid_value_is_a_deserialize_error() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let tmp = TempDir::new().unwrap();
        let config_path = utf8(tmp.path().join("config.toml"));
        fs::write(&config_path, r#"sort = "sideways""#).unwrap();
        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&config_path)
            .load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn input_limit_defaults_and_can_be_disabled() {
        let mut config = Config::default();
        assert_eq!(config.input_limit(), Some(DEFAULT_MAX_INPUT_BYTES));
        config.max_input_bytes = Some(1024);
        assert_eq!(config.input_limit(), Some(1024));
        config.disable_input_limit = true;
        assert_eq!(config.input_limit(), None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "sort: length\ncorpus_dir: texts\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sort, SortMode::ByLength);
        assert_eq!(config.corpus_dir, Some(Utf8PathBuf::from("texts")));
        assert_eq!(config.corpus_globs, vec!["*.txt", "*.md"]);
        assert_eq!(config.vocabulary_groups, DEFAULT_VOCABULARY_GROUPS);
    }

    #[test]
    fn empty_yaml_is_default_config() {
        let config: Config = serde_yaml::from_str("log_level: info\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn absolute_paths_are_not_rebased() {
        let config = Config {
            corpus_dir: Some("/srv/corpus".into()),
            ..Config::default()
        };
        assert_eq!(
            config.corpus_path(Utf8Path::new("/home/me")),
            Some(Utf8PathBuf::from("/srv/corpus"))
        );
    }

    #[test]
    fn test_user_config_dir() {
        if let Some(path) = user_config_dir() {
            assert!(path.as_str().contains("reader-tools"));
        }
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_env_var_overrides_file_config() {
        let _guard = TEST_ENV_MUTEX.lock().unwrap();
        let tmp = TempDir::new().unwrap();
        let config_path = utf8(tmp.path().join("config.toml"));
        fs::write(&config_path, "sort = \"length\"\nmax_words_per_ingest = 50\n").unwrap();

        // SAFETY: serialized by TEST_ENV_MUTEX; no other thread reads these vars.
        unsafe {
            std::env::set_var("READER_TOOLS_SORT", "frequency");
        }
        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&config_path)
            .load();
        // SAFETY: as above.
        unsafe {
            std::env::remove_var("READER_TOOLS_SORT");
        }

        let (config, _sources) = result.unwrap();
        assert_eq!(config.sort, SortMode::ByFrequency);
        assert_eq!(config.max_words_per_ingest, 50);
    }
}
