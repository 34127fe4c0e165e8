//! Info command implementation

use camino::Utf8Path;
use clap::Args;
use owo_colors::Style;
use reader_tools_core::config::{Config, ConfigSources};
use serde::Serialize;
use tracing::{debug, instrument};

use super::paint;
use crate::host;

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    settings_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    corpus_dir: Option<String>,
    corpus_globs: Vec<String>,
    sort: String,
    vocabulary_groups: usize,
    max_words_per_ingest: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_input_bytes: Option<usize>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources, base_dir: &Utf8Path) -> Self {
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            settings_file: host::settings_path(config, base_dir).to_string(),
            corpus_dir: config.corpus_path(base_dir).map(|p| p.to_string()),
            corpus_globs: config.corpus_globs.clone(),
            sort: config.sort.to_string(),
            vocabulary_groups: config.vocabulary_groups,
            max_words_per_ingest: config.max_words_per_ingest,
            max_input_bytes: config.input_limit(),
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config source metadata from loading
/// * `base_dir` - Directory relative config paths resolve against
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
    base_dir: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, sources, base_dir),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    let package = &full_info.package;
    println!(
        "{} {}",
        paint(&package.name, Style::new().bold()),
        paint(&package.version, Style::new().green()),
    );
    if !package.description.is_empty() {
        println!("{}", package.description);
    }
    if !package.license.is_empty() {
        println!("{}: {}", paint("License", Style::new().dimmed()), package.license);
    }
    if !package.repository.is_empty() {
        println!(
            "{}: {}",
            paint("Repository", Style::new().dimmed()),
            paint(&package.repository, Style::new().cyan()),
        );
    }

    let config = &full_info.config;
    println!();
    println!("{}", paint("Configuration", Style::new().bold().underline()));
    if let Some(ref path) = config.config_file {
        println!(
            "{}: {}",
            paint("Config file", Style::new().dimmed()),
            paint(&path, Style::new().cyan()),
        );
    } else {
        println!(
            "{}: {}",
            paint("Config file", Style::new().dimmed()),
            paint("none loaded", Style::new().yellow()),
        );
    }
    println!("{}: {}", paint("Log level", Style::new().dimmed()), config.log_level);
    if let Some(ref dir) = config.log_dir {
        println!("{}: {}", paint("Log directory", Style::new().dimmed()), dir);
    }

    println!();
    println!("{}", paint("Reader", Style::new().bold().underline()));
    println!(
        "{}: {}",
        paint("Settings file", Style::new().dimmed()),
        paint(&config.settings_file, Style::new().cyan()),
    );
    match config.corpus_dir {
        Some(ref dir) => println!(
            "{}: {} ({})",
            paint("Corpus", Style::new().dimmed()),
            paint(&dir, Style::new().cyan()),
            config.corpus_globs.join(", ")
        ),
        None => println!(
            "{}: {}",
            paint("Corpus", Style::new().dimmed()),
            paint("(not set)", Style::new().dimmed()),
        ),
    }
    println!("{}: {}", paint("Sort", Style::new().dimmed()), config.sort);
    println!("{}: {}", paint("Vocabulary groups", Style::new().dimmed()), config.vocabulary_groups);
    println!(
        "{}: {}",
        paint("Max words per sample", Style::new().dimmed()),
        config.max_words_per_ingest
    );
    match config.max_input_bytes {
        Some(max) => println!("{}: {} bytes", paint("Input limit", Style::new().dimmed()), max),
        None => println!(
            "{}: {}",
            paint("Input limit", Style::new().dimmed()),
            paint("disabled", Style::new().yellow()),
        ),
    }

    Ok(())
}
