//! Stats command: measure a manuscript against a reader level.

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::Style;
use reader_tools_core::collaborators::{JsonSettingsStore, SettingsStore};
use reader_tools_core::manuscript::Book;
use reader_tools_core::statistics::{BookStatistics, LevelCheck, LevelReport};
use reader_tools_core::{Config, Settings};
use tracing::{debug, instrument};

use super::{is_markdown, paint, read_input_file};
use crate::host;

/// Arguments for the `stats` subcommand.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Manuscript to measure. Pages are separated by `---` or form feeds.
    pub file: Utf8PathBuf,

    /// One-based level number (defaults to the saved level, then 1).
    #[arg(short, long)]
    pub level: Option<usize>,
}

/// Measure a manuscript and fail if it exceeds any limit of the level.
#[instrument(name = "cmd_stats", skip_all, fields(file = %args.file))]
pub fn cmd_stats(
    args: StatsArgs,
    global_json: bool,
    config: &Config,
    base_dir: &Utf8Path,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(file = %args.file, level = ?args.level, "executing stats command");

    let content = read_input_file(&args.file, max_input_bytes)?;
    let store = JsonSettingsStore::new(host::settings_path(config, base_dir));
    let settings = store
        .load()
        .with_context(|| format!("failed to load reader settings from {}", store.path()))?;

    let level_number = match args.level {
        Some(n) => n,
        None => saved_level(&store),
    };
    let report = measure(&content, is_markdown(&args.file), &settings, level_number)?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.pass {
        let violations: Vec<String> = report.violations().map(describe).collect();
        bail!(
            "{} is too hard for level {}: {}",
            args.file,
            report.level,
            violations.join("; ")
        );
    }
    if !global_json {
        println!(
            "{} {} fits level {}",
            paint("PASS:", Style::new().green()),
            args.file,
            report.level,
        );
    }
    Ok(())
}

fn saved_level(store: &JsonSettingsStore) -> usize {
    match store.load_progress() {
        Ok(Some(progress)) if progress.level > 0 => progress.level,
        Ok(_) => 1,
        Err(e) => {
            debug!(error = %e, "ignoring unreadable progress file");
            1
        }
    }
}

fn measure(
    content: &str,
    markdown: bool,
    settings: &Settings,
    level_number: usize,
) -> anyhow::Result<LevelReport> {
    let Some(level) = settings.level(level_number) else {
        bail!(
            "level {level_number} does not exist (settings define {} levels)",
            settings.level_count()
        );
    };
    let book = Book::parse(content, markdown, &settings.sentence_punct);
    let stats = BookStatistics::compute(&book, &settings.grapheme_inventory());
    Ok(LevelReport::new(stats, level, level_number))
}

fn describe(check: &LevelCheck) -> String {
    format!(
        "{} {} (max {})",
        check.metric,
        format_value(check.measured),
        format_value(check.limit)
    )
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn print_report(report: &LevelReport) {
    let stats = &report.statistics;
    println!(
        "{} {}",
        paint("Level", Style::new().bold()),
        paint(&report.level, Style::new().bold()),
    );
    println!(
        "{}: {}  {}: {}  {}: {}",
        paint("Pages", Style::new().dimmed()),
        stats.pages,
        paint("Sentences", Style::new().dimmed()),
        stats.sentences,
        paint("Words", Style::new().dimmed()),
        stats.total_words
    );
    println!();
    for check in &report.checks {
        let limit = if check.limit == 0.0 {
            "-".to_string()
        } else {
            format_value(check.limit)
        };
        let measured = format_value(check.measured);
        if check.acceptable {
            println!(
                "  {:<28} {:>8} {:>8}",
                check.metric.label(),
                measured,
                paint(&limit, Style::new().dimmed()),
            );
        } else {
            println!(
                "  {:<28} {:>8} {:>8}",
                paint(&check.metric.label(), Style::new().red()),
                paint(&measured, Style::new().red().bold()),
                limit
            );
        }
    }
}
