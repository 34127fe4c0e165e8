//! Words command: the decodable word list for a stage.

use std::ops::RangeInclusive;

use camino::Utf8Path;
use clap::Args;
use owo_colors::Style;
use reader_tools_core::controller::WordFilters;
use reader_tools_core::decodability::{DEFAULT_SYLLABLE_LENGTHS, WordEntry};
use reader_tools_core::{Config, SortMode};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{enter_stage, paint};
use crate::host;

/// Arguments for the `words` subcommand.
#[derive(Args, Debug)]
pub struct WordsArgs {
    /// One-based stage number.
    #[arg(short, long, default_value_t = 1)]
    pub stage: usize,

    /// Word ordering (overrides config).
    #[arg(long, value_enum)]
    pub sort: Option<SortMode>,

    /// Keep words whose estimated syllable count is in MIN..MAX.
    #[arg(long, value_name = "MIN..MAX", value_parser = parse_syllables)]
    pub syllables: Option<RangeInclusive<usize>>,

    /// Keep words in these vocabulary groups (1 = most frequent).
    #[arg(long, value_delimiter = ',', value_name = "N,...")]
    pub groups: Vec<usize>,
}

#[derive(Serialize)]
struct WordsReport {
    stage: String,
    heading: String,
    count: usize,
    words: Vec<WordEntry>,
}

/// Accepts `N` or `MIN..MAX`.
fn parse_syllables(value: &str) -> Result<RangeInclusive<usize>, String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid syllable count {s:?}: {e}"))
    };
    let (min, max) = match value.split_once("..") {
        Some((min, max)) => (parse(min)?, parse(max.trim_start_matches('='))?),
        None => {
            let n = parse(value)?;
            (n, n)
        }
    };
    if min > max {
        return Err(format!("empty syllable range {min}..{max}"));
    }
    Ok(min..=max)
}

/// Print the words a reader can decode at a stage.
#[instrument(name = "cmd_words", skip_all, fields(stage = args.stage))]
pub fn cmd_words(
    args: WordsArgs,
    global_json: bool,
    show_progress: bool,
    config: &Config,
    base_dir: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        stage = args.stage,
        sort = ?args.sort,
        syllables = ?args.syllables,
        groups = ?args.groups,
        "executing words command"
    );

    let config = Config {
        sort: args.sort.unwrap_or(config.sort),
        ..config.clone()
    };
    let controller = host::build_controller(&config, base_dir, show_progress && !global_json)?;
    controller.set_word_filters(WordFilters {
        syllable_lengths: args.syllables.unwrap_or(DEFAULT_SYLLABLE_LENGTHS),
        vocabulary_groups: (!args.groups.is_empty()).then_some(args.groups),
        parts_of_speech: None,
    });
    enter_stage(&controller, args.stage)?;

    let words = controller.words();
    let report = WordsReport {
        stage: controller.stage_label(),
        heading: controller.stage_heading(),
        count: words.len(),
        words,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", paint(&report.heading, Style::new().bold()));
    for word in &report.words {
        if word.is_sight_word {
            println!(
                "{} {}",
                paint(&word.name, Style::new().cyan()),
                paint("(sight)", Style::new().dimmed()),
            );
        } else {
            println!("{}", word.name);
        }
    }
    println!("{}: {}", paint("Words", Style::new().dimmed()), report.count);
    Ok(())
}
