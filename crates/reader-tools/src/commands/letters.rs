//! Letters command: the cumulative letter list for a stage.

use camino::Utf8Path;
use clap::Args;
use owo_colors::Style;
use reader_tools_core::Config;
use reader_tools_core::collaborators::LetterEntry;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{enter_stage, paint};
use crate::host;

/// Arguments for the `letters` subcommand.
#[derive(Args, Debug)]
pub struct LettersArgs {
    /// One-based stage number.
    #[arg(short, long, default_value_t = 1)]
    pub stage: usize,
}

#[derive(Serialize)]
struct LettersReport {
    stage: String,
    heading: String,
    letters: Vec<LetterEntry>,
}

/// Print the letters known at a stage; letters new to it are highlighted.
#[instrument(name = "cmd_letters", skip_all, fields(stage = args.stage))]
pub fn cmd_letters(
    args: LettersArgs,
    global_json: bool,
    show_progress: bool,
    config: &Config,
    base_dir: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(stage = args.stage, "executing letters command");

    let controller = host::build_controller(config, base_dir, show_progress && !global_json)?;
    enter_stage(&controller, args.stage)?;

    let report = LettersReport {
        stage: controller.stage_label(),
        heading: controller.stage_heading(),
        letters: controller.letters(),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", paint(&report.heading, Style::new().bold()));
    let line = report
        .letters
        .iter()
        .map(|entry| {
            if entry.is_new {
                paint(&entry.letter, Style::new().green().bold())
            } else {
                entry.letter.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    let new: Vec<&str> = report
        .letters
        .iter()
        .filter(|e| e.is_new)
        .map(|e| e.letter.as_str())
        .collect();
    if !new.is_empty() {
        println!("{}: {}", paint("New", Style::new().dimmed()), new.join(" "));
    }
    Ok(())
}
