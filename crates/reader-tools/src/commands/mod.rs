//! Command implementations.

use std::fmt::Display;

use anyhow::{Context, bail};
use camino::Utf8Path;
use owo_colors::{OwoColorize, Stream, Style};
use reader_tools_core::{ProgressionController, StageOutcome};

use crate::host;

pub mod check;
pub mod info;
pub mod letters;
pub mod schema;
pub mod stats;
pub mod words;

/// Style text for stdout, honoring `--color` and terminal detection.
pub fn paint<T: Display>(value: T, style: Style) -> String {
    value
        .if_supports_color(Stream::Stdout, |v| v.style(style))
        .to_string()
}

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Reload `controller` and move it to `stage`.
///
/// Fails when the settings define no such stage.
pub fn enter_stage(controller: &ProgressionController, stage: usize) -> anyhow::Result<()> {
    host::block_on(controller.reload())?.context("failed to load reader settings")?;
    let stage_count = controller.settings().stage_count();
    if stage == 0 || stage > stage_count {
        bail!("stage {stage} does not exist (settings define {stage_count} stages)");
    }
    if controller.current_stage() != stage {
        let outcome = host::block_on(controller.set_stage(stage))?;
        if outcome != StageOutcome::Applied {
            bail!("stage {stage} could not be selected");
        }
    }
    Ok(())
}

/// Whether a manuscript path should be parsed as markdown.
pub fn is_markdown(path: &Utf8Path) -> bool {
    matches!(path.extension(), Some("md" | "markdown"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_follows_color_override() {
        owo_colors::set_override(false);
        assert_eq!(paint("PASS:", Style::new().green()), "PASS:");
        owo_colors::set_override(true);
        assert!(paint("PASS:", Style::new().green()).contains("\x1b["));
        owo_colors::unset_override();
    }

    #[test]
    fn read_input_file_enforces_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("book.txt");
        std::fs::write(&path, "The cat sat.").unwrap();

        assert_eq!(read_input_file(&path, None).unwrap(), "The cat sat.");
        assert_eq!(read_input_file(&path, Some(100)).unwrap(), "The cat sat.");
        let err = read_input_file(&path, Some(4)).unwrap_err();
        assert!(err.to_string().contains("input too large"));
    }

    #[test]
    fn read_input_file_reports_missing_path() {
        let err = read_input_file(Utf8Path::new("/no/such/book.txt"), None).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn markdown_detection() {
        assert!(is_markdown(Utf8Path::new("book.md")));
        assert!(is_markdown(Utf8Path::new("book.markdown")));
        assert!(!is_markdown(Utf8Path::new("book.txt")));
    }
}
