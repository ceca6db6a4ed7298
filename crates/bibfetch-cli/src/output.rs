use std::io::Write;

use bibfetch_core::{BibStats, Reference};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the numbered reference list for one document.
pub fn print_reference_list(
    w: &mut dyn Write,
    file_name: &str,
    refs: &[Reference],
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} ({} references)", file_name.bold(), refs.len())?;
    } else {
        writeln!(w, "{} ({} references)", file_name, refs.len())?;
    }
    for reference in refs {
        writeln!(w, "{}", reference.text)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print the extraction summary before resolution starts.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    file_name: &str,
    total_refs: usize,
) -> std::io::Result<()> {
    writeln!(w, "Extracting references from {}...", file_name)?;
    writeln!(w, "Found {} references to resolve", total_refs)?;
    Ok(())
}

/// Print the per-document resolution summary. `None` stats mean the
/// bibliography came straight from the cache.
pub fn print_fetch_summary(
    w: &mut dyn Write,
    file_name: &str,
    stats: Option<BibStats>,
    color: ColorMode,
) -> std::io::Result<()> {
    let Some(stats) = stats else {
        writeln!(w, "{}: bibliography served from cache", file_name)?;
        return Ok(());
    };

    let found = format!("{} found", stats.found);
    let not_found = format!("{} not found", stats.not_found);
    let errors = format!("{} server errors", stats.server_errors);
    if color.enabled() {
        writeln!(
            w,
            "{}: {} / {} / {}",
            file_name,
            found.green(),
            not_found.red(),
            errors.yellow()
        )?;
    } else {
        writeln!(w, "{}: {} / {} / {}", file_name, found, not_found, errors)?;
    }
    Ok(())
}

/// Report a per-file failure without aborting the batch.
pub fn print_file_error(
    w: &mut dyn Write,
    file_name: &str,
    message: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}: {}", "ERROR".red(), file_name, message)?;
    } else {
        writeln!(w, "ERROR {}: {}", file_name, message)?;
    }
    Ok(())
}
