// End-of-batch report printed after the live view is torn down

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::engine::{BatchResult, EncoderBackend, display_file_name, stderr_tail};
use crate::ui::constants::FAILURE_TAIL_LINES;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Final report: counts, skipped and failed files with diagnostics, output location
pub fn render_summary(result: &BatchResult, output_dir: &Path) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Processing complete!");
    let _ = writeln!(out, "Successfully processed: {} files", result.processed());

    if !result.skipped.is_empty() {
        let _ = writeln!(
            out,
            "Skipped (output already exists): {} files",
            result.skipped.len()
        );
        for path in &result.skipped {
            let _ = writeln!(out, " - {}", display_file_name(path));
        }
    }

    if !result.failed.is_empty() {
        let _ = writeln!(out, "Failed to process: {} files", result.failed_count());
        for failure in &result.failed {
            let _ = writeln!(out, " - {}", failure.file_name());
            for line in stderr_tail(&failure.error, FAILURE_TAIL_LINES).lines() {
                let _ = writeln!(out, "     {}", line);
            }
        }
    }

    let _ = writeln!(out, "Output files saved to: {}", output_dir.display());

    let started = result.started_at.format(TIMESTAMP_FORMAT);
    match (result.finished_at, result.elapsed()) {
        (Some(finished), Some(elapsed)) => {
            let _ = writeln!(
                out,
                "Started: {} | Finished: {} ({:.1} seconds)",
                started,
                finished.format(TIMESTAMP_FORMAT),
                elapsed.num_milliseconds() as f64 / 1000.0
            );
        }
        _ => {
            let _ = writeln!(out, "Started: {}", started);
        }
    }

    out
}

/// Which encoder the batch will use, as announced before it starts
pub fn backend_message(backend: EncoderBackend, hardware_enabled: bool) -> String {
    if backend.is_hardware() {
        format!("{} encoder detected and will be used", backend.display_name())
    } else if hardware_enabled {
        "No hardware encoders detected, falling back to CPU encoding".to_string()
    } else {
        "Hardware acceleration disabled, using CPU encoding".to_string()
    }
}

/// Message for a batch where no input needed encoding
pub fn render_nothing_to_do(input_dir: &Path, skipped: &[PathBuf]) -> String {
    if skipped.is_empty() {
        return format!("No video files found in {}\n", input_dir.display());
    }

    let mut out = format!(
        "Nothing to do in {}: all {} video files already have output (use --overwrite to redo them)\n",
        input_dir.display(),
        skipped.len()
    );
    for path in skipped {
        let _ = writeln!(out, " - {}", display_file_name(path));
    }
    out
}
