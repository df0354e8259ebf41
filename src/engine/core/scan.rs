use super::types::VideoJob;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Video file extensions picked up from the input directory
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Inserted between the file stem and extension of every output
pub const OUTPUT_SUFFIX: &str = "_LUT";

/// Check if a path has a video file extension (case-insensitive)
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Whether the file looks like something a previous run produced
pub fn is_lut_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(OUTPUT_SUFFIX))
}

/// Final path component for display; the full path when there is none
pub fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `dir/clip.mp4` -> `dir/clip_LUT.mp4`
pub fn derive_output_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let file_name = match input_path.extension() {
        Some(ext) => format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, OUTPUT_SUFFIX),
    };

    input_path.with_file_name(file_name)
}

/// List video files directly inside `dir` (no recursion), sorted by file name.
/// Outputs of earlier runs are left out so they never get graded twice.
/// Failing to read `dir` itself is an error; unreadable entries are skipped.
pub fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(e).with_context(|| format!("Failed to read directory: {}", dir.display()));
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        if path.is_file() && is_video_file(path) && !is_lut_output(path) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Jobs to run plus inputs skipped because their output already exists
#[derive(Debug, Default)]
pub struct JobQueue {
    pub jobs: Vec<VideoJob>,
    pub skipped: Vec<PathBuf>,
}

/// Build the job queue from scanned files.
/// Without `overwrite`, inputs whose output already exists never become jobs.
pub fn build_job_queue(files: Vec<PathBuf>, overwrite: bool) -> JobQueue {
    let mut queue = JobQueue::default();

    for input_path in files {
        let output_path = derive_output_path(&input_path);
        if !overwrite && output_path.exists() {
            tracing::debug!(input = %input_path.display(), "output exists, skipping");
            queue.skipped.push(input_path);
            continue;
        }
        queue.jobs.push(VideoJob::new(input_path, output_path));
    }

    queue
}
