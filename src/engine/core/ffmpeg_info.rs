use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locations of the external ffmpeg tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

/// Run `<tool> -version` and return the first line
fn tool_version(tool: &Path) -> Result<String> {
    let output = Command::new(tool).arg("-version").output().with_context(|| {
        format!(
            "Failed to execute {}. Is it installed and in PATH?",
            tool.display()
        )
    })?;

    if !output.status.success() {
        anyhow::bail!("{} failed with status: {}", tool.display(), output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check if ffmpeg is available and return its version
pub fn ffmpeg_version(tools: &FfmpegTools) -> Result<String> {
    tool_version(&tools.ffmpeg)
}

/// Check if ffprobe is available and return its version
pub fn ffprobe_version(tools: &FfmpegTools) -> Result<String> {
    tool_version(&tools.ffprobe)
}

/// Probe a video file to get its duration in seconds
pub fn probe_duration(tools: &FfmpegTools, path: &Path) -> Result<f64> {
    let output = Command::new(&tools.ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    parse_ffprobe_duration(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `format.duration` from ffprobe JSON output
pub fn parse_ffprobe_duration(json: &str) -> Result<f64> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;

    let duration_str = probe
        .format
        .duration
        .context("No duration found in ffprobe output")?;

    let duration = duration_str
        .trim()
        .parse::<f64>()
        .context("Failed to parse duration as float")?;

    if !duration.is_finite() || duration <= 0.0 {
        anyhow::bail!("ffprobe reported a non-positive duration: {}", duration_str);
    }

    Ok(duration)
}
