#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

fn tool_runs(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn is_ffmpeg_available() -> bool {
    tool_runs("ffmpeg") && tool_runs("ffprobe")
}

/// ffmpeg is installed and was built with the pieces the real encode path needs
pub fn is_ffmpeg_usable() -> bool {
    if !is_ffmpeg_available() {
        return false;
    }
    let listing = |flag: &str| {
        Command::new("ffmpeg")
            .args(["-hide_banner", flag])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).into_owned())
            .unwrap_or_default()
    };
    listing("-encoders").contains(" libx264 ") && listing("-filters").contains(" lut3d ")
}

/// Generate a short test clip with ffmpeg's built-in test source
pub fn generate_test_video(output_path: &Path, duration_secs: f32) -> Result<()> {
    let status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg(format!("testsrc=duration={}:size=160x120:rate=30", duration_secs))
        .arg("-c:v")
        .arg("libx264")
        .arg("-preset")
        .arg("ultrafast")
        .arg("-threads")
        .arg("1")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-an")
        .arg(output_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("Failed to run ffmpeg")?;

    if !status.success() {
        anyhow::bail!("ffmpeg failed to generate {}", output_path.display());
    }
    Ok(())
}
