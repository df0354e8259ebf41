use super::ffmpeg_info::{FfmpegTools, probe_duration};
use super::profile::EncoderProfile;
use super::types::{ProgressParser, ProgressSnapshot, VideoJob};
use crate::engine::hardware::{self, BackendAvailability};
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// The external encoder, as seen by the worker pool.
///
/// Anything that can list its hardware encoders and run a job while reporting
/// progress can stand in for ffmpeg.
pub trait EncoderTool: Sync {
    /// Which hardware backends can be used. Must not fail; report none instead.
    fn detect_backends(&self) -> BackendAvailability;

    /// Encode one job, calling `on_progress` for every progress line received.
    /// An `Err` carries the diagnostic text shown in the final report.
    fn encode(
        &self,
        job: &VideoJob,
        ctx: &EncodeContext,
        on_progress: &mut dyn FnMut(&ProgressSnapshot),
    ) -> Result<()>;
}

/// Everything every job in a batch shares
#[derive(Debug, Clone)]
pub struct EncodeContext {
    pub lut_path: PathBuf,
    pub profile: EncoderProfile,
    pub overwrite: bool,
}

/// Escape a path for use as a filter option value inside `-vf`.
/// Two levels: the option parser first, then the filtergraph parser.
fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();

    let mut option_level = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(c);
    }

    let mut graph_level = String::with_capacity(option_level.len());
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }

    graph_level
}

/// `lut3d` filter applying the batch LUT
pub fn lut3d_filter(lut_path: &Path) -> String {
    format!("lut3d=file={}", escape_filter_path(lut_path))
}

/// Build the ffmpeg command for one job
pub fn build_encode_cmd(tools: &FfmpegTools, job: &VideoJob, ctx: &EncodeContext) -> Command {
    let mut cmd = Command::new(&tools.ffmpeg);

    cmd.arg("-hide_banner").arg("-nostdin");
    // Never prompt; -n makes ffmpeg fail fast instead of clobbering
    cmd.arg(if ctx.overwrite { "-y" } else { "-n" });

    cmd.arg("-i").arg(&job.input_path);
    cmd.arg("-vf").arg(lut3d_filter(&ctx.lut_path));
    cmd.args(ctx.profile.args());

    // Machine-readable progress on stdout, human stats off
    cmd.arg("-progress").arg("pipe:1").arg("-nostats");
    cmd.arg(&job.output_path);

    cmd
}

/// Format ffmpeg command as a shell-safe string for display
pub fn format_ffmpeg_cmd(cmd: &Command) -> String {
    let parts: Vec<String> = std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect();

    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}

/// Keep only the last `max_lines` lines of diagnostic output
pub fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

/// Spawn ffmpeg, feed its progress stream through a `ProgressParser` and wait for it.
/// Non-zero exit becomes an error carrying the captured stderr.
pub fn run_ffmpeg_with_progress(
    mut cmd: Command,
    duration_s: Option<f64>,
    on_progress: &mut dyn FnMut(&ProgressSnapshot),
) -> Result<()> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!(cmd = %format_ffmpeg_cmd(&cmd), "spawning ffmpeg");

    let started = Instant::now();
    let mut child = cmd.spawn().context("Failed to spawn ffmpeg")?;

    // Drain stderr on its own thread so a chatty encoder can't block on a full pipe
    let stderr = child.stderr.take().context("Failed to capture stderr")?;
    let stderr_thread = std::thread::spawn(move || {
        let mut stderr_output = String::new();
        let reader = BufReader::new(stderr);
        for line in reader.lines().map_while(Result::ok) {
            stderr_output.push_str(&line);
            stderr_output.push('\n');
        }
        stderr_output
    });

    let stdout = child.stdout.take().context("Failed to capture stdout")?;
    let reader = BufReader::new(stdout);
    let mut parser = ProgressParser::new(duration_s);

    let mut last: Option<ProgressSnapshot> = None;

    for line in reader.lines().map_while(Result::ok) {
        parser.parse_line(&line);
        let snapshot = parser.snapshot(started.elapsed());
        on_progress(&snapshot);
        last = Some(snapshot);
    }

    let status = child.wait().context("Failed to wait for ffmpeg")?;
    if let Some(last) = &last {
        tracing::debug!(
            %status,
            media_time_s = last.media_time_s,
            frames = last.frames,
            wall_s = last.wall_elapsed.as_secs_f64(),
            "ffmpeg exited"
        );
    }
    let stderr_output = stderr_thread
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    if !status.success() {
        let diagnostics = stderr_output.trim_end();
        if diagnostics.is_empty() {
            anyhow::bail!("ffmpeg exited with {}", status);
        }
        anyhow::bail!("ffmpeg exited with {}\n{}", status, diagnostics);
    }

    Ok(())
}

/// Drives the real ffmpeg/ffprobe binaries
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    tools: FfmpegTools,
}

impl FfmpegEncoder {
    pub fn new(tools: FfmpegTools) -> Self {
        Self { tools }
    }
}

impl EncoderTool for FfmpegEncoder {
    fn detect_backends(&self) -> BackendAvailability {
        hardware::detect_backends(&self.tools.ffmpeg)
    }

    fn encode(
        &self,
        job: &VideoJob,
        ctx: &EncodeContext,
        on_progress: &mut dyn FnMut(&ProgressSnapshot),
    ) -> Result<()> {
        // Unknown duration is fine, progress just switches to frame counts
        let duration_s = match probe_duration(&self.tools, &job.input_path) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::debug!(job = %job.file_name(), error = %format!("{e:#}"), "duration probe failed");
                None
            }
        };

        let cmd = build_encode_cmd(&self.tools, job, ctx);
        run_ffmpeg_with_progress(cmd, duration_s, on_progress)
    }
}
