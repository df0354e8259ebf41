use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::scan::display_file_name;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Pending -> Running -> {Completed | Failed}, nothing else
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

#[derive(Debug, Clone)]
pub struct VideoJob {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub status: JobStatus,

    // Runtime
    pub started_at: Option<Instant>,
    pub elapsed: Option<Duration>,
    pub last_error: Option<String>,
}

impl VideoJob {
    /// Create a new pending job
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_path,
            output_path,
            status: JobStatus::Pending,
            started_at: None,
            elapsed: None,
            last_error: None,
        }
    }

    /// File name of the input, for display
    pub fn file_name(&self) -> String {
        display_file_name(&self.input_path)
    }

    pub fn start(&mut self) -> bool {
        if !self.transition(JobStatus::Running) {
            return false;
        }
        self.started_at = Some(Instant::now());
        true
    }

    pub fn complete(&mut self) -> bool {
        if !self.transition(JobStatus::Completed) {
            return false;
        }
        self.elapsed = self.started_at.map(|t| t.elapsed());
        true
    }

    pub fn fail(&mut self, error: String) -> bool {
        if !self.transition(JobStatus::Failed) {
            return false;
        }
        self.elapsed = self.started_at.map(|t| t.elapsed());
        self.last_error = Some(error);
        true
    }

    fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::warn!(
                job = %self.file_name(),
                from = ?self.status,
                to = ?next,
                "ignoring invalid job state transition"
            );
            return false;
        }
        self.status = next;
        true
    }
}

/// How progress is reported for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressMode {
    /// Total duration is known, percent and ETA are available
    DurationBased,
    /// Duration unknown, only frame counts and throughput
    FrameBased,
}

/// Latest known progress of one running job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub media_time_s: f64,
    pub wall_elapsed: Duration,
    pub percent: Option<u8>,
    pub eta: Option<Duration>,
    pub frames: u64,
    pub fps: Option<f64>,
    pub mode: ProgressMode,
}

impl ProgressSnapshot {
    /// Frames per wall-clock second since the job started
    pub fn average_fps(&self) -> f64 {
        let secs = self.wall_elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Parser for ffmpeg `-progress` output (key=value lines)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub out_time_us: u64,
    pub frame: u64,
    pub fps: Option<f64>,
    pub is_complete: bool,
    duration_s: Option<f64>,
    percent: Option<u8>,
}

impl ProgressParser {
    /// `duration_s` is the probed length of the input, if known
    pub fn new(duration_s: Option<f64>) -> Self {
        Self {
            duration_s: duration_s.filter(|d| d.is_finite() && *d > 0.0),
            ..Self::default()
        }
    }

    /// Parse a single line of ffmpeg progress output.
    /// Unknown keys, malformed values and `N/A` leave the previous state untouched.
    pub fn parse_line(&mut self, line: &str) {
        let Some((key, value)) = line.split_once('=') else {
            return;
        };

        match key.trim() {
            // Despite the name, ffmpeg reports out_time_ms in microseconds
            "out_time_ms" => {
                if let Some(us) = parse_field::<u64>(value) {
                    self.out_time_us = us;
                    self.update_percent();
                }
            }
            "frame" => {
                if let Some(frame) = parse_field::<u64>(value) {
                    self.frame = frame;
                }
            }
            "fps" => {
                if let Some(fps) = parse_field::<f64>(value).filter(|f| f.is_finite()) {
                    self.fps = Some(fps);
                }
            }
            "progress" => {
                if value.trim() == "end" {
                    self.is_complete = true;
                }
            }
            _ => {}
        }
    }

    /// Get output time in seconds
    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }

    pub fn mode(&self) -> ProgressMode {
        if self.duration_s.is_some() {
            ProgressMode::DurationBased
        } else {
            ProgressMode::FrameBased
        }
    }

    /// Highest percentage seen so far; `None` until media time advances
    pub fn percent(&self) -> Option<u8> {
        self.percent
    }

    /// Build a display snapshot given the wall-clock time since the job started
    pub fn snapshot(&self, wall_elapsed: Duration) -> ProgressSnapshot {
        let percent = self.percent();
        let eta = match percent {
            Some(pct) if pct > 0 => {
                let pct = f64::from(pct);
                let secs = wall_elapsed.as_secs_f64() / pct * (100.0 - pct);
                Some(Duration::from_secs_f64(secs.max(0.0)))
            }
            _ => None,
        };

        ProgressSnapshot {
            media_time_s: self.out_time_s(),
            wall_elapsed,
            percent,
            eta,
            frames: self.frame,
            fps: self.fps,
            mode: self.mode(),
        }
    }

    fn update_percent(&mut self) {
        let Some(duration) = self.duration_s else {
            return;
        };
        let elapsed = self.out_time_s();
        if elapsed <= 0.0 {
            return;
        }

        let pct = (elapsed / duration * 100.0).floor().min(100.0) as u8;
        // Never move backwards, even if ffmpeg briefly reports an earlier timestamp
        self.percent = Some(self.percent.map_or(pct, |prev| prev.max(pct)));
    }
}

/// Parse a progress value, treating `N/A` and garbage as "no information"
fn parse_field<T: FromStr>(value: &str) -> Option<T> {
    let value = value.trim();
    if value == "N/A" {
        return None;
    }
    value.parse().ok()
}
