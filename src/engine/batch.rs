//! Batch sequencing: validate, discover, pick an encoder, run the pool, aggregate.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::hardware::{self, EncoderBackend};
use super::worker::{self, WorkerMessage, WorkerPool};
use super::{
    CRF_MAX, CRF_MIN, DEFAULT_CRF, EncodeContext, EncoderProfile, EncoderTool, QualityPreset,
    VideoJob, build_job_queue, display_file_name, scan,
};

/// Problems with the requested batch, detected before anything runs
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Input directory '{}' does not exist", .0.display())]
    MissingInputDir(PathBuf),

    #[error("LUT file '{}' does not exist", .0.display())]
    MissingLut(PathBuf),

    #[error("LUT file '{}' is not in .cube format", .0.display())]
    NotCubeLut(PathBuf),

    #[error("CRF value must be between {CRF_MIN} and {CRF_MAX} (got {0})")]
    CrfOutOfRange(i32),

    #[error("Failed to list video files in '{}': {message}", path.display())]
    Scan { path: PathBuf, message: String },
}

/// Everything the user asked for, before validation
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub input_dir: PathBuf,
    pub lut_path: PathBuf,
    pub preset: QualityPreset,
    pub crf: i32,
    /// `None` or `Some(0)` means one worker per CPU
    pub threads: Option<usize>,
    pub use_hardware: bool,
    pub overwrite: bool,
    pub refresh_interval: Duration,
}

impl BatchSettings {
    pub fn new(input_dir: impl Into<PathBuf>, lut_path: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            lut_path: lut_path.into(),
            preset: QualityPreset::default(),
            crf: i32::from(DEFAULT_CRF),
            threads: None,
            use_hardware: true,
            overwrite: false,
            refresh_interval: worker::DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Check the inputs that must hold before any job may start.
    /// Returns the CRF narrowed to its valid range on success.
    pub fn validate(&self) -> Result<u8, ConfigError> {
        if !self.input_dir.is_dir() {
            return Err(ConfigError::MissingInputDir(self.input_dir.clone()));
        }
        if !is_cube_file(&self.lut_path) {
            return Err(ConfigError::NotCubeLut(self.lut_path.clone()));
        }
        if !self.lut_path.is_file() {
            return Err(ConfigError::MissingLut(self.lut_path.clone()));
        }
        if !(CRF_MIN..=CRF_MAX).contains(&self.crf) {
            return Err(ConfigError::CrfOutOfRange(self.crf));
        }
        Ok(self.crf as u8)
    }
}

fn is_cube_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("cube"))
}

/// A validated batch, ready to run
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub jobs: Vec<VideoJob>,
    pub skipped: Vec<PathBuf>,
    pub backend: EncoderBackend,
    pub ctx: EncodeContext,
    pub workers: usize,
}

/// Input that failed, with the encoder's diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub input_path: PathBuf,
    pub error: String,
}

impl FailedJob {
    pub fn file_name(&self) -> String {
        display_file_name(&self.input_path)
    }
}

/// Aggregate outcome of a batch; filled in as jobs finish
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub backend: EncoderBackend,
    pub workers: usize,
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<FailedJob>,
    pub skipped: Vec<PathBuf>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl BatchResult {
    pub fn new(plan: &BatchPlan) -> Self {
        Self {
            total: plan.jobs.len(),
            backend: plan.backend,
            workers: plan.workers,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: plan.skipped.clone(),
            started_at: Local::now(),
            finished_at: None,
        }
    }

    /// Successfully processed jobs
    pub fn processed(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Fold a worker message into the aggregate; non-terminal messages are ignored
    pub fn record(&mut self, message: &WorkerMessage) {
        match message {
            WorkerMessage::JobCompleted { output_path, .. } => {
                self.succeeded.push(output_path.clone());
            }
            WorkerMessage::JobFailed {
                input_path, error, ..
            } => {
                self.failed.push(FailedJob {
                    input_path: input_path.clone(),
                    error: error.clone(),
                });
            }
            _ => {}
        }
    }

    fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    /// Wall-clock duration of the batch, once finished
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

#[derive(Debug)]
pub enum BatchOutcome {
    /// No input needed processing
    NothingToDo {
        input_dir: PathBuf,
        skipped: Vec<PathBuf>,
    },
    Finished(BatchResult),
}

/// Receives the batch lifecycle, usually to render it on the terminal
pub trait BatchDisplay {
    fn begin(&mut self, plan: &BatchPlan) -> std::io::Result<()>;
    fn update(&mut self, message: &WorkerMessage, result: &BatchResult) -> std::io::Result<()>;
    fn finish(&mut self, result: &BatchResult) -> std::io::Result<()>;
}

/// Top-level driver of one batch run
pub struct BatchOrchestrator<E: EncoderTool> {
    settings: BatchSettings,
    encoder: E,
    cpus: usize,
}

impl<E: EncoderTool> BatchOrchestrator<E> {
    pub fn new(settings: BatchSettings, encoder: E) -> Self {
        Self {
            settings,
            encoder,
            cpus: worker::available_cpus(),
        }
    }

    /// Override the detected CPU count used when no thread count is set
    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = cpus;
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Validate, discover jobs and fix backend, profile and worker count.
    /// A plan without jobs skips encoder detection entirely.
    pub fn plan(&self) -> Result<BatchPlan, ConfigError> {
        let crf = self.settings.validate()?;

        let files = scan(&self.settings.input_dir).map_err(|e| ConfigError::Scan {
            path: self.settings.input_dir.clone(),
            message: format!("{e:#}"),
        })?;
        let queue = build_job_queue(files, self.settings.overwrite);

        let backend = if queue.jobs.is_empty() {
            EncoderBackend::Software
        } else if self.settings.use_hardware {
            let avail = self.encoder.detect_backends();
            let backend = hardware::select_backend(&avail);
            if backend.is_hardware() {
                tracing::info!(%backend, "hardware encoder detected and will be used");
            } else {
                tracing::info!("no hardware encoders detected, falling back to CPU encoding");
            }
            backend
        } else {
            tracing::info!("hardware acceleration disabled, using CPU encoding");
            EncoderBackend::Software
        };

        let profile = EncoderProfile::build(backend, self.settings.preset, crf);
        let workers = worker::resolve_worker_count(self.settings.threads, self.cpus, queue.jobs.len());
        tracing::info!(jobs = queue.jobs.len(), workers, "batch planned");

        Ok(BatchPlan {
            jobs: queue.jobs,
            skipped: queue.skipped,
            backend,
            ctx: EncodeContext {
                lut_path: self.settings.lut_path.clone(),
                profile,
                overwrite: self.settings.overwrite,
            },
            workers,
        })
    }

    /// Run the whole batch. Only configuration problems are returned as errors;
    /// per-job failures end up in the `BatchResult`.
    pub fn run(&self, display: &mut dyn BatchDisplay) -> Result<BatchOutcome, ConfigError> {
        let plan = self.plan()?;
        if plan.jobs.is_empty() {
            return Ok(BatchOutcome::NothingToDo {
                input_dir: self.settings.input_dir.clone(),
                skipped: plan.skipped,
            });
        }
        Ok(BatchOutcome::Finished(self.execute(plan, display)))
    }

    /// Drive a plan to completion through the worker pool
    pub fn execute(&self, plan: BatchPlan, display: &mut dyn BatchDisplay) -> BatchResult {
        let mut result = BatchResult::new(&plan);

        if let Err(e) = display.begin(&plan) {
            tracing::warn!(error = %e, "failed to prepare terminal display");
        }

        let pool = WorkerPool::new(plan.workers).with_refresh_interval(self.settings.refresh_interval);
        pool.run(plan.jobs, &self.encoder, &plan.ctx, |message| {
            result.record(&message);
            if let Err(e) = display.update(&message, &result) {
                tracing::debug!(error = %e, "display update failed");
            }
        });

        result.finish();
        if let Err(e) = display.finish(&result) {
            tracing::warn!(error = %e, "failed to restore terminal display");
        }

        result
    }
}
