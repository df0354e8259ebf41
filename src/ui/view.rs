// Live batch view: one row per worker slot plus header and running summary

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::{BatchDisplay, BatchPlan, BatchResult, WorkerMessage};
use crate::ui::constants::{FIRST_SLOT_ROW, HEADER_ROW, RULE_CHAR, RULE_ROW, RULE_WIDTH, SUMMARY_GAP};
use crate::ui::terminal::TerminalMultiplexer;
use crate::ui::widgets::{finished_line, progress_line, running_summary_line, starting_line};

/// Screen row of a worker slot
pub fn slot_row(slot: usize) -> u16 {
    FIRST_SLOT_ROW.saturating_add(u16::try_from(slot).unwrap_or(u16::MAX))
}

/// Screen row of the running summary for a pool of `workers`
pub fn summary_row(workers: usize) -> u16 {
    slot_row(workers).saturating_add(SUMMARY_GAP)
}

pub fn header_line(total: usize, workers: usize) -> String {
    format!("Processing {} video files with {} workers", total, workers)
}

/// Renders worker messages onto a `TerminalMultiplexer`.
///
/// Slots are reused modulo the worker count, so a finished job's line is
/// overwritten by the next job dispatched to the same slot.
pub struct BatchView {
    term: Arc<TerminalMultiplexer>,
    workers: usize,
    total: usize,
    names: HashMap<Uuid, String>,
}

impl BatchView {
    /// `term` may also be held by the interrupt handler
    pub fn new(term: Arc<TerminalMultiplexer>) -> Self {
        Self {
            term,
            workers: 1,
            total: 0,
            names: HashMap::new(),
        }
    }

    fn job_name(&self, job_id: &Uuid) -> &str {
        self.names.get(job_id).map_or("?", String::as_str)
    }

    fn write_summary(&self, result: &BatchResult) -> io::Result<()> {
        self.term.write_line(
            summary_row(self.workers),
            &running_summary_line(result.processed(), result.failed_count(), self.total),
        )
    }
}

impl BatchDisplay for BatchView {
    fn begin(&mut self, plan: &BatchPlan) -> io::Result<()> {
        self.workers = plan.workers.max(1);
        self.total = plan.jobs.len();
        self.names.clear();

        self.term.prepare(summary_row(self.workers).saturating_add(1))?;
        self.term
            .write_line(HEADER_ROW, &header_line(self.total, self.workers))?;
        self.term
            .write_line(RULE_ROW, &RULE_CHAR.to_string().repeat(RULE_WIDTH))
    }

    fn update(&mut self, message: &WorkerMessage, result: &BatchResult) -> io::Result<()> {
        match message {
            WorkerMessage::JobStarted {
                job_id,
                slot,
                file_name,
            } => {
                self.names.insert(*job_id, file_name.clone());
                self.term.write_line(slot_row(*slot), &starting_line(file_name))
            }
            WorkerMessage::ProgressUpdate {
                job_id,
                slot,
                snapshot,
            } => {
                // Appending every refresh to a log file is noise
                if !self.term.is_multiplexed() {
                    return Ok(());
                }
                match progress_line(self.job_name(job_id), snapshot) {
                    Some(line) => self.term.write_line(slot_row(*slot), &line),
                    None => Ok(()),
                }
            }
            WorkerMessage::JobCompleted {
                job_id,
                slot,
                elapsed,
                ..
            } => {
                let name = self.names.remove(job_id).unwrap_or_default();
                self.term
                    .write_line(slot_row(*slot), &finished_line(&name, true, *elapsed))?;
                self.write_summary(result)
            }
            WorkerMessage::JobFailed {
                job_id,
                slot,
                elapsed,
                ..
            } => {
                let name = self.names.remove(job_id).unwrap_or_default();
                self.term
                    .write_line(slot_row(*slot), &finished_line(&name, false, *elapsed))?;
                self.write_summary(result)
            }
            WorkerMessage::WorkerIdle { .. } => Ok(()),
        }
    }

    fn finish(&mut self, _result: &BatchResult) -> io::Result<()> {
        self.term.restore()
    }
}

impl Drop for BatchView {
    fn drop(&mut self) {
        let _ = self.term.restore();
    }
}
