// Tests for worker pool and message handling

use lutbatch::engine::{
    EncodeContext, EncoderBackend, EncoderProfile, JobStatus, QualityPreset, VideoJob,
    worker::{WorkerMessage, WorkerPool},
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::common::fake_encoder::FakeEncoder;

fn jobs(names: &[&str]) -> Vec<VideoJob> {
    names
        .iter()
        .map(|n| VideoJob::new(PathBuf::from(n), PathBuf::from(format!("out/{n}"))))
        .collect()
}

fn ctx() -> EncodeContext {
    EncodeContext {
        lut_path: PathBuf::from("look.cube"),
        profile: EncoderProfile::build(EncoderBackend::Software, QualityPreset::Medium, 23),
        overwrite: false,
    }
}

#[test]
fn test_pool_returns_jobs_in_dispatch_order() {
    let pool = WorkerPool::new(3).with_refresh_interval(Duration::ZERO);
    let encoder = FakeEncoder::new().failing_on("c.mp4");
    let input = jobs(&["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4"]);
    let ids: Vec<_> = input.iter().map(|j| j.id).collect();

    let done = pool.run(input, &encoder, &ctx(), |_| {});

    assert_eq!(done.iter().map(|j| j.id).collect::<Vec<_>>(), ids);
    let statuses: Vec<JobStatus> = done.iter().map(|j| j.status).collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Completed,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Completed,
            JobStatus::Completed,
        ]
    );
    assert!(done.iter().all(|j| j.elapsed.is_some()));
    assert!(done[2].last_error.as_deref().unwrap().contains("Invalid data"));
    assert_eq!(encoder.encode_calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_slots_wrap_modulo_worker_count() {
    let pool = WorkerPool::new(2).with_refresh_interval(Duration::ZERO);
    let encoder = FakeEncoder::new();
    let mut slots = HashMap::new();

    pool.run(
        jobs(&["0.mp4", "1.mp4", "2.mp4", "3.mp4", "4.mp4"]),
        &encoder,
        &ctx(),
        |message| {
            if let WorkerMessage::JobStarted {
                slot, file_name, ..
            } = message
            {
                slots.insert(file_name, slot);
            }
        },
    );

    for i in 0..5 {
        assert_eq!(slots[&format!("{i}.mp4")], i % 2);
    }
}

#[test]
fn test_concurrency_never_exceeds_workers() {
    let pool = WorkerPool::new(3);
    let encoder = FakeEncoder::new().with_work_time(Duration::from_millis(30));

    pool.run(
        jobs(&["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4", "f.mp4", "g.mp4", "h.mp4"]),
        &encoder,
        &ctx(),
        |_| {},
    );

    let max = encoder.max_running.load(Ordering::SeqCst);
    assert!((1..=3).contains(&max), "max concurrency was {max}");
}

#[test]
fn test_message_order_per_job() {
    let pool = WorkerPool::new(2).with_refresh_interval(Duration::ZERO);
    let encoder = FakeEncoder::new();
    let mut per_job: HashMap<uuid::Uuid, Vec<&'static str>> = HashMap::new();

    pool.run(jobs(&["a.mp4", "b.mp4", "c.mp4"]), &encoder, &ctx(), |message| {
        let (id, kind) = match message {
            WorkerMessage::JobStarted { job_id, .. } => (job_id, "started"),
            WorkerMessage::ProgressUpdate { job_id, .. } => (job_id, "progress"),
            WorkerMessage::JobCompleted { job_id, .. } => (job_id, "completed"),
            WorkerMessage::JobFailed { job_id, .. } => (job_id, "failed"),
            WorkerMessage::WorkerIdle { .. } => return,
        };
        per_job.entry(id).or_default().push(kind);
    });

    assert_eq!(per_job.len(), 3);
    for kinds in per_job.values() {
        assert_eq!(kinds, &["started", "progress", "progress", "progress", "completed"]);
    }
}

#[test]
fn test_empty_queue_only_reports_idle() {
    let pool = WorkerPool::new(2);
    let encoder = FakeEncoder::new();
    let mut messages = Vec::new();

    let done = pool.run(Vec::new(), &encoder, &ctx(), |m| messages.push(m));

    assert!(done.is_empty());
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| matches!(m, WorkerMessage::WorkerIdle { .. })));
}
