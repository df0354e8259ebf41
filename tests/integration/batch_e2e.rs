// Whole-batch runs through the orchestrator with a fake encoder

use lutbatch::engine::{
    BackendAvailability, BatchOrchestrator, BatchOutcome, EncoderBackend, QualityPreset,
    WorkerMessage, display_file_name,
};
use std::fs;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::common::fake_encoder::{Event, FakeEncoder};
use crate::common::helpers::{Fixture, RecordingDisplay};

fn finished(outcome: BatchOutcome) -> lutbatch::engine::BatchResult {
    match outcome {
        BatchOutcome::Finished(result) => result,
        other => panic!("expected a finished batch, got {:?}", other),
    }
}

#[test]
fn test_three_files_two_workers_software() {
    let fx = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
    let mut settings = fx.settings();
    settings.threads = Some(2);
    settings.crf = 23;
    settings.preset = QualityPreset::Medium;

    let encoder = FakeEncoder::new()
        .with_availability(BackendAvailability {
            nvenc: true,
            ..BackendAvailability::none()
        })
        .with_work_time(Duration::from_millis(150));
    let orchestrator = BatchOrchestrator::new(settings, encoder);

    let plan = orchestrator.plan().unwrap();
    assert_eq!(plan.backend, EncoderBackend::Software);
    assert_eq!(plan.workers, 2);

    let mut display = RecordingDisplay::default();
    let result = orchestrator.execute(plan, &mut display);

    assert_eq!(result.total, 3);
    assert_eq!(result.processed(), 3);
    assert_eq!(result.failed_count(), 0);
    assert!(result.finished_at.is_some());

    let encoder = orchestrator.encoder();
    // Hardware disabled: no capability probe at all
    assert_eq!(encoder.detect_calls.load(Ordering::SeqCst), 0);
    assert_eq!(encoder.encode_calls.load(Ordering::SeqCst), 3);
    assert_eq!(encoder.max_running.load(Ordering::SeqCst), 2);

    // The third job only starts once a worker has finished one
    let events = encoder.events();
    let third_start = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::Started(_)))
        .nth(2)
        .map(|(i, _)| i)
        .unwrap();
    assert!(
        events[..third_start]
            .iter()
            .any(|e| matches!(e, Event::Finished(_)))
    );

    for args in encoder.seen_profiles.lock().unwrap().iter() {
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264 -crf 23 -preset medium"));
    }

    assert_eq!(display.began, Some((3, 2)));
    assert!(display.finished);
    assert_eq!(display.final_counts, Some((3, 0)));
}

#[test]
fn test_failure_is_isolated_to_its_job() {
    let fx = Fixture::new(&["a.mp4", "b.mov", "c.mkv", "d.avi"]);
    let encoder = FakeEncoder::new().failing_on("c.mkv");
    let orchestrator = BatchOrchestrator::new(fx.settings(), encoder);

    let mut display = RecordingDisplay::default();
    let result = finished(orchestrator.run(&mut display).unwrap());

    assert_eq!(result.processed(), 3);
    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.failed[0].input_path, fx.video("c.mkv"));
    assert_eq!(result.failed[0].file_name(), "c.mkv");
    assert!(result.failed[0].error.contains("exit status: 1"));
    assert!(result.failed[0].error.contains("Invalid data found"));

    let mut outputs: Vec<String> = result.succeeded.iter().map(|p| display_file_name(p)).collect();
    outputs.sort();
    assert_eq!(outputs, vec!["a_LUT.mp4", "b_LUT.mov", "d_LUT.avi"]);

    assert_eq!(
        display.count(|m| matches!(m, WorkerMessage::JobFailed { .. })),
        1
    );
    assert_eq!(
        display.count(|m| matches!(m, WorkerMessage::JobCompleted { .. })),
        3
    );
}

#[test]
fn test_dispatch_follows_file_name_order() {
    let fx = Fixture::new(&["c.mp4", "a.mp4", "b.mp4"]);
    let mut settings = fx.settings();
    settings.threads = Some(1);
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());

    let mut display = RecordingDisplay::default();
    finished(orchestrator.run(&mut display).unwrap());

    assert_eq!(display.started(), vec!["a.mp4", "b.mp4", "c.mp4"]);
}

#[test]
fn test_hardware_backend_priority() {
    let fx = Fixture::new(&["a.mp4"]);
    let mut settings = fx.settings();
    settings.use_hardware = true;

    let encoder = FakeEncoder::new().with_availability(BackendAvailability {
        amf: true,
        qsv: true,
        videotoolbox: true,
        ..BackendAvailability::none()
    });
    let orchestrator = BatchOrchestrator::new(settings, encoder);

    let plan = orchestrator.plan().unwrap();
    assert_eq!(plan.backend, EncoderBackend::Amf);
    assert_eq!(plan.ctx.profile.backend, EncoderBackend::Amf);
    assert!(plan.ctx.profile.args().iter().any(|a| a == "h264_amf"));
    assert_eq!(orchestrator.encoder().detect_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_no_hardware_falls_back_to_software() {
    let fx = Fixture::new(&["a.mp4"]);
    let mut settings = fx.settings();
    settings.use_hardware = true;
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());

    let plan = orchestrator.plan().unwrap();
    assert_eq!(plan.backend, EncoderBackend::Software);
    assert_eq!(orchestrator.encoder().detect_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_worker_count_defaults_to_cpus() {
    let fx = Fixture::new(&["1.mp4", "2.mp4", "3.mp4", "4.mp4", "5.mp4"]);

    let orchestrator = BatchOrchestrator::new(fx.settings(), FakeEncoder::new()).with_cpus(3);
    assert_eq!(orchestrator.plan().unwrap().workers, 3);

    let mut settings = fx.settings();
    settings.threads = Some(0);
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new()).with_cpus(4);
    assert_eq!(orchestrator.plan().unwrap().workers, 4);

    // Never more workers than jobs
    let mut settings = fx.settings();
    settings.threads = Some(16);
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());
    assert_eq!(orchestrator.plan().unwrap().workers, 5);
}

#[test]
fn test_empty_directory_is_nothing_to_do() {
    let fx = Fixture::new(&["notes.txt", "look_LUT.mp4"]);
    let orchestrator = BatchOrchestrator::new(fx.settings(), FakeEncoder::new());

    let mut display = RecordingDisplay::default();
    match orchestrator.run(&mut display).unwrap() {
        BatchOutcome::NothingToDo { input_dir, skipped } => {
            assert_eq!(input_dir, fx.videos);
            assert!(skipped.is_empty());
        }
        other => panic!("expected nothing to do, got {:?}", other),
    }

    assert!(display.began.is_none());
    assert_eq!(orchestrator.encoder().encode_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_existing_outputs_are_skipped_unless_overwrite() {
    let fx = Fixture::new(&["a.mp4", "b.mp4"]);
    fs::write(fx.video("a_LUT.mp4"), b"done earlier").unwrap();

    let orchestrator = BatchOrchestrator::new(fx.settings(), FakeEncoder::new());
    let result = finished(orchestrator.run(&mut RecordingDisplay::default()).unwrap());
    assert_eq!(result.total, 1);
    assert_eq!(result.skipped, vec![fx.video("a.mp4")]);
    assert_eq!(result.succeeded, vec![fx.video("b_LUT.mp4")]);

    let mut settings = fx.settings();
    settings.overwrite = true;
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());
    let plan = orchestrator.plan().unwrap();
    assert_eq!(plan.jobs.len(), 2);
    assert!(plan.skipped.is_empty());
    assert!(plan.ctx.overwrite);
}

#[test]
fn test_progress_updates_are_throttled() {
    let fx = Fixture::new(&["a.mp4", "b.mp4"]);

    // Zero interval: every progress block reaches the display
    let orchestrator = BatchOrchestrator::new(fx.settings(), FakeEncoder::new());
    let mut display = RecordingDisplay::default();
    finished(orchestrator.run(&mut display).unwrap());
    assert_eq!(
        display.count(|m| matches!(m, WorkerMessage::ProgressUpdate { .. })),
        6
    );

    // Long interval: none of the quick updates get through
    let mut settings = fx.settings();
    settings.refresh_interval = Duration::from_secs(3600);
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());
    let mut display = RecordingDisplay::default();
    finished(orchestrator.run(&mut display).unwrap());
    assert_eq!(
        display.count(|m| matches!(m, WorkerMessage::ProgressUpdate { .. })),
        0
    );
    assert_eq!(
        display.count(|m| matches!(m, WorkerMessage::JobCompleted { .. })),
        2
    );
}

#[test]
fn test_every_worker_reports_idle() {
    let fx = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
    let mut settings = fx.settings();
    settings.threads = Some(3);
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());

    let mut display = RecordingDisplay::default();
    finished(orchestrator.run(&mut display).unwrap());

    assert_eq!(
        display.count(|m| matches!(m, WorkerMessage::WorkerIdle { .. })),
        3
    );
    // Idle notices arrive after the last job of that worker, so the batch is complete by then
    assert!(matches!(
        display.messages.last(),
        Some(WorkerMessage::WorkerIdle { .. })
    ));
}

#[test]
fn test_report_serializes_result() {
    let fx = Fixture::new(&["a.mp4", "b.mp4"]);
    let orchestrator = BatchOrchestrator::new(fx.settings(), FakeEncoder::new().failing_on("b.mp4"));
    let result = finished(orchestrator.run(&mut RecordingDisplay::default()).unwrap());

    let json: serde_json::Value = serde_json::to_value(&result).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["backend"], "software");
    assert_eq!(json["succeeded"].as_array().unwrap().len(), 1);
    assert!(
        json["failed"][0]["error"]
            .as_str()
            .unwrap()
            .contains("Invalid data")
    );
    assert!(json["started_at"].is_string());
    assert!(json["finished_at"].is_string());
}
