// Invalid batch requests must be rejected before any encoder runs

use lutbatch::engine::{BatchOrchestrator, ConfigError};
use std::fs;
use std::sync::atomic::Ordering;

use crate::common::fake_encoder::FakeEncoder;
use crate::common::helpers::{Fixture, RecordingDisplay};

#[test]
fn test_non_cube_lut_rejected_without_encoding() {
    let fx = Fixture::new(&["a.mp4", "b.mp4"]);
    let png = fx.dir.path().join("look.png");
    fs::write(&png, b"png").unwrap();

    let mut settings = fx.settings();
    settings.lut_path = png.clone();
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());

    let mut display = RecordingDisplay::default();
    let err = orchestrator.run(&mut display).unwrap_err();
    assert!(matches!(err, ConfigError::NotCubeLut(ref p) if *p == png));
    assert!(err.to_string().contains("not in .cube format"));

    assert_eq!(orchestrator.encoder().encode_calls.load(Ordering::SeqCst), 0);
    assert_eq!(orchestrator.encoder().detect_calls.load(Ordering::SeqCst), 0);
    assert!(display.began.is_none());
}

#[test]
fn test_cube_extension_is_case_insensitive() {
    let fx = Fixture::new(&["a.mp4"]);
    let upper = fx.dir.path().join("LOOK.CUBE");
    fs::write(&upper, crate::common::helpers::IDENTITY_CUBE).unwrap();

    let mut settings = fx.settings();
    settings.lut_path = upper;
    assert!(settings.validate().is_ok());
}

#[test]
fn test_missing_lut_rejected() {
    let fx = Fixture::new(&["a.mp4"]);
    let mut settings = fx.settings();
    settings.lut_path = fx.dir.path().join("absent.cube");

    let err = settings.validate().unwrap_err();
    assert!(matches!(err, ConfigError::MissingLut(_)));
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_missing_input_dir_rejected() {
    let fx = Fixture::new(&[]);
    let mut settings = fx.settings();
    settings.input_dir = fx.dir.path().join("nowhere");

    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());
    let err = orchestrator.plan().unwrap_err();
    assert!(matches!(err, ConfigError::MissingInputDir(_)));
    assert!(err.to_string().starts_with("Input directory '"));
}

#[test]
fn test_input_dir_must_be_a_directory() {
    let fx = Fixture::new(&["a.mp4"]);
    let mut settings = fx.settings();
    settings.input_dir = fx.video("a.mp4");

    assert!(matches!(
        settings.validate(),
        Err(ConfigError::MissingInputDir(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_input_dir_is_a_scan_error() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new(&["a.mp4"]);
    fs::set_permissions(&fx.videos, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits don't stop root; nothing to check then
    let readable = fs::read_dir(&fx.videos).is_ok();
    let outcome = BatchOrchestrator::new(fx.settings(), FakeEncoder::new()).plan();
    fs::set_permissions(&fx.videos, fs::Permissions::from_mode(0o755)).unwrap();
    if readable {
        return;
    }

    let err = outcome.unwrap_err();
    assert!(matches!(err, ConfigError::Scan { ref path, .. } if *path == fx.videos));
    assert!(err.to_string().starts_with("Failed to list video files in '"));
}

#[test]
fn test_crf_range() {
    let fx = Fixture::new(&["a.mp4"]);

    for crf in [-1, 52, 100, i32::MIN] {
        let mut settings = fx.settings();
        settings.crf = crf;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::CrfOutOfRange(c) if c == crf));
        assert!(err.to_string().contains("between 0 and 51"));
    }

    for crf in [0, 23, 51] {
        let mut settings = fx.settings();
        settings.crf = crf;
        assert_eq!(settings.validate().unwrap(), crf as u8);
    }
}

#[test]
fn test_crf_error_does_not_start_batch() {
    let fx = Fixture::new(&["a.mp4"]);
    let mut settings = fx.settings();
    settings.crf = 60;
    let orchestrator = BatchOrchestrator::new(settings, FakeEncoder::new());

    assert!(orchestrator.run(&mut RecordingDisplay::default()).is_err());
    assert_eq!(orchestrator.encoder().encode_calls.load(Ordering::SeqCst), 0);
}
