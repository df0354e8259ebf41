// Shared fixtures for integration tests

pub mod ffmpeg_runner;
