use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::engine::hardware::EncoderBackend;

/// Lowest accepted CRF value (best quality)
pub const CRF_MIN: i32 = 0;
/// Highest accepted CRF value (worst quality)
pub const CRF_MAX: i32 = 51;
pub const DEFAULT_CRF: u8 = 23;

/// x264-style speed/quality presets, slowest (highest quality) first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Veryslow,
    Slower,
    Slow,
    #[default]
    Medium,
    Fast,
    Faster,
    Veryfast,
    Superfast,
    Ultrafast,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 9] = [
        Self::Veryslow,
        Self::Slower,
        Self::Slow,
        Self::Medium,
        Self::Fast,
        Self::Faster,
        Self::Veryfast,
        Self::Superfast,
        Self::Ultrafast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veryslow => "veryslow",
            Self::Slower => "slower",
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
            Self::Faster => "faster",
            Self::Veryfast => "veryfast",
            Self::Superfast => "superfast",
            Self::Ultrafast => "ultrafast",
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown quality preset '{0}' (expected one of: ultrafast, superfast, veryfast, faster, fast, medium, slow, slower, veryslow)")]
pub struct ParsePresetError(pub String);

impl FromStr for QualityPreset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ParsePresetError(s.to_string()))
    }
}

/// Backend-specific encoder arguments for one batch.
/// Built once before any job starts and shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncoderProfile {
    pub backend: EncoderBackend,
    pub preset: QualityPreset,
    pub crf: u8,
    args: Vec<String>,
}

impl EncoderProfile {
    /// Map (backend, preset, crf) to ffmpeg arguments.
    /// `crf` is expected to be validated already; values above 51 are clamped.
    pub fn build(backend: EncoderBackend, preset: QualityPreset, crf: u8) -> Self {
        let crf = crf.min(CRF_MAX as u8);
        let mut args = video_args(backend, preset, crf);
        args.extend(common_args());

        Self {
            backend,
            preset,
            crf,
            args,
        }
    }

    /// Ordered encoder arguments: video codec settings followed by stream/format normalization
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

fn video_args(backend: EncoderBackend, preset: QualityPreset, crf: u8) -> Vec<String> {
    use QualityPreset::*;

    let crf_s = crf.to_string();
    let mut args: Vec<String> = vec!["-c:v".into(), backend.ffmpeg_name().into()];

    match backend {
        EncoderBackend::Software => {
            args.extend(["-crf".into(), crf_s, "-preset".into(), preset.as_str().into()]);
        }
        EncoderBackend::Nvenc => {
            let nv_preset = match preset {
                Veryslow | Slower | Slow => "p4",
                Medium => "p2",
                _ => "p1",
            };
            args.extend([
                "-preset".into(),
                nv_preset.into(),
                "-profile:v".into(),
                "high".into(),
                "-rc".into(),
                "vbr".into(),
                "-cq".into(),
                crf_s,
                // Zero bitrate puts NVENC in pure constant-quality mode
                "-b:v".into(),
                "0".into(),
            ]);
        }
        EncoderBackend::Amf => {
            let amf_quality = match preset {
                Veryslow | Slower | Slow | Medium => "quality",
                _ => "speed",
            };
            args.extend([
                "-quality".into(),
                amf_quality.into(),
                "-rc".into(),
                "cqp".into(),
                "-qp_i".into(),
                crf_s.clone(),
                "-qp_p".into(),
                crf_s,
            ]);
        }
        EncoderBackend::Qsv => {
            let qsv_preset = match preset {
                Veryslow | Slower => "veryslow",
                Slow => "slower",
                Medium => "medium",
                _ => "faster",
            };
            args.extend([
                "-preset".into(),
                qsv_preset.into(),
                "-global_quality".into(),
                crf_s,
            ]);
        }
        EncoderBackend::VideoToolbox => {
            args.extend([
                "-q:v".into(),
                videotoolbox_quality(crf).to_string(),
                "-allow_sw".into(),
                "1".into(),
            ]);
        }
    }

    args
}

/// VideoToolbox quality runs 1..=100 with higher meaning better
pub fn videotoolbox_quality(crf: u8) -> u8 {
    let q = (CRF_MAX - i32::from(crf)) * 2;
    q.clamp(1, 100) as u8
}

fn common_args() -> Vec<String> {
    [
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "copy",
        "-map",
        "0:v:0",
        "-map",
        "0:a?",
        "-ignore_unknown",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
