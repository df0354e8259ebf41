//! Hardware encoder detection and backend selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::Command;

// ============================================================================
// Encoder backends
// ============================================================================

/// H.264 encoder backends ffmpeg can drive for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderBackend {
    Software,     // libx264
    Nvenc,        // NVIDIA NVENC
    Amf,          // AMD AMF
    Qsv,          // Intel Quick Sync
    VideoToolbox, // Apple VideoToolbox
}

/// Hardware backends in the order they are preferred (discrete GPUs first).
/// Software is the implicit last resort.
pub const BACKEND_PRIORITY: [EncoderBackend; 4] = [
    EncoderBackend::Nvenc,
    EncoderBackend::Amf,
    EncoderBackend::VideoToolbox,
    EncoderBackend::Qsv,
];

impl EncoderBackend {
    /// Get the FFmpeg encoder name
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::Software => "libx264",
            Self::Nvenc => "h264_nvenc",
            Self::Amf => "h264_amf",
            Self::Qsv => "h264_qsv",
            Self::VideoToolbox => "h264_videotoolbox",
        }
    }

    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::Software)
    }

    /// Get user-friendly display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Software => "libx264 (Software)",
            Self::Nvenc => "NVENC (NVIDIA)",
            Self::Amf => "AMF (AMD)",
            Self::Qsv => "Quick Sync (Intel)",
            Self::VideoToolbox => "VideoToolbox (Apple)",
        }
    }
}

impl fmt::Display for EncoderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Capability detection
// ============================================================================

/// Which hardware backends the local ffmpeg build reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackendAvailability {
    pub nvenc: bool,
    pub amf: bool,
    pub qsv: bool,
    pub videotoolbox: bool,
}

impl BackendAvailability {
    /// Nothing but software encoding
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, backend: EncoderBackend) -> bool {
        match backend {
            EncoderBackend::Software => true,
            EncoderBackend::Nvenc => self.nvenc,
            EncoderBackend::Amf => self.amf,
            EncoderBackend::Qsv => self.qsv,
            EncoderBackend::VideoToolbox => self.videotoolbox,
        }
    }

    /// Available hardware backends, in priority order
    pub fn hardware_backends(&self) -> Vec<EncoderBackend> {
        BACKEND_PRIORITY
            .iter()
            .copied()
            .filter(|b| self.contains(*b))
            .collect()
    }
}

/// Scan `ffmpeg -encoders` output for hardware H.264 encoders.
/// An encoder counts only when its name appears as a whole word with spaces on both sides.
pub fn parse_encoder_listing(listing: &str) -> BackendAvailability {
    let has = |backend: EncoderBackend| listing.contains(&format!(" {} ", backend.ffmpeg_name()));

    BackendAvailability {
        nvenc: has(EncoderBackend::Nvenc),
        amf: has(EncoderBackend::Amf),
        qsv: has(EncoderBackend::Qsv),
        videotoolbox: has(EncoderBackend::VideoToolbox),
    }
}

/// Ask ffmpeg once which encoders it was built with.
/// Any failure degrades to "no hardware" so the batch falls back to software.
pub fn detect_backends(ffmpeg: &Path) -> BackendAvailability {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let mut listing = String::from_utf8_lossy(&out.stdout).into_owned();
            listing.push_str(&String::from_utf8_lossy(&out.stderr));
            let avail = parse_encoder_listing(&listing);
            tracing::debug!(?avail, "ffmpeg encoder probe finished");
            avail
        }
        Ok(out) => {
            tracing::debug!(status = %out.status, "ffmpeg encoder probe failed");
            BackendAvailability::none()
        }
        Err(e) => {
            tracing::debug!(error = %e, ffmpeg = %ffmpeg.display(), "could not run ffmpeg encoder probe");
            BackendAvailability::none()
        }
    }
}

/// Pick the single backend for the batch: first available in `BACKEND_PRIORITY`, else software
pub fn select_backend(avail: &BackendAvailability) -> EncoderBackend {
    avail
        .hardware_backends()
        .first()
        .copied()
        .unwrap_or(EncoderBackend::Software)
}
