mod ffmpeg_cmd;
mod ffmpeg_info;
mod profile;
mod scan;
mod types;

pub use ffmpeg_cmd::{
    EncodeContext, EncoderTool, FfmpegEncoder, build_encode_cmd, format_ffmpeg_cmd, lut3d_filter,
    run_ffmpeg_with_progress, stderr_tail,
};
pub use ffmpeg_info::{
    FfmpegTools, ffmpeg_version, ffprobe_version, parse_ffprobe_duration, probe_duration,
};
pub use profile::{
    CRF_MAX, CRF_MIN, DEFAULT_CRF, EncoderProfile, ParsePresetError, QualityPreset,
    videotoolbox_quality,
};
pub use scan::{
    JobQueue, OUTPUT_SUFFIX, build_job_queue, derive_output_path, display_file_name,
    is_lut_output, is_video_file, scan,
};
pub use types::{JobStatus, ProgressMode, ProgressParser, ProgressSnapshot, VideoJob};
