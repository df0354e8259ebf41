use clap::{Parser, Subcommand};
use lutbatch::engine::QualityPreset;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lutbatch")]
#[command(
    about = "Batch-apply a .cube LUT to every video in a directory using ffmpeg",
    long_about = None
)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    /// Directory containing the videos to process
    #[arg(value_name = "INPUT_DIR", required = true)]
    pub input_dir: Option<PathBuf>,

    /// LUT file in .cube format
    #[arg(value_name = "LUT_FILE", required = true)]
    pub lut_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Encoding preset (default from config, otherwise medium)
    #[arg(short, long, value_name = "PRESET")]
    pub quality: Option<QualityPreset>,

    /// Constant rate factor 0-51, lower is better quality (default 23)
    #[arg(short, long, allow_negative_numbers = true)]
    pub crf: Option<i32>,

    /// Number of parallel encodes (default: number of CPUs, 0 = auto)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Use a hardware encoder when one is available (default)
    #[arg(short = 'g', long = "gpu", conflicts_with = "no_gpu")]
    pub gpu: bool,

    /// Always encode on the CPU with libx264
    #[arg(long = "no-gpu", conflicts_with = "gpu")]
    pub no_gpu: bool,

    /// Re-encode videos whose _LUT output already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Show the ffmpeg commands that would run without encoding anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write the batch result as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Append diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging, written to lutbatch.log unless --log-file is given
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// `Some(true)` for --gpu, `Some(false)` for --no-gpu, `None` to use the config
    pub fn use_hardware(&self) -> Option<bool> {
        if self.gpu {
            Some(true)
        } else if self.no_gpu {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// List the hardware H.264 encoders ffmpeg reports and the one that would be used
    Encoders,

    /// Probe a video file to get its duration
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// Scan a directory and show jobs without encoding
    Scan {
        /// Directory to scan
        directory: PathBuf,

        /// Include files that already have output files (re-encode)
        #[arg(long)]
        overwrite: bool,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
