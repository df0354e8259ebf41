use crate::cli::{Cli, Commands};
use lutbatch::engine::{
    self, BatchOrchestrator, BatchPlan, BatchResult, BatchSettings, FfmpegEncoder, FfmpegTools,
    hardware,
};
use lutbatch::{config, logging, ui};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// Config file, or built-in defaults when it is missing or broken
fn load_config() -> config::Config {
    match config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "ignoring config file, using defaults");
            config::Config::default()
        }
    }
}

pub fn run(mut cli: Cli) {
    if let Err(e) = logging::init(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Warning: {:#}", e);
    }

    let config = load_config();

    // Handle subcommands first
    if let Some(command) = cli.command.take() {
        match command {
            Commands::CheckFfmpeg => handle_check_ffmpeg(&config.tools),
            Commands::Encoders => handle_encoders(&config.tools),
            Commands::Probe { file } => handle_probe(&config.tools, &file),
            Commands::Scan {
                directory,
                overwrite,
            } => handle_scan(&directory, overwrite),
            Commands::InitConfig => handle_init_config(),
        }
        return;
    }

    // clap enforces both positionals when no subcommand is given
    let (Some(input_dir), Some(lut_file)) = (cli.input_dir.clone(), cli.lut_file.clone()) else {
        eprintln!("Error: INPUT_DIR and LUT_FILE are required");
        process::exit(2);
    };

    let settings = batch_settings(&cli, &config, input_dir, lut_file);
    let orchestrator =
        BatchOrchestrator::new(settings, FfmpegEncoder::new(config.tools.clone()));

    let plan = match orchestrator.plan() {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let input_dir = orchestrator.settings().input_dir.clone();
    if plan.jobs.is_empty() {
        print!("{}", ui::render_nothing_to_do(&input_dir, &plan.skipped));
        return;
    }

    println!(
        "{}",
        ui::backend_message(plan.backend, orchestrator.settings().use_hardware)
    );
    println!("Found {} video files to process", plan.jobs.len());
    println!("Using {} worker threads", plan.workers);

    if cli.dry_run {
        print_dry_run(&config.tools, &plan);
        return;
    }

    let term = Arc::new(ui::TerminalMultiplexer::stdout());
    if let Err(e) = ui::install_interrupt_handler(Arc::clone(&term)) {
        tracing::warn!(error = %e, "failed to install interrupt handler");
    }

    let mut view = ui::BatchView::new(term);
    let result = orchestrator.execute(plan, &mut view);
    drop(view);

    println!();
    print!("{}", ui::render_summary(&result, &input_dir));

    if let Some(report_path) = cli.report.as_deref() {
        if let Err(e) = write_report(&result, report_path) {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
        println!("Report written to: {}", report_path.display());
    }
}

/// CLI flags win over the config file, which wins over built-in defaults
fn batch_settings(
    cli: &Cli,
    config: &config::Config,
    input_dir: PathBuf,
    lut_file: PathBuf,
) -> BatchSettings {
    let defaults = &config.defaults;

    BatchSettings {
        input_dir,
        lut_path: lut_file,
        preset: cli.quality.unwrap_or(defaults.quality),
        crf: cli.crf.unwrap_or(defaults.crf),
        threads: cli.threads.or(Some(defaults.threads)),
        use_hardware: cli.use_hardware().unwrap_or(defaults.use_hardware),
        overwrite: cli.overwrite || defaults.overwrite,
        refresh_interval: config.display.refresh_interval(),
    }
}

fn print_dry_run(tools: &FfmpegTools, plan: &BatchPlan) {
    println!("Dry run: no files will be encoded");
    for job in &plan.jobs {
        let cmd = engine::build_encode_cmd(tools, job, &plan.ctx);
        println!("{}", engine::format_ffmpeg_cmd(&cmd));
    }
    for path in &plan.skipped {
        println!("# skipped, output exists: {}", path.display());
    }
}

fn write_report(result: &BatchResult, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    let json = serde_json::to_string_pretty(result).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

fn handle_check_ffmpeg(tools: &FfmpegTools) {
    match engine::ffmpeg_version(tools) {
        Ok(version) => {
            println!("ffmpeg found: {}", version);
            match engine::ffprobe_version(tools) {
                Ok(probe_version) => {
                    println!("ffprobe found: {}", probe_version);
                    process::exit(0);
                }
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_encoders(tools: &FfmpegTools) {
    let avail = hardware::detect_backends(&tools.ffmpeg);

    println!("Hardware H.264 encoders reported by {}:", tools.ffmpeg.display());
    for backend in hardware::BACKEND_PRIORITY {
        println!(
            "   {:<22} {}",
            backend.display_name(),
            if avail.contains(backend) { "available" } else { "-" }
        );
    }
    println!("Selected: {}", hardware::select_backend(&avail));
}

fn handle_probe(tools: &FfmpegTools, file: &Path) {
    match engine::probe_duration(tools, file) {
        Ok(duration) => {
            println!("Duration: {:.2} seconds", duration);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_scan(dir: &Path, overwrite: bool) {
    println!("Scanning directory: {}", dir.display());

    match engine::scan(dir) {
        Ok(files) => {
            let queue = engine::build_job_queue(files, overwrite);

            for job in &queue.jobs {
                println!(
                    "- {} -> {}",
                    job.input_path.display(),
                    job.output_path.display()
                );
            }
            for path in &queue.skipped {
                println!("- {} (skipped, output exists)", path.display());
            }
            println!("Total jobs: {}", queue.jobs.len());
        }
        Err(e) => {
            eprintln!("Error scanning directory: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_init_config() {
    let path = match config::Config::config_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    match config::Config::ensure_default() {
        Ok(true) => println!("Default config saved to {}", path.display()),
        Ok(false) => match config::Config::load() {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
            }
            Err(e) => {
                eprintln!("Config at {} is invalid: {:#}", path.display(), e);
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Failed to save default config: {:#}", e);
            process::exit(1);
        }
    }
}
