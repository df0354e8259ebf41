// Text rendering of per-job status lines

use std::time::Duration;

use crate::engine::{ProgressMode, ProgressSnapshot};
use crate::ui::constants::{BAR_EMPTY, BAR_FILL, BAR_WIDTH};

/// `MM:SS`, minutes are not wrapped into hours
pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `[#####               ]` for 25%
pub fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH / 100).min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    bar.extend(std::iter::repeat_n(BAR_FILL, filled));
    bar.extend(std::iter::repeat_n(BAR_EMPTY, BAR_WIDTH - filled));
    bar.push(']');
    bar
}

pub fn starting_line(name: &str) -> String {
    format!("Starting: {}", name)
}

/// Live progress line, or `None` while there is nothing worth showing yet
pub fn progress_line(name: &str, snapshot: &ProgressSnapshot) -> Option<String> {
    let time = format_clock(snapshot.wall_elapsed);

    if let (ProgressMode::DurationBased, Some(pct)) = (snapshot.mode, snapshot.percent) {
        let eta = snapshot
            .eta
            .filter(|_| pct > 0)
            .map_or_else(|| "--:--".to_string(), format_clock);
        return Some(format!(
            "{}: {}% {} Time: {} ETA: {}",
            name,
            pct,
            progress_bar(pct),
            time,
            eta
        ));
    }

    if snapshot.frames > 0 {
        return Some(format!(
            "{}: Processed frames: {} | FPS: {:.2} | Time: {}",
            name,
            snapshot.frames,
            snapshot.average_fps(),
            time
        ));
    }

    None
}

pub fn finished_line(name: &str, success: bool, elapsed: Duration) -> String {
    format!(
        "{}: {} in {:.1} seconds",
        name,
        if success { "Completed" } else { "Failed" },
        elapsed.as_secs_f64()
    )
}

pub fn running_summary_line(succeeded: usize, failed: usize, total: usize) -> String {
    format!(
        "Completed: {}/{} | Failed: {}",
        succeeded,
        total,
        failed
    )
}
