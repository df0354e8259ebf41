// Line widgets for the batch view

pub mod progress;

pub use progress::{
    finished_line, format_clock, progress_bar, progress_line, running_summary_line, starting_line,
};
