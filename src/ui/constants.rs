// Layout of the multiplexed batch view (0-based terminal rows)

/// "Processing N video files with W workers"
pub const HEADER_ROW: u16 = 0;

/// Horizontal rule under the header
pub const RULE_ROW: u16 = 1;

/// Row of worker slot 0; slot `n` is drawn at `FIRST_SLOT_ROW + n`
pub const FIRST_SLOT_ROW: u16 = 2;

/// Blank rows between the last slot and the running summary
pub const SUMMARY_GAP: u16 = 1;

pub const RULE_WIDTH: usize = 80;
pub const RULE_CHAR: char = '=';

// Progress bar: one fill character per 5 percent
pub const BAR_WIDTH: usize = 20;
pub const BAR_FILL: char = '#';
pub const BAR_EMPTY: char = ' ';

/// Lines of ffmpeg stderr kept per failure in the final summary
pub const FAILURE_TAIL_LINES: usize = 5;
