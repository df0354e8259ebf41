// Shared output surface with race-free per-line writes

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    terminal::{Clear, ClearType},
};
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// How lines reach the output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceMode {
    /// Interactive terminal: each line is redrawn in place at its row
    Multiplexed,
    /// Pipe or file: lines are appended, no control sequences
    Plain,
}

struct Surface {
    out: Box<dyn Write + Send>,
    rows: u16,
    prepared: bool,
    /// Set by `restore`; later row writes would drag the cursor back into the layout
    closed: bool,
}

/// Owns the output stream; every write goes through one lock so that
/// cursor movement and text from different jobs never interleave.
pub struct TerminalMultiplexer {
    surface: Mutex<Surface>,
    mode: SurfaceMode,
}

impl TerminalMultiplexer {
    /// Stdout, multiplexed only when it is an interactive terminal
    pub fn stdout() -> Self {
        let mode = if io::stdout().is_terminal() {
            SurfaceMode::Multiplexed
        } else {
            SurfaceMode::Plain
        };
        Self::with_writer(Box::new(io::stdout()), mode)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, mode: SurfaceMode) -> Self {
        Self {
            surface: Mutex::new(Surface {
                out,
                rows: 0,
                prepared: false,
                closed: false,
            }),
            mode,
        }
    }

    pub fn is_multiplexed(&self) -> bool {
        self.mode == SurfaceMode::Multiplexed
    }

    /// Clear the screen, hide the cursor and reserve `rows` lines for the layout
    pub fn prepare(&self, rows: u16) -> io::Result<()> {
        let mut surface = self.lock();
        surface.rows = rows;

        if self.mode == SurfaceMode::Multiplexed {
            queue!(surface.out, Clear(ClearType::All), MoveTo(0, 0), Hide)?;
            surface.out.flush()?;
            surface.prepared = true;
            surface.closed = false;
        }

        Ok(())
    }

    /// Replace the contents of `row` with `text`
    pub fn write_line(&self, row: u16, text: &str) -> io::Result<()> {
        let mut surface = self.lock();

        match self.mode {
            SurfaceMode::Multiplexed if surface.closed => return Ok(()),
            SurfaceMode::Multiplexed => {
                queue!(surface.out, MoveTo(0, row), Clear(ClearType::UntilNewLine))?;
                surface.out.write_all(text.as_bytes())?;
            }
            SurfaceMode::Plain => {
                writeln!(surface.out, "{}", text)?;
            }
        }

        surface.out.flush()
    }

    /// Show the cursor again and park it below the layout.
    /// Safe to call more than once; only the first call after `prepare` writes,
    /// and row writes after it are dropped.
    pub fn restore(&self) -> io::Result<()> {
        let mut surface = self.lock();
        if !surface.prepared {
            return Ok(());
        }
        surface.prepared = false;
        surface.closed = true;

        let park_row = surface.rows;
        queue!(surface.out, MoveTo(0, park_row), Show)?;
        surface.out.write_all(b"\n")?;
        surface.out.flush()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Surface> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TerminalMultiplexer {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Exit status used when the batch is interrupted
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// On SIGINT/SIGTERM: restore `term` and exit with status 130.
/// Running encoders receive the same signal from the terminal.
pub fn install_interrupt_handler(term: Arc<TerminalMultiplexer>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        // Waits for any row write in flight before parking the cursor
        let _ = term.restore();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}
