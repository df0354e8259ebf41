// Terminal surface for batch progress (plain ANSI line control, no full-screen TUI)

pub mod constants;
pub mod summary;
pub mod terminal;
pub mod view;
pub mod widgets;

pub use summary::{backend_message, render_nothing_to_do, render_summary};
pub use terminal::{SurfaceMode, TerminalMultiplexer, install_interrupt_handler};
pub use view::BatchView;
