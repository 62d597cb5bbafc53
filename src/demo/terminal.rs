//! Terminal state cleanup.

use crossterm::{
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};

/// Restores the terminal on drop, including when a panic unwinds through
/// the event loop. Create it only after raw mode and the alternate screen
/// are enabled.
pub struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Errors are ignored: this runs during unwinding too.
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}
