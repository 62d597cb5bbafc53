//! Interactive terminal demo: nested scopes over a list and an editor pane.

mod app;
mod terminal;
mod ui;

pub use app::App;

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io;
use std::time::Duration;
use terminal::TerminalGuard;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(app: &mut App) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let result = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    while !app.quit {
        terminal.draw(|f| ui::draw(f, app))?;
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        // Resize and other events only need a redraw.
        if let Event::Key(key) = event::read()? {
            app.handle_key(&key)?;
        }
    }
    Ok(())
}
