mod app;
use app::App;

mod logging;
mod ui;

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::Terminal;
use ratatui::crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseButton, MouseEventKind,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use ratatui_image::picker::Picker;

use crate::app::CurrentScreen;
use crate::app::config::Config;

fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to a file, the terminal belongs to the UI
    let log_path = logging::init()?;
    tracing::info!(path = %log_path.display(), "starting movie_rows");

    let config = Config::from_env();

    // setup terminal
    enable_raw_mode()?;
    let mut stderr = io::stderr(); // This is a special case. Normally using stdout is fine
    execute!(stderr, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let mut app = App::new(config);
    // Ask the terminal which image protocol it supports
    app.picker = match Picker::from_query_stdio() {
        Ok(picker) => Some(picker),
        Err(e) => {
            tracing::warn!(error = %e, "terminal graphics query failed, using half blocks");
            Some(Picker::halfblocks())
        }
    };
    app.start();
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        // Apply whatever the worker threads have finished
        app.drain_messages();
        app.tick();
        terminal.draw(|f| ui::ui(f, app))?;

        // Poll for events with a timeout to allow UI updates
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                if key.kind == event::KeyEventKind::Release {
                    // Skip events that are not KeyEventKind::Press
                    continue;
                }

                match app.current_screen {
                    CurrentScreen::Browse => {
                        app.status = None;
                        match key.code {
                            KeyCode::Char('q') => app.current_screen = CurrentScreen::Exiting,
                            KeyCode::Down | KeyCode::Char('j') => app.next_row(),
                            KeyCode::Up | KeyCode::Char('k') => app.previous_row(),
                            KeyCode::Right | KeyCode::Char('l') => app.next_item(),
                            KeyCode::Left | KeyCode::Char('h') => app.previous_item(),
                            KeyCode::Enter | KeyCode::Char(' ') => app.click_selected(),
                            KeyCode::Char('c') => app.cycle_endpoint(),
                            KeyCode::Char('r') => app.refresh_focused(),
                            KeyCode::Char('o') => app.open_trailer(),
                            _ => {}
                        }
                    }
                    CurrentScreen::Exiting => match key.code {
                        KeyCode::Char('y') | KeyCode::Char('q') => return Ok(()),
                        KeyCode::Char('n') | KeyCode::Esc => {
                            app.current_screen = CurrentScreen::Browse;
                        }
                        _ => {}
                    },
                }
            }
            // Clicking a card works like Enter on it
            Event::Mouse(mouse) => {
                if app.current_screen == CurrentScreen::Browse
                    && mouse.kind == MouseEventKind::Down(MouseButton::Left)
                {
                    app.click_at(mouse.column, mouse.row);
                }
            }
            _ => {}
        }
    }
}
