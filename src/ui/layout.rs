use crate::app::{App, CurrentScreen};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use super::footer::render_footer;
use super::header::render_header;
use super::main_content::render_main_content;
use super::screens::{render_exit_confirm, render_missing_api_key};

/// Main UI rendering function that orchestrates all UI components
pub fn ui(frame: &mut Frame, app: &mut App) {
    // Card positions are recorded again during this draw
    app.hitboxes.clear();

    // Create the main layout: banner, rows, footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Banner
            Constraint::Min(1),    // Rows
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    // Render banner
    render_header(frame, app, chunks[0]);

    // Render rows, or the setup instructions when there is no key
    if !app.has_api_key {
        render_missing_api_key(frame, chunks[1]);
    } else {
        render_main_content(frame, app, chunks[1]);
    }

    // Quit dialog goes on top of the rows
    if app.current_screen == CurrentScreen::Exiting {
        render_exit_confirm(frame, chunks[1]);
    }

    // Render footer with instructions
    render_footer(frame, app, chunks[2]);
}
