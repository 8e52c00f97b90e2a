use crate::app::{App, CurrentScreen};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Text,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Returns the appropriate instruction text based on app state
fn get_instruction_text(app: &App) -> &'static str {
    if !app.has_api_key {
        return "Set TMDB_API_KEY and restart, (q) to quit";
    }
    match app.current_screen {
        CurrentScreen::Exiting => "(y) to confirm, (n) to cancel",
        CurrentScreen::Browse => {
            if app.playing_trailer().is_some() {
                "(Enter/click) close trailer, (o) open in browser, (↑↓/jk) rows, (q) quit"
            } else {
                "(Enter/click) play trailer, (↑↓/jk) rows, (←→/hl) titles, (c) switch listing, (r) refresh, (q) quit"
            }
        }
    }
}

/// Renders the footer with instructions at the bottom of the screen
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let bottom_block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default());

    let bottom = match &app.status {
        Some(status) => Paragraph::new(Text::styled(status.as_str(), Style::default().fg(Color::Yellow))),
        None => Paragraph::new(Text::styled(get_instruction_text(app), Style::default())),
    }
    .block(bottom_block);

    frame.render_widget(bottom, area);
}
