use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tui_big_text::{BigText, PixelSize};

/// Renders the banner at the top of the screen: a featured title picked
/// from the first row that loaded.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title_block = Block::default()
        .borders(Borders::ALL)
        .title("Movie Rows")
        .style(Style::default());

    let inner = title_block.inner(area);
    frame.render_widget(title_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(inner);

    let headline = app
        .banner
        .as_ref()
        .map(|item| item.display_name().to_uppercase())
        .unwrap_or_else(|| "MOVIE ROWS".to_string());

    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .lines(vec![headline.into()])
        .build();
    frame.render_widget(big_text, chunks[0]);

    let subtitle = match &app.banner {
        Some(item) => Line::from(vec![
            Span::styled("Featured: ", Style::default().fg(Color::Gray)),
            Span::styled(
                item.display_name().to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from(Span::styled(
            "Browse the catalog row by row",
            Style::default().fg(Color::Gray),
        )),
    };
    frame.render_widget(Paragraph::new(subtitle), chunks[1]);
}
