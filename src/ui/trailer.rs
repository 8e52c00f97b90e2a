use crate::app::row::PLAYER_OPTIONS;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub const TRAILER_PANEL_HEIGHT: u16 = 6;

/// Renders the trailer panel in place of an embedded player
pub fn render_trailer(frame: &mut Frame, video_id: &str, area: Rect) {
    let trailer_block = Block::default()
        .title(" Trailer ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let lines = vec![
        Line::from(vec![
            Span::styled("▶ Playing ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(video_id, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("Embed: ", Style::default().fg(Color::Cyan)),
            Span::raw(PLAYER_OPTIONS.embed_url(video_id)),
        ]),
        Line::from(vec![
            Span::styled("Player: ", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                "{}x{}, autoplay={}",
                PLAYER_OPTIONS.width,
                PLAYER_OPTIONS.height,
                u8::from(PLAYER_OPTIONS.autoplay)
            )),
        ]),
        Line::from(Span::styled(
            "(o) open in browser, (Enter/click) close",
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(trailer_block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
