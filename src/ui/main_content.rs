use crate::app::{App, Hitbox};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use ratatui_image::{Resize, StatefulImage, protocol::StatefulProtocol};

use super::loading::render_row_loading;
use super::trailer::{TRAILER_PANEL_HEIGHT, render_trailer};

const LARGE_ROW_HEIGHT: u16 = 14;
const ROW_HEIGHT: u16 = 8;
// Posters are portrait, backdrops are landscape.
const LARGE_CARD_WIDTH: u16 = 18;
const CARD_WIDTH: u16 = 26;

struct CardView {
    label: String,
    image_url: String,
    has_image: bool,
    selected: bool,
}

fn row_height(app: &App, index: usize) -> u16 {
    let row = &app.rows[index];
    let base = if row.is_large_row { LARGE_ROW_HEIGHT } else { ROW_HEIGHT };
    if row.trailer.video_id().is_some() {
        base + TRAILER_PANEL_HEIGHT
    } else {
        base
    }
}

/// First row to draw so the focused row stays on screen.
fn first_visible_row(app: &App, height: u16) -> usize {
    let mut used = 0u16;
    let mut first = app.focused_row.min(app.rows.len().saturating_sub(1));
    used = used.saturating_add(row_height(app, first));
    while first > 0 {
        let above = row_height(app, first - 1);
        if used.saturating_add(above) > height {
            break;
        }
        used += above;
        first -= 1;
    }
    first
}

/// Renders the rows of poster cards, each followed by its trailer panel when
/// one is playing.
pub fn render_main_content(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.rows.is_empty() {
        let empty_block = Block::default()
            .title("No rows configured")
            .borders(Borders::ALL)
            .style(Style::default());

        frame.render_widget(empty_block, area);
        return;
    }

    let mut y = area.y;
    for index in first_visible_row(app, area.height)..app.rows.len() {
        let bottom = area.y + area.height;
        if y >= bottom {
            break;
        }
        let is_large_row = app.rows[index].is_large_row;
        let height = if is_large_row { LARGE_ROW_HEIGHT } else { ROW_HEIGHT };
        let row_area = Rect::new(area.x, y, area.width, height.min(bottom - y));
        // Render row, then its trailer panel directly underneath
        render_row(frame, app, index, row_area);
        y += row_area.height;

        if let Some(video_id) = app.rows[index].trailer.video_id() {
            if y >= bottom {
                break;
            }
            let panel_area = Rect::new(area.x, y, area.width, TRAILER_PANEL_HEIGHT.min(bottom - y));
            render_trailer(frame, video_id, panel_area);
            y += panel_area.height;
        }
    }
}

fn render_row(frame: &mut Frame, app: &mut App, index: usize, area: Rect) {
    let focused = index == app.focused_row;
    let row = &app.rows[index];

    // Row title with load stats
    let mut title = vec![Span::styled(
        format!(" {} ", row.title),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(updated) = row.last_updated {
        title.push(Span::styled(
            format!("({} titles, updated {}) ", row.items.len(), updated.format("%H:%M")),
            Style::default().fg(Color::Gray),
        ));
    }

    if row.is_fetching_trailer() {
        title.push(Span::styled("fetching trailer... ", Style::default().fg(Color::Cyan)));
    }

    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let row_block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut inner = row_block.inner(area);
    frame.render_widget(row_block, area);

    // Trailer errors take the last line of the row
    if let Some(notice) = &row.notice {
        if inner.height > 1 {
            let notice_area = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
            frame.render_widget(
                Paragraph::new(Span::styled(notice.as_str(), Style::default().fg(Color::Red))),
                notice_area,
            );
            inner.height -= 1;
        }
    }

    // Spinner while the first page loads
    if row.items.is_empty() {
        if row.is_loading() {
            let label = format!("Loading {}...", row.title);
            render_row_loading(frame, &mut app.throbber_state, &label, inner);
        } else {
            frame.render_widget(
                Paragraph::new(Span::styled("Nothing to show", Style::default().fg(Color::Gray))),
                inner,
            );
        }
        return;
    }

    // Scroll the strip so the selected card is visible
    let card_width = if row.is_large_row { LARGE_CARD_WIDTH } else { CARD_WIDTH };
    let visible = usize::from((inner.width / card_width).max(1));
    let selected = app.selected[index];
    let offset = (selected + 1).saturating_sub(visible);

    let cards: Vec<CardView> = row
        .poster_cards(&app.image_base_url)
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(position, card)| CardView {
            label: card.item.display_name().to_string(),
            image_url: card.image_url,
            has_image: card.has_image,
            selected: focused && position == selected,
        })
        .collect();

    for (slot, card) in cards.into_iter().enumerate() {
        let x = inner.x + card_width * slot as u16;
        let width = card_width.min(inner.x + inner.width - x);
        let card_area = Rect::new(x, inner.y, width, inner.height);

        app.hitboxes.push(Hitbox {
            area: card_area,
            row: index,
            index: offset + slot,
        });
        render_card(frame, app, card, card_area);
    }
}

fn render_card(frame: &mut Frame, app: &mut App, card: CardView, area: Rect) {
    let style = if card.selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let card_block = Block::default()
        .borders(Borders::ALL)
        .title(card.label.clone())
        .border_style(style);

    let inner = card_block.inner(area);
    frame.render_widget(card_block, area);

    // Render the poster once it has been downloaded
    if let Some(protocol) = app.posters.get_mut(&card.image_url) {
        let image = StatefulImage::<StatefulProtocol>::default().resize(Resize::Fit(None));
        frame.render_stateful_widget(image, inner, protocol);
        return;
    }

    // Show placeholder
    let placeholder = if card.has_image {
        Line::from(Span::styled(card.label, style))
    } else {
        Line::from(Span::styled("No poster available", Style::default().fg(Color::Gray)))
    };
    frame.render_widget(
        Paragraph::new(placeholder).alignment(Alignment::Center),
        inner,
    );
}
