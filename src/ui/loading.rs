use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    Frame,
};
use throbber_widgets_tui::{Throbber, ThrobberState};

/// Renders the spinner shown inside a row while its first page is loading
pub fn render_row_loading(frame: &mut Frame, state: &mut ThrobberState, label: &str, area: Rect) {
    let throbber = Throbber::default()
        .label(label.to_string())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .throbber_set(throbber_widgets_tui::BRAILLE_SIX);

    frame.render_stateful_widget(throbber, area, state);
}
