//! Card grid rendering.
//!
//! Cards are laid out left to right in as many fixed-width columns as the
//! area allows, scrolled by whole rows so the selected card stays on screen.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use homelab_core::catalog::{Card, Grid};
use homelab_core::utils::truncate;

use crate::app::App;

use super::styles;

/// Card size including borders.
pub const CARD_WIDTH: u16 = 34;
pub const CARD_HEIGHT: u16 = 6;

/// Number of card columns that fit in `width`, at least one.
pub fn columns_for_width(width: u16) -> usize {
    (width / CARD_WIDTH).max(1) as usize
}

/// First visible row so that `selected_row` is inside a window of
/// `visible_rows`.
pub fn first_visible_row(selected_row: usize, visible_rows: usize) -> usize {
    selected_row.saturating_sub(visible_rows.max(1) - 1)
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.view().grid {
        Grid::Cards(cards) => render_cards(frame, &cards, app.selection, area),
        Grid::NoResults => {
            let message = if app.is_searching() {
                format!("No services match \"{}\"", app.search_input.trim())
            } else {
                "No services in this tab".to_string()
            };
            render_placeholder(frame, Span::styled(message, styles::muted_style()), area);
        }
        Grid::LoadError(message) => {
            render_placeholder(frame, Span::styled(message, styles::error_style()), area);
        }
    }
}

fn render_placeholder(frame: &mut Frame, message: Span, area: Rect) {
    let top_padding = area.height.saturating_sub(1) / 2;
    let mut lines: Vec<Line> = (0..top_padding).map(|_| Line::from("")).collect();
    lines.push(Line::from(message));

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_cards(frame: &mut Frame, cards: &[Card], selection: usize, area: Rect) {
    let columns = columns_for_width(area.width);
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let first_row = first_visible_row(selection / columns, visible_rows);

    // Center the grid horizontally
    let grid_width = (columns as u16 * CARD_WIDTH).min(area.width);
    let left = area.x + (area.width - grid_width) / 2;

    for (index, card) in cards.iter().enumerate().skip(first_row * columns) {
        let row = index / columns - first_row;
        if row >= visible_rows {
            break;
        }
        let col = index % columns;

        let y = area.y + row as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min(area.bottom().saturating_sub(y));
        if height < 3 {
            break;
        }
        let card_area = Rect {
            x: left + col as u16 * CARD_WIDTH,
            y,
            width: CARD_WIDTH.min(grid_width),
            height,
        };
        render_card(frame, card, index == selection, card_area);
    }
}

fn render_card(frame: &mut Frame, card: &Card, selected: bool, area: Rect) {
    let inner_width = area.width.saturating_sub(4) as usize;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::card_border_style(selected))
        .style(styles::card_style(selected))
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(truncate(&card.title, inner_width), styles::card_title_style()),
            Span::raw(" "),
        ]));

    let lines = vec![
        Line::from(Span::styled(
            truncate(&format!("[{}]", card.icon), inner_width),
            styles::card_icon_style(),
        )),
        Line::from(Span::raw(truncate(&card.description, inner_width))),
        Line::from(Span::styled(
            truncate(&card.url, inner_width),
            styles::muted_style(),
        )),
    ];

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}
