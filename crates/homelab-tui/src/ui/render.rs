use std::rc::Rc;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use homelab_core::gatekeeper::age_display;
use homelab_core::utils::pluralize;

use crate::app::{App, AppState};

use super::{grid, styles};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = layout(frame.area());

    render_header(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_search_bar(frame, app, chunks[2]);
    grid::render(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn layout(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Length(2), // Tabs
            Constraint::Length(3), // Search
            Constraint::Min(6),    // Grid
            Constraint::Length(1), // Status bar
        ])
        .split(area)
}

/// Where the card grid lands in a terminal of the given size.
pub fn grid_area(area: Rect) -> Rect {
    layout(area)[3]
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let greeting = format!("  {}", app.greeting);
    let clock = format!("{}  ", app.clock);

    let header_line = Line::from(vec![
        Span::styled(greeting.clone(), styles::greeting_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(greeting.chars().count() + clock.chars().count()),
        )),
        Span::styled(clock, styles::clock_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(header_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.is_searching();
    let current = app.catalog.current_tab();

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in app.tabs().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = if i < 9 {
            format!("[{}] {}", i + 1, tab.label)
        } else {
            tab.label.clone()
        };
        // No tab is active while a search spans all of them
        let active = !searching && tab.key == current;
        let style = if active {
            styles::tab_style(true)
        } else if searching {
            styles::muted_style()
        } else {
            styles::tab_style(false)
        };
        spans.push(Span::styled(label, style));
    }

    if searching {
        spans.push(Span::styled("   Searching all tabs", styles::accent_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.state == AppState::Searching;

    let content = if app.search_input.is_empty() && !focused {
        Line::from(Span::styled(
            "Press / to search all services",
            styles::muted_style(),
        ))
    } else {
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::raw(app.search_input.clone()),
            Span::styled(cursor, styles::accent_style()),
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::search_bar_style(focused))
        .title(Span::styled(" Search ", styles::search_bar_style(focused)));

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/] search | [r]eload | [?] help | [q]uit";

    let left_text = format!(" {} ", status_text(app));

    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

/// Left side of the status bar. The search count always wins in search mode;
/// otherwise the transient message, then the cache age, then the catalog size.
fn status_text(app: &App) -> String {
    if let Some(status) = app.view().status {
        return status;
    }
    if let Some(ref msg) = app.status_message {
        return msg.clone();
    }
    match app.catalog.cached_at() {
        Some(cached_at) => format!("Catalog cached {}", age_display(cached_at)),
        None => pluralize(app.catalog.services().len(), "service"),
    }
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(50, 21, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  homelab hub", styles::greeting_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::accent_style())),
        help_line("1-9", "Select tab"),
        help_line("←/→ Tab", "Previous/next tab"),
        help_line("↑/↓ hjkl", "Move between cards"),
        help_line("Enter", "Open service in browser"),
        Line::from(""),
        Line::from(Span::styled(" Search", styles::accent_style())),
        help_line("/", "Search all services"),
        help_line("Enter", "Leave search field, keep query"),
        help_line("Esc", "Clear search"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::accent_style())),
        help_line("r", "Reload catalog"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::overlay_border_style())
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::accent_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::overlay_border_style())
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

/// A `width` x `height` rect centered in `area`, clipped to fit.
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
