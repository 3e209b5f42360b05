use ratatui::style::{Color, Modifier, Style};

// Color palette
pub const PRIMARY: Color = Color::Rgb(86, 156, 214);
pub const ACCENT: Color = Color::Rgb(220, 180, 90);
pub const ERROR: Color = Color::Rgb(210, 80, 80);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const SURFACE: Color = Color::Rgb(36, 40, 52);

// Header
pub fn greeting_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn clock_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn accent_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(active: bool) -> Style {
    if active {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn search_bar_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(MUTED)
    }
}

// Cards
pub fn card_border_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn card_style(selected: bool) -> Style {
    if selected {
        Style::default().bg(SURFACE)
    } else {
        Style::default()
    }
}

pub fn card_title_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

pub fn card_icon_style() -> Style {
    Style::default().fg(PRIMARY)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(SURFACE).fg(Color::White)
}

// Overlays
pub fn overlay_border_style() -> Style {
    Style::default().fg(PRIMARY)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}
