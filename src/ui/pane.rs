use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Borders},
};

use mailrhythm::config::ThemeConfig;

/// A styled pane with consistent border and title treatment
pub struct Pane<'a> {
    title: String,
    focused: bool,
    theme: &'a ThemeConfig,
}

impl<'a> Pane<'a> {
    pub fn new(title: impl Into<String>, focused: bool, theme: &'a ThemeConfig) -> Self {
        Self {
            title: title.into(),
            focused,
            theme,
        }
    }

    /// Get the styled block for this pane
    pub fn block(&self) -> Block<'static> {
        let border_color = if self.focused {
            self.theme.border_active()
        } else {
            self.theme.border()
        };

        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title_style(Style::default().fg(self.theme.primary()))
            .title(format!(" {} ", self.title))
            .style(Style::default().bg(self.theme.bg()))
    }
}

/// A centered modal dialog
pub struct Modal<'a> {
    title: &'a str,
    theme: &'a ThemeConfig,
}

impl<'a> Modal<'a> {
    pub fn new(title: &'a str, theme: &'a ThemeConfig) -> Self {
        Self { title, theme }
    }

    /// Calculate centered rect for the modal
    pub fn centered_rect(&self, width: u16, height: u16, area: Rect) -> Rect {
        centered_rect(width, height, area)
    }

    /// Get the styled block for this modal
    pub fn block(&self) -> Block<'a> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_active()))
            .title(self.title)
            .title_alignment(Alignment::Center)
            .title_style(Style::default().fg(self.theme.primary()))
            .style(Style::default().bg(self.theme.bg_panel()))
    }

    /// Same block with the warning color, for error dialogs
    pub fn warning_block(&self) -> Block<'a> {
        self.block()
            .border_style(Style::default().fg(self.theme.warning()))
            .title_style(Style::default().fg(self.theme.warning()))
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let modal_width = width.min(area.width.saturating_sub(4));
    let modal_height = height.min(area.height.saturating_sub(4));
    let x = (area.width.saturating_sub(modal_width)) / 2 + area.x;
    let y = (area.height.saturating_sub(modal_height)) / 2 + area.y;
    Rect::new(x, y, modal_width, modal_height)
}
