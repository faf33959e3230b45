use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Clear, Gauge, Paragraph},
    Frame,
};

use super::Modal;
use mailrhythm::config::ThemeConfig;

/// Fraction of files processed, 0.0 while the total is still unknown
pub fn progress_ratio(current: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (current as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Render the scan progress modal
pub fn render_loading(
    f: &mut Frame,
    area: Rect,
    (current, total): (usize, usize),
    source: &str,
    theme: &ThemeConfig,
) {
    let bg_block = Block::default().style(Style::default().bg(theme.bg()));
    f.render_widget(bg_block, area);

    let modal = Modal::new(" Scanning ", theme);
    let modal_area = modal.centered_rect(50, 7, area);
    f.render_widget(Clear, modal_area);

    let block = modal.block();
    let inner_area = block.inner(modal_area);
    f.render_widget(block, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // source
            Constraint::Length(1),
            Constraint::Length(1), // gauge
            Constraint::Length(1), // count
        ])
        .split(inner_area);

    let msg = Paragraph::new(Line::from(Span::styled(
        format!("Reading {}", source),
        Style::default().fg(theme.fg()),
    )))
    .alignment(Alignment::Center);
    f.render_widget(msg, chunks[0]);

    let gauge = Gauge::default()
        .ratio(progress_ratio(current, total))
        .gauge_style(Style::default().fg(theme.primary()).bg(theme.bg_element()))
        .use_unicode(true);
    f.render_widget(gauge, chunks[2]);

    let count_text = if total > 0 {
        format!("{} / {} files", current, total)
    } else {
        "Discovering folders...".to_string()
    };
    let count = Paragraph::new(Line::from(Span::styled(
        count_text,
        Style::default().fg(theme.fg_muted()),
    )))
    .alignment(Alignment::Center);
    f.render_widget(count, chunks[3]);
}
