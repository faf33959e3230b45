use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use mailrhythm::analytics::MailSummary;
use mailrhythm::config::ThemeConfig;

/// Incoming per outgoing ratio, ∞ when nothing was sent
pub fn format_ratio(summary: &MailSummary) -> String {
    match summary.ratio() {
        Some(r) => format!("{:.2}", r),
        None => "∞".to_string(),
    }
}

/// Tabs plus the headline numbers
pub fn render_header(f: &mut Frame, area: Rect, app: &App, theme: &ThemeConfig) {
    let titles: Vec<&str> = View::TABS.iter().map(|v| v.title()).collect();
    let tabs = Tabs::new(titles)
        .select(app.view.tab_index())
        .style(Style::default().fg(theme.fg_muted()).bg(theme.bg_panel()))
        .highlight_style(
            Style::default()
                .fg(theme.primary())
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");

    let summary = &app.summary;
    let label = Style::default().fg(theme.fg_muted());
    let kpis = Line::from(vec![
        Span::styled(format!(" {}  ", app.source_label), Style::default().fg(theme.secondary())),
        Span::styled("incoming ", label),
        Span::styled(summary.incoming.to_string(), Style::default().fg(theme.incoming())),
        Span::styled("  outgoing ", label),
        Span::styled(summary.outgoing.to_string(), Style::default().fg(theme.outgoing())),
        Span::styled("  in/out ", label),
        Span::styled(format_ratio(summary), Style::default().fg(theme.fg())),
        Span::styled("  total ", label),
        Span::styled(summary.total().to_string(), Style::default().fg(theme.fg())),
    ])
    .style(Style::default().bg(theme.bg_panel()));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);
    f.render_widget(tabs, rows[0]);
    f.render_widget(Paragraph::new(kpis), rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ratio() {
        let summary = MailSummary {
            incoming: 30,
            outgoing: 8,
        };
        assert_eq!(format_ratio(&summary), "3.75");
        let none_sent = MailSummary {
            incoming: 3,
            outgoing: 0,
        };
        assert_eq!(format_ratio(&none_sent), "∞");
    }
}
