use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::View;
use mailrhythm::config::ThemeConfig;

/// Key hints shown in the bottom bar for each view
pub fn key_hints(view: View) -> &'static [(&'static str, &'static str)] {
    match view {
        View::Loading => &[("q", "quit")],
        View::Calendar => &[
            ("Tab", "view"),
            ("[/]", "year"),
            ("i/o", "direction"),
            ("w", "work hours"),
            ("</>", "start"),
            ("-/+", "end"),
            ("d", "weekdays"),
            ("hjkl", "cursor"),
            ("q", "quit"),
        ],
        View::Rhythm | View::Trend | View::Distribution => &[
            ("Tab", "view"),
            ("i/o", "direction"),
            ("q", "quit"),
        ],
        View::Weekly => &[
            ("Tab", "view"),
            ("[/]", "year"),
            ("i/o", "direction"),
            ("q", "quit"),
        ],
    }
}

pub fn render_help(
    f: &mut Frame,
    area: Rect,
    view: View,
    status: Option<&str>,
    theme: &ThemeConfig,
) {
    let key_style = Style::default().fg(theme.primary());
    let text_style = Style::default().fg(theme.fg_muted());

    let hints = key_hints(view);
    let mut spans = Vec::with_capacity(hints.len() * 2 + 2);
    for (i, (key, desc)) in hints.iter().enumerate() {
        spans.push(Span::styled(*key, key_style));
        let sep = if i + 1 < hints.len() { "  " } else { "" };
        spans.push(Span::styled(format!(" {}{}", desc, sep), text_style));
    }

    let mut line = Line::from(spans);

    if let Some(msg) = status {
        line.spans
            .push(Span::styled("  │  ", Style::default().fg(theme.border())));
        line.spans
            .push(Span::styled(msg, Style::default().fg(theme.warning())));
    }

    let paragraph = Paragraph::new(line).style(Style::default().bg(theme.bg_panel()));

    f.render_widget(paragraph, area);
}
