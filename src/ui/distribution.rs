use ratatui::{
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Paragraph},
    Frame,
};

use super::Pane;
use mailrhythm::analytics::{CountDistribution, HistogramBin};
use mailrhythm::config::ThemeConfig;

/// Axis label for a bin: its lower edge, rounded to whole mails
pub fn bin_label(bin: &HistogramBin) -> String {
    format!("{}", bin.low.round() as i64)
}

pub fn render_distribution(
    f: &mut Frame,
    area: Rect,
    distributions: &[CountDistribution],
    theme: &ThemeConfig,
) {
    if distributions.is_empty() {
        let pane = Pane::new("Distribution", true, theme);
        let text = Paragraph::new(Span::styled(
            "No direction selected",
            Style::default().fg(theme.fg_muted()),
        ))
        .block(pane.block());
        f.render_widget(text, area);
        return;
    }

    let constraints: Vec<Constraint> = distributions
        .iter()
        .map(|_| Constraint::Ratio(1, distributions.len() as u32))
        .collect();
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints(constraints)
        .split(area);

    for (dist, chunk) in distributions.iter().zip(chunks.iter()) {
        let days: u64 = dist.bins.iter().map(|b| b.days).sum();
        let title = format!("Mails per day · {} · {} days", dist.direction, days);
        let pane = Pane::new(title, true, theme);

        if dist.bins.is_empty() {
            let text = Paragraph::new(Span::styled(
                "No mail",
                Style::default().fg(theme.fg_muted()),
            ))
            .block(pane.block());
            f.render_widget(text, *chunk);
            continue;
        }

        let color = theme.direction(dist.direction);
        let bars: Vec<Bar> = dist
            .bins
            .iter()
            .map(|bin| {
                Bar::default()
                    .value(bin.days)
                    .label(Line::from(bin_label(bin)))
                    .style(Style::default().fg(color))
            })
            .collect();

        let chart = BarChart::default()
            .block(pane.block())
            .bar_width(3)
            .bar_gap(1)
            .label_style(Style::default().fg(theme.fg_muted()))
            .data(BarGroup::default().bars(&bars));
        f.render_widget(chart, *chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_label() {
        let bin = HistogramBin {
            low: 4.5,
            high: 5.0,
            days: 2,
        };
        assert_eq!(bin_label(&bin), "5");
        let bin = HistogramBin {
            low: 12.0,
            high: 15.3,
            days: 0,
        };
        assert_eq!(bin_label(&bin), "12");
    }
}
