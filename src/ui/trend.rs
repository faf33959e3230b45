use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::Pane;
use mailrhythm::analytics::TrendSeries;
use mailrhythm::config::ThemeConfig;

/// Plot points for one series: x is days since `origin`
pub fn series_points(
    series: &TrendSeries,
    origin: NaiveDate,
) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    series
        .points
        .iter()
        .map(|p| {
            let x = (p.date - origin).num_days() as f64;
            ((x, p.count as f64), (x, p.average))
        })
        .unzip()
}

pub fn render_trend(
    f: &mut Frame,
    area: Rect,
    series: &[TrendSeries],
    window: usize,
    theme: &ThemeConfig,
) {
    let pane = Pane::new(format!("Trend · daily counts · {}-day average", window), true, theme);

    let first = series.iter().filter_map(|s| s.points.first()).map(|p| p.date).min();
    let last = series.iter().filter_map(|s| s.points.last()).map(|p| p.date).max();
    let (Some(first), Some(last)) = (first, last) else {
        let text = Paragraph::new(Span::styled(
            "No mail in the configured date range",
            Style::default().fg(theme.fg_muted()),
        ))
        .block(pane.block());
        f.render_widget(text, area);
        return;
    };

    let plotted: Vec<_> = series
        .iter()
        .map(|s| (s.direction, series_points(s, first)))
        .collect();

    let mut datasets = Vec::new();
    for (direction, (counts, averages)) in &plotted {
        let color = theme.direction(*direction);
        datasets.push(
            Dataset::default()
                .name(format!("{} per day", direction))
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme.fg_muted()))
                .data(counts),
        );
        datasets.push(
            Dataset::default()
                .name(format!("{} average", direction))
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(averages),
        );
    }

    let max_y = plotted
        .iter()
        .flat_map(|(_, (counts, _))| counts.iter().map(|&(_, y)| y))
        .fold(1.0, f64::max);
    let span = ((last - first).num_days() as f64).max(1.0);
    let middle = first + chrono::Duration::days((last - first).num_days() / 2);

    let muted = Style::default().fg(theme.fg_muted());
    let chart = Chart::new(datasets)
        .block(pane.block())
        .x_axis(
            Axis::default()
                .style(muted)
                .bounds([0.0, span])
                .labels(vec![
                    first.format("%Y-%m-%d").to_string(),
                    middle.format("%Y-%m-%d").to_string(),
                    last.format("%Y-%m-%d").to_string(),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(muted)
                .bounds([0.0, max_y])
                .labels(vec!["0".to_string(), format!("{}", max_y as u64)]),
        );

    f.render_widget(chart, area);
}
