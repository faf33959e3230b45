use std::collections::BTreeMap;

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Paragraph},
    Frame,
};

use super::Pane;
use mailrhythm::analytics::WeeklyBucket;
use mailrhythm::config::ThemeConfig;
use mailrhythm::mail::{Direction, DirectionSet};

/// Counts per ISO week, one slot per selected direction
pub fn weekly_columns(
    buckets: &[&WeeklyBucket],
    directions: DirectionSet,
) -> BTreeMap<u32, Vec<(Direction, u64)>> {
    let mut columns: BTreeMap<u32, Vec<(Direction, u64)>> = BTreeMap::new();
    for bucket in buckets {
        columns
            .entry(bucket.iso_week)
            .or_insert_with(|| directions.iter().map(|d| (d, 0)).collect());
    }
    for bucket in buckets {
        if let Some(slots) = columns.get_mut(&bucket.iso_week)
            && let Some(slot) = slots.iter_mut().find(|(d, _)| *d == bucket.direction)
        {
            slot.1 += bucket.count;
        }
    }
    columns
}

pub fn render_weekly(
    f: &mut Frame,
    area: Rect,
    year: i32,
    buckets: &[&WeeklyBucket],
    directions: DirectionSet,
    label_every: usize,
    theme: &ThemeConfig,
) {
    let pane = Pane::new(format!("Weekly · {} · {}", year, directions), true, theme);
    let columns = weekly_columns(buckets, directions);
    if columns.is_empty() {
        let text = Paragraph::new(Span::styled(
            format!("No mail in {}", year),
            Style::default().fg(theme.fg_muted()),
        ))
        .block(pane.block());
        f.render_widget(text, area);
        return;
    }

    let every = label_every.max(1) as u32;
    let mut chart = BarChart::default()
        .block(pane.block())
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1)
        .label_style(Style::default().fg(theme.fg_muted()));

    for (week, slots) in &columns {
        let bars: Vec<Bar> = slots
            .iter()
            .map(|(direction, count)| {
                Bar::default()
                    .value(*count)
                    .text_value(String::new())
                    .style(Style::default().fg(theme.direction(*direction)))
            })
            .collect();
        let mut group = BarGroup::default().bars(&bars);
        if (week - 1) % every == 0 {
            group = group.label(Line::from(week.to_string()));
        }
        chart = chart.data(group);
    }

    f.render_widget(chart, area);
}
