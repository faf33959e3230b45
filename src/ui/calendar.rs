use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use super::heat::{heat_color, heat_level, LEVELS};
use super::{Modal, Pane};
use crate::app::App;
use mailrhythm::analytics::{CalendarGrid, WEEKDAY_LABELS};
use mailrhythm::config::ThemeConfig;

const ROW_LABEL_WIDTH: usize = 4;

/// Title describing the active calendar filters
pub fn calendar_title(app: &App) -> String {
    let hours = app
        .hours
        .map(|h| h.to_string())
        .unwrap_or_else(|| "all hours".to_string());
    let mut title = format!("{} · {} · {}", app.year, app.directions, hours);
    if app.weekdays_only {
        title.push_str(" · Mon-Fri");
    }
    title
}

/// Week numbers above the grid, one label every `every` weeks starting at week 1.
/// Spillover columns are left blank.
pub fn week_label_row(grid: &CalendarGrid, every: usize, cell_width: usize) -> String {
    let every = every.max(1);
    let width = ROW_LABEL_WIDTH + grid.column_count() * cell_width;
    let mut row = vec![' '; width];
    let mut free_from = 0;
    for week in 1..=grid.max_week() as usize {
        if (week - 1) % every != 0 {
            continue;
        }
        let at = ROW_LABEL_WIDTH + week * cell_width;
        if at < free_from {
            continue;
        }
        for (i, c) in week.to_string().chars().enumerate() {
            if let Some(slot) = row.get_mut(at + i) {
                *slot = c;
            }
        }
        free_from = at + week.to_string().len() + 1;
    }
    row.into_iter().collect::<String>().trim_end().to_string()
}

pub fn render_calendar(f: &mut Frame, area: Rect, app: &App, theme: &ThemeConfig) {
    let pane = Pane::new(format!("Calendar {}", calendar_title(app)), true, theme);
    let block = pane.block();
    let inner = block.inner(area);
    f.render_widget(block, area);

    let grid = match &app.calendar {
        Ok(grid) => grid,
        Err(e) => {
            render_warning(f, inner, &e.to_string(), theme);
            return;
        }
    };

    let columns = grid.column_count();
    let cell_width = if inner.width as usize >= ROW_LABEL_WIDTH + columns * 2 {
        2
    } else {
        1
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // week labels
            Constraint::Length(7), // grid
            Constraint::Length(1),
            Constraint::Length(1), // hover
            Constraint::Length(1), // legend
            Constraint::Min(0),
        ])
        .split(inner);

    let muted = Style::default().fg(theme.fg_muted());
    f.render_widget(
        Paragraph::new(Span::styled(
            week_label_row(grid, app.config.analysis.label_every, cell_width),
            muted,
        )),
        chunks[0],
    );

    let max = grid.max_count();
    let glyph = if cell_width == 2 { "■ " } else { "■" };
    let rows: Vec<Line> = WEEKDAY_LABELS
        .iter()
        .enumerate()
        .map(|(weekday, label)| {
            let mut spans = vec![Span::styled(format!("{:<4}", label), muted)];
            for week in grid.weeks() {
                let level = heat_level(grid.count(weekday, week), max);
                let color =
                    heat_color(level, theme.bg_element(), theme.heat_low(), theme.heat_high());
                let mut style = Style::default().fg(color);
                if (weekday, week) == app.cursor {
                    style = style.bg(theme.border_active()).add_modifier(Modifier::BOLD);
                }
                spans.push(Span::styled(glyph, style));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(rows), chunks[1]);

    let (weekday, week) = app.cursor;
    let hover = match app.selected_cell() {
        Some((date, count)) => Line::from(vec![
            Span::styled(date.format("%Y-%m-%d").to_string(), Style::default().fg(theme.fg())),
            Span::styled(
                format!(
                    " ({}) · {} mail{}",
                    WEEKDAY_LABELS[weekday],
                    count,
                    if count == 1 { "" } else { "s" }
                ),
                muted,
            ),
        ]),
        None => Line::from(Span::styled(
            format!("{} · week column {} · no mail", WEEKDAY_LABELS[weekday], week),
            muted,
        )),
    };
    f.render_widget(Paragraph::new(hover), chunks[3]);

    let mut legend = vec![Span::styled("less ", muted)];
    for level in 0..=LEVELS {
        let color = heat_color(level, theme.bg_element(), theme.heat_low(), theme.heat_high());
        legend.push(Span::styled("■ ", Style::default().fg(color)));
    }
    legend.push(Span::styled(
        format!("more   total {} · busiest day {}", grid.total(), max),
        muted,
    ));
    f.render_widget(Paragraph::new(Line::from(legend)), chunks[4]);
}

fn render_warning(f: &mut Frame, area: Rect, message: &str, theme: &ThemeConfig) {
    let modal = Modal::new(" No data ", theme);
    let modal_area = modal.centered_rect(60, 5, area);
    f.render_widget(Clear, modal_area);
    let text = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(theme.fg()),
    )))
    .wrap(Wrap { trim: true })
    .block(modal.warning_block());
    f.render_widget(text, modal_area);
}
