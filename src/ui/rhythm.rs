use ratatui::{
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::heat::{heat_color, heat_level};
use super::Pane;
use mailrhythm::analytics::{RhythmMatrix, WEEKDAY_LABELS};
use mailrhythm::config::ThemeConfig;

/// Hour ruler for a 24 column grid with two chars per hour
pub fn hour_ruler() -> String {
    let mut ruler = String::from("    ");
    for hour in (0..24).step_by(3) {
        ruler.push_str(&format!("{:<6}", hour));
    }
    ruler.trim_end().to_string()
}

/// Hour with the most mail, ties going to the earliest
pub fn peak_hour(matrix: &RhythmMatrix) -> Option<u32> {
    let mut per_hour = [0u64; 24];
    for row in &matrix.counts {
        for (hour, count) in row.iter().enumerate() {
            per_hour[hour] += count;
        }
    }
    let max = *per_hour.iter().max()?;
    if max == 0 {
        return None;
    }
    per_hour.iter().position(|&c| c == max).map(|h| h as u32)
}

pub fn render_rhythm(f: &mut Frame, area: Rect, matrices: &[RhythmMatrix], theme: &ThemeConfig) {
    if matrices.is_empty() {
        let pane = Pane::new("Rhythm", true, theme);
        let text = Paragraph::new(Span::styled(
            "No direction selected",
            Style::default().fg(theme.fg_muted()),
        ))
        .block(pane.block());
        f.render_widget(text, area);
        return;
    }

    let constraints: Vec<Constraint> = matrices
        .iter()
        .map(|_| Constraint::Ratio(1, matrices.len() as u32))
        .collect();
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints(constraints)
        .split(area);

    for (matrix, chunk) in matrices.iter().zip(chunks.iter()) {
        render_matrix(f, *chunk, matrix, theme);
    }
}

fn render_matrix(f: &mut Frame, area: Rect, matrix: &RhythmMatrix, theme: &ThemeConfig) {
    let peak = peak_hour(matrix)
        .map(|h| format!("peak {:02}:00", h))
        .unwrap_or_else(|| "no mail".to_string());
    let title = format!("Rhythm · {} · {} mails · {}", matrix.direction, matrix.total(), peak);
    let pane = Pane::new(title, true, theme);

    let muted = Style::default().fg(theme.fg_muted());
    let high = theme.direction(matrix.direction);
    let max = matrix.max_count();

    let mut lines = vec![Line::from(Span::styled(hour_ruler(), muted))];
    for (weekday, label) in WEEKDAY_LABELS.iter().enumerate() {
        let mut spans = vec![Span::styled(format!("{:<4}", label), muted)];
        for count in matrix.counts[weekday] {
            let level = heat_level(count, max);
            let color = heat_color(level, theme.bg_element(), theme.heat_low(), high);
            spans.push(Span::styled("■ ", Style::default().fg(color)));
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines).block(pane.block()), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailrhythm::mail::Direction;

    #[test]
    fn test_hour_ruler() {
        let ruler = hour_ruler();
        assert!(ruler.starts_with("    0     3     6"));
        assert!(ruler.ends_with("21"));
    }

    #[test]
    fn test_peak_hour() {
        let mut matrix = RhythmMatrix {
            direction: Direction::Incoming,
            counts: [[0; 24]; 7],
        };
        assert_eq!(peak_hour(&matrix), None);
        matrix.counts[0][9] = 3;
        matrix.counts[4][14] = 2;
        matrix.counts[5][14] = 1;
        assert_eq!(peak_hour(&matrix), Some(9));
        // 2 + 1 on hour 14 ties with 3 on hour 9
        matrix.counts[5][14] = 0;
        matrix.counts[6][14] = 1;
        assert_eq!(peak_hour(&matrix), Some(9));
        matrix.counts[6][14] = 2;
        assert_eq!(peak_hour(&matrix), Some(14));
    }
}
