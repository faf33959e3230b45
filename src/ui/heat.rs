use ratatui::style::Color;

pub const LEVELS: u8 = 4;

/// Bucket a count into 0..=LEVELS relative to the largest count shown.
/// Only an empty cell gets level 0.
pub fn heat_level(count: u64, max: u64) -> u8 {
    if count == 0 || max == 0 {
        return 0;
    }
    let levels = LEVELS as u64;
    ((count * levels).div_ceil(max)).clamp(1, levels) as u8
}

/// Color for a heat level, interpolated between `low` and `high`
pub fn heat_color(level: u8, empty: Color, low: Color, high: Color) -> Color {
    if level == 0 {
        return empty;
    }
    let t = (level.min(LEVELS) - 1) as f32 / (LEVELS - 1) as f32;
    lerp_color(low, high, t)
}

/// Linear blend of two RGB colors. Named colors snap to the nearer end.
pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    match (a, b) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ if t < 0.5 => a,
        _ => b,
    }
}
