use chrono::{Datelike, Local, NaiveDate};
use std::sync::Arc;

use mailrhythm::analytics::{
    aggregate, available_years, bin_calendar, daily_count_distribution, daily_trend, summarize,
    weekday_hour_matrix, Aggregates, AnalyticsError, CalendarFilter, CalendarGrid,
    CountDistribution, HourRange, MailSummary, RhythmMatrix, TrendSeries, WeeklyBucket,
};
use mailrhythm::config::Config;
use mailrhythm::mail::{Direction, DirectionSet, MailEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Loading,
    Calendar,
    Rhythm,
    Trend,
    Weekly,
    Distribution,
}

impl View {
    pub const TABS: [View; 5] = [
        View::Calendar,
        View::Rhythm,
        View::Trend,
        View::Weekly,
        View::Distribution,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::Loading => "Loading",
            View::Calendar => "Calendar",
            View::Rhythm => "Rhythm",
            View::Trend => "Trend",
            View::Weekly => "Weekly",
            View::Distribution => "Distribution",
        }
    }

    pub fn tab_index(&self) -> Option<usize> {
        Self::TABS.iter().position(|v| v == self)
    }
}

pub struct App {
    pub config: Arc<Config>,
    pub view: View,
    /// Account name or file the events came from
    pub source_label: String,
    pub events: Vec<MailEvent>,
    pub aggregates: Aggregates,
    pub summary: MailSummary,
    pub years: Vec<i32>,
    // Calendar filters
    pub year: i32,
    pub directions: DirectionSet,
    pub hours: Option<HourRange>,
    pub weekdays_only: bool,
    pub calendar: Result<CalendarGrid, AnalyticsError>,
    // Selected calendar cell: (weekday, week column)
    pub cursor: (usize, usize),
    pub should_quit: bool,
    pub status_message: Option<String>,
    // Scan progress: (current, total)
    pub loading: (usize, usize),
}

impl App {
    pub fn new(config: Arc<Config>, source_label: String) -> Self {
        let year = Local::now().year();
        Self {
            config,
            view: View::Loading,
            source_label,
            events: Vec::new(),
            aggregates: Aggregates::default(),
            summary: MailSummary::default(),
            years: Vec::new(),
            year,
            directions: DirectionSet::all(),
            hours: None,
            weekdays_only: false,
            calendar: Err(AnalyticsError::NoData {
                year,
                directions: DirectionSet::all(),
            }),
            cursor: (0, 1),
            should_quit: false,
            status_message: None,
            loading: (0, 0),
        }
    }

    /// Install freshly loaded events and recompute everything derived from them.
    /// Selects `year` if given, otherwise the most recent year with data.
    pub fn set_events(&mut self, events: Vec<MailEvent>, year: Option<i32>) {
        self.aggregates = aggregate(&events);
        self.summary = summarize(&self.aggregates.per_day);
        self.years = available_years(&events);
        self.events = events;
        if let Some(y) = year.or_else(|| self.years.last().copied()) {
            self.year = y;
        }
        if self.view == View::Loading {
            self.view = View::Calendar;
        }
        self.rebin();
    }

    pub fn filter(&self) -> CalendarFilter {
        CalendarFilter {
            year: self.year,
            directions: self.directions,
            hours: self.hours,
            weekdays_only: self.weekdays_only,
        }
    }

    pub fn rebin(&mut self) {
        self.calendar = bin_calendar(&self.events, &self.filter());
        if let Ok(grid) = &self.calendar {
            let last = grid.column_count() - 1;
            self.cursor.1 = self.cursor.1.min(last);
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn next_view(&mut self) {
        if let Some(i) = self.view.tab_index() {
            self.view = View::TABS[(i + 1) % View::TABS.len()];
        }
    }

    pub fn previous_view(&mut self) {
        if let Some(i) = self.view.tab_index() {
            self.view = View::TABS[(i + View::TABS.len() - 1) % View::TABS.len()];
        }
    }

    /// Step through the years that have data
    pub fn next_year(&mut self) {
        if let Some(&y) = self.years.iter().find(|&&y| y > self.year) {
            self.year = y;
            self.rebin();
        }
    }

    pub fn previous_year(&mut self) {
        if let Some(&y) = self.years.iter().rev().find(|&&y| y < self.year) {
            self.year = y;
            self.rebin();
        }
    }

    pub fn toggle_direction(&mut self, direction: Direction) {
        self.directions.toggle(direction);
        self.rebin();
    }

    pub fn toggle_weekdays_only(&mut self) {
        self.weekdays_only = !self.weekdays_only;
        self.rebin();
    }

    /// Switch between all hours and the configured working hours
    pub fn toggle_work_hours(&mut self) {
        if self.hours.is_some() {
            self.hours = None;
        } else {
            match self.config.analysis.work_hours() {
                Ok(hours) => self.hours = Some(hours),
                Err(e) => {
                    self.set_status(&e.to_string());
                    return;
                }
            }
        }
        self.rebin();
    }

    /// Shift the hour window. Invalid windows are rejected and the old one is kept.
    pub fn adjust_hours(&mut self, start_delta: i32, end_delta: i32) {
        let current = match self.hours {
            Some(h) => h,
            None => match self.config.analysis.work_hours() {
                Ok(h) => h,
                Err(e) => {
                    self.set_status(&e.to_string());
                    return;
                }
            },
        };
        let start = current.start() as i32 + start_delta;
        let end = current.end() as i32 + end_delta;
        if start < 0 || end < 0 {
            self.set_status(&format!("invalid hour range {}..{}", start, end));
            return;
        }
        match HourRange::new(start as u32, end as u32) {
            Ok(hours) => {
                self.hours = Some(hours);
                self.rebin();
            }
            Err(e) => self.set_status(&e.to_string()),
        }
    }

    pub fn move_cursor(&mut self, weekday_delta: i32, week_delta: i32) {
        let columns = match &self.calendar {
            Ok(grid) => grid.column_count(),
            Err(_) => return,
        };
        let weekday = (self.cursor.0 as i32 + weekday_delta).clamp(0, 6);
        let week = (self.cursor.1 as i32 + week_delta).clamp(0, columns as i32 - 1);
        self.cursor = (weekday as usize, week as usize);
    }

    /// Date and count under the cursor, if that cell holds mail
    pub fn selected_cell(&self) -> Option<(NaiveDate, u64)> {
        let grid = self.calendar.as_ref().ok()?;
        let (weekday, week) = self.cursor;
        grid.date_at(weekday, week)
            .map(|d| (d, grid.count(weekday, week)))
    }

    pub fn rhythm(&self) -> Vec<RhythmMatrix> {
        self.directions
            .iter()
            .map(|d| weekday_hour_matrix(&self.events, d))
            .collect()
    }

    pub fn trend(&self) -> Vec<TrendSeries> {
        daily_trend(
            &self.aggregates.per_day,
            self.directions,
            self.config.analysis.date_range(),
            self.config.analysis.trend_window,
        )
    }

    /// Mails-per-day histograms over the configured date range
    pub fn distribution(&self) -> Vec<CountDistribution> {
        let range = self.config.analysis.date_range();
        let per_day: Vec<_> = self
            .aggregates
            .per_day
            .iter()
            .filter(|b| range.contains_date(b.date))
            .cloned()
            .collect();
        let bins = self.config.analysis.histogram_bins;
        self.directions
            .iter()
            .map(|d| daily_count_distribution(&per_day, d, bins))
            .collect()
    }

    /// Weekly buckets of the selected ISO year for the selected directions
    pub fn weekly(&self) -> Vec<&WeeklyBucket> {
        self.aggregates
            .per_week
            .iter()
            .filter(|b| b.iso_year == self.year && self.directions.contains(b.direction))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn event(direction: Direction, s: &str) -> MailEvent {
        MailEvent::new(
            direction,
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap(),
        )
    }

    fn app() -> App {
        let mut app = App::new(Arc::new(Config::default()), "test".to_string());
        app.set_events(
            vec![
                event(Direction::Incoming, "2024-03-04 10:00"),
                event(Direction::Incoming, "2025-01-06 09:00"),
                event(Direction::Incoming, "2025-01-06 20:00"),
                event(Direction::Outgoing, "2025-01-11 11:00"),
            ],
            None,
        );
        app
    }

    #[test]
    fn test_loads_latest_year() {
        let app = app();
        assert_eq!(app.view, View::Calendar);
        assert_eq!(app.years, vec![2024, 2025]);
        assert_eq!(app.year, 2025);
        assert_eq!(app.calendar.as_ref().unwrap().total(), 3);
        assert_eq!(app.summary.total(), 4);
    }

    #[test]
    fn test_year_navigation_only_visits_years_with_data() {
        let mut app = app();
        app.next_year();
        assert_eq!(app.year, 2025);
        app.previous_year();
        assert_eq!(app.year, 2024);
        assert_eq!(app.calendar.as_ref().unwrap().total(), 1);
    }

    #[test]
    fn test_filters_rebin() {
        let mut app = app();
        app.toggle_work_hours();
        assert_eq!(app.hours, HourRange::new(8, 18).ok());
        assert_eq!(app.calendar.as_ref().unwrap().total(), 2);

        app.toggle_weekdays_only();
        assert_eq!(app.calendar.as_ref().unwrap().total(), 1);

        app.toggle_direction(Direction::Incoming);
        assert!(matches!(app.calendar, Err(AnalyticsError::NoData { .. })));
        assert!(app.selected_cell().is_none());
    }

    #[test]
    fn test_invalid_hour_adjustment_is_rejected() {
        let mut app = app();
        app.adjust_hours(0, 0);
        assert_eq!(app.hours, HourRange::new(8, 18).ok());
        app.adjust_hours(0, 7);
        assert_eq!(app.hours, HourRange::new(8, 18).ok());
        assert!(app.status_message.as_deref().unwrap().contains("invalid hour range"));
        app.adjust_hours(-9, 0);
        assert_eq!(app.hours, HourRange::new(8, 18).ok());
        app.adjust_hours(0, 6);
        assert_eq!(app.hours, HourRange::new(8, 24).ok());
    }

    #[test]
    fn test_cursor_reports_selected_date() {
        let mut app = app();
        app.cursor = (0, 0);
        app.move_cursor(0, 2);
        assert_eq!(app.cursor, (0, 2));
        assert_eq!(
            app.selected_cell(),
            Some((NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 2))
        );
        app.move_cursor(10, 100);
        assert_eq!(app.cursor, (6, 53));
    }

    #[test]
    fn test_view_cycling() {
        let mut app = app();
        app.next_view();
        assert_eq!(app.view, View::Rhythm);
        app.previous_view();
        app.previous_view();
        assert_eq!(app.view, View::Distribution);
        app.next_view();
        assert_eq!(app.view, View::Calendar);
    }

    #[test]
    fn test_weekly_and_rhythm_follow_direction_filter() {
        let mut app = app();
        assert_eq!(app.weekly().len(), 2);
        app.toggle_direction(Direction::Outgoing);
        assert_eq!(app.weekly().len(), 1);
        assert_eq!(app.rhythm().len(), 1);
        assert_eq!(app.trend().len(), 1);
        assert_eq!(app.distribution().len(), 1);
    }

    #[test]
    fn test_distribution_counts_days_with_mail() {
        let app = app();
        let dists = app.distribution();
        assert_eq!(dists.len(), 2);
        let incoming = &dists[0];
        assert_eq!(incoming.direction, Direction::Incoming);
        // 2024-03-04 has one mail, 2025-01-06 has two
        assert_eq!(incoming.bins.iter().map(|b| b.days).sum::<u64>(), 2);
        assert_eq!(incoming.bins.first().map(|b| b.days), Some(1));
        assert_eq!(incoming.bins.last().map(|b| b.days), Some(1));
    }
}
