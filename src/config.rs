use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::analytics::{AnalyticsError, HourRange};
use crate::mail::DateRange;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default account name (if not set, uses first account)
    pub default_account: Option<String>,
    /// Named accounts
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,
    pub analysis: AnalysisConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Your email address (used for detecting sent mail)
    pub email: String,
    /// Maildir root for this account
    pub maildir: String,
    /// Folders to scan, relative to the maildir root. Empty scans every maildir found.
    pub folders: Vec<String>,
    /// Folders whose messages always count as outgoing
    pub sent_folders: Vec<String>,
}

/// How a message's Date header is turned into a naive timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeReference {
    /// Convert to this machine's local time, then drop the zone
    #[default]
    Local,
    /// Convert to UTC, then drop the zone
    Utc,
    /// Keep the sender's wall clock time
    Sender,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ignore mail before this date (inclusive bound)
    pub start_date: Option<NaiveDate>,
    /// Ignore mail after this date (inclusive bound)
    pub end_date: Option<NaiveDate>,
    pub time_reference: TimeReference,
    /// Working hours as [start, end), used by the hour filter toggle
    pub work_hours: (u32, u32),
    /// Moving average window in days for the daily trend
    pub trend_window: usize,
    /// Number of bins in the mails-per-day distribution
    pub histogram_bins: usize,
    /// Show a week label every N columns in the calendar
    pub label_every: usize,
    /// Use the local cache of parsed mail files
    pub use_cache: bool,
}

/// Heatmap and chrome colors, hex (#RRGGBB) or named
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    // Base colors
    pub bg: String,
    pub bg_panel: String,
    pub bg_element: String,
    pub fg: String,
    pub fg_muted: String,

    // Border colors
    pub border: String,
    pub border_active: String,

    // Accent colors
    pub primary: String,
    pub secondary: String,

    // Semantic colors
    pub success: String,
    pub warning: String,

    // Data colors
    pub incoming: String,
    pub outgoing: String,
    pub heat_low: String,
    pub heat_high: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_account: None,
            accounts: HashMap::new(),
            analysis: AnalysisConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            maildir: shellexpand::tilde("~/Mail").into_owned(),
            folders: Vec::new(),
            sent_folders: vec![
                "Sent".to_string(),
                "Sent Items".to_string(),
                "[Gmail]/Sent Mail".to_string(),
            ],
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            time_reference: TimeReference::Local,
            work_hours: (8, 18),
            trend_window: 30,
            histogram_bins: 30,
            label_every: 4,
            use_cache: true,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            bg: "#1a1917".to_string(),
            bg_panel: "#262422".to_string(),
            bg_element: "#393634".to_string(),
            fg: "#f7f7f5".to_string(),
            fg_muted: "#8c8985".to_string(),

            border: "#524f4c".to_string(),
            border_active: "#d4a366".to_string(), // primary

            primary: "#d4a366".to_string(),
            secondary: "#8fa5ae".to_string(),

            success: "#52c41a".to_string(),
            warning: "#faad14".to_string(),

            incoming: "#8fa5ae".to_string(), // secondary
            outgoing: "#d4a366".to_string(), // primary
            heat_low: "#3b4a3f".to_string(),
            heat_high: "#52c41a".to_string(), // success
        }
    }
}

impl AccountConfig {
    pub fn maildir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.maildir).into_owned())
    }
}

impl AnalysisConfig {
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn work_hours(&self) -> Result<HourRange, AnalyticsError> {
        HourRange::new(self.work_hours.0, self.work_hours.1)
    }
}

impl Config {
    /// Get account names in sorted order
    pub fn account_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.accounts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the default account name
    pub fn default_account_name(&self) -> Option<&str> {
        self.default_account
            .as_deref()
            .or_else(|| self.accounts.keys().min().map(|s| s.as_str()))
    }

    /// Get account config by name
    pub fn get_account(&self, name: &str) -> Option<&AccountConfig> {
        self.accounts.get(name)
    }

    /// Resolve an explicitly requested account, falling back to the default one
    pub fn resolve_account<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Option<(&'a str, &'a AccountConfig)> {
        let name = name.or_else(|| self.default_account_name())?;
        self.get_account(name).map(|account| (name, account))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("mailrhythm/config.toml"))
            .unwrap_or_else(|| {
                PathBuf::from(shellexpand::tilde("~/.config/mailrhythm/config.toml").into_owned())
            })
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the user config, falling back to defaults when it is missing or broken
    pub fn load() -> Self {
        let config_path = Self::config_path();

        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %config_path.display(), "Config error: {}", e),
            }
        }

        Self::default()
    }
}

impl ThemeConfig {
    pub fn bg(&self) -> ratatui::style::Color {
        parse_color(&self.bg)
    }
    pub fn bg_panel(&self) -> ratatui::style::Color {
        parse_color(&self.bg_panel)
    }
    pub fn bg_element(&self) -> ratatui::style::Color {
        parse_color(&self.bg_element)
    }
    pub fn fg(&self) -> ratatui::style::Color {
        parse_color(&self.fg)
    }
    pub fn fg_muted(&self) -> ratatui::style::Color {
        parse_color(&self.fg_muted)
    }
    pub fn border(&self) -> ratatui::style::Color {
        parse_color(&self.border)
    }
    pub fn border_active(&self) -> ratatui::style::Color {
        parse_color(&self.border_active)
    }
    pub fn primary(&self) -> ratatui::style::Color {
        parse_color(&self.primary)
    }
    pub fn secondary(&self) -> ratatui::style::Color {
        parse_color(&self.secondary)
    }
    pub fn success(&self) -> ratatui::style::Color {
        parse_color(&self.success)
    }
    pub fn warning(&self) -> ratatui::style::Color {
        parse_color(&self.warning)
    }
    pub fn incoming(&self) -> ratatui::style::Color {
        parse_color(&self.incoming)
    }
    pub fn outgoing(&self) -> ratatui::style::Color {
        parse_color(&self.outgoing)
    }
    pub fn heat_low(&self) -> ratatui::style::Color {
        parse_color(&self.heat_low)
    }
    pub fn heat_high(&self) -> ratatui::style::Color {
        parse_color(&self.heat_high)
    }
    pub fn direction(&self, direction: crate::mail::Direction) -> ratatui::style::Color {
        match direction {
            crate::mail::Direction::Incoming => self.incoming(),
            crate::mail::Direction::Outgoing => self.outgoing(),
        }
    }
}

/// Parse color string to ratatui Color
pub fn parse_color(s: &str) -> ratatui::style::Color {
    use ratatui::style::Color;

    // Try hex first (#RRGGBB)
    if s.starts_with('#') && s.len() == 7 && s.is_ascii() {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&s[1..3], 16),
            u8::from_str_radix(&s[3..5], 16),
            u8::from_str_radix(&s[5..7], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }

    // Named colors
    match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightgreen" => Color::LightGreen,
        "lightblue" => Color::LightBlue,
        "white" => Color::White,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#d4a366"), Color::Rgb(0xd4, 0xa3, 0x66));
        assert_eq!(parse_color("Cyan"), Color::Cyan);
        assert_eq!(parse_color("#zzzzzz"), Color::White);
        // seven bytes but not seven chars
        assert_eq!(parse_color("#aébbb"), Color::White);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.accounts.is_empty());
        assert_eq!(config.analysis.work_hours, (8, 18));
        assert_eq!(config.analysis.trend_window, 30);
        assert_eq!(config.analysis.histogram_bins, 30);
        assert_eq!(config.analysis.time_reference, TimeReference::Local);
        assert_eq!(config.analysis.date_range(), DateRange::unbounded());
    }

    #[test]
    fn test_parse_accounts_and_analysis() {
        let config = Config::from_toml_str(
            r#"
            default_account = "work"

            [accounts.work]
            email = "me@example.com"
            maildir = "/var/mail/me"
            folders = ["INBOX", "Sent"]

            [accounts.home]
            email = "me@home.example"

            [analysis]
            start_date = "2025-01-01"
            end_date = "2025-12-31"
            time_reference = "utc"
            work_hours = [9, 17]
            "#,
        )
        .unwrap();

        assert_eq!(config.account_names(), vec!["home", "work"]);
        let (name, account) = config.resolve_account(None).unwrap();
        assert_eq!(name, "work");
        assert_eq!(account.folders, vec!["INBOX", "Sent"]);
        assert_eq!(account.maildir_path(), PathBuf::from("/var/mail/me"));
        // defaults fill in unspecified account fields
        let home = config.get_account("home").unwrap();
        assert!(home.sent_folders.contains(&"Sent".to_string()));

        let analysis = &config.analysis;
        assert_eq!(analysis.time_reference, TimeReference::Utc);
        assert_eq!(analysis.work_hours().unwrap(), HourRange::new(9, 17).unwrap());
        assert!(analysis
            .date_range()
            .contains_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
    }

    #[test]
    fn test_invalid_work_hours_are_rejected() {
        let config = Config::from_toml_str("[analysis]\nwork_hours = [18, 8]\n").unwrap();
        assert!(config.analysis.work_hours().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[accounts.a]\nemail = \"a@b.c\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_account_name(), Some("a"));
        assert!(Config::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
