use anyhow::Result;
use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::cache::{get_files_to_parse, load_cache, save_cache};
use super::source::MailSource;
use super::types::{DateRange, Direction, MailEvent, ScannedMail};
use crate::config::{AccountConfig, AnalysisConfig, TimeReference};

/// Reads mail events straight from a maildir tree
#[derive(Debug, Clone)]
pub struct MaildirSource {
    root: PathBuf,
    folders: Vec<String>,
    sent_folders: Vec<String>,
    user_email: String,
    time_reference: TimeReference,
    cache_path: Option<PathBuf>,
}

/// A maildir folder with its name relative to the root
#[derive(Debug, Clone, PartialEq, Eq)]
struct Folder {
    name: String,
    path: PathBuf,
}

impl MaildirSource {
    pub fn new(root: impl Into<PathBuf>, user_email: &str) -> Self {
        let defaults = AccountConfig::default();
        Self {
            root: root.into(),
            folders: Vec::new(),
            sent_folders: defaults.sent_folders,
            user_email: user_email.to_string(),
            time_reference: TimeReference::Local,
            cache_path: None,
        }
    }

    pub fn from_account(name: &str, account: &AccountConfig, analysis: &AnalysisConfig) -> Self {
        let cache_path = if analysis.use_cache {
            super::cache::cache_path(name)
        } else {
            None
        };
        Self {
            root: account.maildir_path(),
            folders: account.folders.clone(),
            sent_folders: account.sent_folders.clone(),
            user_email: account.email.clone(),
            time_reference: analysis.time_reference,
            cache_path,
        }
    }

    pub fn with_folders(mut self, folders: Vec<String>) -> Self {
        self.folders = folders;
        self
    }

    pub fn with_sent_folders(mut self, sent_folders: Vec<String>) -> Self {
        self.sent_folders = sent_folders;
        self
    }

    pub fn with_time_reference(mut self, time_reference: TimeReference) -> Self {
        self.time_reference = time_reference;
        self
    }

    pub fn with_cache(mut self, cache_path: Option<PathBuf>) -> Self {
        self.cache_path = cache_path;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{:?}",
            self.user_email.to_lowercase(),
            self.sent_folders.join(","),
            self.time_reference
        )
    }

    fn is_sent_folder(&self, folder: &str) -> bool {
        let folder = normalize_folder(folder);
        self.sent_folders
            .iter()
            .any(|s| normalize_folder(s) == folder)
    }

    /// Configured folders, or every maildir below the root when none are configured
    fn folders(&self) -> Vec<Folder> {
        if !self.folders.is_empty() {
            return self
                .folders
                .iter()
                .map(|name| Folder {
                    name: name.clone(),
                    path: self.root.join(name),
                })
                .collect();
        }

        let mut found: Vec<Folder> = walkdir::WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.file_name() == "cur")
            .filter_map(|e| {
                let path = e.path().parent()?.to_path_buf();
                let name = path
                    .strip_prefix(&self.root)
                    .ok()?
                    .to_string_lossy()
                    .to_string();
                let name = if name.is_empty() {
                    "INBOX".to_string()
                } else {
                    name
                };
                Some(Folder { name, path })
            })
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Scan all configured folders and return the events inside `range`.
    /// Uses the parse cache and Rayon for parallel file parsing.
    pub fn scan<F>(&self, range: &DateRange, progress: F) -> Result<Vec<MailEvent>>
    where
        F: Fn(usize, usize) + Sync, // (current, total)
    {
        if !self.root.is_dir() {
            return Err(anyhow::anyhow!(
                "Maildir not found: {}",
                self.root.display()
            ));
        }

        // Collect all file paths from cur/ and new/ with their direction hint
        let mut file_paths: Vec<PathBuf> = Vec::new();
        let mut sent_hint: HashMap<PathBuf, bool> = HashMap::new();

        for folder in self.folders() {
            let is_sent = self.is_sent_folder(&folder.name);
            for subdir in &["cur", "new"] {
                if let Ok(entries) = std::fs::read_dir(folder.path.join(subdir)) {
                    for entry in entries.flatten() {
                        let path = entry.path();
                        if path.is_file() {
                            sent_hint.insert(path.clone(), is_sent);
                            file_paths.push(path);
                        }
                    }
                }
            }
        }

        let total = file_paths.len();
        let fingerprint = self.fingerprint();

        let cache = self
            .cache_path
            .as_deref()
            .map(|p| load_cache(p, &fingerprint))
            .unwrap_or_default();
        let (to_parse, mut scanned) = get_files_to_parse(&file_paths, &cache);

        let cache_hits = scanned.len();
        let to_parse_count = to_parse.len();

        // Report initial progress (cache hits are "instant")
        progress(cache_hits, total);

        let dropped = AtomicUsize::new(0);
        if !to_parse.is_empty() {
            let processed = AtomicUsize::new(0);

            let parsed: Vec<(PathBuf, ScannedMail)> = to_parse
                .into_par_iter()
                .filter_map(|path| {
                    let in_sent_folder = sent_hint.get(&path).copied().unwrap_or(false);
                    let result = match parse_mail_file(
                        &path,
                        in_sent_folder,
                        &self.user_email,
                        self.time_reference,
                    ) {
                        Ok(mail) => Some((path, mail)),
                        Err(e) => {
                            tracing::debug!(path = %path.display(), "Skipping mail: {}", e);
                            dropped.fetch_add(1, Ordering::Relaxed);
                            None
                        }
                    };

                    // Update progress atomically
                    let current = processed.fetch_add(1, Ordering::Relaxed);
                    if current % 100 == 0 || current == to_parse_count - 1 {
                        progress(cache_hits + current, total);
                    }

                    result
                })
                .collect();

            scanned.extend(parsed);
        }

        progress(total, total);

        if let Some(path) = self.cache_path.as_deref() {
            if let Err(e) = save_cache(path, &fingerprint, &scanned) {
                tracing::warn!(path = %path.display(), "Failed to save cache: {}", e);
            }
        }

        let unique = dedupe_by_message_id(scanned.into_iter().map(|(_, m)| m));
        let mut events: Vec<MailEvent> = unique
            .into_iter()
            .map(|m| m.event)
            .filter(|e| range.contains(&e.timestamp))
            .collect();
        events.sort_by_key(|e| (e.timestamp, e.direction));

        tracing::info!(
            root = %self.root.display(),
            files = total,
            cache_hits,
            dropped = dropped.load(Ordering::Relaxed),
            events = events.len(),
            "maildir scan finished"
        );

        Ok(events)
    }
}

impl MailSource for MaildirSource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<MailEvent>> {
        self.scan(range, |_, _| {})
    }
}

/// Collapse copies of the same message (e.g. All Mail + Sent). A copy seen as
/// outgoing anywhere makes the message outgoing.
fn dedupe_by_message_id(mails: impl IntoIterator<Item = ScannedMail>) -> Vec<ScannedMail> {
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<ScannedMail> = Vec::new();

    for mail in mails {
        let Some(id) = mail.message_id.clone() else {
            unique.push(mail);
            continue;
        };
        match by_id.get(&id) {
            Some(&idx) => {
                if mail.event.direction == Direction::Outgoing {
                    unique[idx].event.direction = Direction::Outgoing;
                }
            }
            None => {
                by_id.insert(id, unique.len());
                unique.push(mail);
            }
        }
    }

    unique
}

/// Folder names compare case-insensitively, ignoring Maildir++ leading dots
fn normalize_folder(name: &str) -> String {
    name.trim_matches('/').trim_start_matches('.').to_lowercase()
}

/// Read the header block (everything up to the first empty line)
fn read_header_block(path: &Path) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut headers = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        headers.extend_from_slice(&line);
        if line == b"\n" || line == b"\r\n" {
            break;
        }
    }

    Ok(headers)
}

/// Parse a single maildir file into a scanned mail
fn parse_mail_file(
    path: &Path,
    in_sent_folder: bool,
    user_email: &str,
    time_reference: TimeReference,
) -> Result<ScannedMail> {
    let raw = read_header_block(path)?;

    let message = mail_parser::MessageParser::default()
        .parse(&raw)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse headers"))?;

    let date = message
        .date()
        .ok_or_else(|| anyhow::anyhow!("Missing Date header"))?;
    let timestamp = normalize_timestamp(date, time_reference)
        .ok_or_else(|| anyhow::anyhow!("Invalid Date header: {:?}", date))?;

    let from = message
        .from()
        .and_then(|a| a.first())
        .and_then(|a| a.address());

    let direction = if in_sent_folder || is_from_user(from, user_email) {
        Direction::Outgoing
    } else {
        Direction::Incoming
    };

    Ok(ScannedMail {
        event: MailEvent::new(direction, timestamp),
        message_id: message.message_id().map(|s| s.to_string()),
    })
}

fn is_from_user(from: Option<&str>, user_email: &str) -> bool {
    if user_email.is_empty() {
        return false;
    }
    from.map(|f| f.trim().eq_ignore_ascii_case(user_email.trim()))
        .unwrap_or(false)
}

/// Drop the timezone from a parsed Date header according to `reference`
fn normalize_timestamp(
    date: &mail_parser::DateTime,
    reference: TimeReference,
) -> Option<NaiveDateTime> {
    let wall_clock = NaiveDate::from_ymd_opt(date.year as i32, date.month as u32, date.day as u32)?
        .and_hms_opt(date.hour as u32, date.minute as u32, date.second as u32)?;

    let sign = if date.tz_before_gmt { -1 } else { 1 };
    let offset_secs = sign * (date.tz_hour as i32 * 3600 + date.tz_minute as i32 * 60);
    let zoned = FixedOffset::east_opt(offset_secs)?
        .from_local_datetime(&wall_clock)
        .single()?;

    Some(match reference {
        TimeReference::Sender => wall_clock,
        TimeReference::Utc => zoned.naive_utc(),
        TimeReference::Local => zoned.with_timezone(&Local).naive_local(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn write_mail(dir: &Path, name: &str, from: &str, date: &str, message_id: Option<&str>) {
        fs::create_dir_all(dir).unwrap();
        let mut content = format!("From: {}\r\nTo: someone@example.com\r\nSubject: hi\r\n", from);
        if !date.is_empty() {
            content.push_str(&format!("Date: {}\r\n", date));
        }
        if let Some(id) = message_id {
            content.push_str(&format!("Message-ID: <{}>\r\n", id));
        }
        content.push_str("\r\nbody\r\n");
        fs::write(dir.join(name), content).unwrap();
    }

    fn maildir() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let inbox = root.path().join("INBOX");
        let sent = root.path().join("Sent");
        fs::create_dir_all(inbox.join("new")).unwrap();
        fs::create_dir_all(sent.join("new")).unwrap();

        write_mail(
            &inbox.join("cur"),
            "1:2,S",
            "Alice <alice@example.com>",
            "Mon, 06 Jan 2025 09:00:00 +0000",
            Some("a1@example.com"),
        );
        write_mail(
            &inbox.join("cur"),
            "2:2,S",
            "Me <me@example.com>",
            "Mon, 06 Jan 2025 20:15:00 +0200",
            Some("a2@example.com"),
        );
        write_mail(&inbox.join("new"), "3", "Bob <bob@example.com>", "", None);
        write_mail(
            &sent.join("cur"),
            "4:2,S",
            "Other Alias <alias@example.com>",
            "Tue, 31 Dec 2024 23:30:00 -0100",
            Some("s1@example.com"),
        );
        root
    }

    #[test]
    fn test_scan_classifies_and_drops_undated() {
        let root = maildir();
        let source = MaildirSource::new(root.path(), "me@example.com")
            .with_time_reference(TimeReference::Utc);

        let events = source.fetch(&DateRange::unbounded()).unwrap();
        assert_eq!(
            events,
            vec![
                MailEvent::new(Direction::Outgoing, at("2025-01-01 00:30:00")),
                MailEvent::new(Direction::Incoming, at("2025-01-06 09:00:00")),
                MailEvent::new(Direction::Outgoing, at("2025-01-06 18:15:00")),
            ]
        );
    }

    #[test]
    fn test_sender_wall_clock_and_date_range() {
        let root = maildir();
        let source = MaildirSource::new(root.path(), "me@example.com")
            .with_time_reference(TimeReference::Sender)
            .with_folders(vec!["Sent".to_string()]);

        let events = source.fetch(&DateRange::unbounded()).unwrap();
        assert_eq!(
            events,
            vec![MailEvent::new(Direction::Outgoing, at("2024-12-31 23:30:00"))]
        );

        let only_2025 = DateRange::new(NaiveDate::from_ymd_opt(2025, 1, 1), None);
        assert!(source.fetch(&only_2025).unwrap().is_empty());
    }

    #[test]
    fn test_scan_reports_progress_and_uses_cache() {
        let root = maildir();
        let cache_file = root.path().join("cache.bin");
        let source = MaildirSource::new(root.path(), "me@example.com")
            .with_time_reference(TimeReference::Utc)
            .with_cache(Some(cache_file.clone()));

        let last = std::sync::Mutex::new((0, 0));
        let first = source
            .scan(&DateRange::unbounded(), |current, total| {
                *last.lock().unwrap() = (current, total);
            })
            .unwrap();
        assert_eq!(*last.lock().unwrap(), (4, 4));
        assert!(cache_file.exists());

        let second = source.fetch(&DateRange::unbounded()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_maildir_is_an_error() {
        let source = MaildirSource::new("/nonexistent/mailrhythm/maildir", "me@example.com");
        assert!(source.fetch(&DateRange::unbounded()).is_err());
    }

    #[test]
    fn test_dedupe_prefers_outgoing() {
        let event = |d| MailEvent::new(d, at("2025-02-03 10:00:00"));
        let mails = vec![
            ScannedMail {
                event: event(Direction::Incoming),
                message_id: Some("x@y".to_string()),
            },
            ScannedMail {
                event: event(Direction::Outgoing),
                message_id: Some("x@y".to_string()),
            },
            ScannedMail {
                event: event(Direction::Incoming),
                message_id: None,
            },
            ScannedMail {
                event: event(Direction::Incoming),
                message_id: None,
            },
        ];
        let unique = dedupe_by_message_id(mails);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].event.direction, Direction::Outgoing);
    }

    #[test]
    fn test_folder_matching() {
        let source = MaildirSource::new("/tmp", "");
        assert!(source.is_sent_folder(".Sent"));
        assert!(source.is_sent_folder("sent items"));
        assert!(source.is_sent_folder("[Gmail]/Sent Mail"));
        assert!(!source.is_sent_folder("INBOX"));
        assert!(!is_from_user(Some("me@example.com"), ""));
        assert!(is_from_user(Some("Me@Example.com"), "me@example.com"));
    }
}
