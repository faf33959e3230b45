use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;

use super::types::{CachedMail, ScannedMail};

const CACHE_VERSION: u32 = 1;

#[derive(serde::Serialize, serde::Deserialize)]
struct CacheFile {
    version: u32,
    /// Settings that influence parsing (user email, sent folders, time reference)
    fingerprint: String,
    mails: HashMap<String, CachedMail>, // keyed by file path
}

/// Default cache location for an account
pub fn cache_path(account: &str) -> Option<PathBuf> {
    let file_name: String = account
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    dirs::cache_dir().map(|p| p.join("mailrhythm").join(format!("{}.bin", file_name)))
}

/// Load scan cache from disk. Missing, unreadable, outdated or foreign caches load as empty.
pub fn load_cache(path: &Path, fingerprint: &str) -> HashMap<String, CachedMail> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return HashMap::new(),
    };

    let reader = BufReader::new(file);
    let cache: CacheFile = match bincode::deserialize_from(reader) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), "Ignoring unreadable cache: {}", e);
            return HashMap::new();
        }
    };

    if cache.version != CACHE_VERSION || cache.fingerprint != fingerprint {
        tracing::debug!(path = %path.display(), "Cache outdated, rescanning");
        return HashMap::new();
    }

    cache.mails
}

/// Save scan cache to disk. Writes to a temp file first so a crash never leaves
/// a truncated cache behind.
pub fn save_cache(path: &Path, fingerprint: &str, mails: &[(PathBuf, ScannedMail)]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) => p,
        None => return Ok(()),
    };
    fs::create_dir_all(parent)?;

    let mut cache_map = HashMap::with_capacity(mails.len());
    for (file_path, mail) in mails {
        let mtime = get_file_mtime(file_path).unwrap_or(0);
        cache_map.insert(
            file_path.to_string_lossy().to_string(),
            CachedMail {
                mail: mail.clone(),
                mtime,
            },
        );
    }

    let cache = CacheFile {
        version: CACHE_VERSION,
        fingerprint: fingerprint.to_string(),
        mails: cache_map,
    };

    let tmp = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        bincode::serialize_into(&mut writer, &cache)?;
        writer.flush()?;
    }
    tmp.persist(path)?;

    Ok(())
}

/// Get file modification time in seconds since epoch
pub fn get_file_mtime(path: &Path) -> Option<u64> {
    let metadata = fs::metadata(path).ok()?;
    let mtime = metadata.modified().ok()?;
    let duration = mtime.duration_since(SystemTime::UNIX_EPOCH).ok()?;
    Some(duration.as_secs())
}

/// Check if a cached entry is still valid (file hasn't changed)
pub fn is_cache_valid(cached: &CachedMail, file_path: &Path) -> bool {
    match get_file_mtime(file_path) {
        Some(current_mtime) => cached.mtime == current_mtime,
        None => false, // File doesn't exist anymore
    }
}

/// Split files into those that need parsing (new or modified) and cache hits.
/// Every cached entry is checked against the file's current mtime, so a file
/// edited in place under the same name is parsed again.
pub fn get_files_to_parse(
    file_paths: &[PathBuf],
    cache: &HashMap<String, CachedMail>,
) -> (Vec<PathBuf>, Vec<(PathBuf, ScannedMail)>) {
    use rayon::prelude::*;

    let results: Vec<(Option<PathBuf>, Option<(PathBuf, ScannedMail)>)> = file_paths
        .par_iter()
        .map(|path| match cache.get(path.to_string_lossy().as_ref()) {
            Some(cached) if is_cache_valid(cached, path) => {
                (None, Some((path.clone(), cached.mail.clone())))
            }
            // modified or new file
            _ => (Some(path.clone()), None),
        })
        .collect();

    let mut to_parse = Vec::new();
    let mut from_cache = Vec::new();

    for (parse, cached) in results {
        if let Some(p) = parse {
            to_parse.push(p);
        }
        if let Some(e) = cached {
            from_cache.push(e);
        }
    }

    (to_parse, from_cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{Direction, MailEvent};
    use chrono::NaiveDate;

    fn mail(day: u32) -> ScannedMail {
        ScannedMail {
            event: MailEvent::new(
                Direction::Incoming,
                NaiveDate::from_ymd_opt(2025, 1, day)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
            ),
            message_id: Some(format!("{}@example.com", day)),
        }
    }

    #[test]
    fn test_round_trip_and_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("msg1");
        fs::write(&file, "Date: x\n\nbody").unwrap();
        let cache_file = dir.path().join("cache/account.bin");

        save_cache(&cache_file, "me@example.com", &[(file.clone(), mail(6))]).unwrap();

        let loaded = load_cache(&cache_file, "me@example.com");
        assert_eq!(loaded.len(), 1);
        let cached = &loaded[file.to_string_lossy().as_ref()];
        assert_eq!(cached.mail.event, mail(6).event);
        assert!(is_cache_valid(cached, &file));

        assert!(load_cache(&cache_file, "other@example.com").is_empty());
        assert!(load_cache(&dir.path().join("missing.bin"), "me@example.com").is_empty());
    }

    #[test]
    fn test_files_to_parse_splits_new_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let known = dir.path().join("known");
        let fresh = dir.path().join("fresh");
        fs::write(&known, "a").unwrap();
        fs::write(&fresh, "b").unwrap();

        let mut cache = HashMap::new();
        cache.insert(
            known.to_string_lossy().to_string(),
            CachedMail {
                mail: mail(7),
                mtime: get_file_mtime(&known).unwrap(),
            },
        );

        let files = vec![known.clone(), fresh.clone()];
        let (to_parse, from_cache) = get_files_to_parse(&files, &cache);
        assert_eq!(to_parse, vec![fresh]);
        assert_eq!(from_cache.len(), 1);
        assert_eq!(from_cache[0].0, known);

        cache.get_mut(known.to_string_lossy().as_ref()).unwrap().mtime = 1;
        let (to_parse, from_cache) = get_files_to_parse(&files, &cache);
        assert_eq!(to_parse.len(), 2);
        assert!(from_cache.is_empty());
    }

    #[test]
    fn test_edited_file_is_reparsed_when_all_paths_are_known() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("msg");
        fs::write(&file, "a").unwrap();

        let mut cache = HashMap::new();
        cache.insert(
            file.to_string_lossy().to_string(),
            CachedMail {
                mail: mail(8),
                mtime: get_file_mtime(&file).unwrap(),
            },
        );
        let files = vec![file.clone()];
        let (to_parse, from_cache) = get_files_to_parse(&files, &cache);
        assert!(to_parse.is_empty());
        assert_eq!(from_cache.len(), 1);

        // Same path and file count, older mtime on record
        cache.get_mut(file.to_string_lossy().as_ref()).unwrap().mtime -= 10;
        let (to_parse, from_cache) = get_files_to_parse(&files, &cache);
        assert_eq!(to_parse, vec![file]);
        assert!(from_cache.is_empty());
    }
}
