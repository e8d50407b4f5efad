//! Date-keyed archive of daily snapshots.
//!
//! Layout is `<root>/<YYYY>/<MM>/<YYYY-MM-DD>.json`, one entry per UTC day.
//! Re-running on the same day replaces that day's entry. An entry's file
//! modification time is its snapshot's capture time; the document itself is
//! stored exactly as fetched.
use crate::snapshot::Snapshot;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use skydaily_common::{Result, SkydailyError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const ENTRY_EXT: &str = "json";

/// An existing archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub date: NaiveDate,
    pub path: PathBuf,
}

/// What [`Archiver::archive`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub entry: ArchiveEntry,
    /// Most recent entry dated strictly before `entry.date`.
    pub previous: Option<ArchiveEntry>,
    /// False when an entry for the same day was overwritten.
    pub is_new_day: bool,
}

/// Most recent date in `dates` strictly before `date`.
///
/// ```
/// use chrono::NaiveDate;
/// use skydaily_stats::latest_before;
///
/// let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
/// let known = [d("2024-11-18"), d("2024-11-20"), d("2024-11-19")];
/// assert_eq!(latest_before(known, d("2024-11-20")), Some(d("2024-11-19")));
/// assert_eq!(latest_before(known, d("2024-11-18")), None);
/// ```
pub fn latest_before<I>(dates: I, date: NaiveDate) -> Option<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates.into_iter().filter(|d| *d < date).max()
}

/// Relative location of the entry for `date`.
pub fn entry_relative_path(date: NaiveDate) -> PathBuf {
    PathBuf::from(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{}.{ENTRY_EXT}", date.format("%Y-%m-%d")))
}

/// Recover the date of an entry from its year dir, month dir and file name.
/// Anything that does not follow the layout is `None`.
pub fn parse_entry_name(year: &str, month: &str, file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(&format!(".{ENTRY_EXT}"))?;
    if stem.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()?;
    let matches_dirs = year == format!("{:04}", date.year()) && month == format!("{:02}", date.month());
    matches_dirs.then_some(date)
}

#[derive(Debug, Clone)]
pub struct Archiver {
    root: PathBuf,
}

impl Archiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(entry_relative_path(date))
    }

    /// Every date with an entry on disk, sorted. A missing root is an empty archive.
    pub fn list_dates(&self) -> io::Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for year in read_dir_names(&self.root)? {
            let year_dir = self.root.join(&year);
            if !year_dir.is_dir() {
                continue;
            }
            for month in read_dir_names(&year_dir)? {
                let month_dir = year_dir.join(&month);
                if !month_dir.is_dir() {
                    continue;
                }
                for file_name in read_dir_names(&month_dir)? {
                    if let Some(date) = parse_entry_name(&year, &month, &file_name) {
                        if month_dir.join(&file_name).is_file() {
                            dates.push(date);
                        }
                    }
                }
            }
        }
        dates.sort();
        Ok(dates)
    }

    /// Most recent entry strictly before `date`, if any.
    pub fn previous_entry(&self, date: NaiveDate) -> io::Result<Option<ArchiveEntry>> {
        let dates = self.list_dates()?;
        Ok(latest_before(dates, date).map(|d| ArchiveEntry {
            date: d,
            path: self.entry_path(d),
        }))
    }

    /// Persist `snapshot` as the entry for `date`.
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed into place, so readers see either the old entry or the new one.
    pub fn archive(&self, snapshot: &Snapshot, date: NaiveDate) -> Result<ArchiveOutcome> {
        let path = self.entry_path(date);
        let is_new_day = !path.exists();

        let previous = match self.previous_entry(date) {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(root=%self.root.display(), error=%e, "archive.scan_failed");
                None
            }
        };

        let json = snapshot.to_archive_json().map_err(|e| SkydailyError::Write {
            path: path.clone(),
            source: io::Error::from(e),
        })?;
        write_atomically(&path, json.as_bytes(), snapshot.captured_at().into())?;

        tracing::info!(
            path=%path.display(),
            is_new_day,
            previous=?previous.as_ref().map(|p| p.date),
            "archive.written"
        );

        Ok(ArchiveOutcome {
            entry: ArchiveEntry { date, path },
            previous,
            is_new_day,
        })
    }

    /// Read an entry back. Without a `last_update_time` in the document the
    /// capture time is the file's modification time, or midnight UTC of the
    /// entry's date when the platform cannot report one.
    pub fn load(&self, entry: &ArchiveEntry) -> Result<Snapshot> {
        let read_err = |message: String| SkydailyError::Read {
            path: entry.path.clone(),
            message,
        };
        let raw = fs::read_to_string(&entry.path).map_err(|e| read_err(e.to_string()))?;
        let document = serde_json::from_str(&raw).map_err(|e| read_err(e.to_string()))?;
        let fallback = match fs::metadata(&entry.path).and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(e) => {
                tracing::debug!(path=%entry.path.display(), error=%e, "archive.mtime_unavailable");
                entry.date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
            }
        };
        Snapshot::from_document(document, fallback).map_err(|e| read_err(e.to_string()))
    }

    /// Load the previous entry of `outcome`; an unreadable entry is logged and
    /// treated as absent.
    pub fn load_previous(&self, outcome: &ArchiveOutcome) -> Option<Snapshot> {
        let previous = outcome.previous.as_ref()?;
        match self.load(previous) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error=%e, "archive.previous_unreadable");
                None
            }
        }
    }
}

fn read_dir_names(dir: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut names = Vec::new();
    for entry in entries {
        if let Some(name) = entry?.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

fn write_atomically(path: &Path, bytes: &[u8], modified: SystemTime) -> Result<()> {
    let write_err = |path: &Path, source: io::Error| SkydailyError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .ok_or_else(|| write_err(path, io::Error::other("entry path has no parent")))?;
    fs::create_dir_all(dir).map_err(|e| write_err(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_err(dir, e))?;
    tmp.write_all(bytes).map_err(|e| write_err(path, e))?;
    tmp.as_file()
        .set_modified(modified)
        .map_err(|e| write_err(path, e))?;
    tmp.as_file().sync_all().map_err(|e| write_err(path, e))?;
    tmp.persist(path).map_err(|e| write_err(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn relative_path_uses_year_month_and_date() {
        assert_eq!(
            entry_relative_path(d("2024-03-07")),
            PathBuf::from("2024").join("03").join("2024-03-07.json")
        );
    }

    #[test]
    fn latest_before_is_strict() {
        let known = vec![d("2024-01-01"), d("2024-01-03")];
        assert_eq!(latest_before(known.clone(), d("2024-01-03")), Some(d("2024-01-01")));
        assert_eq!(latest_before(known.clone(), d("2024-01-04")), Some(d("2024-01-03")));
        assert_eq!(latest_before(known, d("2024-01-01")), None);
        assert_eq!(latest_before(Vec::new(), d("2024-01-01")), None);
    }

    #[test]
    fn latest_before_crosses_month_and_year_boundaries() {
        let known = vec![d("2023-12-31"), d("2024-02-29"), d("2025-01-01")];
        assert_eq!(latest_before(known.clone(), d("2024-03-01")), Some(d("2024-02-29")));
        assert_eq!(latest_before(known, d("2024-01-01")), Some(d("2023-12-31")));
    }

    #[test]
    fn entry_names_must_match_their_directories() {
        assert_eq!(parse_entry_name("2024", "11", "2024-11-20.json"), Some(d("2024-11-20")));
        assert_eq!(parse_entry_name("2024", "10", "2024-11-20.json"), None);
        assert_eq!(parse_entry_name("2023", "11", "2024-11-20.json"), None);
        assert_eq!(parse_entry_name("2024", "11", "2024-11-20.json.tmp"), None);
        assert_eq!(parse_entry_name("2024", "11", "README.md"), None);
        assert_eq!(parse_entry_name("2024", "11", "2024-11-5.json"), None);
    }
}
