use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

/// At-most-once-per-day marker: a text file holding the last run's ISO date.
#[derive(Debug, Clone)]
pub struct RunGuard {
    path: PathBuf,
}

impl RunGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_run(&self) -> Result<Option<NaiveDate>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("read {}", self.path.display()));
            }
        };
        // A garbled marker is treated as "never ran" so the day is not lost.
        Ok(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
    }

    pub fn already_ran(&self, day: NaiveDate) -> Result<bool> {
        Ok(self.last_run()? == Some(day))
    }

    pub fn mark(&self, day: NaiveDate) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("txt.tmp");
        fs::write(&tmp, day.format("%Y-%m-%d").to_string()).context("write run marker")?;
        fs::rename(&tmp, &self.path).context("swap run marker")?;
        info!(%day, path = %self.path.display(), "marked daily run");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    #[test]
    fn fresh_guard_has_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let guard = RunGuard::new(dir.path().join("last_run_date.txt"));
        assert_eq!(guard.last_run().unwrap(), None);
        assert!(!guard.already_ran(day(6)).unwrap());
    }

    #[test]
    fn marks_only_that_day() {
        let dir = tempfile::tempdir().unwrap();
        let guard = RunGuard::new(dir.path().join("nested").join("last_run_date.txt"));
        guard.mark(day(6)).unwrap();
        assert!(guard.already_ran(day(6)).unwrap());
        assert!(!guard.already_ran(day(7)).unwrap());
        guard.mark(day(7)).unwrap();
        assert!(guard.already_ran(day(7)).unwrap());
        assert_eq!(fs::read_to_string(guard.path()).unwrap(), "2025-12-07");
    }

    #[test]
    fn garbled_marker_counts_as_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_run_date.txt");
        fs::write(&path, "yesterday").unwrap();
        assert!(!RunGuard::new(path).already_ran(day(6)).unwrap());
    }
}
