//! CSV ledger of URLs that failed to ingest (`url,exception`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub exception: String,
}

#[derive(Debug)]
pub struct FailureLog {
    path: PathBuf,
    records: Vec<FailureRecord>,
}

impl FailureLog {
    /// Loads the ledger; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        let mut records = Vec::new();
        if path.exists() {
            let mut reader = csv::Reader::from_path(path)
                .with_context(|| format!("Failed to open failure ledger: {}", path.display()))?;
            for record in reader.deserialize() {
                records.push(record.with_context(|| format!("Bad row in {}", path.display()))?);
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.records.iter().any(|r| r.url == url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records a failure, replacing any earlier entry for the same URL.
    pub fn record(&mut self, url: &str, exception: &str) {
        self.records.retain(|r| r.url != url);
        self.records.push(FailureRecord {
            url: url.to_string(),
            exception: exception.to_string(),
        });
    }

    /// Drops the entry for a URL that has since succeeded.
    pub fn clear(&mut self, url: &str) {
        self.records.retain(|r| r.url != url);
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to write failure ledger: {}", self.path.display()))?;
        if self.records.is_empty() {
            writer.write_record(["url", "exception"])?;
        }
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = FailureLog::load(&dir.path().join("exceptions.csv")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_record_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/exceptions.csv");

        let mut log = FailureLog::load(&path).unwrap();
        log.record("https://jobs.example/1", "HTTP 404 Not Found");
        log.record("https://jobs.example/2", "bad, \"quoted\" json");
        log.record("https://jobs.example/1", "HTTP 500");
        log.save().unwrap();

        let reloaded = FailureLog::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("https://jobs.example/1"));
        assert!(!reloaded.contains("https://jobs.example/3"));
        assert_eq!(reloaded.records[1].exception, "HTTP 500");
        assert_eq!(reloaded.records[0].exception, "bad, \"quoted\" json");
    }

    #[test]
    fn test_clear_then_save_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exceptions.csv");
        let mut log = FailureLog::load(&path).unwrap();
        log.record("https://jobs.example/1", "boom");
        log.clear("https://jobs.example/1");
        log.save().unwrap();

        assert!(FailureLog::load(&path).unwrap().is_empty());
    }
}
