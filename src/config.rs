//! YAML configuration and default file locations.
//!
//! ```yaml
//! bookmark_path: ~/.config/google-chrome/Default/Bookmarks
//! jobs_bookmark_folder: Job-searching/Jobs
//! llm_model: gpt-4o-mini
//! resume_fn: resume.txt
//! keyword_fn: keywords.csv
//! scored_examples:
//!   - score: 9
//!     path: examples/great_fit.txt
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::JobBoardError;

pub const DEFAULT_FOLDER: &str = "Job-searching/Jobs";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CONFIG_FILE: &str = "config.yaml";

/// A job description with a known fit score, used as a few-shot example.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredExample {
    pub score: i64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bookmark_path: Option<PathBuf>,
    pub jobs_bookmark_folder: String,
    pub recursive: bool,
    pub llm_model: String,
    pub keyword_fn: Option<PathBuf>,
    pub resume_fn: Option<PathBuf>,
    pub scored_examples: Vec<ScoredExample>,
    pub database_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    /// WebDriver endpoint (e.g. chromedriver) used when a plain fetch fails.
    pub webdriver_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bookmark_path: None,
            jobs_bookmark_folder: DEFAULT_FOLDER.to_string(),
            recursive: true,
            llm_model: DEFAULT_MODEL.to_string(),
            keyword_fn: None,
            resume_fn: None,
            scored_examples: Vec::new(),
            database_path: None,
            data_dir: None,
            webdriver_url: None,
        }
    }
}

impl Config {
    /// Reads a config file. Relative paths inside it resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    /// Loads `explicit` if given, otherwise `./config.yaml`, otherwise the
    /// per-user config file. Falls back to defaults when none exists.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dirs) = project_dirs() {
            candidates.push(dirs.config_dir().join(CONFIG_FILE));
        }

        for candidate in candidates {
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok((config, Some(candidate)));
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok((Self::default(), None))
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            let expanded = expand_home(p);
            *p = if expanded.is_relative() { base.join(expanded) } else { expanded };
        };

        for path in [
            self.bookmark_path.as_mut(),
            self.keyword_fn.as_mut(),
            self.resume_fn.as_mut(),
            self.database_path.as_mut(),
            self.data_dir.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
        for example in &mut self.scored_examples {
            resolve(&mut example.path);
        }
    }

    pub fn require_bookmark_path(&self) -> Result<&Path, JobBoardError> {
        self.bookmark_path.as_deref().ok_or_else(|| {
            JobBoardError::Config(
                "'bookmark_path' is required (set it in config.yaml or pass --bookmarks)".to_string(),
            )
        })
    }

    /// Directory holding the database, snapshots and the failure ledger.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join("jobs.db"))
    }

    pub fn jobs_snapshot_path(&self) -> PathBuf {
        self.data_dir().join("jobs_snapshot.csv")
    }

    pub fn applications_snapshot_path(&self) -> PathBuf {
        self.data_dir().join("applications_snapshot.csv")
    }

    pub fn failures_path(&self) -> PathBuf {
        self.data_dir().join("exceptions.csv")
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "job-board")
}

/// Expands a leading `~/` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(base) = directories::BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_keys_missing() {
        let config: Config = serde_yaml::from_str("bookmark_path: /tmp/Bookmarks\n").unwrap();
        assert_eq!(config.bookmark_path, Some(PathBuf::from("/tmp/Bookmarks")));
        assert_eq!(config.jobs_bookmark_folder, DEFAULT_FOLDER);
        assert_eq!(config.llm_model, DEFAULT_MODEL);
        assert!(config.recursive);
        assert!(config.scored_examples.is_empty());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "bookmark_path: Bookmarks\n\
             jobs_bookmark_folder: Jobs\n\
             resume_fn: resume.txt\n\
             data_dir: /var/lib/job-board\n\
             scored_examples:\n  - score: 8\n    path: ex/good.txt\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.bookmark_path, Some(dir.path().join("Bookmarks")));
        assert_eq!(config.resume_fn, Some(dir.path().join("resume.txt")));
        assert_eq!(config.jobs_bookmark_folder, "Jobs");
        assert_eq!(config.scored_examples[0].path, dir.path().join("ex/good.txt"));
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/job-board/jobs.db"));
        assert_eq!(
            config.failures_path(),
            PathBuf::from("/var/lib/job-board/exceptions.csv")
        );
    }

    #[test]
    fn test_missing_bookmark_path_is_config_error() {
        let config = Config::default();
        let err = config.require_bookmark_path().unwrap_err();
        assert!(matches!(err, JobBoardError::Config(_)));
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::discover(Some(&dir.path().join("nope.yaml")));
        assert!(result.is_err());
    }
}
