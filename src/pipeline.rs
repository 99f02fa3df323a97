use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::ai::Normalizer;
use crate::bookmarks::Bookmark;
use crate::db::Database;
use crate::error::JobBoardError;
use crate::failures::FailureLog;
use crate::fetch::{visible_text, PageFetcher};
use crate::keywords::KeywordSet;
use crate::models::{JobPosting, PostingStatus};

#[derive(Debug, Default)]
pub struct PipelineOptions {
    /// Reference resume text; postings are scored only when set.
    pub resume: Option<String>,
    pub keywords: KeywordSet,
    /// Skip URLs already in the failure ledger.
    pub skip_failed: bool,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub stored: Vec<String>,
    pub skipped: usize,
    pub failures: Vec<(String, JobBoardError)>,
}

pub struct Pipeline<'a> {
    db: &'a Database,
    fetcher: &'a dyn PageFetcher,
    normalizer: &'a dyn Normalizer,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        db: &'a Database,
        fetcher: &'a dyn PageFetcher,
        normalizer: &'a dyn Normalizer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            db,
            fetcher,
            normalizer,
            options,
        }
    }

    /// Fetches, normalizes and scores one posting without storing it.
    pub fn process(&self, url: &str) -> Result<JobPosting, JobBoardError> {
        let html = self.fetcher.fetch(url)?;
        let text = visible_text(&html);
        if text.trim().is_empty() {
            return Err(JobBoardError::Fetch {
                url: url.to_string(),
                reason: "page has no visible text".to_string(),
                status: None,
            });
        }

        let extracted = self.normalizer.normalize(url, &text)?;
        let mut job = extracted.into_posting(url, chrono::Utc::now().to_rfc3339());

        let description = job.description.clone().unwrap_or_else(|| text.clone());

        if !self.options.keywords.is_empty() {
            let matched = self.options.keywords.matches(&description);
            job.keyword_score = Some(matched.len() as i64);
            job.matched_keywords = Some(matched.join(", "));
        }

        if let Some(resume) = &self.options.resume {
            job.resume_score = Some(self.normalizer.score(url, &description, resume)?);
        }

        Ok(job)
    }

    /// Runs every bookmark through the pipeline. Per-posting failures are
    /// recorded and skipped; store and credential errors abort the run.
    pub fn run(
        &self,
        bookmarks: impl IntoIterator<Item = Bookmark>,
        failures: &mut FailureLog,
        progress: &ProgressBar,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for bookmark in bookmarks {
            let url = bookmark.url.as_str();
            progress.set_message(bookmark.title.clone());
            debug!(url, folder = %bookmark.folder, "Processing bookmark");

            if self.db.job_status(url)? == Some(PostingStatus::Normalized) {
                debug!(url, "Already normalized, skipping");
                report.skipped += 1;
                progress.inc(1);
                continue;
            }

            if self.options.skip_failed && failures.contains(url) {
                debug!(url, "Failed in an earlier run, skipping");
                report.skipped += 1;
                progress.inc(1);
                continue;
            }

            match self.process(url) {
                Ok(job) => {
                    self.db.upsert_job(&job)?;
                    failures.clear(url);
                    info!(url, title = %job.title, score = ?job.resume_score, "Stored posting");
                    report.stored.push(bookmark.url);
                }
                Err(err) if err.is_per_posting() => {
                    warn!(url, kind = err.kind(), error = %err, "Skipping posting");
                    failures.record(url, &err.to_string());
                    report.failures.push((bookmark.url, err));
                }
                Err(err) => return Err(err.into()),
            }
            progress.inc(1);
        }

        Ok(report)
    }
}
