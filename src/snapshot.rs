use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::db::{ApplicationFilter, ApplicationSort, Database, JobFilter, JobSort};

const JOB_HEADERS: [&str; 19] = [
    "id",
    "url",
    "title",
    "company",
    "location",
    "employment_type",
    "remote",
    "salary_min",
    "salary_max",
    "description",
    "requirements",
    "responsibilities",
    "post_date",
    "keyword_score",
    "matched_keywords",
    "resume_score",
    "status",
    "parsed_at",
    "notes",
];

const APPLICATION_HEADERS: [&str; 7] = [
    "id",
    "job_url",
    "application_date",
    "status",
    "notes",
    "resume_path",
    "created_at",
];

fn create_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create snapshot file: {}", path.display()))
}

/// Writes every job row to `path`. Returns the number of data rows.
pub fn write_jobs_snapshot(db: &Database, path: &Path) -> Result<usize> {
    let jobs = db.get_jobs(&JobFilter::default(), &JobSort::default())?;
    let mut writer = create_writer(path)?;

    writer.write_record(JOB_HEADERS)?;
    for job in &jobs {
        writer.serialize(job)?;
    }
    writer.flush()?;

    info!(rows = jobs.len(), path = %path.display(), "Wrote jobs snapshot");
    Ok(jobs.len())
}

/// Writes every application row to `path`. Returns the number of data rows.
pub fn write_applications_snapshot(db: &Database, path: &Path) -> Result<usize> {
    let apps = db.get_applications(&ApplicationFilter::default(), &ApplicationSort::default())?;
    let mut writer = create_writer(path)?;

    writer.write_record(APPLICATION_HEADERS)?;
    for app in &apps {
        writer.serialize(app)?;
    }
    writer.flush()?;

    info!(rows = apps.len(), path = %path.display(), "Wrote applications snapshot");
    Ok(apps.len())
}
