use anyhow::{anyhow, Context, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::models::{Application, ApplicationStatus, JobPosting, PostingStatus};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        location TEXT,
        employment_type TEXT,
        remote INTEGER,
        salary_min TEXT,
        salary_max TEXT,
        description TEXT,
        requirements TEXT,
        responsibilities TEXT,
        post_date TEXT,
        keyword_score INTEGER,
        matched_keywords TEXT,
        resume_score INTEGER,
        status TEXT NOT NULL DEFAULT 'normalized' CHECK (status IN ('raw', 'normalized')),
        parsed_at TEXT NOT NULL,
        notes TEXT
    );

    CREATE TABLE IF NOT EXISTS applications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        job_url TEXT NOT NULL,
        application_date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'applied' CHECK (status IN ('applied', 'interviewing', 'rejected', 'offer')),
        notes TEXT,
        resume_path TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX IF NOT EXISTS idx_jobs_score ON jobs(resume_score);
    CREATE INDEX IF NOT EXISTS idx_applications_url ON applications(job_url);
"#;

const JOB_COLUMNS: &str = "id, url, title, company, location, employment_type, remote, \
    salary_min, salary_max, description, requirements, responsibilities, post_date, \
    keyword_score, matched_keywords, resume_score, status, parsed_at, notes";

const APPLICATION_COLUMNS: &str =
    "id, job_url, application_date, status, notes, resume_path, created_at";

// --- Query options ---

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Case-insensitive substring of title, company or location.
    pub text: Option<String>,
    pub company: Option<String>,
    pub min_score: Option<i64>,
    pub status: Option<PostingStatus>,
}

// salary_min with currency marks, separators and spaces removed
macro_rules! salary_digits {
    () => {
        "REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(\
         UPPER(salary_min), '$', ''), ',', ''), ' ', ''), 'USD', ''), 'EUR', ''), 'GBP', ''), '€', ''), '£', '')"
    };
}

/// Best-effort numeric value of the free-text `salary_min`: "$120k" and
/// "USD 120,000" both read as 120000. Text without a leading number
/// ("Competitive") is NULL. Ranges read as their lower bound.
const SALARY_MIN_AMOUNT: &str = concat!(
    "(CASE WHEN ",
    salary_digits!(),
    " NOT GLOB '[0-9]*' THEN NULL WHEN ",
    salary_digits!(),
    " LIKE '%K%' THEN CAST(REPLACE(",
    salary_digits!(),
    ", 'K', '') AS REAL) * 1000 ELSE CAST(",
    salary_digits!(),
    " AS REAL) END)"
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobSortField {
    #[default]
    Score,
    Title,
    Company,
    ParsedAt,
    Salary,
}

impl JobSortField {
    pub const ALL: [JobSortField; 5] = [
        JobSortField::Score,
        JobSortField::Title,
        JobSortField::Company,
        JobSortField::ParsedAt,
        JobSortField::Salary,
    ];

    fn column(&self) -> &'static str {
        match self {
            Self::Score => "resume_score",
            Self::Title => "LOWER(title)",
            Self::Company => "LOWER(company)",
            Self::ParsedAt => "parsed_at",
            Self::Salary => SALARY_MIN_AMOUNT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::Title => "title",
            Self::Company => "company",
            Self::ParsedAt => "parsed",
            Self::Salary => "salary",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for JobSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for JobSortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "score" | "resume_score" => Ok(Self::Score),
            "title" => Ok(Self::Title),
            "company" => Ok(Self::Company),
            "parsed" | "parsed_at" | "date" => Ok(Self::ParsedAt),
            "salary" => Ok(Self::Salary),
            other => Err(anyhow!(
                "Unknown sort field '{}'. Available: score, title, company, parsed, salary",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSort {
    pub field: JobSortField,
    pub descending: bool,
}

impl Default for JobSort {
    fn default() -> Self {
        Self {
            field: JobSortField::Score,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    /// Case-insensitive substring of the job URL.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplicationSortField {
    #[default]
    Date,
    Status,
    Url,
}

impl ApplicationSortField {
    pub const ALL: [ApplicationSortField; 3] = [
        ApplicationSortField::Date,
        ApplicationSortField::Status,
        ApplicationSortField::Url,
    ];

    fn column(&self) -> &'static str {
        match self {
            Self::Date => "application_date",
            Self::Status => "status",
            Self::Url => "LOWER(job_url)",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Status => "status",
            Self::Url => "url",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ApplicationSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationSortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" | "application_date" => Ok(Self::Date),
            "status" => Ok(Self::Status),
            "url" | "job_url" => Ok(Self::Url),
            other => Err(anyhow!("Unknown sort field '{}'. Available: date, status, url", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationSort {
    pub field: ApplicationSortField,
    pub descending: bool,
}

impl Default for ApplicationSort {
    fn default() -> Self {
        Self {
            field: ApplicationSortField::Date,
            descending: true,
        }
    }
}

fn direction(descending: bool) -> &'static str {
    if descending { "DESC" } else { "ASC" }
}

// --- Store ---

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens (creating if needed) the store at `path` and ensures the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.init()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to create database schema")?;
        Ok(())
    }

    /// Drops both tables and recreates them empty.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS jobs;
             DROP TABLE IF EXISTS applications;",
        )?;
        self.init()
    }

    // --- Job operations ---

    /// Inserts the posting, or overwrites the row with the same URL.
    pub fn upsert_job(&self, job: &JobPosting) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO jobs (url, title, company, location, employment_type, remote,
                    salary_min, salary_max, description, requirements, responsibilities,
                    post_date, keyword_score, matched_keywords, resume_score, status,
                    parsed_at, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                 ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    company = excluded.company,
                    location = excluded.location,
                    employment_type = excluded.employment_type,
                    remote = excluded.remote,
                    salary_min = excluded.salary_min,
                    salary_max = excluded.salary_max,
                    description = excluded.description,
                    requirements = excluded.requirements,
                    responsibilities = excluded.responsibilities,
                    post_date = excluded.post_date,
                    keyword_score = excluded.keyword_score,
                    matched_keywords = excluded.matched_keywords,
                    resume_score = excluded.resume_score,
                    status = excluded.status,
                    parsed_at = excluded.parsed_at,
                    notes = COALESCE(excluded.notes, jobs.notes)",
                params![
                    job.url,
                    job.title,
                    job.company,
                    job.location,
                    job.employment_type,
                    job.remote,
                    job.salary_min,
                    job.salary_max,
                    job.description,
                    job.requirements,
                    job.responsibilities,
                    job.post_date,
                    job.keyword_score,
                    job.matched_keywords,
                    job.resume_score,
                    job.status,
                    job.parsed_at,
                    job.notes,
                ],
            )
            .with_context(|| format!("Failed to store job {}", job.url))?;

        let id = self
            .conn
            .query_row("SELECT id FROM jobs WHERE url = ?1", [&job.url], |row| row.get(0))?;
        Ok(id)
    }

    pub fn get_jobs(&self, filter: &JobFilter, sort: &JobSort) -> Result<Vec<JobPosting>> {
        let mut sql = format!("SELECT {} FROM jobs WHERE 1=1", JOB_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(text) = filter.text.as_deref().filter(|t| !t.trim().is_empty()) {
            values.push(Value::Text(format!("%{}%", text.trim().to_lowercase())));
            let n = values.len();
            sql.push_str(&format!(
                " AND (LOWER(title) LIKE ?{n} OR LOWER(company) LIKE ?{n} OR LOWER(COALESCE(location, '')) LIKE ?{n})"
            ));
        }

        if let Some(company) = &filter.company {
            values.push(Value::Text(company.clone()));
            sql.push_str(&format!(" AND LOWER(company) = LOWER(?{})", values.len()));
        }

        if let Some(min) = filter.min_score {
            values.push(Value::Integer(min));
            sql.push_str(&format!(" AND resume_score >= ?{}", values.len()));
        }

        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }

        sql.push_str(&format!(
            " ORDER BY {} {}, id ASC",
            sort.field.column(),
            direction(sort.descending)
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::row_to_job)?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list jobs")
    }

    pub fn get_job_by_url(&self, url: &str) -> Result<Option<JobPosting>> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM jobs WHERE url = ?1", JOB_COLUMNS),
            [url],
            Self::row_to_job,
        );
        match result {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn job_status(&self, url: &str) -> Result<Option<PostingStatus>> {
        let result = self.conn.query_row(
            "SELECT status FROM jobs WHERE url = ?1",
            [url],
            |row| row.get::<_, PostingStatus>(0),
        );
        match result {
            Ok(status) => Ok(Some(status)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn job_exists(&self, url: &str) -> Result<bool> {
        Ok(self.job_status(url)?.is_some())
    }

    /// Marks one posting (or all when `url` is `None`) for re-parsing.
    pub fn mark_for_reparse(&self, url: Option<&str>) -> Result<usize> {
        let changed = match url {
            Some(url) => self.conn.execute(
                "UPDATE jobs SET status = 'raw' WHERE url = ?1",
                [url],
            )?,
            None => self.conn.execute("UPDATE jobs SET status = 'raw'", [])?,
        };
        Ok(changed)
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<JobPosting> {
        Ok(JobPosting {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            company: row.get(3)?,
            location: row.get(4)?,
            employment_type: row.get(5)?,
            remote: row.get(6)?,
            salary_min: row.get(7)?,
            salary_max: row.get(8)?,
            description: row.get(9)?,
            requirements: row.get(10)?,
            responsibilities: row.get(11)?,
            post_date: row.get(12)?,
            keyword_score: row.get(13)?,
            matched_keywords: row.get(14)?,
            resume_score: row.get(15)?,
            status: row.get(16)?,
            parsed_at: row.get(17)?,
            notes: row.get(18)?,
        })
    }

    // --- Application operations ---

    pub fn add_application(&self, app: &Application) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO applications (job_url, application_date, status, notes, resume_path)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    app.job_url,
                    app.application_date,
                    app.status,
                    app.notes,
                    app.resume_path,
                ],
            )
            .context("Failed to add application")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_applications(
        &self,
        filter: &ApplicationFilter,
        sort: &ApplicationSort,
    ) -> Result<Vec<Application>> {
        let mut sql = format!("SELECT {} FROM applications WHERE 1=1", APPLICATION_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }

        if let Some(url) = filter.url.as_deref().filter(|u| !u.trim().is_empty()) {
            values.push(Value::Text(format!("%{}%", url.trim().to_lowercase())));
            sql.push_str(&format!(" AND LOWER(job_url) LIKE ?{}", values.len()));
        }

        sql.push_str(&format!(
            " ORDER BY {} {}, id ASC",
            sort.field.column(),
            direction(sort.descending)
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::row_to_application)?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list applications")
    }

    pub fn update_application_status(&self, id: i64, status: ApplicationStatus) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE applications SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        if changed == 0 {
            return Err(anyhow!("Application #{} not found", id));
        }
        Ok(())
    }

    fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<Application> {
        Ok(Application {
            id: row.get(0)?,
            job_url: row.get(1)?,
            application_date: row.get(2)?,
            status: row.get(3)?,
            notes: row.get(4)?,
            resume_path: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

// --- Column conversions ---

impl ToSql for PostingStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PostingStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

impl ToSql for ApplicationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ApplicationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_job(url: &str, title: &str, score: Option<i64>) -> JobPosting {
        JobPosting {
            id: None,
            url: url.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: Some("Remote".to_string()),
            employment_type: Some("full-time".to_string()),
            remote: Some(true),
            salary_min: Some("$100,000".to_string()),
            salary_max: Some("$140,000".to_string()),
            description: Some("Build things".to_string()),
            requirements: Some("Rust, SQL".to_string()),
            responsibilities: None,
            post_date: None,
            keyword_score: Some(1),
            matched_keywords: Some("rust".to_string()),
            resume_score: score,
            status: PostingStatus::Normalized,
            parsed_at: "2026-01-01T00:00:00+00:00".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_upsert_same_url_keeps_one_row_with_latest_values() {
        let db = Database::open_in_memory().unwrap();
        let first = db.upsert_job(&sample_job("https://jobs.example/1", "Engineer", Some(4))).unwrap();

        let mut updated = sample_job("https://jobs.example/1", "Senior Engineer", Some(8));
        updated.company = "Globex".to_string();
        let second = db.upsert_job(&updated).unwrap();

        assert_eq!(first, second);
        let jobs = db.get_jobs(&JobFilter::default(), &JobSort::default()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Senior Engineer");
        assert_eq!(jobs[0].company, "Globex");
        assert_eq!(jobs[0].resume_score, Some(8));
    }

    #[test]
    fn test_get_jobs_sorts_and_filters() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_job(&sample_job("https://jobs.example/a", "Backend Engineer", Some(3))).unwrap();
        db.upsert_job(&sample_job("https://jobs.example/b", "Data Scientist", Some(9))).unwrap();
        db.upsert_job(&sample_job("https://jobs.example/c", "Analyst", None)).unwrap();

        let by_score = db.get_jobs(&JobFilter::default(), &JobSort::default()).unwrap();
        let titles: Vec<&str> = by_score.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["Data Scientist", "Backend Engineer", "Analyst"]);

        let by_title = db
            .get_jobs(
                &JobFilter::default(),
                &JobSort { field: JobSortField::Title, descending: false },
            )
            .unwrap();
        assert_eq!(by_title[0].title, "Analyst");

        let filtered = db
            .get_jobs(
                &JobFilter { text: Some("ENGINEER".to_string()), ..Default::default() },
                &JobSort::default(),
            )
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].url, "https://jobs.example/a");

        let strong = db
            .get_jobs(
                &JobFilter { min_score: Some(5), ..Default::default() },
                &JobSort::default(),
            )
            .unwrap();
        assert_eq!(strong.len(), 1);
        assert_eq!(strong[0].title, "Data Scientist");
    }

    #[test]
    fn test_salary_sort_reads_common_formats() {
        let db = Database::open_in_memory().unwrap();
        for (url, salary) in [
            ("https://jobs.example/a", "$95,000"),
            ("https://jobs.example/b", "$120k"),
            ("https://jobs.example/c", "Competitive"),
            ("https://jobs.example/d", "USD 100000"),
            ("https://jobs.example/e", "$110K - $130K"),
        ] {
            let job = JobPosting {
                salary_min: Some(salary.to_string()),
                ..sample_job(url, salary, Some(5))
            };
            db.upsert_job(&job).unwrap();
        }

        let jobs = db
            .get_jobs(
                &JobFilter::default(),
                &JobSort { field: JobSortField::Salary, descending: true },
            )
            .unwrap();
        let order: Vec<&str> = jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(order, vec!["$120k", "$110K - $130K", "USD 100000", "$95,000", "Competitive"]);
    }

    #[test]
    fn test_mark_for_reparse() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_job(&sample_job("https://jobs.example/a", "A", Some(3))).unwrap();
        db.upsert_job(&sample_job("https://jobs.example/b", "B", Some(3))).unwrap();

        assert_eq!(db.mark_for_reparse(Some("https://jobs.example/a")).unwrap(), 1);
        assert_eq!(db.job_status("https://jobs.example/a").unwrap(), Some(PostingStatus::Raw));
        assert_eq!(db.job_status("https://jobs.example/b").unwrap(), Some(PostingStatus::Normalized));
        assert_eq!(db.job_status("https://jobs.example/missing").unwrap(), None);

        assert_eq!(db.mark_for_reparse(None).unwrap(), 2);
        let raw = db
            .get_jobs(
                &JobFilter { status: Some(PostingStatus::Raw), ..Default::default() },
                &JobSort::default(),
            )
            .unwrap();
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_application_for_untracked_url_is_accepted() {
        let db = Database::open_in_memory().unwrap();
        let mut app = Application::new("Recruiter email from Initech", ApplicationStatus::Applied);
        app.notes = Some("no posting link".to_string());

        let id = db.add_application(&app).unwrap();
        let apps = db
            .get_applications(&ApplicationFilter::default(), &ApplicationSort::default())
            .unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].id, Some(id));
        assert_eq!(apps[0].job_url, "Recruiter email from Initech");
        assert!(apps[0].created_at.is_some());
    }

    #[test]
    fn test_update_application_status_and_filter() {
        let db = Database::open_in_memory().unwrap();
        let first = db
            .add_application(&Application::new("https://jobs.example/a", ApplicationStatus::Applied))
            .unwrap();
        db.add_application(&Application::new("https://jobs.example/b", ApplicationStatus::Applied))
            .unwrap();

        db.update_application_status(first, ApplicationStatus::Interviewing).unwrap();
        assert!(db.update_application_status(999, ApplicationStatus::Offer).is_err());

        let interviewing = db
            .get_applications(
                &ApplicationFilter {
                    status: Some(ApplicationStatus::Interviewing),
                    ..Default::default()
                },
                &ApplicationSort::default(),
            )
            .unwrap();
        assert_eq!(interviewing.len(), 1);
        assert_eq!(interviewing[0].job_url, "https://jobs.example/a");
    }

    #[test]
    fn test_reset_empties_both_tables() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_job(&sample_job("https://jobs.example/a", "A", Some(3))).unwrap();
        db.add_application(&Application::new("https://jobs.example/a", ApplicationStatus::Offer))
            .unwrap();

        db.reset().unwrap();

        assert!(db.get_jobs(&JobFilter::default(), &JobSort::default()).unwrap().is_empty());
        assert!(db
            .get_applications(&ApplicationFilter::default(), &ApplicationSort::default())
            .unwrap()
            .is_empty());

        // still usable after reset
        db.upsert_job(&sample_job("https://jobs.example/b", "B", None)).unwrap();
        assert!(db.job_exists("https://jobs.example/b").unwrap());
    }

    #[test]
    fn test_open_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jobs.db");
        {
            let db = Database::open(&path).unwrap();
            db.upsert_job(&sample_job("https://jobs.example/a", "A", Some(1))).unwrap();
        }
        let reopened = Database::open(&path).unwrap();
        assert!(reopened.job_exists("https://jobs.example/a").unwrap());
        assert_eq!(reopened.path(), &path);
    }
}
