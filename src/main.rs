mod ai;
mod bookmarks;
mod config;
mod db;
mod error;
mod failures;
mod fetch;
mod keywords;
mod models;
mod pipeline;
mod prompt;
mod snapshot;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

use bookmarks::{Bookmark, BookmarkTree};
use config::Config;
use db::{
    ApplicationFilter, ApplicationSort, ApplicationSortField, Database, JobFilter, JobSort,
    JobSortField,
};
use failures::FailureLog;
use fetch::{FallbackFetcher, HttpFetcher, PageFetcher, WebDriverFetcher};
use keywords::KeywordSet;
use models::{ApplicationStatus, PostingStatus};
use pipeline::{Pipeline, PipelineOptions};

#[derive(Parser)]
#[command(name = "job-board")]
#[command(about = "Collect bookmarked job postings, normalize them with an LLM, and track applications")]
#[command(version)]
struct Cli {
    /// Config file (default: ./config.yaml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse bookmarked postings and store them
    #[command(name = "generate_jobs")]
    GenerateJobs {
        /// Skip URLs that failed in an earlier run
        #[arg(long)]
        skip_failed: bool,

        /// Bookmarks file (overrides bookmark_path)
        #[arg(long)]
        bookmarks: Option<PathBuf>,

        /// Bookmark folder, e.g. "Job-searching/Jobs"
        #[arg(long)]
        folder: Option<String>,

        /// Model id or alias (overrides llm_model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Export all jobs to CSV
    #[command(name = "jobs_snapshot")]
    JobsSnapshot {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export all applications to CSV
    #[command(name = "applications_snapshot")]
    ApplicationsSnapshot {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a job application (prompts for anything not given)
    #[command(name = "add_job_application")]
    AddJobApplication {
        /// Posting URL, or free text for untracked postings
        #[arg(long)]
        url: Option<String>,

        /// applied, interviewing, rejected or offer
        #[arg(short, long)]
        status: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// Application date, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Resume file that was sent
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Delete all jobs and applications
    #[command(name = "reset_db")]
    ResetDb {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Browse jobs and applications in the terminal
    Dashboard,

    /// List jobs
    Jobs {
        /// Text to match in title, company or location
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(short, long)]
        company: Option<String>,

        /// Minimum fit score
        #[arg(long)]
        min_score: Option<i64>,

        /// Only postings queued for re-parsing
        #[arg(long)]
        raw: bool,

        /// score, title, company, parsed or salary
        #[arg(long, default_value = "score")]
        sort: String,

        /// Ascending order
        #[arg(long)]
        asc: bool,
    },

    /// List applications
    Applications {
        #[arg(short, long)]
        status: Option<String>,

        /// Text to match in the job URL
        #[arg(short, long)]
        filter: Option<String>,

        /// date, status or url
        #[arg(long, default_value = "date")]
        sort: String,

        /// Ascending order
        #[arg(long)]
        asc: bool,
    },

    /// Change an application's status
    #[command(name = "update_application")]
    UpdateApplication {
        id: i64,
        /// applied, interviewing, rejected or offer
        status: String,
    },

    /// Queue stored postings to be parsed and scored again
    Reparse {
        #[arg(long, required_unless_present = "all")]
        url: Option<String>,

        #[arg(long, conflicts_with = "url")]
        all: bool,
    },
}

fn init_logging(verbose: bool, dashboard: bool) {
    // the dashboard owns the terminal
    let log_level = match (dashboard, verbose) {
        (true, _) => "off",
        (false, true) => "debug",
        (false, false) => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::Dashboard));

    let (config, config_path) = Config::discover(cli.config.as_deref())?;
    match &config_path {
        Some(path) => debug!(path = %path.display(), "Loaded config"),
        None => debug!("Using default config"),
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let db = Database::open(&db_path)?;
    debug!(path = %db.path().display(), "Opened database");

    match cli.command {
        Commands::GenerateJobs {
            skip_failed,
            bookmarks,
            folder,
            model,
        } => {
            generate_jobs(&db, &config, skip_failed, bookmarks, folder, model)?;
        }

        Commands::JobsSnapshot { output } => {
            let path = output.unwrap_or_else(|| config.jobs_snapshot_path());
            let rows = snapshot::write_jobs_snapshot(&db, &path)?;
            println!("Wrote {} job(s) to {}", rows, path.display());
        }

        Commands::ApplicationsSnapshot { output } => {
            let path = output.unwrap_or_else(|| config.applications_snapshot_path());
            let rows = snapshot::write_applications_snapshot(&db, &path)?;
            println!("Wrote {} application(s) to {}", rows, path.display());
        }

        Commands::AddJobApplication {
            url,
            status,
            notes,
            date,
            resume,
        } => {
            let status = status.map(|s| s.parse::<ApplicationStatus>()).transpose()?;
            let known_urls: Vec<String> = db
                .get_jobs(&JobFilter::default(), &JobSort::default())?
                .into_iter()
                .map(|job| job.url)
                .collect();

            let args = prompt::ApplicationArgs {
                url,
                status,
                notes,
                date,
                resume,
            };
            let app = prompt::complete_application(
                &mut io::stdin().lock(),
                &mut io::stdout(),
                args,
                &known_urls,
            )?;
            let id = db.add_application(&app)?;
            println!(
                "Added application #{} ({}, {}) for {}",
                id, app.status, app.application_date, app.job_url
            );
            if let Some(job) = db.get_job_by_url(&app.job_url)? {
                println!("  {} at {}", job.title, job.company);
            }
        }

        Commands::ResetDb { yes } => {
            if !yes {
                let question = format!("Delete all jobs and applications in {}?", db.path().display());
                if !prompt::confirm(&mut io::stdin().lock(), &mut io::stdout(), &question)? {
                    println!("Aborted.");
                    return Ok(());
                }
            }
            db.reset()?;
            println!("Database reset at {}", db.path().display());
        }

        Commands::Dashboard => {
            tui::run_dashboard(&db)?;
        }

        Commands::Jobs {
            filter,
            company,
            min_score,
            raw,
            sort,
            asc,
        } => {
            let filter = JobFilter {
                text: filter,
                company,
                min_score,
                status: raw.then_some(PostingStatus::Raw),
            };
            let sort = JobSort {
                field: sort.parse::<JobSortField>()?,
                descending: !asc,
            };
            let jobs = db.get_jobs(&filter, &sort)?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<6} {:>5} {:<30} {:<20} {:<16} {:<20}",
                    "ID", "SCORE", "TITLE", "COMPANY", "LOCATION", "SALARY"
                );
                println!("{}", "-".repeat(102));
                for job in jobs {
                    println!(
                        "{:<6} {:>5} {:<30} {:<20} {:<16} {:<20}",
                        job.id.unwrap_or_default(),
                        job.resume_score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                        truncate(&job.title, 28),
                        truncate(&job.company, 18),
                        truncate(job.location.as_deref().unwrap_or("-"), 14),
                        truncate(&job.salary_range().unwrap_or_else(|| "-".to_string()), 20)
                    );
                }
            }
        }

        Commands::Applications {
            status,
            filter,
            sort,
            asc,
        } => {
            let filter = ApplicationFilter {
                status: status.map(|s| s.parse::<ApplicationStatus>()).transpose()?,
                url: filter,
            };
            let sort = ApplicationSort {
                field: sort.parse::<ApplicationSortField>()?,
                descending: !asc,
            };
            let apps = db.get_applications(&filter, &sort)?;
            if apps.is_empty() {
                println!("No applications found.");
            } else {
                println!("{:<6} {:<12} {:<14} {:<44} {:<20}", "ID", "DATE", "STATUS", "JOB", "NOTES");
                println!("{}", "-".repeat(100));
                for app in apps {
                    println!(
                        "{:<6} {:<12} {:<14} {:<44} {:<20}",
                        app.id.unwrap_or_default(),
                        app.application_date,
                        app.status,
                        truncate(&app.job_url, 42),
                        truncate(app.notes.as_deref().unwrap_or(""), 20)
                    );
                }
            }
        }

        Commands::UpdateApplication { id, status } => {
            let status = status.parse::<ApplicationStatus>()?;
            db.update_application_status(id, status)?;
            println!("Application #{} is now {}.", id, status);
        }

        Commands::Reparse { url, all } => {
            if let Some(url) = url.as_deref().filter(|_| !all) {
                if !db.job_exists(url)? {
                    println!("No job with URL {}", url);
                    let known: Vec<String> = db
                        .get_jobs(&JobFilter::default(), &JobSort::default())?
                        .into_iter()
                        .map(|job| job.url)
                        .collect();
                    for hint in prompt::similar_urls(url, &known, 3) {
                        println!("  did you mean {}?", hint);
                    }
                    return Ok(());
                }
            }
            let changed = if all {
                db.mark_for_reparse(None)?
            } else {
                db.mark_for_reparse(url.as_deref())?
            };
            if changed == 0 {
                println!("No matching jobs.");
            } else {
                println!("Marked {} job(s) for re-parsing. Run generate_jobs to refresh them.", changed);
            }
        }
    }

    Ok(())
}

fn generate_jobs(
    db: &Database,
    config: &Config,
    skip_failed: bool,
    bookmarks: Option<PathBuf>,
    folder: Option<String>,
    model: Option<String>,
) -> Result<()> {
    // credentials are checked before anything is fetched
    let model = model.unwrap_or_else(|| config.llm_model.clone());
    let spec = ai::resolve_model(&model)?;
    let provider = ai::create_provider(&spec)?;
    info!(model = %spec.model_id, "Using model");

    let bookmark_path = match bookmarks {
        Some(path) => path,
        None => config.require_bookmark_path()?.to_path_buf(),
    };
    let folder = folder.unwrap_or_else(|| config.jobs_bookmark_folder.clone());

    let tree = BookmarkTree::load(&bookmark_path)?;
    let links: Vec<Bookmark> = tree.links(&folder, config.recursive)?.collect();
    info!(folder = %folder, count = links.len(), "Found bookmarks");

    let resume = config
        .resume_fn
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read resume: {}", path.display()))
        })
        .transpose()?;
    if resume.is_none() {
        info!("No resume_fn configured, postings will not be scored");
    }

    let keywords = match &config.keyword_fn {
        Some(path) => KeywordSet::load(path)?,
        None => KeywordSet::default(),
    };
    if !keywords.is_empty() {
        info!(count = keywords.len(), "Loaded keywords");
    }

    let normalizer = ai::LlmNormalizer::new(provider).with_examples(&config.scored_examples);
    let fallback = config
        .webdriver_url
        .as_ref()
        .map(|url| Box::new(WebDriverFetcher::new(url.clone())) as Box<dyn PageFetcher>);
    let fetcher = FallbackFetcher::new(Box::new(HttpFetcher::new()?), fallback);

    let mut failures = FailureLog::load(&config.failures_path())?;
    if skip_failed && !failures.is_empty() {
        info!(count = failures.len(), "Skipping URLs that failed in earlier runs");
    }

    let total = links.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let pipeline = Pipeline::new(
        db,
        &fetcher,
        &normalizer,
        PipelineOptions {
            resume,
            keywords,
            skip_failed,
        },
    );
    let result = pipeline.run(links, &mut failures, &pb);
    pb.finish_and_clear();
    failures.save()?;
    let report = result?;

    println!("\nResults:");
    println!("  Bookmarks found: {}", total);
    println!("  Stored:          {}", report.stored.len());
    println!("  Skipped:         {}", report.skipped);
    if !report.failures.is_empty() {
        println!("  Failed:          {}", report.failures.len());
        for (_, err) in &report.failures {
            println!("    [{}] {}", err.kind(), err);
        }
        println!("\nFailures were written to {}", config.failures_path().display());
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommands_use_snake_case() {
        let cli = Cli::try_parse_from(["job-board", "generate_jobs", "--skip-failed"]).unwrap();
        assert!(matches!(cli.command, Commands::GenerateJobs { skip_failed: true, .. }));

        let cli = Cli::try_parse_from(["job-board", "reset_db", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::ResetDb { yes: true }));

        let cli = Cli::try_parse_from(["job-board", "--db", "/tmp/x.db", "jobs_snapshot"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_reparse_needs_url_or_all() {
        assert!(Cli::try_parse_from(["job-board", "reparse"]).is_err());
        assert!(Cli::try_parse_from(["job-board", "reparse", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["job-board", "reparse", "--all", "--url", "u"]).is_err());
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Ingénieur logiciel senior", 10), "Ingénie...");
    }
}
