//! Line-based prompts for commands that ask before acting.

use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};

use crate::models::{parse_application_date, Application, ApplicationStatus};

/// Values given on the command line; missing ones are asked for.
#[derive(Debug, Clone, Default)]
pub struct ApplicationArgs {
    pub url: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub notes: Option<String>,
    pub date: Option<String>,
    pub resume: Option<String>,
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<String> {
    write!(out, "{}", question)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("Input closed before '{}' was answered", question.trim()));
    }
    Ok(line.trim().to_string())
}

/// Asks a yes/no question; anything but `y`/`yes` is no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    let answer = ask(input, out, &format!("{} (y/N) ", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Tracked URLs that look like `url`, best match first.
pub fn similar_urls<'a>(url: &str, known: &'a [String], limit: usize) -> Vec<&'a str> {
    let needle = url.trim().to_lowercase();
    let mut scored: Vec<(f64, &str)> = known
        .iter()
        .map(|k| (strsim::normalized_levenshtein(&needle, &k.to_lowercase()), k.as_str()))
        .filter(|(score, _)| *score >= 0.6)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, k)| k).collect()
}

/// Builds an application from `args`, prompting for whatever is missing.
/// A URL that matches no tracked posting is kept as free text after
/// printing the closest tracked URLs as a hint.
pub fn complete_application<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    args: ApplicationArgs,
    known_urls: &[String],
) -> Result<Application> {
    let url = match args.url.filter(|u| !u.trim().is_empty()) {
        Some(url) => url.trim().to_string(),
        None => loop {
            let answer = ask(input, out, "Job URL (or description): ")?;
            if !answer.is_empty() {
                break answer;
            }
        },
    };

    if !known_urls.iter().any(|k| k == &url) {
        writeln!(out, "Note: '{}' is not a tracked posting; saving it as free text.", url)?;
        let hints = similar_urls(&url, known_urls, 3);
        if !hints.is_empty() {
            writeln!(out, "Did you mean:")?;
            for hint in hints {
                writeln!(out, "  {}", hint)?;
            }
        }
    }

    let status = match args.status {
        Some(status) => status,
        None => loop {
            let answer = ask(input, out, "Status [applied/interviewing/rejected/offer] (applied): ")?;
            if answer.is_empty() {
                break ApplicationStatus::default();
            }
            match answer.parse() {
                Ok(status) => break status,
                Err(e) => writeln!(out, "{}", e)?,
            }
        },
    };

    let mut app = Application::new(url, status);

    match args.date {
        Some(date) => app.application_date = parse_application_date(&date)?,
        None => loop {
            let question = format!("Application date YYYY-MM-DD ({}): ", app.application_date);
            let answer = ask(input, out, &question)?;
            if answer.is_empty() {
                break;
            }
            match parse_application_date(&answer) {
                Ok(date) => {
                    app.application_date = date;
                    break;
                }
                Err(e) => writeln!(out, "{}", e)?,
            }
        },
    }

    app.notes = match args.notes {
        Some(notes) => Some(notes),
        None => Some(ask(input, out, "Notes (optional): ")?),
    }
    .filter(|n| !n.trim().is_empty());

    app.resume_path = match args.resume {
        Some(resume) => Some(resume),
        None => Some(ask(input, out, "Resume used (optional path): ")?),
    }
    .filter(|r| !r.trim().is_empty());

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn known() -> Vec<String> {
        vec![
            "https://jobs.example/rust-engineer".to_string(),
            "https://jobs.example/data-engineer".to_string(),
            "https://other.example/careers/42".to_string(),
        ]
    }

    #[test]
    fn test_all_args_given_needs_no_input() {
        let mut input = Cursor::new("");
        let mut out = Vec::new();
        let app = complete_application(
            &mut input,
            &mut out,
            ApplicationArgs {
                url: Some("https://jobs.example/rust-engineer".to_string()),
                status: Some(ApplicationStatus::Interviewing),
                notes: Some("phone screen".to_string()),
                date: Some("2026-04-01".to_string()),
                resume: Some(String::new()),
            },
            &known(),
        )
        .unwrap();

        assert_eq!(app.job_url, "https://jobs.example/rust-engineer");
        assert_eq!(app.status, ApplicationStatus::Interviewing);
        assert_eq!(app.application_date, "2026-04-01");
        assert_eq!(app.notes.as_deref(), Some("phone screen"));
        assert_eq!(app.resume_path, None);
        assert!(out.is_empty());
    }

    #[test]
    fn test_prompts_fill_missing_values_and_retry_bad_status() {
        let mut input = Cursor::new("\nhttps://jobs.example/rust-engineer\nghosted\noffer\n2026-13-01\n2026-05-02\n\nresume.pdf\n");
        let mut out = Vec::new();
        let app = complete_application(&mut input, &mut out, ApplicationArgs::default(), &known()).unwrap();

        assert_eq!(app.status, ApplicationStatus::Offer);
        assert_eq!(app.application_date, "2026-05-02");
        assert_eq!(app.notes, None);
        assert_eq!(app.resume_path.as_deref(), Some("resume.pdf"));

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Unknown application status 'ghosted'"));
        assert!(printed.contains("Invalid date"));
        assert!(!printed.contains("not a tracked posting"));
    }

    #[test]
    fn test_untracked_url_is_kept_with_hints() {
        let mut input = Cursor::new("\n\n\n\n");
        let mut out = Vec::new();
        let args = ApplicationArgs {
            url: Some("https://jobs.example/rust-engineers".to_string()),
            ..Default::default()
        };
        let app = complete_application(&mut input, &mut out, args, &known()).unwrap();

        assert_eq!(app.job_url, "https://jobs.example/rust-engineers");
        assert_eq!(app.status, ApplicationStatus::Applied);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("not a tracked posting"));
        assert!(printed.contains("  https://jobs.example/rust-engineer\n"));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut input = Cursor::new("");
        let mut out = Vec::new();
        assert!(complete_application(&mut input, &mut out, ApplicationArgs::default(), &known()).is_err());
    }

    #[test]
    fn test_confirm() {
        let mut out = Vec::new();
        assert!(confirm(&mut Cursor::new("yes\n"), &mut out, "Delete?").unwrap());
        assert!(!confirm(&mut Cursor::new("\n"), &mut out, "Delete?").unwrap());
        assert!(!confirm(&mut Cursor::new("nope\n"), &mut out, "Delete?").unwrap());
    }

    #[test]
    fn test_similar_urls_ranked() {
        let known = known();
        let hints = similar_urls("https://jobs.example/data-enginer", &known, 2);
        assert_eq!(hints[0], "https://jobs.example/data-engineer");
        assert!(similar_urls("something unrelated", &known, 3).is_empty());
    }
}
