use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    /// Queued for (re-)parsing on the next ingestion run.
    Raw,
    Normalized,
}

impl PostingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Normalized => "normalized",
        }
    }
}

impl fmt::Display for PostingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "normalized" => Ok(Self::Normalized),
            other => Err(anyhow!("Unknown posting status '{}'. Expected raw or normalized", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub remote: Option<bool>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,     // ", "-joined list
    pub responsibilities: Option<String>, // ", "-joined list
    pub post_date: Option<String>,
    pub keyword_score: Option<i64>,
    pub matched_keywords: Option<String>,
    pub resume_score: Option<i64>, // 0-10 fit against the reference resume
    pub status: PostingStatus,
    pub parsed_at: String,
    pub notes: Option<String>,
}

impl JobPosting {
    pub fn salary_range(&self) -> Option<String> {
        match (self.salary_min.as_deref(), self.salary_max.as_deref()) {
            (Some(min), Some(max)) if min == max => Some(min.to_string()),
            (Some(min), Some(max)) => Some(format!("{} - {}", min, max)),
            (Some(min), None) => Some(format!("{}+", min)),
            (None, Some(max)) => Some(format!("up to {}", max)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Interviewing,
    Rejected,
    Offer,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Rejected,
        ApplicationStatus::Offer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Interviewing => "interviewing",
            Self::Rejected => "rejected",
            Self::Offer => "offer",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "applied" => Ok(Self::Applied),
            "interviewing" | "interview" => Ok(Self::Interviewing),
            "rejected" => Ok(Self::Rejected),
            "offer" => Ok(Self::Offer),
            other => Err(anyhow!(
                "Unknown application status '{}'. Expected applied, interviewing, rejected or offer",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Option<i64>,
    /// URL of a tracked posting, or free text when the posting is not tracked.
    pub job_url: String,
    pub application_date: String, // YYYY-MM-DD
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub resume_path: Option<String>,
    pub created_at: Option<String>,
}

impl Application {
    /// New application dated today.
    pub fn new(job_url: impl Into<String>, status: ApplicationStatus) -> Self {
        Self {
            id: None,
            job_url: job_url.into(),
            application_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            status,
            notes: None,
            resume_path: None,
            created_at: None,
        }
    }
}

/// Validates and normalizes a `YYYY-MM-DD` date.
pub fn parse_application_date(input: &str) -> Result<String> {
    let date = chrono::NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow!("Invalid date '{}' (expected YYYY-MM-DD): {}", input.trim(), e))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_status_parse_and_cycle() {
        assert_eq!("Interviewing".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Interviewing);
        assert_eq!(" offer ".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Offer);
        assert!("ghosted".parse::<ApplicationStatus>().is_err());

        assert_eq!(ApplicationStatus::Offer.next(), ApplicationStatus::Applied);
        assert_eq!(ApplicationStatus::Applied.prev(), ApplicationStatus::Offer);
    }

    #[test]
    fn test_parse_application_date() {
        assert_eq!(parse_application_date("2026-03-05").unwrap(), "2026-03-05");
        assert!(parse_application_date("03/05/2026").is_err());
    }

    #[test]
    fn test_salary_range_formatting() {
        let mut job = JobPosting {
            id: None,
            url: "https://example.com/job".to_string(),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: None,
            employment_type: None,
            remote: None,
            salary_min: Some("$120,000".to_string()),
            salary_max: Some("$150,000".to_string()),
            description: None,
            requirements: None,
            responsibilities: None,
            post_date: None,
            keyword_score: None,
            matched_keywords: None,
            resume_score: None,
            status: PostingStatus::Normalized,
            parsed_at: "2026-01-01T00:00:00Z".to_string(),
            notes: None,
        };
        assert_eq!(job.salary_range().as_deref(), Some("$120,000 - $150,000"));

        job.salary_max = Some("$120,000".to_string());
        assert_eq!(job.salary_range().as_deref(), Some("$120,000"));

        job.salary_min = None;
        job.salary_max = None;
        assert_eq!(job.salary_range(), None);
    }
}
