use std::path::PathBuf;

use thiserror::Error;

/// Failures the ingestion pipeline distinguishes between.
///
/// `NotFound`, `Bookmarks*`, `Credential` and `Config` abort a run. `Fetch`,
/// `Normalization` and `Model` are per-posting: the posting is skipped and the
/// batch continues.
#[derive(Debug, Error)]
pub enum JobBoardError {
    #[error("Folder '{0}' not found in bookmarks")]
    NotFound(String),

    #[error("Failed to read bookmarks file {path:?}: {source}")]
    BookmarksRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bookmarks file {path:?} is not a valid bookmarks export: {source}")]
    BookmarksFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `status` is set when the server answered with an HTTP error code.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        reason: String,
        status: Option<u16>,
    },

    #[error("Could not normalize {url}: {reason}")]
    Normalization { url: String, reason: String },

    #[error("Model request failed for {url}: {reason}")]
    Model { url: String, reason: String },

    #[error("{var} environment variable not set. Set it with: export {var}=your-key-here")]
    Credential { var: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl JobBoardError {
    /// Short label used in logs and the failure ledger.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BookmarksRead { .. } | Self::BookmarksFormat { .. } => "bookmarks",
            Self::Fetch { .. } => "fetch",
            Self::Normalization { .. } => "normalization",
            Self::Model { .. } => "model",
            Self::Credential { .. } => "credential",
            Self::Config(_) => "config",
        }
    }

    /// Whether the pipeline should skip the posting and keep going.
    pub fn is_per_posting(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Normalization { .. } | Self::Model { .. }
        )
    }

    /// HTTP status of a fetch the server answered with an error code.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_message_names_variable() {
        let err = JobBoardError::Credential { var: "OPENAI_API_KEY" };
        let msg = err.to_string();
        assert!(msg.contains("OPENAI_API_KEY"));
        assert!(!err.is_per_posting());
    }

    #[test]
    fn test_per_posting_kinds() {
        let fetch = JobBoardError::Fetch {
            url: "https://a".to_string(),
            reason: "HTTP 404".to_string(),
            status: Some(404),
        };
        assert!(fetch.is_per_posting());
        assert_eq!(fetch.kind(), "fetch");
        assert_eq!(fetch.http_status(), Some(404));

        let missing = JobBoardError::NotFound("Jobs".to_string());
        assert!(!missing.is_per_posting());
        assert_eq!(missing.to_string(), "Folder 'Jobs' not found in bookmarks");
    }
}
