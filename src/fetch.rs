use scraper::{ElementRef, Html};
use std::time::Duration;
use thirtyfour::prelude::*;
use tracing::{debug, info, warn};

use crate::error::JobBoardError;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; JobScraper/1.0)";
/// Upper bound on page text handed to the model.
pub const MAX_PAGE_CHARS: usize = 120_000;
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "nav", "footer", "header", "noscript"];

pub trait PageFetcher {
    /// Returns the page HTML.
    fn fetch(&self, url: &str) -> Result<String, JobBoardError>;
}

// --- Plain HTTP ---

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, JobBoardError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| JobBoardError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, JobBoardError> {
        let fetch_error = |reason: String| JobBoardError::Fetch {
            url: url.to_string(),
            reason,
            status: None,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobBoardError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
                status: Some(status.as_u16()),
            });
        }

        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}

// --- WebDriver-rendered pages ---

/// Renders pages in headless Chrome through a running WebDriver server,
/// for postings that only fill in their content with JavaScript.
pub struct WebDriverFetcher {
    server_url: String,
    settle: Duration,
}

impl WebDriverFetcher {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            settle: Duration::from_secs(3),
        }
    }

    async fn render(&self, url: &str) -> WebDriverResult<String> {
        let mut caps = DesiredCapabilities::chrome();
        caps.set_headless()?;
        let driver = WebDriver::new(&self.server_url, caps).await?;

        let result = async {
            driver.goto(url).await?;
            tokio::time::sleep(self.settle).await;
            driver.source().await
        }
        .await;

        after_quit(result, driver.quit().await, url)
    }
}

/// A failed session close is logged; the navigation outcome is what the
/// caller needs.
fn after_quit<T, E: std::fmt::Display>(result: T, quit: Result<(), E>, url: &str) -> T {
    if let Err(e) = quit {
        warn!(url, error = %e, "Failed to close WebDriver session");
    }
    result
}

impl PageFetcher for WebDriverFetcher {
    fn fetch(&self, url: &str) -> Result<String, JobBoardError> {
        let fetch_error = |reason: String| JobBoardError::Fetch {
            url: url.to_string(),
            reason,
            status: None,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| fetch_error(format!("Failed to start runtime: {}", e)))?;

        info!(url, "Rendering page with WebDriver");
        runtime
            .block_on(self.render(url))
            .map_err(|e| fetch_error(format!("WebDriver: {}", e)))
    }
}

/// Tries `primary`, then `fallback` if one is configured. HTTP error
/// statuses from `primary` are returned as-is; only transport failures
/// fall back.
pub struct FallbackFetcher {
    primary: Box<dyn PageFetcher>,
    fallback: Option<Box<dyn PageFetcher>>,
}

impl FallbackFetcher {
    pub fn new(primary: Box<dyn PageFetcher>, fallback: Option<Box<dyn PageFetcher>>) -> Self {
        Self { primary, fallback }
    }
}

impl PageFetcher for FallbackFetcher {
    fn fetch(&self, url: &str) -> Result<String, JobBoardError> {
        match self.primary.fetch(url) {
            Ok(html) => Ok(html),
            Err(err) if err.http_status().is_some() => Err(err),
            Err(err) => match &self.fallback {
                Some(fallback) => {
                    warn!(url, error = %err, "Plain fetch failed, trying rendered fetch");
                    fallback.fetch(url)
                }
                None => Err(err),
            },
        }
    }
}

// --- Text extraction ---

/// Visible text of an HTML page: one text run per line, with scripts, styles
/// and page chrome removed, capped at [`MAX_PAGE_CHARS`].
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    collect_text(document.root_element(), &mut lines);

    let text = lines.join("\n");
    debug!("Extracted {} characters of visible text", text.len());
    truncate_chars(&text, MAX_PAGE_CHARS)
}

fn collect_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if SKIPPED_TAGS.contains(&child_element.value().name()) {
                continue;
            }
            collect_text(child_element, lines);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_visible_text_drops_scripts_and_chrome() {
        let html = r#"<html><head><title>Rust Engineer</title><style>body { color: red; }</style></head>
            <body>
              <header>Site header</header>
              <nav><a href="/">Home</a></nav>
              <h1>Rust Engineer</h1>
              <p>Acme is hiring.   </p>
              <script>var tracking = 1;</script>
              <ul><li>Write Rust</li><li>Review code</li></ul>
              <footer>Copyright</footer>
            </body></html>"#;

        let text = visible_text(html);
        assert!(text.contains("Rust Engineer"));
        assert!(text.contains("Acme is hiring."));
        assert!(text.contains("Write Rust\nReview code"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Site header"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    struct Failing(Option<u16>);
    impl PageFetcher for Failing {
        fn fetch(&self, url: &str) -> Result<String, JobBoardError> {
            Err(JobBoardError::Fetch {
                url: url.to_string(),
                reason: match self.0 {
                    Some(code) => format!("HTTP {}", code),
                    None => "connection reset".to_string(),
                },
                status: self.0,
            })
        }
    }

    struct Counting(Cell<usize>);
    impl PageFetcher for Rc<Counting> {
        fn fetch(&self, url: &str) -> Result<String, JobBoardError> {
            self.as_ref().fetch(url)
        }
    }

    impl PageFetcher for Counting {
        fn fetch(&self, _url: &str) -> Result<String, JobBoardError> {
            self.0.set(self.0.get() + 1);
            Ok("<p>rendered</p>".to_string())
        }
    }

    #[test]
    fn test_transport_failure_falls_back_to_renderer() {
        let fetcher = FallbackFetcher::new(Box::new(Failing(None)), Some(Box::new(Counting(Cell::new(0)))));
        assert_eq!(fetcher.fetch("https://jobs.example/1").unwrap(), "<p>rendered</p>");

        let no_fallback = FallbackFetcher::new(Box::new(Failing(None)), None);
        let err = no_fallback.fetch("https://jobs.example/1").unwrap_err();
        assert!(matches!(err, JobBoardError::Fetch { .. }));
    }

    #[test]
    fn test_http_404_is_not_retried_through_renderer() {
        let renderer = Rc::new(Counting(Cell::new(0)));
        let fetcher = FallbackFetcher::new(Box::new(Failing(Some(404))), Some(Box::new(Rc::clone(&renderer))));

        let err = fetcher.fetch("https://jobs.example/gone").unwrap_err();
        assert_eq!(err.http_status(), Some(404));
        assert!(err.to_string().contains("HTTP 404"));
        assert_eq!(renderer.0.get(), 0);
    }

    #[test]
    fn test_quit_failure_keeps_navigation_outcome() {
        let quit_failed: Result<(), String> = Err("session already closed".to_string());
        let page: Result<String, String> = Ok("<p>job</p>".to_string());
        assert_eq!(after_quit(page, quit_failed.clone(), "https://jobs.example/1").unwrap(), "<p>job</p>");

        let nav_failed: Result<String, String> = Err("net::ERR_NAME_NOT_RESOLVED".to_string());
        let err = after_quit(nav_failed, quit_failed, "https://jobs.example/1").unwrap_err();
        assert_eq!(err, "net::ERR_NAME_NOT_RESOLVED");
    }

    #[test]
    #[ignore] // requires network access
    fn test_http_fetcher_reports_404() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch("https://httpbin.org/status/404").unwrap_err();
        assert!(err.to_string().contains("404"));
        assert_eq!(err.http_status(), Some(404));
    }
}
