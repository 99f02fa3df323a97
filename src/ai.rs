use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use tracing::{debug, warn};

use crate::config::ScoredExample;
use crate::error::JobBoardError;
use crate::models::{JobPosting, PostingStatus};

// --- Provider trait ---

pub trait AIProvider {
    fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
}

impl ProviderKind {
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_id: String,
}

/// Maps a configured model name (or short alias) to a provider.
pub fn resolve_model(name: &str) -> Result<ModelSpec, JobBoardError> {
    let spec = |provider, model_id: &str| {
        Ok(ModelSpec {
            provider,
            model_id: model_id.to_string(),
        })
    };

    match name.trim() {
        "claude-sonnet" | "sonnet" => spec(ProviderKind::Anthropic, "claude-sonnet-4-5-20250929"),
        "claude-opus" | "opus" => spec(ProviderKind::Anthropic, "claude-opus-4-6"),
        "claude-haiku" | "haiku" => spec(ProviderKind::Anthropic, "claude-haiku-4-5-20251001"),
        "gpt4o" => spec(ProviderKind::OpenAI, "gpt-4o"),
        "gpt5" => spec(ProviderKind::OpenAI, "gpt-5.2"),
        other if other.starts_with("claude-") => spec(ProviderKind::Anthropic, other),
        other
            if other.starts_with("gpt-")
                || other.starts_with("o1")
                || other.starts_with("o3")
                || other.starts_with("o4") =>
        {
            spec(ProviderKind::OpenAI, other)
        }
        other => Err(JobBoardError::Config(format!(
            "Unknown model '{}'. Use a gpt-*, o*, or claude-* model id, or one of: \
             sonnet, opus, haiku, gpt4o, gpt5",
            other
        ))),
    }
}

/// Builds the provider, failing with `Credential` when its API key is not set.
pub fn create_provider(spec: &ModelSpec) -> Result<Box<dyn AIProvider>, JobBoardError> {
    match spec.provider {
        ProviderKind::Anthropic => Ok(Box::new(AnthropicProvider::new(spec.model_id.clone())?)),
        ProviderKind::OpenAI => Ok(Box::new(OpenAIProvider::new(spec.model_id.clone())?)),
    }
}

fn api_key(kind: ProviderKind, value: Option<String>) -> Result<String, JobBoardError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(JobBoardError::Credential {
            var: kind.credential_var(),
        })
}

// --- Anthropic provider ---

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl AnthropicProvider {
    pub fn new(model_id: String) -> Result<Self, JobBoardError> {
        Self::with_key(model_id, env::var(ProviderKind::Anthropic.credential_var()).ok())
    }

    pub fn with_key(model_id: String, key: Option<String>) -> Result<Self, JobBoardError> {
        let api_key = api_key(ProviderKind::Anthropic, key)?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, client })
    }
}

impl AIProvider for AnthropicProvider {
    fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = AnthropicRequest {
            model: &self.model_id,
            max_tokens,
            temperature: 0.0,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Anthropic API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: AnthropicResponse = response
            .json()
            .context("Failed to parse Anthropic API response")?;

        api_response
            .content
            .into_iter()
            .find(|block| block.content_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| anyhow!("No content in Anthropic API response"))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- OpenAI provider ---

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<OpenAIMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug)]
pub struct OpenAIProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl OpenAIProvider {
    pub fn new(model_id: String) -> Result<Self, JobBoardError> {
        Self::with_key(model_id, env::var(ProviderKind::OpenAI.credential_var()).ok())
    }

    pub fn with_key(model_id: String, key: Option<String>) -> Result<Self, JobBoardError> {
        let api_key = api_key(ProviderKind::OpenAI, key)?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, client })
    }

    // reasoning models only accept the default temperature
    fn temperature(&self) -> Option<f32> {
        if self.model_id.starts_with('o') || self.model_id.starts_with("gpt-5") {
            None
        } else {
            Some(0.0)
        }
    }
}

impl AIProvider for OpenAIProvider {
    fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = OpenAIRequest {
            model: &self.model_id,
            max_completion_tokens: max_tokens,
            temperature: self.temperature(),
            messages: vec![
                OpenAIMessage {
                    role: "system",
                    content: system,
                },
                OpenAIMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .context("Failed to send request to OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "OpenAI API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: OpenAIResponse = response
            .json()
            .context("Failed to parse OpenAI API response")?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("No choices in OpenAI API response"))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Normalization ---

/// Structured record the model is asked to return for a posting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractedPosting {
    pub job_title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub remote: Option<bool>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub salary_min: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub salary_max: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "list_or_text")]
    pub requirements: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_text")]
    pub responsibilities: Option<Vec<String>>,
    #[serde(default)]
    pub post_date: Option<String>,
}

impl ExtractedPosting {
    pub fn into_posting(self, url: &str, parsed_at: String) -> JobPosting {
        JobPosting {
            id: None,
            url: url.to_string(),
            title: self.job_title.trim().to_string(),
            company: self.company.trim().to_string(),
            location: self.location,
            employment_type: self.employment_type,
            remote: self.remote,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            description: self.description,
            requirements: join_list(self.requirements),
            responsibilities: join_list(self.responsibilities),
            post_date: self.post_date,
            keyword_score: None,
            matched_keywords: None,
            resume_score: None,
            status: PostingStatus::Normalized,
            parsed_at,
            notes: None,
        }
    }
}

fn join_list(items: Option<Vec<String>>) -> Option<String> {
    items.filter(|v| !v.is_empty()).map(|v| v.join(", "))
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or number, got {}",
            other
        ))),
    }
}

fn list_or_text<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrText {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Option::<ListOrText>::deserialize(deserializer)? {
        None => None,
        Some(ListOrText::List(items)) => Some(items),
        Some(ListOrText::Text(text)) => Some(vec![text]),
    })
}

/// Turns page text into a schema record and scores it against a resume.
pub trait Normalizer {
    fn normalize(&self, url: &str, page_text: &str) -> Result<ExtractedPosting, JobBoardError>;

    /// Fit score from 0 to 10.
    fn score(&self, url: &str, description: &str, resume: &str) -> Result<i64, JobBoardError>;
}

const EXTRACTION_SYSTEM: &str = "You are an expert at extracting structured information from job postings.

Rules:
- Extract ONLY information present in the text
- Do NOT invent missing fields
- If a field is not present, return null
- Salary min/max should be in dollars per year if possible
- If there is a single salary figure, copy it to both min and max
- Description should be full text, cleaned but not summarized
- Requirements and responsibilities should be bullet-style lists if possible

Return valid JSON only, with these fields:
{
  \"job_title\": string,
  \"company\": string,
  \"location\": string | null,
  \"employment_type\": string | null,
  \"remote\": boolean | null,
  \"salary_min\": string | null,
  \"salary_max\": string | null,
  \"description\": string,
  \"requirements\": [string] | null,
  \"responsibilities\": [string] | null,
  \"post_date\": string | null
}";

const SCORING_SYSTEM: &str = "You are an expert career advisor.";

const EXTRACTION_MAX_TOKENS: u32 = 4096;
const SCORE_MAX_TOKENS: u32 = 16;

pub struct LlmNormalizer {
    provider: Box<dyn AIProvider>,
    examples: Vec<(i64, String)>,
}

impl LlmNormalizer {
    pub fn new(provider: Box<dyn AIProvider>) -> Self {
        Self {
            provider,
            examples: Vec::new(),
        }
    }

    /// Adds few-shot scoring examples. Unreadable example files are skipped.
    pub fn with_examples(mut self, examples: &[ScoredExample]) -> Self {
        for example in examples {
            match std::fs::read_to_string(&example.path) {
                Ok(text) => self.examples.push((example.score, text)),
                Err(e) => warn!(
                    path = %example.path.display(),
                    error = %e,
                    "Skipping scored example"
                ),
            }
        }
        self
    }

    fn ask(&self, url: &str, system: &str, prompt: &str, max_tokens: u32) -> Result<String, JobBoardError> {
        debug!(url, model = self.provider.model_name(), "Sending model request");
        self.provider
            .complete(system, prompt, max_tokens)
            .map_err(|e| JobBoardError::Model {
                url: url.to_string(),
                reason: format!("{:#}", e),
            })
    }

    fn score_prompt(&self, description: &str, resume: &str) -> String {
        let mut prompt = format!(
            "Given the following job description and resume, score how well the resume \
             matches the job on a scale of 0 to 10.\n\n\
             Job Description:\n{}\n\n\
             Resume:\n{}\n\n",
            description, resume
        );

        if !self.examples.is_empty() {
            prompt.push_str("\n\nHere are some examples of job descriptions and their scores:\n");
            for (score, text) in &self.examples {
                prompt.push_str(&format!("Job Description:\n{}\n\nScore: {}\n\n", text, score));
            }
        }

        prompt.push_str("\n\nReturn only the integer score.\nScore:");
        prompt
    }
}

impl Normalizer for LlmNormalizer {
    fn normalize(&self, url: &str, page_text: &str) -> Result<ExtractedPosting, JobBoardError> {
        let prompt = format!(
            "Extract job posting information from the following page text.\n\n\
             BEGIN PAGE\n{}\nEND PAGE",
            page_text
        );
        let response = self.ask(url, EXTRACTION_SYSTEM, &prompt, EXTRACTION_MAX_TOKENS)?;
        parse_extraction(&response).map_err(|reason| JobBoardError::Normalization {
            url: url.to_string(),
            reason,
        })
    }

    fn score(&self, url: &str, description: &str, resume: &str) -> Result<i64, JobBoardError> {
        let prompt = self.score_prompt(description, resume);
        let response = self.ask(url, SCORING_SYSTEM, &prompt, SCORE_MAX_TOKENS)?;
        parse_score(&response).map_err(|reason| JobBoardError::Normalization {
            url: url.to_string(),
            reason,
        })
    }
}

/// Parses the model's JSON answer, tolerating markdown code fences and
/// surrounding chatter.
pub fn parse_extraction(content: &str) -> Result<ExtractedPosting, String> {
    let fence = regex::Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").map_err(|e| e.to_string())?;
    let body = match fence.captures(content).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => match (content.find('{'), content.rfind('}')) {
            (Some(start), Some(end)) if start < end => &content[start..=end],
            _ => content.trim(),
        },
    };

    let posting: ExtractedPosting = serde_json::from_str(body)
        .map_err(|e| format!("Extraction failed: {}\nLLM output:\n{}", e, content))?;

    if posting.job_title.trim().is_empty() || posting.company.trim().is_empty() {
        return Err(format!("Extraction returned an empty title or company\nLLM output:\n{}", content));
    }
    Ok(posting)
}

/// Parses an integer score in `0..=10` from answers like `7` or `Score: 7`.
pub fn parse_score(content: &str) -> Result<i64, String> {
    let re = regex::Regex::new(r"(?i)^\s*(?:score\s*:\s*)?(-?\d+)\b").map_err(|e| e.to_string())?;
    let score = re
        .captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| format!("Invalid score returned: {}", content.trim()))?;

    if (0..=10).contains(&score) {
        Ok(score)
    } else {
        Err(format!("Score {} out of range", score))
    }
}
