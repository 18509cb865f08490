//! Document sources.
//!
//! An origin URL names a file on a code host. [`OriginRef`] recognizes the
//! supported URL shape and [`GitHubSource`] fetches the file through the
//! GitHub contents API.

use std::sync::LazyLock;
use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use serde::Deserialize;
use ureq::Agent;

/// Default GitHub API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

static GITHUB_BLOB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/blob/([^/]+)/(.+)$").unwrap()
});

/// A fetched document, alive for one ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub origin_url: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(origin_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin_url: origin_url.into(),
            text: text.into(),
        }
    }
}

/// A file on GitHub addressed by a `blob` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginRef {
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit.
    pub git_ref: String,
    pub path: String,
}

impl OriginRef {
    /// Parse `https://github.com/<owner>/<repo>/blob/<ref>/<path>`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnrecognizedUrl`] for any other URL.
    pub fn parse(url: &str) -> Result<Self, SourceError> {
        let caps = GITHUB_BLOB_RE
            .captures(url)
            .ok_or_else(|| SourceError::UnrecognizedUrl(url.to_owned()))?;

        Ok(Self {
            owner: caps[1].to_owned(),
            repo: caps[2].to_owned(),
            git_ref: caps[3].to_owned(),
            path: caps[4].to_owned(),
        })
    }

    /// Contents API URL for this file under `api_url`.
    #[must_use]
    pub fn contents_url(&self, api_url: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            api_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.path,
            self.git_ref
        )
    }
}

/// Error fetching a document.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("unrecognized origin URL: {0}")]
    UnrecognizedUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("malformed contents response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether the caller supplied a bad origin (as opposed to an upstream failure).
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnrecognizedUrl(_))
    }
}

/// Fetches the document behind an origin URL.
pub trait ContentSource: Send + Sync {
    /// Fetch `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the URL is not recognized or the fetch fails.
    fn fetch(&self, url: &str) -> Result<RawDocument, SourceError>;
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
}

/// GitHub contents API client.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    agent: Agent,
    api_url: String,
    token: Option<String>,
}

impl GitHubSource {
    /// Create a source for `api_url` with an optional API token.
    pub fn new(api_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

impl ContentSource for GitHubSource {
    fn fetch(&self, url: &str) -> Result<RawDocument, SourceError> {
        let origin = OriginRef::parse(url)?;
        let contents_url = origin.contents_url(&self.api_url);

        tracing::debug!(url = %contents_url, "Fetching document");

        let mut request = self
            .agent
            .get(&contents_url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "umlhub");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {token}"));
        }

        let response = request
            .call()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(SourceError::Status {
                status,
                body: error_body,
            });
        }

        let contents: ContentsResponse = body
            .read_json()
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(RawDocument::new(url, decode_content(&contents.content)?))
    }
}

/// Decode the base64 `content` field, which GitHub wraps at 60 columns.
fn decode_content(content: &str) -> Result<String, SourceError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_STANDARD
        .decode(compact)
        .map_err(|e| SourceError::Malformed(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
