//! Syntax-check service client.
//!
//! The service accepts `POST /check_syntax` with `{"source": "..."}` and
//! answers `{"valid": bool, "diagramType": "...", "description": "..."}`.
//! A description of the form `(N entities)` carries an entity count; blocks
//! the service reports with zero entities are not worth indexing.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::consts::{CHECK_SYNTAX_PATH, DEFAULT_TIMEOUT};
use crate::error::{Service, ServiceError, ServiceErrorKind};
use crate::http::{create_agent, success_body, transport_error};

/// Matches descriptions like `(3 participants)`.
static ENTITY_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([0-9]+) .+\)$").unwrap());

/// Verdict returned by the syntax-check service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyntaxCheckResult {
    pub valid: bool,
    /// Coarse category reported by the service (e.g. `SEQUENCE`, `DESCRIPTION`).
    pub diagram_type: String,
    pub description: String,
}

impl SyntaxCheckResult {
    /// Entity count carried by the description, if it has the `(N ...)` form.
    #[must_use]
    pub fn entity_count(&self) -> Option<u64> {
        ENTITY_COUNT_RE
            .captures(&self.description)
            .and_then(|caps| caps[1].parse().ok())
    }

    /// Whether the diagram has any entities.
    ///
    /// Only a count written exactly as `0` rejects; descriptions without a
    /// count are accepted.
    #[must_use]
    pub fn has_entities(&self) -> bool {
        ENTITY_COUNT_RE
            .captures(&self.description)
            .is_none_or(|caps| &caps[1] != "0")
    }

    /// Whether the block should be indexed.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.valid && self.has_entities()
    }
}

/// Checks block syntax.
pub trait SyntaxValidator: Send + Sync {
    /// Ask whether `source` is a valid diagram.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the service cannot be reached, answers
    /// with a non-2xx status, or returns malformed JSON.
    fn check(&self, source: &str) -> Result<SyntaxCheckResult, ServiceError>;
}

#[derive(Serialize)]
struct CheckSyntaxRequest<'a> {
    source: &'a str,
}

/// HTTP client for the syntax-check service.
#[derive(Debug, Clone)]
pub struct SyntaxCheckClient {
    agent: Agent,
    base_url: String,
}

impl SyntaxCheckClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

impl SyntaxValidator for SyntaxCheckClient {
    fn check(&self, source: &str) -> Result<SyntaxCheckResult, ServiceError> {
        let url = format!("{}{CHECK_SYNTAX_PATH}", self.base_url);
        tracing::debug!(url = %url, "Checking diagram syntax");

        let response = self
            .agent
            .post(&url)
            .send_json(CheckSyntaxRequest { source })
            .map_err(|e| transport_error(Service::SyntaxChecker, &e))?;

        let mut body = success_body(Service::SyntaxChecker, response)?;
        body.read_json::<SyntaxCheckResult>().map_err(|e| {
            ServiceError::new(
                Service::SyntaxChecker,
                ServiceErrorKind::Malformed(e.to_string()),
            )
        })
    }
}
