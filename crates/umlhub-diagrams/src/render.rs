//! Render service client.
//!
//! Rendering is a two-phase protocol:
//!
//! 1. `POST /form` with the form-encoded block (`text=...`). The service
//!    answers with a redirect; the last path segment of its `Location` header
//!    is an opaque render id. Redirects are not followed.
//! 2. `GET /svg/<id>`, `GET /png/<id>` and `GET /txt/<id>` return the three
//!    representations.
//!
//! [`RenderClient::submit`] performs phase 1 and returns a [`RenderSession`]
//! whose methods fetch each format on demand. [`DiagramRenderer::render`]
//! runs the whole protocol, fetching the formats one after another; any
//! failure fails the render and no partial artifact is produced.

use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use ureq::Agent;
use umlhub_model::RenderArtifact;

use crate::consts::{DEFAULT_TIMEOUT, FORM_PATH};
use crate::error::{Service, ServiceError, ServiceErrorKind};
use crate::http::{create_no_redirect_agent, status_error, success_body, transport_error};

/// Characters left unescaped in `application/x-www-form-urlencoded` values.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// Renders a block to all supported formats.
pub trait DiagramRenderer: Send + Sync {
    /// Render `source` to SVG, PNG and text.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if submission or any of the three fetches fails.
    fn render(&self, source: &str) -> Result<RenderArtifact, ServiceError>;
}

/// HTTP client for the render service.
#[derive(Debug, Clone)]
pub struct RenderClient {
    agent: Agent,
    base_url: String,
}

impl RenderClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: create_no_redirect_agent(timeout),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Submit a block and obtain its render id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure, an error status, or a
    /// response without a usable `Location` header.
    pub fn submit(&self, source: &str) -> Result<RenderSession<'_>, ServiceError> {
        let url = format!("{}{FORM_PATH}", self.base_url);
        let form = format!("text={}", utf8_percent_encode(source, FORM_VALUE));

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send(form.as_bytes())
            .map_err(|e| transport_error(Service::Renderer, &e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(status_error(Service::Renderer, status, response.into_body()));
        }

        let location = response
            .headers()
            .get("location")
            .ok_or_else(|| renderer_error(ServiceErrorKind::MissingLocation))?
            .to_str()
            .map_err(|_| {
                renderer_error(ServiceErrorKind::InvalidLocation(
                    "(non-ASCII header value)".to_owned(),
                ))
            })?;

        let id = render_id_from_location(location).ok_or_else(|| {
            renderer_error(ServiceErrorKind::InvalidLocation(location.to_owned()))
        })?;

        tracing::debug!(render_id = %id, "Render submitted");

        Ok(RenderSession {
            client: self,
            id: id.to_owned(),
        })
    }

    fn fetch(&self, format: &str, id: &str) -> Result<Vec<u8>, ServiceError> {
        let url = format!("{}/{format}/{id}", self.base_url);

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| transport_error(Service::Renderer, &e))?;

        success_body(Service::Renderer, response)?
            .read_to_vec()
            .map_err(|e| transport_error(Service::Renderer, &e))
    }
}

impl DiagramRenderer for RenderClient {
    fn render(&self, source: &str) -> Result<RenderArtifact, ServiceError> {
        let session = self.submit(source)?;
        let svg = session.svg()?;
        let png = session.png()?;
        let ascii = session.txt()?;

        Ok(RenderArtifact {
            render_id: session.id,
            svg,
            png_base64: BASE64_STANDARD.encode(png),
            ascii,
        })
    }
}

/// A submitted render, identified by the service-issued id.
#[derive(Debug)]
pub struct RenderSession<'a> {
    client: &'a RenderClient,
    id: String,
}

impl RenderSession<'_> {
    /// Render id taken from the submission's `Location` header.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fetch the SVG rendering.
    pub fn svg(&self) -> Result<String, ServiceError> {
        let bytes = self.client.fetch("svg", &self.id)?;
        String::from_utf8(bytes).map_err(|_| {
            renderer_error(ServiceErrorKind::Malformed(
                "SVG is not valid UTF-8".to_owned(),
            ))
        })
    }

    /// Fetch the PNG rendering as raw bytes.
    pub fn png(&self) -> Result<Vec<u8>, ServiceError> {
        self.client.fetch("png", &self.id)
    }

    /// Fetch the plain-text rendering.
    pub fn txt(&self) -> Result<String, ServiceError> {
        let bytes = self.client.fetch("txt", &self.id)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn renderer_error(kind: ServiceErrorKind) -> ServiceError {
    ServiceError::new(Service::Renderer, kind)
}

/// Last path segment of a `Location` value, ignoring query and fragment.
fn render_id_from_location(location: &str) -> Option<&str> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    path.rsplit('/').next().filter(|id| !id.is_empty())
}
