//! Errors from external diagram services.

use std::fmt;

/// External service that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    SyntaxChecker,
    Renderer,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyntaxChecker => f.write_str("syntax checker"),
            Self::Renderer => f.write_str("renderer"),
        }
    }
}

/// Failure talking to an external diagram service.
///
/// Always fatal for the block being processed; nothing is retried.
#[derive(Debug, thiserror::Error)]
#[error("{service}: {kind}")]
pub struct ServiceError {
    pub service: Service,
    pub kind: ServiceErrorKind,
}

impl ServiceError {
    #[must_use]
    pub fn new(service: Service, kind: ServiceErrorKind) -> Self {
        Self { service, kind }
    }
}

/// Kind of service failure.
#[derive(Debug, thiserror::Error)]
pub enum ServiceErrorKind {
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response has no Location header")]
    MissingLocation,
    #[error("Location header carries no render id: {0}")]
    InvalidLocation(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_display_names_service_and_kind() {
        let err = ServiceError::new(
            Service::Renderer,
            ServiceErrorKind::Status {
                status: 502,
                body: "bad gateway".to_owned(),
            },
        );

        assert_eq!(err.to_string(), "renderer: HTTP 502: bad gateway");
    }

    #[test]
    fn test_display_missing_location() {
        let err = ServiceError::new(Service::Renderer, ServiceErrorKind::MissingLocation);
        assert_eq!(err.to_string(), "renderer: response has no Location header");
    }
}
