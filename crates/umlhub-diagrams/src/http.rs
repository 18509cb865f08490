//! Shared HTTP plumbing for service clients.

use std::time::Duration;

use ureq::http::Response;
use ureq::{Agent, Body};

use crate::error::{Service, ServiceError, ServiceErrorKind};

/// Create HTTP agent with the specified timeout.
///
/// HTTP error statuses are returned as responses, not errors, so callers can
/// read the body for details.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Create an agent that hands redirect responses back to the caller.
///
/// The render service answers a submission with a redirect whose `Location`
/// carries the render id; following it would lose the id.
pub(crate) fn create_no_redirect_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .max_redirects(0)
        .max_redirects_will_error(false)
        .build()
        .into()
}

pub(crate) fn transport_error(service: Service, err: &ureq::Error) -> ServiceError {
    ServiceError::new(service, ServiceErrorKind::Transport(err.to_string()))
}

/// Return the body of a 2xx response, or a status error carrying the body text.
pub(crate) fn success_body(
    service: Service,
    response: Response<Body>,
) -> Result<Body, ServiceError> {
    let status = response.status().as_u16();
    let body = response.into_body();

    if !(200..300).contains(&status) {
        return Err(status_error(service, status, body));
    }

    Ok(body)
}

/// Build a status error, reading the response body for details.
pub(crate) fn status_error(service: Service, status: u16, mut body: Body) -> ServiceError {
    let error_body = body
        .read_to_string()
        .unwrap_or_else(|_| String::from("(unable to read error body)"));
    ServiceError::new(
        service,
        ServiceErrorKind::Status {
            status,
            body: error_body,
        },
    )
}
