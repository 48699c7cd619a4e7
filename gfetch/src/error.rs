//! Client error types.

use thiserror::Error;

use crate::Response;

/// Status reported for failures that never produced a server response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 599;

/// Result type for client construction and configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing or configuring a client.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument was empty or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The default transport could not be built.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failures reported by a [`Transport`](crate::Transport) before any response
/// was produced.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The target URL could not be parsed.
    #[error("URL parse error: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The endpoint outlived the client that registered it.
    #[error("Client has been dropped")]
    ClientDropped,
}

/// Error returned by every endpoint call.
///
/// Raised either for a completed response whose status is outside the
/// success range, or for a transport failure, in which case `status` is
/// [`TRANSPORT_FAILURE_STATUS`] and no response is attached. Formats as
/// exactly `status_text`.
#[derive(Debug, Error)]
#[error("{status_text}")]
pub struct RequestError {
    status: u16,
    status_text: String,
    response: Option<Box<Response>>,
}

impl RequestError {
    /// Build an error from a non-success response.
    pub fn from_response(response: Response) -> Self {
        Self {
            status: response.status().as_u16(),
            status_text: response.status_text().to_string(),
            response: Some(Box::new(response)),
        }
    }

    /// Build an error for a request that never reached a server.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            status_text: message.into(),
            response: None,
        }
    }

    /// HTTP status, or 599 for transport failures.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status text of the response, or the transport error message.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// The failed response, absent for transport failures.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    /// Consume the error and return the failed response.
    pub fn into_response(self) -> Option<Response> {
        self.response.map(|r| *r)
    }

    /// Check if the request never reached a server.
    pub fn is_transport_failure(&self) -> bool {
        self.response.is_none() && self.status == TRANSPORT_FAILURE_STATUS
    }

    /// Check if the server answered with a 4xx status.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the server answered with a 5xx status.
    pub fn is_server_error(&self) -> bool {
        !self.is_transport_failure() && (500..600).contains(&self.status)
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        Self::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_display_is_status_text() {
        let response = Response::new(StatusCode::NOT_FOUND, "");
        let err = RequestError::from_response(response);
        assert_eq!(err.to_string(), "Not Found");
        assert_eq!(err.status(), 404);
        assert!(err.is_client_error());
        assert!(!err.is_transport_failure());
        assert!(err.response().is_some());
    }

    #[test]
    fn test_transport_failure() {
        let err = RequestError::from(TransportError::Connection("refused".to_string()));
        assert_eq!(err.status(), TRANSPORT_FAILURE_STATUS);
        assert_eq!(err.status_text(), "Connection error: refused");
        assert!(err.is_transport_failure());
        assert!(!err.is_server_error());
        assert!(err.into_response().is_none());
    }

    #[test]
    fn test_server_error_keeps_response() {
        let response = Response::new(StatusCode::SERVICE_UNAVAILABLE, "down")
            .with_status_text("Maintenance");
        let err = RequestError::from_response(response);
        assert_eq!(err.to_string(), "Maintenance");
        assert!(err.is_server_error());
        let response = err.into_response().unwrap();
        assert_eq!(response.text().unwrap(), "down");
    }
}
