//! HTTP adapter errors and their failure mapping

use std::error::Error as StdError;
use std::io;

use rebound_core::retry::{Failure, FailureCode, FailureSource, Interruption};
use thiserror::Error;

/// Errors produced by [`crate::HttpClient`] implementations
#[derive(Error, Debug)]
pub enum HttpError {
    /// The transport failed before a response was received
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status outside 200..=399
    #[error("HTTP {status} from {url}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The client could not be built or the request was malformed
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The response body could not be decoded
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller cancelled the call or its deadline elapsed
    #[error(transparent)]
    Interrupted(#[from] Interruption),
}

impl HttpError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub fn status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Status code of an error response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl FailureSource for HttpError {
    fn to_failure(&self) -> Failure {
        let message = self.to_string();
        match self {
            HttpError::Transport { source, .. } => transport_failure(source, message),
            HttpError::Status { status, .. } => Failure::status(*status, message),
            HttpError::InvalidRequest { .. } | HttpError::Decode(_) => Failure::other(message),
            HttpError::Interrupted(_) => Failure::cancelled(message),
        }
    }
}

fn transport_failure(err: &reqwest::Error, message: String) -> Failure {
    if err.is_timeout() {
        return Failure::timeout(message).with_code(FailureCode::ConnectionTimedOut);
    }
    if let Some(status) = err.status() {
        return Failure::status(status.as_u16(), message);
    }

    let code = io_source(err).and_then(|io_err| io_err.to_failure().code().cloned());
    if err.is_connect() || err.is_request() || err.is_body() {
        let failure = Failure::network(message);
        return match code {
            Some(code) => failure.with_code(code),
            None => failure,
        };
    }

    match code {
        Some(code) => Failure::other(message).with_code(code),
        None => Failure::other(message),
    }
}

/// First `io::Error` in the source chain
fn io_source(err: &reqwest::Error) -> Option<&io::Error> {
    let mut source = StdError::source(err);
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        source = inner.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::retry::FailureKind;

    #[test]
    fn test_status_maps_to_status_failure() {
        let failure = HttpError::status(502, "http://upstream/", "bad gateway").to_failure();
        assert_eq!(failure.kind(), FailureKind::Status);
        assert_eq!(failure.status_code(), Some(502));
        assert!(failure.message().contains("HTTP 502"));
    }

    #[test]
    fn test_interruption_maps_to_cancelled() {
        let failure = HttpError::from(Interruption::DeadlineExceeded).to_failure();
        assert_eq!(failure.kind(), FailureKind::Cancelled);
    }

    #[test]
    fn test_invalid_request_is_terminal_kind() {
        let failure = HttpError::invalid_request("bad header").to_failure();
        assert_eq!(failure.kind(), FailureKind::Other);
        assert_eq!(failure.status_code(), None);
    }
}
