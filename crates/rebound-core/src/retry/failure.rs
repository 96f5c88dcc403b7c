//! Normalized failure descriptors
//!
//! The classifier never inspects transport-specific error types. Each error
//! type handed to the executor describes itself as a [`Failure`] through the
//! [`FailureSource`] trait.

use std::fmt;
use std::io;

/// Broad category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection-level failure: refused, reset, DNS, unreachable host
    Network,
    /// The operation exceeded its own deadline
    Timeout,
    /// The transport produced a response carrying an error status
    Status,
    /// The caller cancelled the operation
    Cancelled,
    /// Anything else
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Network => "network",
            FailureKind::Timeout => "timeout",
            FailureKind::Status => "status",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Machine-readable transport code attached to a failure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureCode {
    ConnectionRefused,
    ConnectionReset,
    ConnectionAborted,
    ConnectionTimedOut,
    DnsFailure,
    Other(String),
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCode::ConnectionRefused => f.write_str("connection-refused"),
            FailureCode::ConnectionReset => f.write_str("connection-reset"),
            FailureCode::ConnectionAborted => f.write_str("connection-aborted"),
            FailureCode::ConnectionTimedOut => f.write_str("connection-timed-out"),
            FailureCode::DnsFailure => f.write_str("dns-failure"),
            FailureCode::Other(code) => f.write_str(code),
        }
    }
}

/// Transport-agnostic view of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    message: String,
    kind: FailureKind,
    status: Option<u16>,
    code: Option<FailureCode>,
}

impl Failure {
    /// Create a failure of the given kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
            code: None,
        }
    }

    /// Connection-level failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    /// Deadline exceeded inside the operation
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    /// Error response carrying `status`
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Status, message).with_status(status)
    }

    /// Caller-initiated cancellation
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Cancelled, message)
    }

    /// Unclassified failure
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Other, message)
    }

    /// Attach a status code
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a transport code
    pub fn with_code(mut self, code: FailureCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    pub fn code(&self) -> Option<&FailureCode> {
        self.code.as_ref()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.code) {
            (Some(status), _) => write!(f, "{} (status {})", self.message, status),
            (None, Some(code)) => write!(f, "{} ({})", self.message, code),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Failure {}

/// Errors that can describe themselves as a [`Failure`]
///
/// Every error type passed through the retry executor implements this trait.
/// Adapters are responsible for mapping their transport errors faithfully.
pub trait FailureSource {
    /// Build the normalized failure view of this error
    fn to_failure(&self) -> Failure;
}

impl FailureSource for Failure {
    fn to_failure(&self) -> Failure {
        self.clone()
    }
}

impl FailureSource for io::Error {
    fn to_failure(&self) -> Failure {
        let message = self.to_string();
        match self.kind() {
            io::ErrorKind::ConnectionRefused => {
                Failure::network(message).with_code(FailureCode::ConnectionRefused)
            }
            io::ErrorKind::ConnectionReset => {
                Failure::network(message).with_code(FailureCode::ConnectionReset)
            }
            io::ErrorKind::ConnectionAborted => {
                Failure::other(message).with_code(FailureCode::ConnectionAborted)
            }
            io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable => Failure::network(message),
            io::ErrorKind::TimedOut => {
                Failure::timeout(message).with_code(FailureCode::ConnectionTimedOut)
            }
            _ => Failure::other(message),
        }
    }
}

impl<T: FailureSource + ?Sized> FailureSource for Box<T> {
    fn to_failure(&self) -> Failure {
        (**self).to_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_status() {
        let failure = Failure::status(503, "service unavailable");
        assert_eq!(failure.to_string(), "service unavailable (status 503)");
        assert_eq!(failure.kind(), FailureKind::Status);
        assert_eq!(failure.status_code(), Some(503));
    }

    #[test]
    fn test_display_includes_code() {
        let failure = Failure::network("connect failed").with_code(FailureCode::ConnectionRefused);
        assert_eq!(failure.to_string(), "connect failed (connection-refused)");
    }

    #[test]
    fn test_io_error_mapping() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(refused.to_failure().kind(), FailureKind::Network);
        assert_eq!(
            refused.to_failure().code(),
            Some(&FailureCode::ConnectionRefused)
        );

        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        assert_eq!(timed_out.to_failure().kind(), FailureKind::Timeout);

        let aborted = io::Error::new(io::ErrorKind::ConnectionAborted, "aborted");
        assert_eq!(aborted.to_failure().kind(), FailureKind::Other);
        assert_eq!(
            aborted.to_failure().code(),
            Some(&FailureCode::ConnectionAborted)
        );

        // EINTR is left to the policy, it is not a caller cancellation
        let interrupted = io::Error::new(io::ErrorKind::Interrupted, "signal");
        assert_eq!(interrupted.to_failure().kind(), FailureKind::Other);

        let not_found = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(not_found.to_failure().kind(), FailureKind::Other);
        assert_eq!(not_found.to_failure().message(), "missing");
    }
}
