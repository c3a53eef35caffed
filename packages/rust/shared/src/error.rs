//! Error types for SalarySignal.
//!
//! Library crates use [`SalarySignalError`] via `thiserror`.
//! The CLI wraps this with `color-eyre`; the HTTP API maps it to a status
//! code through [`SalarySignalError::status_code`].
//!
//! "No verified salary found" is *not* an error: it is a
//! regular outcome carried by the pipeline result types.

use std::path::PathBuf;

/// Top-level error type for all SalarySignal operations.
#[derive(Debug, thiserror::Error)]
pub enum SalarySignalError {
    /// Configuration error, typically a missing credential.
    #[error("config error: {message}")]
    Config { message: String },

    /// The inbound request is missing a required field.
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// An upstream call exceeded its time budget.
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    /// An upstream collaborator answered with a non-success status.
    #[error("upstream error{}: {message}", status_suffix(.status))]
    Upstream { status: Option<u16>, message: String },

    /// Transport failure before any response was received.
    #[error("network error: {0}")]
    Network(String),

    /// An upstream collaborator answered with a body we cannot use.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// Local parsing error (config, fixtures, payloads we produced).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Longest upstream error body echoed into an error message.
const MAX_ERROR_BODY: usize = 300;

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SalarySignalError>;

impl SalarySignalError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a bad-request error from any displayable message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>, after_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after_ms,
        }
    }

    /// A request that failed before any response arrived. Timeouts stay
    /// timeouts so the cascades can downgrade on them.
    pub fn transport(
        operation: &str,
        after_ms: u64,
        timed_out: bool,
        detail: impl std::fmt::Display,
    ) -> Self {
        if timed_out {
            Self::timeout(operation, after_ms)
        } else {
            Self::Network(format!("{operation}: {detail}"))
        }
    }

    /// A response body that could not be read or decoded. A body that stalls
    /// past the deadline is a timeout like any other.
    pub fn decode(
        operation: &str,
        after_ms: u64,
        timed_out: bool,
        detail: impl std::fmt::Display,
    ) -> Self {
        if timed_out {
            Self::timeout(operation, after_ms)
        } else {
            Self::InvalidResponse(format!("{operation}: {detail}"))
        }
    }

    /// A non-success status, keeping at most the first 300 characters of
    /// the body.
    pub fn upstream(status: u16, body: &str) -> Self {
        Self::Upstream {
            status: Some(status),
            message: truncate(body, MAX_ERROR_BODY),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a timeout (the only error that triggers a
    /// model downgrade).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// HTTP-like status code reported to callers.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::Config { .. } | Self::Parse { .. } | Self::Io { .. } => 500,
            Self::Network(_) | Self::InvalidResponse(_) => 502,
            Self::Upstream { status, .. } => status.unwrap_or(502),
            Self::Timeout { .. } => 504,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SalarySignalError::config("Missing SERPER_API_KEY");
        assert_eq!(err.to_string(), "config error: Missing SERPER_API_KEY");

        let err = SalarySignalError::timeout("serper search", 6000);
        assert_eq!(err.to_string(), "serper search timed out after 6000ms");

        let err = SalarySignalError::Upstream {
            status: Some(429),
            message: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "upstream error (HTTP 429): rate limited");
    }

    #[test]
    fn status_codes() {
        assert_eq!(SalarySignalError::bad_request("Missing role").status_code(), 400);
        assert_eq!(SalarySignalError::config("no key").status_code(), 500);
        assert_eq!(SalarySignalError::InvalidResponse("empty".into()).status_code(), 502);
        assert_eq!(SalarySignalError::timeout("llm", 3000).status_code(), 504);
        let upstream = SalarySignalError::Upstream {
            status: Some(401),
            message: "unauthorized".into(),
        };
        assert_eq!(upstream.status_code(), 401);
        let unknown = SalarySignalError::Upstream {
            status: None,
            message: "?".into(),
        };
        assert_eq!(unknown.status_code(), 502);
    }

    #[test]
    fn transport_and_decode_share_the_timeout_mapping() {
        for err in [
            SalarySignalError::transport("serper search", 6000, true, "deadline"),
            SalarySignalError::decode("serper search", 6000, true, "deadline"),
        ] {
            assert!(err.is_timeout());
            assert_eq!(err.status_code(), 504);
        }
        let err = SalarySignalError::transport("gemini", 3000, false, "connection reset");
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.to_string(), "network error: gemini: connection reset");

        let err = SalarySignalError::decode("gemini", 3000, false, "expected value");
        assert!(matches!(err, SalarySignalError::InvalidResponse(_)));
    }

    #[test]
    fn upstream_bodies_are_truncated() {
        let err = SalarySignalError::upstream(500, &"x".repeat(400));
        let SalarySignalError::Upstream { status, message } = &err else {
            panic!("expected upstream error");
        };
        assert_eq!(*status, Some(500));
        assert_eq!(message.chars().count(), 301);
        assert!(message.ends_with('…'));

        let err = SalarySignalError::upstream(403, "Unauthorized.");
        assert_eq!(err.to_string(), "upstream error (HTTP 403): Unauthorized.");
    }

    #[test]
    fn only_timeouts_are_timeouts() {
        assert!(SalarySignalError::timeout("x", 1).is_timeout());
        assert!(!SalarySignalError::Network("reset".into()).is_timeout());
    }
}
