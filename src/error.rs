//! Error types for the site-brochure library.
//!
//! Every failure the controller can observe is one variant of
//! [`BrochureError`]. The request variants fall into three groups that a
//! caller typically renders differently:
//!
//! * **Transport** — [`BrochureError::NetworkFailure`] and
//!   [`BrochureError::Timeout`]: the backend was never reached, or never
//!   answered in time.
//! * **Server** — [`BrochureError::ServerError`]: the backend answered with a
//!   non-2xx status.
//! * **Shape** — [`BrochureError::InvalidResponseShape`]: the backend answered
//!   2xx but the body is not the JSON object we asked for.
//!
//! Whatever the variant, the loading flag of the failed request is already
//! clear by the time the error reaches the caller.

use crate::state::RequestKind;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the site-brochure library.
#[derive(Debug, Error)]
pub enum BrochureError {
    // ── Submission errors ─────────────────────────────────────────────────
    /// The form was submitted without a URL.
    #[error("A website URL is required before submitting")]
    EmptyUrl,

    /// A request of the same kind is still loading.
    #[error("A {kind} request is already in flight")]
    RequestInFlight { kind: RequestKind },

    /// The response arrived after its request stopped being the current one
    /// for its kind, so it was not stored.
    #[error("The {kind} response was discarded because the request was superseded")]
    Superseded { kind: RequestKind },

    // ── Request errors ────────────────────────────────────────────────────
    /// The backend could not be reached or the body could not be read.
    #[error("Request to '{endpoint}' failed: {reason}\nIs the brochure backend running?")]
    NetworkFailure { endpoint: String, reason: String },

    /// The backend did not answer within the configured timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s\nIncrease --timeout.")]
    Timeout { endpoint: String, secs: u64 },

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status} for '{endpoint}': {body}")]
    ServerError {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The backend answered, but not with the expected JSON object.
    #[error("Unexpected response from '{endpoint}': {detail}")]
    InvalidResponseShape { endpoint: String, detail: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// PDF generation failed.
    #[error("PDF export failed: {0}")]
    ExportFailed(String),

    /// Could not create or write the exported file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrochureError {
    /// `true` for the failures that come back from a dispatched request
    /// (as opposed to a refused submission or a local export problem).
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            BrochureError::NetworkFailure { .. }
                | BrochureError::Timeout { .. }
                | BrochureError::ServerError { .. }
                | BrochureError::InvalidResponseShape { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_display() {
        let e = BrochureError::ServerError {
            endpoint: "http://127.0.0.1:8000/brochure".into(),
            status: 502,
            body: "bad gateway".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("502"), "got: {msg}");
        assert!(msg.contains("bad gateway"), "got: {msg}");
    }

    #[test]
    fn in_flight_display_names_kind() {
        let e = BrochureError::RequestInFlight {
            kind: RequestKind::Summary,
        };
        assert!(e.to_string().contains("summary"));
    }

    #[test]
    fn timeout_display() {
        let e = BrochureError::Timeout {
            endpoint: "http://localhost/summarise".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn request_failure_classification() {
        assert!(BrochureError::InvalidResponseShape {
            endpoint: "x".into(),
            detail: "missing field".into(),
        }
        .is_request_failure());
        assert!(!BrochureError::EmptyUrl.is_request_failure());
        assert!(!BrochureError::Superseded {
            kind: RequestKind::Brochure
        }
        .is_request_failure());
        assert!(!BrochureError::ExportFailed("boom".into()).is_request_failure());
    }
}
