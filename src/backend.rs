//! The request dispatcher: one POST per user action.
//!
//! [`BrochureBackend`] is the seam between the controller and the network.
//! [`HttpBackend`] is the real implementation on top of reqwest; tests and
//! embedders can supply their own through
//! [`crate::config::ClientConfigBuilder::backend`].
//!
//! Every failure is classified into one of the request variants of
//! [`BrochureError`]: transport problems become `NetworkFailure` or `Timeout`,
//! non-2xx statuses become `ServerError`, and a 2xx body that does not parse
//! into the expected object becomes `InvalidResponseShape`.

use crate::error::BrochureError;
use crate::model::{BrochureRequest, BrochureResponse, SummariseRequest, SummaryResponse};
use crate::state::RequestKind;
use futures::future::BoxFuture;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest slice of an error body kept in [`BrochureError::ServerError`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// A brochure backend.
pub trait BrochureBackend: Send + Sync {
    /// `POST /brochure`
    fn generate_brochure<'a>(
        &'a self,
        request: &'a BrochureRequest,
    ) -> BoxFuture<'a, Result<BrochureResponse, BrochureError>>;

    /// `POST /summarise`
    fn summarise<'a>(
        &'a self,
        request: &'a SummariseRequest,
    ) -> BoxFuture<'a, Result<SummaryResponse, BrochureError>>;
}

/// JSON-over-HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    timeout_secs: u64,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url`.
    ///
    /// `timeout_secs == 0` disables the request timeout.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, BrochureError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| BrochureError::InvalidConfig(format!("base URL '{base_url}': {e}")))?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| BrochureError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            timeout_secs,
        })
    }

    /// Absolute URL of the endpoint for `kind`.
    pub fn endpoint(&self, kind: RequestKind) -> Result<Url, BrochureError> {
        self.base
            .join(kind.path())
            .map_err(|e| BrochureError::InvalidConfig(format!("endpoint '{}': {e}", kind.path())))
    }

    async fn post_json<B, R>(&self, kind: RequestKind, body: &B) -> Result<R, BrochureError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(kind)?;
        let endpoint = url.to_string();
        let payload = serde_json::to_vec(body)
            .map_err(|e| BrochureError::Internal(format!("serialise {kind} request: {e}")))?;

        info!("POST {} ({} bytes)", endpoint, payload.len());
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(&endpoint, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&endpoint, e))?;
        debug!(
            "{} answered {} with {} bytes in {:?}",
            endpoint,
            status,
            bytes.len(),
            start.elapsed()
        );

        if !status.is_success() {
            let body = truncate(String::from_utf8_lossy(&bytes).trim(), MAX_ERROR_BODY_CHARS);
            warn!("{} returned HTTP {}", endpoint, status);
            return Err(BrochureError::ServerError {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| BrochureError::InvalidResponseShape {
            endpoint,
            detail: e.to_string(),
        })
    }

    fn transport_error(&self, endpoint: &str, e: reqwest::Error) -> BrochureError {
        if e.is_timeout() {
            BrochureError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            BrochureError::NetworkFailure {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl BrochureBackend for HttpBackend {
    fn generate_brochure<'a>(
        &'a self,
        request: &'a BrochureRequest,
    ) -> BoxFuture<'a, Result<BrochureResponse, BrochureError>> {
        Box::pin(self.post_json(RequestKind::Brochure, request))
    }

    fn summarise<'a>(
        &'a self,
        request: &'a SummariseRequest,
    ) -> BoxFuture<'a, Result<SummaryResponse, BrochureError>> {
        Box::pin(self.post_json(RequestKind::Summary, request))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}
