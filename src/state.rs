//! The page state and its transitions.
//!
//! [`PageState`] is the single owner of everything the brochure page shows:
//! the three form fields, the returned markdown and summary, and one loading
//! flag per request kind. Fields are private; the only way to change them is
//! through the transition methods below, which is what keeps the loading
//! flags honest.
//!
//! ## Request lifecycle
//!
//! ```text
//!            begin()                complete() / fail()
//!   idle ───────────────▶ loading ─────────────────────▶ idle
//!     ▲                      │
//!     └──────────────────────┘
//!            abandon()  (future dropped)
//! ```
//!
//! `begin` hands out a [`RequestTicket`] carrying the generation of the new
//! request. `complete`, `fail` and `abandon` only act when the ticket is
//! still the current in-flight one, so a late answer can never clobber the
//! flag or text of a newer request.

use crate::config::Language;
use crate::error::BrochureError;
use crate::model::{BrochureRequest, SummariseRequest};
use serde::Serialize;
use std::fmt;

/// The two independent kinds of request the page can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// `POST /brochure`
    Brochure,
    /// `POST /summarise`
    Summary,
}

impl RequestKind {
    /// Endpoint path relative to the backend origin.
    pub fn path(self) -> &'static str {
        match self {
            RequestKind::Brochure => "brochure",
            RequestKind::Summary => "summarise",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Brochure => "brochure",
            RequestKind::Summary => "summary",
        })
    }
}

/// Identifies one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub generation: u64,
}

/// Everything the brochure page holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageState {
    url: String,
    title: String,
    language: Language,
    markdown: String,
    summary: String,
    loading_brochure: bool,
    loading_summary: bool,
    brochure_error: Option<String>,
    summary_error: Option<String>,
    #[serde(skip)]
    brochure_generation: u64,
    #[serde(skip)]
    summary_generation: u64,
}

impl PageState {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn is_loading(&self, kind: RequestKind) -> bool {
        match kind {
            RequestKind::Brochure => self.loading_brochure,
            RequestKind::Summary => self.loading_summary,
        }
    }

    /// Message of the last failed request of `kind`, cleared on its next success.
    pub fn last_error(&self, kind: RequestKind) -> Option<&str> {
        match kind {
            RequestKind::Brochure => self.brochure_error.as_deref(),
            RequestKind::Summary => self.summary_error.as_deref(),
        }
    }

    /// The preview is mounted whenever there is markdown to show.
    pub fn has_preview(&self) -> bool {
        !self.markdown.is_empty()
    }

    /// Whether the trigger control for `kind` is enabled.
    pub fn can_submit(&self, kind: RequestKind) -> bool {
        !self.url.trim().is_empty() && !self.is_loading(kind)
    }

    // ── Form input ───────────────────────────────────────────────────────

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Replace the markdown source with user-edited text.
    pub fn edit_markdown(&mut self, text: impl Into<String>) {
        self.markdown = text.into();
    }

    // ── Request bodies ───────────────────────────────────────────────────

    pub fn brochure_request(&self) -> BrochureRequest {
        BrochureRequest {
            url: self.url.trim().to_string(),
            title: self.title.clone(),
            lang: self.language.code().to_string(),
        }
    }

    pub fn summarise_request(&self) -> SummariseRequest {
        SummariseRequest {
            url: self.url.trim().to_string(),
        }
    }

    // ── Request transitions ──────────────────────────────────────────────

    /// Mark a new request of `kind` as in flight.
    ///
    /// Refused when the URL is empty or a request of the same kind is
    /// already loading. Starting a brochure request unmounts the preview.
    pub fn begin(&mut self, kind: RequestKind) -> Result<RequestTicket, BrochureError> {
        if self.url.trim().is_empty() {
            return Err(BrochureError::EmptyUrl);
        }
        if self.is_loading(kind) {
            return Err(BrochureError::RequestInFlight { kind });
        }

        let generation = match kind {
            RequestKind::Brochure => {
                self.markdown.clear();
                self.brochure_error = None;
                self.loading_brochure = true;
                self.brochure_generation += 1;
                self.brochure_generation
            }
            RequestKind::Summary => {
                self.summary_error = None;
                self.loading_summary = true;
                self.summary_generation += 1;
                self.summary_generation
            }
        };
        Ok(RequestTicket { kind, generation })
    }

    /// `true` while `ticket` is the request currently loading for its kind.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        let generation = match ticket.kind {
            RequestKind::Brochure => self.brochure_generation,
            RequestKind::Summary => self.summary_generation,
        };
        self.is_loading(ticket.kind) && generation == ticket.generation
    }

    /// Store the response text and clear the loading flag.
    ///
    /// Returns `false` (and changes nothing) for a stale ticket.
    pub fn complete(&mut self, ticket: RequestTicket, text: String) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match ticket.kind {
            RequestKind::Brochure => {
                self.markdown = text;
                self.brochure_error = None;
            }
            RequestKind::Summary => {
                self.summary = text;
                self.summary_error = None;
            }
        }
        self.clear_loading(ticket.kind);
        true
    }

    /// Record the failure and clear the loading flag.
    pub fn fail(&mut self, ticket: RequestTicket, error: &BrochureError) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let message = Some(error.to_string());
        match ticket.kind {
            RequestKind::Brochure => self.brochure_error = message,
            RequestKind::Summary => self.summary_error = message,
        }
        self.clear_loading(ticket.kind);
        true
    }

    /// Clear the loading flag of a request that will never finish.
    pub fn abandon(&mut self, ticket: RequestTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.clear_loading(ticket.kind);
        true
    }

    fn clear_loading(&mut self, kind: RequestKind) {
        match kind {
            RequestKind::Brochure => self.loading_brochure = false,
            RequestKind::Summary => self.loading_summary = false,
        }
    }
}
