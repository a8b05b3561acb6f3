//! Wire types exchanged with the brochure backend.
//!
//! Requests are built fresh from the page state on every submission and are
//! never stored. Responses live only until their text is copied into
//! [`crate::state::PageState`].

use serde::{Deserialize, Serialize};

/// Body of `POST /brochure`.
///
/// `title` and `lang` are always serialised, even when the title is empty:
/// `{"url":"example.com","title":"","lang":"en"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrochureRequest {
    pub url: String,
    pub title: String,
    pub lang: String,
}

/// Body returned by `POST /brochure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrochureResponse {
    pub markdown: String,
}

/// Body of `POST /summarise`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummariseRequest {
    pub url: String,
}

/// Body returned by `POST /summarise`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// The current preview: the editable source and its rendered HTML.
///
/// Only exists while the markdown is non-empty, i.e. while the preview is
/// mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub markdown: String,
    pub html: String,
}
