//! Configuration types for the brochure controller.
//!
//! Everything the controller needs beyond the form fields lives in
//! [`ClientConfig`], built through [`ClientConfigBuilder`]. The defaults talk to
//! a backend on `http://127.0.0.1:8000` and export to `brochure.pdf`.

use crate::backend::BrochureBackend;
use crate::error::BrochureError;
use crate::progress::ControllerObserver;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default backend origin.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default name of the exported document.
pub const DEFAULT_PDF_FILE_NAME: &str = "brochure.pdf";

/// Configuration for a [`crate::controller::BrochureController`].
///
/// # Example
/// ```rust
/// use site_brochure::{ClientConfig, Language};
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:9000")
///     .timeout_secs(30)
///     .default_language(Language::Spanish)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend origin. `/brochure` and `/summarise` are resolved against it.
    pub base_url: String,

    /// Per-request timeout in seconds. `0` waits forever. Default: 120.
    ///
    /// Brochure generation scrapes several pages and makes more than one LLM
    /// call on the backend, so it routinely takes tens of seconds.
    pub timeout_secs: u64,

    /// Language selected when the form is first shown. Default: English.
    pub default_language: Language,

    /// File name used when exporting without an explicit path.
    pub pdf_file_name: String,

    /// Optional line printed at the bottom of every exported page.
    pub pdf_footer: Option<String>,

    /// TrueType/OpenType font used for every text run of the export.
    ///
    /// Needed for non-Latin brochures (e.g. Hindi); the built-in PDF fonts
    /// only cover Latin text.
    pub pdf_font: Option<PathBuf>,

    /// Pre-constructed backend. Takes precedence over `base_url`.
    pub backend: Option<Arc<dyn BrochureBackend>>,

    /// Receives request and export events.
    pub observer: Option<Arc<dyn ControllerObserver>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 120,
            default_language: Language::default(),
            pdf_file_name: DEFAULT_PDF_FILE_NAME.to_string(),
            pdf_footer: None,
            pdf_font: None,
            backend: None,
            observer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("default_language", &self.default_language)
            .field("pdf_file_name", &self.pdf_file_name)
            .field("pdf_footer", &self.pdf_footer)
            .field("pdf_font", &self.pdf_font)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn BrochureBackend>"))
            .field("observer", &self.observer.as_ref().map(|_| "<dyn ControllerObserver>"))
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn default_language(mut self, lang: Language) -> Self {
        self.config.default_language = lang;
        self
    }

    pub fn pdf_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.pdf_file_name = name.into();
        self
    }

    pub fn pdf_footer(mut self, footer: impl Into<String>) -> Self {
        let footer = footer.into();
        self.config.pdf_footer = (!footer.trim().is_empty()).then_some(footer);
        self
    }

    pub fn pdf_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdf_font = Some(path.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn BrochureBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ControllerObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, BrochureError> {
        let c = &self.config;
        if c.backend.is_none() {
            let url = Url::parse(&c.base_url).map_err(|e| {
                BrochureError::InvalidConfig(format!("base URL '{}': {}", c.base_url, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(BrochureError::InvalidConfig(format!(
                    "base URL must be http or https, got '{}'",
                    url.scheme()
                )));
            }
        }
        if c.pdf_file_name.trim().is_empty() {
            return Err(BrochureError::InvalidConfig(
                "PDF file name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Languages offered by the form selector.
///
/// The selected code is sent verbatim as `lang`; whether the backend
/// translates is its own business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    /// Every selectable language, in menu order.
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Spanish];

    /// The code sent to the backend.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Spanish => "es",
        }
    }

    /// Display name shown in the selector.
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Spanish => "Spanish",
        }
    }

    /// Look a language up by its code. Case-insensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.base_url, "http://127.0.0.1:8000");
        assert_eq!(c.pdf_file_name, "brochure.pdf");
        assert_eq!(c.default_language, Language::English);
        assert!(c.backend.is_none());
    }

    #[test]
    fn build_rejects_unparseable_base_url() {
        let err = ClientConfig::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, BrochureError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_non_http_scheme() {
        let err = ClientConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn blank_footer_is_dropped() {
        let c = ClientConfig::builder().pdf_footer("   ").build().unwrap();
        assert!(c.pdf_footer.is_none());
        let c = ClientConfig::builder().pdf_footer("Acme").build().unwrap();
        assert_eq!(c.pdf_footer.as_deref(), Some("Acme"));
    }

    #[test]
    fn language_codes_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("ES"), Some(Language::Spanish));
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    fn language_serialises_as_code() {
        assert_eq!(serde_json::to_string(&Language::Hindi).unwrap(), r#""hi""#);
    }
}
