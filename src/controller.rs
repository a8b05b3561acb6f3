//! The brochure page controller.
//!
//! [`BrochureController`] owns the [`PageState`] and is the only thing that
//! changes it. Form input, request dispatch, preview edits and export all go
//! through its methods, which map one-to-one onto user actions:
//!
//! | User action              | Method                                   |
//! |--------------------------|------------------------------------------|
//! | type URL / title         | [`set_url`] / [`set_title`]              |
//! | pick a language          | [`set_language`]                         |
//! | press "Generate"         | [`generate_brochure`]                    |
//! | press "Summarise"        | [`summarise`]                            |
//! | type in the editor       | [`edit_markdown`]                        |
//! | press "Download PDF"     | [`export_pdf`] / [`export_to_file`]      |
//!
//! [`set_url`]: BrochureController::set_url
//! [`set_title`]: BrochureController::set_title
//! [`set_language`]: BrochureController::set_language
//! [`generate_brochure`]: BrochureController::generate_brochure
//! [`summarise`]: BrochureController::summarise
//! [`edit_markdown`]: BrochureController::edit_markdown
//! [`export_pdf`]: BrochureController::export_pdf
//! [`export_to_file`]: BrochureController::export_to_file
//!
//! All methods take `&self`. The state sits behind a mutex that is only held
//! for the duration of a transition and never across an `.await`, so a
//! brochure and a summary request can be awaited together.
//!
//! ## Loading flags
//!
//! Each dispatched request is wrapped in an [`InFlight`] guard. The guard
//! settles the request exactly once: with the response, with the error, or,
//! if the future is dropped before either, by abandoning it. Whichever way
//! the request ends, its loading flag is clear afterwards.

use crate::backend::{BrochureBackend, HttpBackend};
use crate::config::{ClientConfig, Language};
use crate::error::BrochureError;
use crate::export::{self, ExportSource};
use crate::model::Preview;
use crate::render::html::render_html;
use crate::state::{PageState, RequestKind, RequestTicket};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns the page state and drives every user action.
pub struct BrochureController {
    state: Mutex<PageState>,
    backend: Arc<dyn BrochureBackend>,
    config: ClientConfig,
}

impl BrochureController {
    /// Create a controller with an empty form.
    ///
    /// Uses `config.backend` when set, otherwise an [`HttpBackend`] rooted
    /// at `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, BrochureError> {
        let backend: Arc<dyn BrochureBackend> = match config.backend {
            Some(ref backend) => Arc::clone(backend),
            None => Arc::new(HttpBackend::new(&config.base_url, config.timeout_secs)?),
        };

        Ok(Self {
            state: Mutex::new(PageState::new(config.default_language)),
            backend,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A copy of the current page state.
    pub fn snapshot(&self) -> PageState {
        self.state().clone()
    }

    // ── Form input ───────────────────────────────────────────────────────

    pub fn set_url(&self, url: impl Into<String>) {
        self.state().set_url(url);
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state().set_title(title);
    }

    pub fn set_language(&self, language: Language) {
        self.state().set_language(language);
    }

    /// Whether the "Generate" control is enabled.
    pub fn can_submit_brochure(&self) -> bool {
        self.state().can_submit(RequestKind::Brochure)
    }

    /// Whether the "Summarise" control is enabled.
    pub fn can_summarise(&self) -> bool {
        self.state().can_submit(RequestKind::Summary)
    }

    pub fn is_loading(&self, kind: RequestKind) -> bool {
        self.state().is_loading(kind)
    }

    pub fn markdown(&self) -> String {
        self.state().markdown().to_string()
    }

    pub fn summary(&self) -> String {
        self.state().summary().to_string()
    }

    // ── Requests ─────────────────────────────────────────────────────────

    /// Submit the form to `POST /brochure` and store the returned markdown.
    ///
    /// Refused without a network call when the URL is empty or a brochure
    /// request is already loading. Any previously held markdown is cleared
    /// as soon as the request starts.
    pub async fn generate_brochure(&self) -> Result<String, BrochureError> {
        let (ticket, request) = {
            let mut state = self.state();
            let ticket = state.begin(RequestKind::Brochure)?;
            (ticket, state.brochure_request())
        };
        let guard = InFlight::new(self, ticket);
        info!(
            "Generating brochure for '{}' (title: {:?}, lang: {})",
            request.url, request.title, request.lang
        );
        self.notify_start(RequestKind::Brochure);

        let start = Instant::now();
        let result = self
            .backend
            .generate_brochure(&request)
            .await
            .map(|r| r.markdown);
        debug!("Brochure request settled in {:?}", start.elapsed());
        self.settle(guard, result)
    }

    /// Submit the URL to `POST /summarise` and store the returned summary.
    pub async fn summarise(&self) -> Result<String, BrochureError> {
        let (ticket, request) = {
            let mut state = self.state();
            let ticket = state.begin(RequestKind::Summary)?;
            (ticket, state.summarise_request())
        };
        let guard = InFlight::new(self, ticket);
        info!("Summarising '{}'", request.url);
        self.notify_start(RequestKind::Summary);

        let start = Instant::now();
        let result = self.backend.summarise(&request).await.map(|r| r.summary);
        debug!("Summary request settled in {:?}", start.elapsed());
        self.settle(guard, result)
    }

    fn settle(
        &self,
        guard: InFlight<'_>,
        result: Result<String, BrochureError>,
    ) -> Result<String, BrochureError> {
        let kind = guard.ticket.kind;
        match result {
            Ok(text) => {
                let len = text.len();
                if !guard.complete(text.clone()) {
                    debug!("Discarding stale {} response", kind);
                    return Err(BrochureError::Superseded { kind });
                }
                info!("{} request complete ({} bytes)", kind, len);
                if let Some(ref o) = self.config.observer {
                    o.on_request_complete(kind, len);
                }
                Ok(text)
            }
            Err(e) => {
                warn!("{} request failed: {}", kind, e);
                if guard.fail(&e) {
                    if let Some(ref o) = self.config.observer {
                        o.on_request_error(kind, &e.to_string());
                    }
                }
                Err(e)
            }
        }
    }

    fn notify_start(&self, kind: RequestKind) {
        if let Some(ref o) = self.config.observer {
            o.on_request_start(kind);
        }
    }

    // ── Preview ──────────────────────────────────────────────────────────

    /// Replace the markdown source with edited text.
    ///
    /// The editor only exists while a preview is mounted, so an edit with no
    /// markdown present is ignored and `false` is returned. Never touches
    /// the network.
    pub fn edit_markdown(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        {
            let mut state = self.state();
            if !state.has_preview() {
                return false;
            }
            state.edit_markdown(text.as_str());
        }
        if let Some(ref o) = self.config.observer {
            o.on_markdown_edited(text.len());
        }
        true
    }

    /// The current source and its rendered HTML, or `None` when unmounted.
    pub fn preview(&self) -> Option<Preview> {
        let markdown = {
            let state = self.state();
            if !state.has_preview() {
                return None;
            }
            state.markdown().to_string()
        };
        let html = render_html(&markdown);
        Some(Preview { markdown, html })
    }

    // ── Export ───────────────────────────────────────────────────────────

    /// Convert the current preview to PDF bytes.
    ///
    /// `Ok(None)` when no preview is mounted; no conversion happens then.
    pub fn export_pdf(&self) -> Result<Option<Vec<u8>>, BrochureError> {
        let bytes = export::export_pdf(&self.export_source())?;
        if let (Some(b), Some(o)) = (&bytes, &self.config.observer) {
            o.on_export_complete(b.len());
        }
        Ok(bytes)
    }

    /// Export the current preview to `path`, or to the configured file name
    /// (`brochure.pdf`) in the working directory.
    ///
    /// Returns the path written, or `None` when no preview is mounted.
    pub async fn export_to_file(
        &self,
        path: Option<&Path>,
    ) -> Result<Option<PathBuf>, BrochureError> {
        let target = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.pdf_file_name));
        match export::export_to_file(self.export_source(), target.clone()).await? {
            Some(len) => {
                if let Some(ref o) = self.config.observer {
                    o.on_export_complete(len);
                }
                Ok(Some(target))
            }
            None => Ok(None),
        }
    }

    fn export_source(&self) -> ExportSource {
        let state = self.state();
        ExportSource {
            markdown: state.markdown().to_string(),
            title: state.title().to_string(),
            url: state.url().trim().to_string(),
            footer: self.config.pdf_footer.clone(),
            font: self.config.pdf_font.clone(),
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Lock the state. Transitions never panic midway, so a poisoned lock
    /// still guards a consistent state.
    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles one in-flight request; abandons it on drop if nothing else did.
struct InFlight<'a> {
    controller: &'a BrochureController,
    ticket: RequestTicket,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(controller: &'a BrochureController, ticket: RequestTicket) -> Self {
        Self {
            controller,
            ticket,
            settled: false,
        }
    }

    fn complete(mut self, text: String) -> bool {
        self.settled = true;
        self.controller.state().complete(self.ticket, text)
    }

    fn fail(mut self, error: &BrochureError) -> bool {
        self.settled = true;
        self.controller.state().fail(self.ticket, error)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled && self.controller.state().abandon(self.ticket) {
            warn!("{} request abandoned before completion", self.ticket.kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BrochureRequest, BrochureResponse, SummariseRequest, SummaryResponse};
    use crate::progress::ControllerObserver;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every brochure request with `# Hello` and counts calls.
    #[derive(Default)]
    struct Canned {
        calls: AtomicUsize,
        fail: bool,
    }

    impl BrochureBackend for Canned {
        fn generate_brochure<'a>(
            &'a self,
            _request: &'a BrochureRequest,
        ) -> BoxFuture<'a, Result<BrochureResponse, BrochureError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(BrochureError::NetworkFailure {
                        endpoint: "mock".into(),
                        reason: "connection refused".into(),
                    })
                } else {
                    Ok(BrochureResponse {
                        markdown: "# Hello".into(),
                    })
                }
            })
        }

        fn summarise<'a>(
            &'a self,
            _request: &'a SummariseRequest,
        ) -> BoxFuture<'a, Result<SummaryResponse, BrochureError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                Ok(SummaryResponse {
                    summary: "short".into(),
                })
            })
        }
    }

    fn controller(backend: Arc<Canned>) -> BrochureController {
        let config = ClientConfig::builder().backend(backend).build().unwrap();
        BrochureController::new(config).unwrap()
    }

    #[tokio::test]
    async fn empty_url_never_dispatches() {
        let backend = Arc::new(Canned::default());
        let c = controller(Arc::clone(&backend));
        assert!(!c.can_submit_brochure());
        assert!(matches!(
            c.generate_brochure().await,
            Err(BrochureError::EmptyUrl)
        ));
        assert!(matches!(c.summarise().await, Err(BrochureError::EmptyUrl)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_stores_markdown_and_clears_flag() {
        let c = controller(Arc::new(Canned::default()));
        c.set_url("example.com");
        assert_eq!(c.generate_brochure().await.unwrap(), "# Hello");
        assert_eq!(c.markdown(), "# Hello");
        assert!(!c.is_loading(RequestKind::Brochure));
        assert_eq!(c.preview().unwrap().html, "<h1>Hello</h1>\n");
    }

    #[tokio::test]
    async fn failure_clears_flag_and_records_error() {
        let c = controller(Arc::new(Canned {
            fail: true,
            ..Canned::default()
        }));
        c.set_url("example.com");
        let err = c.generate_brochure().await.unwrap_err();
        assert!(err.is_request_failure());
        let s = c.snapshot();
        assert!(!s.is_loading(RequestKind::Brochure));
        assert!(s.last_error(RequestKind::Brochure).is_some());
        assert!(c.preview().is_none());
    }

    #[tokio::test]
    async fn edits_rerender_without_network() {
        let backend = Arc::new(Canned::default());
        let c = controller(Arc::clone(&backend));
        assert!(!c.edit_markdown("# ignored"), "no editor before a preview");

        c.set_url("example.com");
        c.generate_brochure().await.unwrap();
        let calls = backend.calls.load(Ordering::SeqCst);

        assert!(c.edit_markdown("## Edited"));
        assert_eq!(c.preview().unwrap().html, "<h2>Edited</h2>\n");
        assert_eq!(backend.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn summary_is_independent_of_markdown() {
        let c = controller(Arc::new(Canned::default()));
        c.set_url("example.com");
        assert_eq!(c.summarise().await.unwrap(), "short");
        assert_eq!(c.summary(), "short");
        assert!(c.markdown().is_empty());
    }

    #[derive(Default)]
    struct Events {
        starts: AtomicUsize,
        completes: AtomicUsize,
        edits: AtomicUsize,
    }

    impl ControllerObserver for Events {
        fn on_request_start(&self, _kind: RequestKind) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_request_complete(&self, _kind: RequestKind, _text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_markdown_edited(&self, _len: usize) {
            self.edits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn observer_hears_requests_and_edits() {
        let events = Arc::new(Events::default());
        let config = ClientConfig::builder()
            .backend(Arc::new(Canned::default()))
            .observer(events.clone())
            .build()
            .unwrap();
        let c = BrochureController::new(config).unwrap();
        c.set_url("example.com");

        tokio_test::block_on(c.generate_brochure()).unwrap();
        assert!(c.edit_markdown("# Edited"));

        assert_eq!(events.starts.load(Ordering::SeqCst), 1);
        assert_eq!(events.completes.load(Ordering::SeqCst), 1);
        assert_eq!(events.edits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_success_is_not_reported_as_stored() {
        let c = controller(Arc::new(Canned::default()));
        c.set_url("example.com");
        let ticket = c.state().begin(RequestKind::Brochure).unwrap();
        let guard = InFlight::new(&c, ticket);
        assert!(c.state().abandon(ticket));

        let result = c.settle(guard, Ok("# late".into()));
        assert!(matches!(
            result,
            Err(BrochureError::Superseded {
                kind: RequestKind::Brochure
            })
        ));
        assert!(c.markdown().is_empty());
        assert!(!c.is_loading(RequestKind::Brochure));
    }

    #[test]
    fn export_without_preview_is_none() {
        let c = controller(Arc::new(Canned::default()));
        assert!(c.export_pdf().unwrap().is_none());
    }
}
