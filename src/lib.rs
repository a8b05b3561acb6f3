//! # site-brochure
//!
//! Generate a marketing brochure for a website through a brochure backend,
//! edit the returned Markdown, and export it as `brochure.pdf`.
//!
//! The heavy lifting (scraping the site, asking an LLM to write the brochure)
//! happens on the backend. This crate is the client side of that exchange:
//! a form, a dispatcher, an editable preview and an exporter, tied together
//! by a [`BrochureController`] that owns the page state.
//!
//! ## Flow
//!
//! ```text
//! form (url, title, lang)
//!  │
//!  ├─ 1. Submit   POST /brochure  (and optionally POST /summarise)
//!  ├─ 2. Store    markdown / summary, loading flags cleared on every exit
//!  ├─ 3. Preview  pulldown-cmark → HTML, re-rendered on every edit
//!  └─ 4. Export   preview → printpdf → brochure.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use site_brochure::{BrochureController, ClientConfig, Language};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = BrochureController::new(ClientConfig::default())?;
//!     controller.set_url("https://example.com");
//!     controller.set_language(Language::Spanish);
//!
//!     let markdown = controller.generate_brochure().await?;
//!     println!("{markdown}");
//!
//!     controller.edit_markdown(format!("{markdown}\n\n_Reviewed._"));
//!     controller.export_to_file(None).await?; // ./brochure.pdf
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `brochure` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod model;
pub mod progress;
pub mod render;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{BrochureBackend, HttpBackend};
pub use config::{ClientConfig, ClientConfigBuilder, Language, DEFAULT_BASE_URL, DEFAULT_PDF_FILE_NAME};
pub use controller::BrochureController;
pub use error::BrochureError;
pub use export::{export_pdf, ExportSource};
pub use model::{BrochureRequest, BrochureResponse, Preview, SummariseRequest, SummaryResponse};
pub use progress::{ControllerObserver, NoopObserver, Observer};
pub use render::html::render_html;
pub use state::{PageState, RequestKind, RequestTicket};
