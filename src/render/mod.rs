//! Rendering stages for the brochure preview and its export.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌──▶ html   ──▶ preview (HTML string)
//! markdown ──┤
//!            └──▶ layout ──▶ pdf ──▶ brochure.pdf bytes
//! ```
//!
//! 1. [`html`]   — CommonMark + GFM to HTML; the live preview
//! 2. [`layout`] — the same parse flattened into printable blocks
//! 3. [`pdf`]    — lay blocks out on US-Letter pages with printpdf
//!
//! Every stage is a pure function of its input.

pub mod html;
pub mod layout;
pub mod pdf;
