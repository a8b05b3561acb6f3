//! Markdown to HTML for the live preview.
//!
//! The preview is re-rendered from the source on every edit, so this has to
//! stay a pure, allocation-light function. Raw HTML embedded in the markdown
//! is shown as text rather than injected into the preview.

use pulldown_cmark::{html, Event, Options, Parser};

/// Parser options shared by the preview and the PDF layout.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render `markdown` to an HTML fragment.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(&mut out, parser);
    out
}
