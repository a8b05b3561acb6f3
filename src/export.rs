//! The export action: rendered preview → `brochure.pdf`.
//!
//! Export reads whatever the preview currently shows, edits included. When
//! there is nothing to show the action does nothing and returns `None`.

use crate::error::BrochureError;
use crate::render::layout;
use crate::render::pdf::{self, PdfOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A snapshot of everything the export needs, detached from the page state
/// so conversion can run off the async executor.
#[derive(Debug, Clone, Default)]
pub struct ExportSource {
    pub markdown: String,
    pub title: String,
    pub url: String,
    pub footer: Option<String>,
    /// TrueType/OpenType font file used instead of the built-in fonts.
    pub font: Option<PathBuf>,
}

impl ExportSource {
    /// The preview is mounted only while there is markdown.
    pub fn is_mounted(&self) -> bool {
        !self.markdown.is_empty()
    }
}

/// Convert the preview to PDF bytes, or `None` when no preview is mounted.
pub fn export_pdf(source: &ExportSource) -> Result<Option<Vec<u8>>, BrochureError> {
    if !source.is_mounted() {
        debug!("Export skipped: no preview mounted");
        return Ok(None);
    }

    let font = source.font.as_deref().map(read_font).transpose()?;
    let blocks = layout::blocks(&source.markdown);
    let options = PdfOptions {
        title: &source.title,
        url: &source.url,
        footer: source.footer.as_deref(),
        font: font.as_deref(),
    };
    let bytes = pdf::render_pdf(&blocks, &options)?;
    info!("Exported {} blocks to {} PDF bytes", blocks.len(), bytes.len());
    Ok(Some(bytes))
}

fn read_font(path: &Path) -> Result<Vec<u8>, BrochureError> {
    std::fs::read(path)
        .map_err(|e| BrochureError::ExportFailed(format!("font '{}': {e}", path.display())))
}

/// Write `bytes` to `path` atomically: temp file in the same directory, then
/// rename. A failure never leaves a half-written file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BrochureError> {
    let write_err = |source: std::io::Error| BrochureError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Export and write to `path` on the blocking pool.
///
/// Returns `Ok(None)` without touching the file system when no preview is
/// mounted, otherwise the number of bytes written.
pub async fn export_to_file(
    source: ExportSource,
    path: PathBuf,
) -> Result<Option<usize>, BrochureError> {
    tokio::task::spawn_blocking(move || {
        let Some(bytes) = export_pdf(&source)? else {
            return Ok(None);
        };
        write_atomic(&path, &bytes)?;
        info!("Wrote {}", path.display());
        Ok(Some(bytes.len()))
    })
    .await
    .map_err(|e| BrochureError::Internal(format!("Export task panicked: {e}")))?
}
