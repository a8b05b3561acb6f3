//! CLI binary for site-brochure.
//!
//! A thin shim over the library crate: flags fill in the form, the
//! controller dispatches, and the result is printed and optionally exported.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use site_brochure::{
    BrochureController, ClientConfig, ControllerObserver, Language, Observer, PageState,
    RequestKind, DEFAULT_BASE_URL, DEFAULT_PDF_FILE_NAME,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Terminal loading indicator: one spinner that stays up while any request
/// is in flight and logs a line as each one settles.
struct SpinnerObserver {
    bar: ProgressBar,
    in_flight: AtomicUsize,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        Arc::new(Self {
            bar,
            in_flight: AtomicUsize::new(0),
        })
    }

    fn settle(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.bar.finish_and_clear();
        }
    }
}

impl ControllerObserver for SpinnerObserver {
    fn on_request_start(&self, kind: RequestKind) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.bar.reset_elapsed();
            self.bar.enable_steady_tick(Duration::from_millis(80));
        }
        self.bar.set_prefix("Loading");
        self.bar.set_message(match kind {
            RequestKind::Brochure => "generating brochure…",
            RequestKind::Summary => "summarising…",
        });
    }

    fn on_request_complete(&self, kind: RequestKind, text_len: usize) {
        self.bar.println(format!(
            "  {} {:<9} {}",
            green("✓"),
            kind.to_string(),
            dim(&format!("{text_len} chars")),
        ));
        self.settle();
    }

    fn on_request_error(&self, kind: RequestKind, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:<9} {}",
            red("✗"),
            kind.to_string(),
            red(first_line),
        ));
        self.settle();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a brochure and print the Markdown
  brochure -u https://example.com

  # Company name, Spanish, export to brochure.pdf
  brochure -u https://example.com --title "Example Inc" --lang es -o

  # Fetch the summary alongside the brochure
  brochure -u https://example.com --summary --json > result.json

  # Replace the generated text with an edited version before exporting
  brochure -u https://example.com --markdown-out draft.md
  brochure -u https://example.com --edit draft.md -o final.pdf

ENVIRONMENT VARIABLES:
  BROCHURE_BACKEND_URL   Backend origin (default http://127.0.0.1:8000)
  BROCHURE_TIMEOUT       Request timeout in seconds, 0 = none
  BROCHURE_PDF_FOOTER    Footer line on every exported page
  BROCHURE_PDF_FONT      TTF/OTF font for the export (needed for Hindi)
  RUST_LOG               Log filter, overrides --verbose / --quiet
"#;

/// Generate, edit and export website brochures.
#[derive(Parser, Debug)]
#[command(
    name = "brochure",
    version,
    about = "Generate, edit and export website brochures",
    long_about = "Send a website URL to a brochure backend, print the Markdown brochure it \
returns, optionally apply an edited version, and export the rendered preview to PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Website URL to build the brochure for.
    #[arg(short, long, env = "BROCHURE_URL")]
    url: String,

    /// Company name shown in the brochure.
    #[arg(short, long, default_value = "")]
    title: String,

    /// Brochure language.
    #[arg(short, long, value_enum, default_value = "en")]
    lang: LangArg,

    /// Backend origin.
    #[arg(long, env = "BROCHURE_BACKEND_URL", default_value = DEFAULT_BASE_URL)]
    backend: String,

    /// Request timeout in seconds (0 = wait forever).
    #[arg(long, env = "BROCHURE_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Also request a summary, concurrently with the brochure.
    #[arg(short, long)]
    summary: bool,

    /// Replace the returned Markdown with this file's contents.
    #[arg(long, value_name = "FILE")]
    edit: Option<PathBuf>,

    /// Save the (possibly edited) Markdown to this file.
    #[arg(long, value_name = "FILE")]
    markdown_out: Option<PathBuf>,

    /// Print the rendered HTML preview instead of Markdown.
    #[arg(long, conflicts_with = "json")]
    html: bool,

    /// Print the page state and preview as JSON.
    #[arg(long)]
    json: bool,

    /// Export the preview to PDF; without a value writes brochure.pdf.
    #[arg(short, long, value_name = "PDF", num_args = 0..=1,
          default_missing_value = DEFAULT_PDF_FILE_NAME)]
    output: Option<PathBuf>,

    /// Footer line printed on every exported page.
    #[arg(long, env = "BROCHURE_PDF_FOOTER")]
    footer: Option<String>,

    /// TrueType/OpenType font used for the export.
    #[arg(long, env = "BROCHURE_PDF_FONT", value_name = "TTF")]
    font: Option<PathBuf>,

    /// Disable the loading spinner.
    #[arg(long, env = "BROCHURE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BROCHURE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "BROCHURE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LangArg {
    En,
    Hi,
    Es,
}

impl From<LangArg> for Language {
    fn from(v: LangArg) -> Self {
        match v {
            LangArg::En => Language::English,
            LangArg::Hi => Language::Hindi,
            LangArg::Es => Language::Spanish,
        }
    }
}

/// `--json` output.
#[derive(Serialize)]
struct JsonOutput {
    state: PageState,
    html: Option<String>,
    pdf: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build controller ─────────────────────────────────────────────────
    let observer: Option<Observer> = if show_progress {
        Some(SpinnerObserver::new() as Arc<dyn ControllerObserver>)
    } else {
        None
    };
    let config = build_config(&cli, observer)?;
    let controller = BrochureController::new(config).context("Invalid configuration")?;

    controller.set_url(cli.url.as_str());
    controller.set_title(cli.title.as_str());
    controller.set_language(cli.lang.into());

    // ── Dispatch ─────────────────────────────────────────────────────────
    let (brochure, summary) = if cli.summary {
        let (b, s) = tokio::join!(controller.generate_brochure(), controller.summarise());
        (b, Some(s))
    } else {
        (controller.generate_brochure().await, None)
    };

    if let Some(Err(ref e)) = summary {
        // A failed summary does not invalidate the brochure.
        eprintln!("{} summary unavailable: {}", red("✗"), e);
    }
    brochure.context("Brochure generation failed")?;

    // ── Edit ─────────────────────────────────────────────────────────────
    if let Some(ref path) = cli.edit {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read edited Markdown from {:?}", path))?;
        if !controller.edit_markdown(text) && !cli.quiet {
            eprintln!("{} backend returned no Markdown; edit ignored", red("✗"));
        }
    }

    if let Some(ref path) = cli.markdown_out {
        tokio::fs::write(path, controller.markdown())
            .await
            .with_context(|| format!("Failed to write Markdown to {:?}", path))?;
    }

    // ── Export ───────────────────────────────────────────────────────────
    let pdf = match cli.output {
        Some(ref path) => controller
            .export_to_file(Some(path.as_path()))
            .await
            .context("PDF export failed")?,
        None => None,
    };

    // ── Output ───────────────────────────────────────────────────────────
    let preview = controller.preview();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if cli.json {
        let output = JsonOutput {
            state: controller.snapshot(),
            html: preview.map(|p| p.html),
            pdf: pdf.clone(),
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        let body = match preview {
            Some(p) if cli.html => p.html,
            Some(p) => p.markdown,
            None => String::new(),
        };
        handle
            .write_all(body.as_bytes())
            .context("Failed to write to stdout")?;
        if !body.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if let Some(Ok(ref text)) = summary {
            if !cli.quiet {
                eprintln!("\n{}\n{}", bold("Summary"), text);
            }
        }
    }

    if !cli.quiet {
        match (&cli.output, &pdf) {
            (Some(_), Some(path)) => {
                eprintln!("{} {}", green("✔"), bold(&path.display().to_string()))
            }
            (Some(_), None) => eprintln!("{} nothing to export", dim("–")),
            _ => {}
        }
    }

    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, observer: Option<Observer>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(cli.backend.as_str())
        .timeout_secs(cli.timeout)
        .default_language(cli.lang.into());

    if let Some(ref footer) = cli.footer {
        builder = builder.pdf_footer(footer.as_str());
    }
    if let Some(ref font) = cli.font {
        builder = builder.pdf_font(font.clone());
    }
    if let Some(observer) = observer {
        builder = builder.observer(observer);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["brochure", "-u", "example.com"]).unwrap();
        assert_eq!(cli.url, "example.com");
        assert_eq!(cli.title, "");
        assert!(matches!(cli.lang, LangArg::En));
        assert!(cli.output.is_none());
        assert!(!cli.summary);
    }

    #[test]
    fn bare_output_flag_uses_default_file_name() {
        let cli = Cli::try_parse_from(["brochure", "-u", "example.com", "-o"]).unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("brochure.pdf")));

        let cli = Cli::try_parse_from(["brochure", "-u", "example.com", "-o", "out.pdf"]).unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("out.pdf")));
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(Cli::try_parse_from(["brochure", "-u", "example.com", "--lang", "fr"]).is_err());
    }

    #[test]
    fn html_conflicts_with_json() {
        assert!(Cli::try_parse_from(["brochure", "-u", "example.com", "--html", "--json"]).is_err());
    }

    #[test]
    fn config_follows_flags() {
        let cli = Cli::try_parse_from([
            "brochure",
            "--url",
            "example.com",
            "--lang",
            "hi",
            "--backend",
            "http://localhost:9000",
            "--timeout",
            "5",
            "--footer",
            "Acme",
        ])
        .unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.default_language, Language::Hindi);
        assert_eq!(config.pdf_footer.as_deref(), Some("Acme"));
    }
}
