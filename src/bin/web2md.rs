//! CLI binary for web2md.
//!
//! A thin shim over the library crate that maps subcommand flags to
//! `LinkConfig` / `ScrapeConfig` / `PdfConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use web2md::{
    convert_dir, extract_links_to_file, scrape_from_file, ImageMode, LinkConfig, PdfConfig,
    ProgressCallback, RunProgressCallback, ScrapeConfig,
};

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per item.
/// Items may finish out of order (PDF conversion is concurrent).
struct CliProgressCallback {
    bar: ProgressBar,
    /// "chapters" or "files".
    noun: &'static str,
    /// Past-tense verb for the summary line.
    verb: &'static str,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new(prefix: &str, noun: &'static str, verb: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix(prefix.to_string());
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            noun,
            verb,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}",
            self.noun
        );
        let progress_style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0) as f64
            / 1000.0
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total} {}…", self.noun))
        ));
    }

    fn on_item_start(&self, index: usize, _total: usize, label: &str) {
        self.start_times
            .lock()
            .unwrap()
            .insert(index, Instant::now());
        self.bar.set_message(label.to_string());
    }

    fn on_item_complete(&self, index: usize, total: usize, label: &str, bytes: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            label,
            dim(&format!("{bytes:>7} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        // Keep long error messages on one line.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} {} {} successfully",
                green("✔"),
                bold(&success_count.to_string()),
                self.noun,
                self.verb
            );
        } else {
            eprintln!(
                "{} {}/{} {} {}  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                self.noun,
                self.verb,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # 1. Extract chapter links from a saved table-of-contents page
  web2md links --input links.html --output chapter-links.txt

  # 2. Scrape every chapter into docs/ (images downloaded to docs/images/)
  web2md scrape --links chapter-links.txt --docs docs

  # Same, but link images by their remote URL
  web2md scrape --remote-images

  # 3. Typeset every docs/*.md as pdfs/*.pdf
  web2md pdf --docs docs --out pdfs --fonts fonts

  # Machine-readable report
  web2md --json scrape > report.json

FONTS:
  The pdf subcommand needs a TrueType family in --fonts named
  <family>-Regular.ttf, <family>-Bold.ttf, <family>-Italic.ttf and
  <family>-BoldItalic.ttf (default family: LiberationSans).

ENVIRONMENT VARIABLES:
  RUST_LOG    Override log filtering (e.g. RUST_LOG=web2md=debug)
"#;

/// Mirror an online tutorial as Markdown files and PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "web2md",
    version,
    about = "Mirror an online tutorial as Markdown files and PDFs",
    long_about = "Extract chapter links from a saved table-of-contents page, scrape each \
chapter into a Markdown file (downloading its images), and typeset the Markdown files as PDFs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output a structured JSON report on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract chapter URLs from a saved table-of-contents page.
    Links(LinksArgs),
    /// Fetch every listed chapter and save it as Markdown.
    Scrape(ScrapeArgs),
    /// Convert every Markdown file in a directory to PDF.
    Pdf(PdfArgs),
}

#[derive(Args, Debug)]
struct LinksArgs {
    /// Saved HTML page holding the table of contents.
    #[arg(short, long, default_value = "links.html")]
    input: PathBuf,

    /// Link list to write, one URL per line.
    #[arg(short, long, default_value = "chapter-links.txt")]
    output: PathBuf,

    /// Base URL relative links are resolved against.
    #[arg(long, default_value = "https://www.tutorialspoint.com")]
    base_url: String,

    /// CSS selector for chapter anchors.
    #[arg(long, default_value = "ul.toc.chapters li a")]
    selector: String,

    /// Keep only links whose path starts with this prefix.
    #[arg(long, default_value = "/javascript/", conflicts_with = "no_prefix")]
    prefix: String,

    /// Keep every matched link regardless of path.
    #[arg(long)]
    no_prefix: bool,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Link list produced by `web2md links`.
    #[arg(short, long, default_value = "chapter-links.txt")]
    links: PathBuf,

    /// Directory receiving one Markdown file per chapter.
    #[arg(short, long, default_value = "docs")]
    docs: PathBuf,

    /// Image directory name inside --docs.
    #[arg(long, default_value = "images")]
    images_subdir: String,

    /// Link images by absolute URL instead of downloading them.
    #[arg(long)]
    remote_images: bool,

    /// Pause between chapter fetches, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// HTTP timeout per request, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// User-Agent header sent with every request.
    #[arg(long)]
    user_agent: Option<String>,

    /// Fence language for code blocks without a language class.
    #[arg(long, default_value = "javascript")]
    code_language: String,

    /// Emit bare ``` fences when the page names no language.
    #[arg(long)]
    no_code_language: bool,

    /// Extra image container selector (repeatable; replaces the defaults).
    #[arg(long = "container", value_name = "SELECTOR")]
    containers: Vec<String>,
}

#[derive(Args, Debug)]
struct PdfArgs {
    /// Directory scanned for *.md files.
    #[arg(short, long, default_value = "docs")]
    docs: PathBuf,

    /// Directory receiving the PDFs.
    #[arg(short, long, default_value = "pdfs")]
    out: PathBuf,

    /// Directory holding the TrueType font family.
    #[arg(long, default_value = "fonts")]
    fonts: PathBuf,

    /// Font family name (file prefix).
    #[arg(long, default_value = "LiberationSans")]
    font_family: String,

    /// Body font size in points (6–36).
    #[arg(long, default_value_t = 11,
          value_parser = clap::value_parser!(u8).range(6..=36))]
    font_size: u8,

    /// Page margin in millimetres.
    #[arg(long, default_value_t = 15)]
    margin: u8,

    /// Number of files laid out concurrently.
    #[arg(short, long, default_value_t = 4)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let has_bar = !matches!(cli.command, Command::Links(_));
    let show_progress = has_bar && !cli.quiet && !cli.no_progress && !cli.json;
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

    match cli.command {
        Command::Links(ref args) => run_links(&cli, args).await,
        Command::Scrape(ref args) => run_scrape(&cli, args, show_progress).await,
        Command::Pdf(ref args) => run_pdf(&cli, args, show_progress).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

fn exit_code(failed: usize) -> ExitCode {
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_links(cli: &Cli, args: &LinksArgs) -> Result<ExitCode> {
    let config = LinkConfig {
        input: args.input.clone(),
        output: args.output.clone(),
        base_url: args.base_url.clone(),
        selector: args.selector.clone(),
        path_prefix: (!args.no_prefix).then(|| args.prefix.clone()),
    };

    let output = extract_links_to_file(&config)
        .await
        .context("Link extraction failed")?;

    if cli.json {
        print_json(&output)?;
    } else if !cli.quiet {
        eprintln!(
            "{}  {} links  →  {}",
            green("✔"),
            output.links.len(),
            bold(&output.path.display().to_string()),
        );
        if output.rejected > 0 {
            eprintln!("   {}", dim(&format!("{} anchors skipped", output.rejected)));
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_scrape(cli: &Cli, args: &ScrapeArgs, show_progress: bool) -> Result<ExitCode> {
    let mut builder = ScrapeConfig::builder()
        .links_file(&args.links)
        .docs_dir(&args.docs)
        .images_subdir(&args.images_subdir)
        .image_mode(if args.remote_images {
            ImageMode::Remote
        } else {
            ImageMode::Download
        })
        .polite_delay_ms(args.delay_ms)
        .timeout_secs(args.timeout)
        .code_language((!args.no_code_language).then(|| args.code_language.clone()));

    if let Some(ref ua) = args.user_agent {
        builder = builder.user_agent(ua);
    }
    if !args.containers.is_empty() {
        builder = builder.image_containers(args.containers.clone());
    }
    if show_progress {
        let cb = CliProgressCallback::new("Scraping", "chapters", "saved");
        builder = builder.progress_callback(cb as Arc<dyn RunProgressCallback>);
    }
    let config = builder.build().context("Invalid configuration")?;

    let output = scrape_from_file(&config).await.context("Scrape failed")?;

    if cli.json {
        print_json(&output)?;
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} chapters  {}ms  →  {}",
            if stats.failed_chapters == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.saved_chapters,
            stats.total_chapters,
            stats.total_duration_ms,
            bold(&config.docs_dir.display().to_string()),
        );
        eprintln!(
            "   {} images downloaded  /  {} fell back to remote URLs",
            dim(&stats.images_downloaded.to_string()),
            dim(&stats.images_failed.to_string()),
        );
        if !show_progress {
            for failure in output.failures() {
                if let Some(ref e) = failure.error {
                    eprintln!("  {} {}", red("✗"), e);
                }
            }
        }
    }
    Ok(exit_code(output.stats.failed_chapters))
}

async fn run_pdf(cli: &Cli, args: &PdfArgs, show_progress: bool) -> Result<ExitCode> {
    let progress_callback: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new("Converting", "files", "converted");
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };
    let config = PdfConfig {
        docs_dir: args.docs.clone(),
        pdf_dir: args.out.clone(),
        font_dir: args.fonts.clone(),
        font_family: args.font_family.clone(),
        font_size: args.font_size,
        margin_mm: args.margin,
        concurrency: args.concurrency,
        progress_callback,
    };

    let output = convert_dir(&config).await.context("PDF conversion failed")?;

    if cli.json {
        print_json(&output)?;
    } else if !cli.quiet {
        eprintln!(
            "{}  {}/{} files  {}ms  →  {}",
            if output.failed == 0 { green("✔") } else { cyan("⚠") },
            output.converted,
            output.files.len(),
            output.total_duration_ms,
            bold(&config.pdf_dir.display().to_string()),
        );
        if !show_progress {
            for file in output.files.iter().filter(|f| f.error.is_some()) {
                eprintln!(
                    "  {} {}: {}",
                    red("✗"),
                    file.source.display(),
                    file.error.as_deref().unwrap_or_default()
                );
            }
        }
    }
    Ok(exit_code(output.failed))
}
