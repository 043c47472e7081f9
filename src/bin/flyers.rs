//! CLI binary for lento-flyers.
//!
//! A thin shim over the library crate: loads the feed, fonts and config from
//! CLI flags, runs the batch and writes the store → link table.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lento_flyers::{
    feed, run_batch, BatchProgressCallback, FlyerConfig, FontSet, ProgressCallback,
};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Header row of the published link table.
const LINK_TABLE_HEADER: [&str; 2] = ["TIENDA RETAIL", "LINK PDF LENTO MOVIMIENTO"];

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the stores plus a log line per
/// finished store. Stores finish out of order when `--workers` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed(&self, store: &str) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(store))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_stores: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} stores  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_stores as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating flyers for {total_stores} stores…"))
        ));
    }

    fn on_store_start(&self, store: &str, _products: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(store.to_string(), Instant::now());
        }
        self.bar.set_message(store.to_string());
    }

    fn on_store_complete(&self, store: &str, pages: usize, _url: &str) {
        let secs = self.elapsed(store);
        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            green("✓"),
            store,
            dim(&format!("{pages:>3} pages")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_store_skipped(&self, store: &str) {
        self.elapsed(store);
        self.bar.inc(1);
    }

    fn on_store_error(&self, store: &str, error: &str) {
        let secs = self.elapsed(store);
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            red("✗"),
            store,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_stores: usize, produced: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {}/{} stores produced a flyer",
                green("✔"),
                bold(&produced.to_string()),
                total_stores
            );
        } else {
            eprintln!(
                "{} {}/{} stores produced a flyer  ({} failed)",
                if produced == 0 { red("✘") } else { cyan("⚠") },
                bold(&produced.to_string()),
                total_stores,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render every store in the feed
  flyers --feed rows.json --lookup images.json --fonts fonts --assets assets

  # Publish under GitHub Pages
  flyers --feed rows.json --lookup images.json \
         --output-dir docs/flyers \
         --base-url https://acme.github.io/offers/flyers/

  # More stores at once, JSON summary on stdout
  flyers --feed rows.json --workers 8 --json

FEED FORMAT:
  A JSON array of rows. Columns: Tienda (store), Marca (brand), SKU (sku),
  Articulo (title), image_link (image, optional).

  The lookup is a JSON array of {"sku": ..., "base_image_path": ...} rows or
  a flat {"sku": "url"} object. SKUs are matched after removing "-EX".

FONTS:
  --fonts must hold the five Proxima Nova faces under their vendor file names
  ("Mark Simonson - Proxima Nova Alt Condensed Bold.otf", ... Extrabold,
  Regular, "Proxima Nova Extrabold.otf", "Proxima Nova Semibold.otf").
  Pass --font to use one face for every text role instead.
"#;

/// Render per-store promotional flyers into PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "flyers",
    version,
    about = "Render per-store promotional flyers into PDF documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Product feed (JSON array of rows).
    #[arg(long, env = "FLYERS_FEED")]
    feed: PathBuf,

    /// SKU → image URL lookup (JSON).
    #[arg(long, env = "FLYERS_LOOKUP")]
    lookup: Option<PathBuf>,

    /// Directory with the five typeface files.
    #[arg(long, env = "FLYERS_FONTS", default_value = ".")]
    fonts: PathBuf,

    /// A single font file used for every text role; overrides --fonts.
    #[arg(long, env = "FLYERS_FONT")]
    font: Option<PathBuf>,

    /// Directory with the logos and header photos.
    #[arg(long, env = "FLYERS_ASSETS", default_value = ".")]
    assets: PathBuf,

    /// Where the PDF documents are written.
    #[arg(short, long, env = "FLYERS_OUTPUT_DIR", default_value = "docs/flyers")]
    output_dir: PathBuf,

    /// Public URL prefix of the output directory.
    #[arg(long, env = "FLYERS_BASE_URL", default_value = "")]
    base_url: String,

    /// Stores rendered concurrently.
    #[arg(short, long, env = "FLYERS_WORKERS", default_value_t = 4)]
    workers: usize,

    /// Product image download timeout in seconds.
    #[arg(long, env = "FLYERS_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Hours from UTC for the "Generado" timestamp.
    #[arg(long, env = "FLYERS_UTC_OFFSET", default_value_t = -5, allow_negative_numbers = true)]
    utc_offset: i32,

    /// Where to write the store → link table. Default: <output-dir>/flyer_links.json.
    #[arg(long, env = "FLYERS_LINKS")]
    links: Option<PathBuf>,

    /// Print the batch output as JSON on stdout.
    #[arg(long, env = "FLYERS_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FLYERS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FLYERS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FLYERS_QUIET")]
    quiet: bool,
}

/// The table handed to whatever publishes the links (a sheet, a page).
#[derive(Serialize)]
struct LinkTable {
    header: [&'static str; 2],
    rows: Vec<(String, String)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs when it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Inputs ───────────────────────────────────────────────────────────
    let rows = feed::load_feed(&cli.feed).context("Failed to load product feed")?;
    let lookup = match cli.lookup {
        Some(ref path) => Some(feed::load_lookup(path).context("Failed to load image lookup")?),
        None => None,
    };
    let groups = feed::group_by_store(rows, lookup.as_ref());

    let fonts = match cli.font {
        Some(ref path) => FontSet::uniform(
            lento_flyers::fonts::load_font(path).context("Failed to load font")?,
        ),
        None => FontSet::load_dir(&cli.fonts).context("Failed to load fonts")?,
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = run_batch(&groups, &config, &fonts)
        .await
        .context("Flyer generation failed")?;

    let links_path = cli
        .links
        .clone()
        .unwrap_or_else(|| cli.output_dir.join("flyer_links.json"));
    let table = LinkTable {
        header: LINK_TABLE_HEADER,
        rows: output
            .entries
            .iter()
            .cloned()
            .map(|entry| entry.into_row())
            .collect(),
    };
    write_links(&links_path, &table)?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        let stats = &output.stats;
        if !show_progress {
            eprintln!(
                "Produced {}/{} stores ({} pages) in {}ms",
                stats.produced_stores,
                stats.total_stores,
                stats.total_pages,
                stats.total_duration_ms
            );
            if stats.failed_stores > 0 {
                eprintln!("  {} stores failed", stats.failed_stores);
            }
        } else {
            eprintln!(
                "   {} pages  /  {} empty stores  —  {}ms total",
                dim(&stats.total_pages.to_string()),
                dim(&stats.skipped_stores.to_string()),
                stats.total_duration_ms,
            );
        }
        eprintln!("   links  →  {}", bold(&links_path.display().to_string()));
    }

    Ok(())
}

/// Map CLI args to `FlyerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<FlyerConfig> {
    let mut builder = FlyerConfig::builder()
        .output_dir(&cli.output_dir)
        .public_base_url(&cli.base_url)
        .asset_dir(&cli.assets)
        .workers(cli.workers)
        .fetch_timeout_secs(cli.timeout)
        .utc_offset_hours(cli.utc_offset);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn write_links(path: &Path, table: &LinkTable) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(table).context("Failed to serialise link table")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
