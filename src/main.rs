//! # fontdl CLI
//!
//! Command-line interface for the fontdl library.
//! Downloads the font files referenced by Google Fonts stylesheets.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use fontdl::{Error, FetchConfig, FetchOptions, FontFetcher, ProjectReport, Result, StylesheetReport, WeightFilter};
use log::error;

mod cli;

/// Exit status for failed runs
const EXIT_FAILURE: i32 = 1;

/// Exit status after Ctrl-C (128 + SIGINT)
const EXIT_INTERRUPTED: i32 = 130;

/// Command-line interface for fontdl
#[derive(Parser)]
#[command(name = "fontdl")]
#[command(about = "Web font downloader for Google Fonts stylesheets")]
#[command(long_about = "Downloads the font files referenced by a Google Fonts stylesheet:
  fontdl \"https://fonts.googleapis.com/css2?family=Roboto:wght@300;400;500&display=swap\"
  fontdl --download-all                # Download the project font set
  fontdl <CSS_URL> -o ./fonts          # Save into ./fonts
  fontdl <CSS_URL> --weights 400,700   # Only Regular and Bold

Files are named <Family>-<Weight>[-<Style>].<ext>, e.g. OpenSans-Medium.woff2.
Files already present are skipped, so re-running is safe.")]
#[command(version = env!("FONTDL_VERSION"))]
struct Cli {
    /// Google Fonts stylesheet URL
    css_url: Option<String>,

    /// Download every font of the built-in project list
    #[arg(long)]
    download_all: bool,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Comma-separated weights to download (e.g. 400,500,600)
    #[arg(long)]
    weights: Option<String>,

    /// User-Agent sent to the font server
    #[arg(long)]
    user_agent: Option<String>,

    /// List the files that would be downloaded without downloading them
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.css_url.is_none() && !cli.download_all {
        let _ = Cli::command().print_help();
        std::process::exit(EXIT_FAILURE);
    }

    let outcome = tokio::select! {
        result = run(&cli) => result,
        Ok(()) = tokio::signal::ctrl_c() => Err(Error::Interrupted),
    };

    match outcome {
        Ok(true) => {
            eprintln!("✅ Fonts saved to: {}", display_dir(&cli.output).display());
        }
        Ok(false) => {
            eprintln!("❌ Download failed");
            std::process::exit(EXIT_FAILURE);
        }
        Err(Error::Interrupted) => {
            eprintln!("\n⚠️  Download interrupted by user");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => {
            error!("❌ Error: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}

/// Initialize logging to stderr; `RUST_LOG` overrides the defaults
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info,fontdl=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Build the fetcher configuration from CLI flags
fn build_config(cli: &Cli, weights: Option<&WeightFilter>) -> FetchConfig {
    let mut config = FetchConfig::default();

    if let Some(ref user_agent) = cli.user_agent {
        config = config.with_user_agent(user_agent.clone());
    }
    if let Some(weights) = weights {
        config = config.with_project_weights(weights.clone());
    }

    config
}

fn parse_weights(weights: Option<&str>) -> Result<Option<WeightFilter>> {
    weights.map(WeightFilter::parse).transpose()
}

/// Returns whether the run produced at least one font file
async fn run(cli: &Cli) -> Result<bool> {
    if cli.verbose {
        eprintln!("🔤 fontdl v{} starting...", env!("FONTDL_VERSION"));
    }

    let weights = parse_weights(cli.weights.as_deref())?;
    let fetcher = FontFetcher::with_config(build_config(cli, weights.as_ref()))?;

    if cli.dry_run {
        return dry_run(cli, &fetcher, weights).await;
    }

    let progress_manager = (!cli.verbose).then(|| cli::ProgressManager::new("🌐 Downloading fonts"));
    let options = FetchOptions {
        weights,
        progress: progress_manager.as_ref().map(|pm| pm.callback()),
    };

    eprintln!("📁 Saving to: {}", cli.output.display());

    let success = match cli.css_url {
        Some(ref css_url) if !cli.download_all => {
            let result = fetcher.process_stylesheet(css_url, &cli.output, &options).await;
            if let Some(ref pm) = progress_manager {
                pm.finish();
            }
            let report = result?;
            print_stylesheet_summary(&report);
            report.is_success()
        }
        _ => {
            let report = fetcher.download_project_fonts(&cli.output, &options).await;
            if let Some(ref pm) = progress_manager {
                pm.finish();
            }
            print_project_summary(&report);
            report.is_success()
        }
    };

    Ok(success)
}

/// Show what would be downloaded
async fn dry_run(cli: &Cli, fetcher: &FontFetcher, weights: Option<WeightFilter>) -> Result<bool> {
    let sources: Vec<String> = match cli.css_url {
        Some(ref css_url) if !cli.download_all => vec![css_url.clone()],
        _ => fetcher.config().project_stylesheets.clone(),
    };
    let weights = if cli.download_all {
        Some(fetcher.config().project_weights.clone())
    } else {
        weights
    };
    let options = FetchOptions {
        weights,
        ..Default::default()
    };

    let mut planned = 0;
    for source in &sources {
        match fetcher.plan(source, &options).await {
            Ok(fonts) => {
                eprintln!("🔍 [DRY RUN] {source}");
                for font in &fonts {
                    let target = cli.output.join(font.target_filename());
                    println!("{}\t{}", target.display(), font.source_url());
                }
                planned += fonts.len();
            }
            Err(e) => eprintln!("❌ {source}: {e}"),
        }
    }

    Ok(planned > 0)
}

fn print_stylesheet_summary(report: &StylesheetReport) {
    eprintln!(
        "📊 {} families: {} downloaded, {} already present, {} failed, {} filtered out",
        report.families, report.downloaded, report.already_present, report.failed, report.filtered
    );
}

fn print_project_summary(report: &ProjectReport) {
    for (url, result) in &report.sources {
        match result {
            Ok(sheet) if sheet.is_success() => eprintln!("✅ {url} ({} files)", sheet.successes()),
            Ok(sheet) if sheet.found == 0 => eprintln!("⚠️  {url}: no font files"),
            Ok(sheet) => eprintln!("⚠️  {url}: {}", shortfall(sheet)),
            Err(e) => eprintln!("❌ {url}: {e}"),
        }
    }
    print_stylesheet_summary(&report.totals());
    eprintln!(
        "📦 Processed {}/{} stylesheets successfully",
        report.successful_sources(),
        report.total_sources()
    );
}

/// Explain why a stylesheet with fonts produced no files
fn shortfall(sheet: &StylesheetReport) -> String {
    format!(
        "no files obtained ({} failed, {} filtered out)",
        sheet.failed, sheet.filtered
    )
}

fn display_dir(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
