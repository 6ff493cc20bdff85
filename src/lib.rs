//! # fontdl Library
//!
//! Downloads the font files referenced by Google Fonts stylesheets and stores
//! them under predictable names such as `OpenSans-Medium.woff2`.
//!
//! ## Features
//!
//! - **Focused parsing**: understands the `@font-face` blocks served by Google Fonts
//! - **Deterministic naming**: `<Family>-<WeightLabel>[-<Style>].<ext>`
//! - **Idempotent**: files already on disk are never fetched again
//! - **Failure isolation**: one broken font never stops the others
//! - **Weight filtering**: fetch only the weights you need
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Download every font of a stylesheet into ./fonts
//!     let report = fontdl::get(
//!         "https://fonts.googleapis.com/css2?family=Comfortaa:wght@400;700&display=swap",
//!         "./fonts",
//!     ).await?;
//!     println!("{} files available", report.successes());
//!
//!     // Download the built-in project font set
//!     let project = fontdl::get_project_fonts("./fonts").await?;
//!     assert!(project.is_success());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Weight Filtering
//!
//! ```rust,no_run
//! use fontdl::{FetchOptions, WeightFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = FetchOptions::with_weights(WeightFilter::parse("400,500")?);
//!     fontdl::get_with_options(
//!         "https://fonts.googleapis.com/css2?family=Nunito:wght@300;400;500&display=swap",
//!         "./fonts",
//!         options,
//!     ).await?;
//!
//!     Ok(())
//! }
//! ```

use std::path::Path;

// Re-export core types that users might need
pub use crate::core::config::{DEFAULT_USER_AGENT, PROJECT_STYLESHEETS, PROJECT_WEIGHTS};
pub use crate::core::{FetchConfig, WeightFilter};
pub use crate::core::error::{Error, Result};
pub use crate::core::fetcher::group_by_family;
pub use crate::core::outcome::{
    FetchOptions, FetchOutcome, FetchProgress, ProgressCallback, ProjectReport, StylesheetReport,
};
pub use crate::core::stylesheet::{
    font_extension, font_filename, parse_font_face, parse_stylesheet, weight_label, FontDescriptor,
    FontFaceBlocks, FONT_EXTENSIONS,
};

// Internal modules
mod core;

/// Download every font referenced by a stylesheet
///
/// # Arguments
/// * `css_url` - Stylesheet URL (e.g. a `fonts.googleapis.com/css2` link)
/// * `output_dir` - Directory receiving the font files, created if missing
///
/// Fails only when the stylesheet itself cannot be fetched; use
/// [`StylesheetReport::is_success`] to check whether any font was obtained.
pub async fn get(css_url: &str, output_dir: impl AsRef<Path>) -> Result<StylesheetReport> {
    get_with_options(css_url, output_dir, FetchOptions::default()).await
}

/// Download the fonts of a stylesheet with custom options
///
/// # Examples
/// ```rust,no_run
/// use fontdl::{FetchOptions, FetchProgress, WeightFilter};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = FetchOptions {
///     weights: Some(WeightFilter::new(["400", "700"])),
///     progress: Some(Arc::new(|progress: &FetchProgress| {
///         println!("{}/{} {}", progress.completed, progress.total, progress.filename);
///     })),
/// };
///
/// fontdl::get_with_options(
///     "https://fonts.googleapis.com/css2?family=Courier+Prime:wght@400;700&display=swap",
///     "./fonts",
///     options,
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub async fn get_with_options(
    css_url: &str,
    output_dir: impl AsRef<Path>,
    options: FetchOptions,
) -> Result<StylesheetReport> {
    let fetcher = FontFetcher::new()?;
    fetcher
        .process_stylesheet(css_url, output_dir.as_ref(), &options)
        .await
}

/// Download the built-in project font set
///
/// Processes every stylesheet in [`PROJECT_STYLESHEETS`] restricted to
/// [`PROJECT_WEIGHTS`]. A failing stylesheet does not stop the others.
pub async fn get_project_fonts(output_dir: impl AsRef<Path>) -> Result<ProjectReport> {
    let fetcher = FontFetcher::new()?;
    Ok(fetcher
        .download_project_fonts(output_dir.as_ref(), &FetchOptions::default())
        .await)
}

/// List the fonts a download would attempt, without downloading anything
pub async fn plan(css_url: &str, weights: Option<WeightFilter>) -> Result<Vec<FontDescriptor>> {
    let fetcher = FontFetcher::new()?;
    let options = FetchOptions {
        weights,
        ..Default::default()
    };
    fetcher.plan(css_url, &options).await
}

/// Advanced API: Create a fetcher with custom configuration
///
/// For callers that need their own project stylesheet list, weights or
/// User-Agent.
///
/// # Examples
/// ```rust,no_run
/// use fontdl::{FetchConfig, FetchOptions, FontFetcher, WeightFilter};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FetchConfig::default()
///     .with_project_stylesheets(["https://fonts.googleapis.com/css2?family=Inter&display=swap"])
///     .with_project_weights(WeightFilter::new(["400"]));
///
/// let fetcher = FontFetcher::with_config(config)?;
/// let report = fetcher
///     .download_project_fonts(std::path::Path::new("./fonts"), &FetchOptions::default())
///     .await;
/// println!("{} stylesheets succeeded", report.successful_sources());
/// # Ok(())
/// # }
/// ```
pub use crate::core::FontFetcher;
