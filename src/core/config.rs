//! Configuration for fontdl
//!
//! Holds the built-in project stylesheet list, weight filters and HTTP settings.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::core::error::{Error, Result};

/// Client identifier sent with every request.
///
/// Google Fonts picks the served format from the User-Agent; a modern desktop
/// browser string is what gets woff2 sources back.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Stylesheets covering the project's default font requirements
pub const PROJECT_STYLESHEETS: &[&str] = &[
    "https://fonts.googleapis.com/css2?family=Noto+Serif+SC:wght@300;400;500;600;700&display=swap",
    "https://fonts.googleapis.com/css2?family=Comfortaa:wght@300;400;500;600;700&display=swap",
    "https://fonts.googleapis.com/css2?family=Nunito:wght@300;400;500;600;700&display=swap",
    "https://fonts.googleapis.com/css2?family=Source+Sans+Pro:wght@300;400;500;600;700&display=swap",
    "https://fonts.googleapis.com/css2?family=Open+Sans:wght@300;400;500;600;700&display=swap",
    "https://fonts.googleapis.com/css2?family=Courier+Prime:wght@400;700&display=swap",
    "https://fonts.googleapis.com/css2?family=Playfair+Display:wght@400;500;600;700&display=swap",
    "https://fonts.googleapis.com/css2?family=IBM+Plex+Mono:wght@400;500;600&display=swap",
    "https://fonts.googleapis.com/css?family=Roboto:300,400,500,700&display=swap",
];

/// Weights fetched for the project stylesheets (Regular, Medium, SemiBold)
pub const PROJECT_WEIGHTS: &[&str] = &["400", "500", "600"];

/// Set of weight codes a download is restricted to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeightFilter {
    weights: BTreeSet<String>,
}

impl WeightFilter {
    /// Build a filter from individual weight codes
    pub fn new<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            weights: weights.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list such as `"400, 500,600"`
    pub fn parse(list: &str) -> Result<Self> {
        let filter = Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty()),
        );

        if filter.weights.is_empty() {
            return Err(Error::InvalidInput(format!(
                "weight list '{list}' does not name any weight"
            )));
        }

        Ok(filter)
    }

    pub fn contains(&self, weight: &str) -> bool {
        self.weights.contains(weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.weights.iter().map(String::as_str)
    }
}

/// Immutable configuration passed to the font fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Stylesheet URLs processed by `download_project_fonts`
    pub project_stylesheets: Vec<String>,

    /// Weight filter applied to the project stylesheets
    pub project_weights: WeightFilter,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Timeout for stylesheet requests
    pub css_timeout: Duration,

    /// Timeout for font file requests
    pub font_timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            project_stylesheets: PROJECT_STYLESHEETS.iter().map(|s| s.to_string()).collect(),
            project_weights: WeightFilter::new(PROJECT_WEIGHTS.iter().copied()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            css_timeout: Duration::from_secs(30),
            font_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl FetchConfig {
    pub fn with_project_stylesheets<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_stylesheets = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_project_weights(mut self, weights: WeightFilter) -> Self {
        self.project_weights = weights;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
