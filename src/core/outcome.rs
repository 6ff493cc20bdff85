//! Per-file outcomes and aggregate reports for fontdl
//!
//! Every download attempt yields a [`FetchOutcome`]; a stylesheet run folds
//! those into a [`StylesheetReport`], and the project run collects one result
//! per stylesheet in a [`ProjectReport`].

use std::sync::Arc;

use crate::core::config::WeightFilter;
use crate::core::error::{Error, Result};

/// Result of a single font download attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// File was fetched and written
    Downloaded { bytes: u64 },

    /// Target file already existed and was left untouched
    AlreadyPresent,

    /// Fetching or writing failed; siblings are unaffected
    Failed(Error),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, FetchOutcome::Failed(_))
    }
}

/// Progress notification emitted after each attempted file
#[derive(Debug, Clone)]
pub struct FetchProgress {
    /// Files attempted so far in the current stylesheet
    pub completed: usize,

    /// Files that will be attempted in the current stylesheet
    pub total: usize,

    /// Target filename of the file just handled
    pub filename: String,

    pub succeeded: bool,
}

/// Progress callback function type
pub type ProgressCallback = Arc<dyn Fn(&FetchProgress) + Send + Sync>;

/// Options for a single stylesheet run
#[derive(Clone, Default)]
pub struct FetchOptions {
    /// Only fetch these weights; `None` fetches everything
    pub weights: Option<WeightFilter>,

    /// Optional progress callback
    pub progress: Option<ProgressCallback>,
}

impl FetchOptions {
    pub fn with_weights(weights: WeightFilter) -> Self {
        Self {
            weights: Some(weights),
            ..Default::default()
        }
    }

    pub(crate) fn accepts(&self, weight: &str) -> bool {
        self.weights.as_ref().map_or(true, |filter| filter.contains(weight))
    }
}

impl std::fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOptions")
            .field("weights", &self.weights)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Tally for one processed stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylesheetReport {
    pub families: usize,
    pub found: usize,
    pub filtered: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl StylesheetReport {
    pub(crate) fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            FetchOutcome::AlreadyPresent => self.already_present += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Files attempted, i.e. not removed by the weight filter
    pub fn attempted(&self) -> usize {
        self.downloaded + self.already_present + self.failed
    }

    /// Files that ended up on disk, including ones already present
    pub fn successes(&self) -> usize {
        self.downloaded + self.already_present
    }

    pub fn is_success(&self) -> bool {
        self.successes() > 0
    }
}

/// Results of processing the project stylesheet list
#[derive(Debug, Default)]
pub struct ProjectReport {
    pub sources: Vec<(String, Result<StylesheetReport>)>,
}

impl ProjectReport {
    /// Stylesheets that produced at least one file
    pub fn successful_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|(_, result)| result.as_ref().is_ok_and(StylesheetReport::is_success))
            .count()
    }

    pub fn total_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn is_success(&self) -> bool {
        self.successful_sources() > 0
    }

    /// Sum of all per-stylesheet tallies
    pub fn totals(&self) -> StylesheetReport {
        self.sources
            .iter()
            .filter_map(|(_, result)| result.as_ref().ok())
            .fold(StylesheetReport::default(), |mut acc, report| {
                acc.families += report.families;
                acc.found += report.found;
                acc.filtered += report.filtered;
                acc.downloaded += report.downloaded;
                acc.already_present += report.already_present;
                acc.failed += report.failed;
                acc.bytes += report.bytes;
                acc
            })
    }
}
