//! CLI-specific progress handling for fontdl
//!
//! Provides a per-stylesheet progress bar fed by the library progress callback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fontdl::{FetchProgress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar counting font files
pub fn create_progress_bar(total_files: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_files);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} fonts {msg}")
            .expect("Failed to create progress style")
            .progress_chars("#>-"),
    );
    pb
}

/// Progress manager for one stylesheet run
pub struct ProgressManager {
    pub pb: ProgressBar,
    failures: Arc<AtomicUsize>,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(message: &str) -> Self {
        // Length is only known once the stylesheet has been parsed
        let pb = create_progress_bar(0);

        eprintln!("{}", message);

        Self {
            pb,
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Callback to hand to the library through `FetchOptions`
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        let failures = Arc::clone(&self.failures);

        Arc::new(move |progress: &FetchProgress| {
            if pb.length().unwrap_or(0) != progress.total as u64 {
                pb.set_length(progress.total as u64);
            }
            if !progress.succeeded {
                failures.fetch_add(1, Ordering::Relaxed);
            }
            pb.set_message(progress.filename.clone());
            pb.set_position(progress.completed as u64);
        })
    }

    /// Clear the bar once the run is over
    pub fn finish(&self) {
        let failures = self.failures.load(Ordering::Relaxed);
        if failures == 0 {
            self.pb.finish_with_message("✅ done");
        } else {
            self.pb.finish_with_message(format!("⚠️  {failures} failed"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar_template() {
        let pb = create_progress_bar(12);

        assert_eq!(pb.length().unwrap(), 12);

        // The template string must be valid for this to not panic
        pb.set_position(3);
        pb.finish();
    }

    #[test]
    fn test_callback_updates_bar() {
        let manager = ProgressManager::new("Test fonts");
        let callback = manager.callback();

        callback(&FetchProgress {
            completed: 1,
            total: 4,
            filename: "Nunito-Regular.woff2".to_string(),
            succeeded: false,
        });

        assert_eq!(manager.pb.length().unwrap(), 4);
        assert_eq!(manager.pb.position(), 1);
        manager.finish();
    }
}
