//! Core library modules for fontdl
//!
//! This module contains the internal implementation details of the fontdl library.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod outcome;
pub mod stylesheet;

// Re-export main types for internal use
pub use config::{FetchConfig, WeightFilter};
pub use fetcher::FontFetcher;
