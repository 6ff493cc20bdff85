//! Error types for fontdl
//!
//! Provides the error taxonomy shared by stylesheet and font fetching.

use std::fmt;

/// Main error type for fontdl operations
#[derive(Debug)]
pub enum Error {
    /// Server answered with a non-success status
    HttpStatus { url: String, status: u16 },

    /// HTTP-level failure (bad response body, protocol error, ...)
    HttpError(String),

    /// Network connectivity issues or timeouts
    NetworkError(String),

    /// File I/O error
    IoError(std::io::Error),

    /// Invalid configuration or parameters
    InvalidInput(String),

    /// Processing was interrupted by the user
    Interrupted,
}

impl Error {
    /// True for failures caused by the remote side or the network
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::HttpStatus { .. }
                | Error::HttpError(_)
                | Error::NetworkError(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::HttpStatus { url, status } => {
                write!(f, "HTTP {} for {}", status, url)
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {}", msg)
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            Error::Interrupted => {
                write!(f, "Interrupted by user")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

/// Convenience result type for fontdl operations
pub type Result<T> = std::result::Result<T, Error>;
