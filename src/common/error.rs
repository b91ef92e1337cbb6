//! Error types for mogilefs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Tracker Errors ===
    #[error("Unable to obtain connection to any tracker")]
    NoTracker,

    #[error("Tracker transport error: {0}")]
    Transport(String),

    #[error("Tracker protocol error: {0}")]
    Protocol(String),

    // === Application Errors (reported by the tracker) ===
    #[error("Unknown key '{key}'")]
    UnknownKey { key: String },

    #[error("Empty file '{key}'")]
    EmptyFile { key: String },

    #[error("None match '{key}'")]
    NoneMatch { key: String },

    // === Transfer Errors ===
    #[error("Storage node returned a {status} status code for {url}")]
    Transfer { status: u16, url: String },

    #[error("Unable to retrieve key '{key}'")]
    NotFound { key: String },

    #[error("HTTP error: {0}")]
    Http(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Could retrying the whole operation at a higher level succeed?
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::NoTracker
            | Error::Transport(_)
            | Error::Protocol(_)
            | Error::NotFound { .. }
            | Error::Http(_) => true,
            Error::Transfer { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The key this error refers to, when it carries one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::UnknownKey { key }
            | Error::EmptyFile { key }
            | Error::NoneMatch { key }
            | Error::NotFound { key } => Some(key),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

impl From<::config::ConfigError> for Error {
    fn from(e: ::config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
