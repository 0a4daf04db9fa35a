//! Error types for the narrator

use std::io;
use thiserror::Error;

/// Main error type for the narrator
#[derive(Error, Debug)]
pub enum NarratorError {
    /// Speech could not be synthesized (network, malformed response, bad audio)
    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    /// A narration pass was requested while another one is running
    #[error("A narration pass is already running")]
    PassActive,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The audio output device could not be opened or has gone away
    #[error("Audio output error: {0}")]
    Audio(String),

    #[cfg(feature = "cloud-tts")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for narrator operations
pub type Result<T> = std::result::Result<T, NarratorError>;

impl From<String> for NarratorError {
    fn from(s: String) -> Self {
        NarratorError::Other(s)
    }
}

impl From<&str> for NarratorError {
    fn from(s: &str) -> Self {
        NarratorError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for NarratorError {
    fn from(e: serde_json::Error) -> Self {
        NarratorError::Synthesis(format!("Malformed synthesis response: {}", e))
    }
}
