//! Error types for the UI harness
//!
//! Failures raised by application code under test are carried through
//! unchanged in [`Error::Handler`]; everything else is a harness or caller
//! problem with a message that says what to fix.

use std::io;
use thiserror::Error;

use crate::runtime::HandlerError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the UI harness
#[derive(Error, Debug)]
pub enum Error {
    // === Dispatcher Errors ===
    #[error("Invalid dispatcher handle: {0}")]
    InvalidDispatcher(String),

    #[error("Dispatcher stalled: queue is empty but the frame was never told to exit")]
    DispatcherStalled,

    // === Input Errors ===
    #[error("Unknown key '{0}'. Run 'ui-harness keys' for the list of key names")]
    InvalidKey(String),

    #[error("Invalid modifier combination '{0}'. Use names like Ctrl+Shift, Alt or Win")]
    InvalidModifiers(String),

    #[error("Invalid key gesture '{0}'")]
    InvalidGesture(String),

    // === Application Errors ===
    /// A handler under test failed; the original error is kept as-is.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    // === Scenario Errors ===
    #[error("Element '{0}' is not declared in the scenario")]
    ElementNotFound(String),

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid dispatcher error
    pub fn invalid_dispatcher(reason: &str) -> Self {
        Self::InvalidDispatcher(reason.to_string())
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// The application error behind this failure, if it came from a handler
    pub fn as_handler(&self) -> Option<&HandlerError> {
        match self {
            Self::Handler(e) => Some(e),
            _ => None,
        }
    }
}
