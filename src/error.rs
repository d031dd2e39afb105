//! Error types for the scan client.
//!
//! Every variant's `Display` text is the message shown to the user, so the
//! front-end can print an error as-is.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Candidate file was absent or not declared as an image
    InvalidFile,

    /// Candidate file exceeds the upload limit (bytes, limit in MB)
    FileTooLarge { size: usize, limit_mb: usize },

    /// Analyze triggered with nothing selected
    NoFileSelected,

    /// Analyze triggered while a previous request is still outstanding
    AnalysisInFlight,

    /// The prediction service answered with an `error` field
    Service(String),

    /// Transport failure talking to the prediction service
    Request(String),

    /// Response body was not a valid prediction
    InvalidResponse(String),

    /// Preview decoding task failed
    Preview(String),

    /// Reading a file from disk failed
    Io(String),

    /// Bad configuration value
    Config(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidFile => write!(f, "Please select a valid image file."),
            ClientError::FileTooLarge { limit_mb, .. } => {
                write!(f, "Image is larger than the {} MB upload limit.", limit_mb)
            }
            ClientError::NoFileSelected => write!(f, "Please select an image first."),
            ClientError::AnalysisInFlight => write!(f, "An analysis is already in progress."),
            ClientError::Service(msg) => write!(f, "Error: {}", msg),
            ClientError::Request(msg) => write!(f, "Analysis failed: {}", msg),
            ClientError::InvalidResponse(msg) => write!(f, "Analysis failed: {}", msg),
            ClientError::Preview(msg) => write!(f, "Preview failed: {}", msg),
            ClientError::Io(msg) => write!(f, "Could not read file: {}", msg),
            ClientError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ClientError {
    fn from(err: tokio::task::JoinError) -> Self {
        ClientError::Preview(err.to_string())
    }
}
