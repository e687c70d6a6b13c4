//! Error handling for the provider
//!
//! Every failing operation surfaces as a `ProviderError`. Resource and data
//! source callbacks wrap their failures with a short summary so the host
//! engine can present them as diagnostics (`summary` + `detail`).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Main error type for the provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// IO errors (file reads, writes, permission changes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO errors tied to a specific file
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command with no text was submitted
    #[error("empty command")]
    EmptyCommand,

    /// The shell could not be spawned or its output could not be collected
    #[error("failed to execute command: {0}")]
    Spawn(std::io::Error),

    /// The command exited non-zero and the caller asked for that to fail
    #[error("command exited with code {code}: {output}")]
    NonZeroExit { code: i64, output: String },

    /// Provider configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request, plan or state values that do not match a schema
    #[error("Validation error: {0}")]
    Validation(String),

    /// No resource or data source registered under this name
    #[error("unknown {kind} type: {name}")]
    UnknownType { kind: &'static str, name: String },

    /// A failed resource/data source operation, with the summary shown to users
    #[error("{summary}: {source}")]
    Operation {
        summary: String,
        #[source]
        source: Box<ProviderError>,
    },
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// IO error annotated with the file it concerns
    pub fn file(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::File {
            path: path.display().to_string(),
            source,
        }
    }

    /// Wrap an error with the summary of the operation that failed
    pub fn operation(summary: impl Into<String>, source: impl Into<ProviderError>) -> Self {
        Self::Operation {
            summary: summary.into(),
            source: Box::new(source.into()),
        }
    }

    /// Short, user-facing headline for this error
    pub fn summary(&self) -> String {
        match self {
            Self::Operation { summary, .. } => summary.clone(),
            Self::Validation(_) => "Invalid attribute value".to_string(),
            Self::Config(_) => "Invalid provider configuration".to_string(),
            Self::UnknownType { .. } => "Unsupported type".to_string(),
            _ => "Provider error".to_string(),
        }
    }

    /// Detailed description, without the summary prefix
    pub fn detail(&self) -> String {
        match self {
            Self::Operation { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

/// Diagnostic severity reported back to the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
}

/// A single diagnostic entry in a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(default)]
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        Diagnostic::error(err.summary(), err.detail())
    }
}
