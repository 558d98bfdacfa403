//! Error types for sysdump

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for sysdump
#[derive(Debug, Error)]
pub enum SysdumpError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to create sysdump directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to register hook tasks: {0}")]
    Hook(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Could not find {what} in output: {output:?}")]
    NotFound { what: &'static str, output: String },

    #[error("Output exceeded the limit of {limit} bytes")]
    LimitExceeded { limit: u64 },

    #[error("Command {command:?} failed in {namespace}/{pod}: {message}")]
    Exec {
        namespace: String,
        pod: String,
        command: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("Task panicked: {0}")]
    Panicked(String),
}

impl SysdumpError {
    /// Whether the error aborts the run before any task starts
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            SysdumpError::CreateDir { .. } | SysdumpError::Hook(_) | SysdumpError::Config(_)
        )
    }
}

impl From<serde_json::Error> for SysdumpError {
    fn from(e: serde_json::Error) -> Self {
        SysdumpError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for SysdumpError {
    fn from(e: serde_yaml::Error) -> Self {
        SysdumpError::Serialization(e.to_string())
    }
}

/// Result type alias for sysdump
pub type Result<T> = std::result::Result<T, SysdumpError>;
