// Central Error Type for package actions

use thiserror::Error;

/// Package-action error type
///
/// Lock contention never surfaces here on its own: it is retried, and once
/// the retry budget is spent the last observed failure is reported as a
/// [`PackageError::CommandFailure`].
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Command failed after {attempts} attempt(s): {command} (exit code {exit_code:?}){}", format_message(.message))]
    CommandFailure {
        command: String,
        exit_code: Option<i32>,
        output: String,
        message: Option<String>,
        attempts: u32,
    },

    #[error("Operation '{operation}' is not supported by the {provider} provider")]
    UnsupportedOperation {
        operation: &'static str,
        provider: &'static str,
    },

    #[error("Package presence check failed: {0}")]
    PresenceCheckFailure(String),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_message(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

impl PackageError {
    /// Build a command failure from the executor's last error
    pub fn from_execution(err: crate::port::ExecutionError, attempts: u32) -> Self {
        PackageError::CommandFailure {
            command: err.command().to_string(),
            exit_code: err.exit_code(),
            output: err.output().unwrap_or_default().to_string(),
            message: Some(err.to_string()),
            attempts,
        }
    }

    /// Exit code of the failing command, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            PackageError::CommandFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Captured output of the failing command
    pub fn output(&self) -> Option<&str> {
        match self {
            PackageError::CommandFailure { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl From<crate::port::DatabaseError> for PackageError {
    fn from(err: crate::port::DatabaseError) -> Self {
        PackageError::PresenceCheckFailure(err.to_string())
    }
}

/// Result type alias using PackageError
pub type Result<T> = std::result::Result<T, PackageError>;
