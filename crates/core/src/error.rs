// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Probe error: {0}")]
    Probe(#[from] crate::port::ProbeError),

    #[error("Command error: {0}")]
    Command(#[from] crate::port::CommandError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] crate::port::AggregateError),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
