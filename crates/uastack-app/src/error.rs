//! Application-level error types.

use std::sync::Arc;
use thiserror::Error;
use uastack_types::{StatusCode, UaError};

/// Application error type wrapping UaError with registry-specific context.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ua(#[from] UaError),

    /// Building the server for `scheme` failed. Every caller that waited on
    /// the same attempt receives the same source error.
    #[error("Failed to construct {scheme} server: {source}")]
    ServerConstruction {
        scheme: &'static str,
        source: Arc<UaError>,
    },

    /// The application was closed while the server was being built.
    #[error("Application closed while the {0} server was being constructed")]
    Closed(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Ua(e) => e.status_code(),
            AppError::ServerConstruction { source, .. } => source.status_code(),
            AppError::Closed(_) => StatusCode::BAD_UNEXPECTED_ERROR,
            AppError::Config(_) => StatusCode::BAD_CONFIGURATION_ERROR,
        }
    }
}

/// Alias for application results.
pub type AppResult<T> = Result<T, AppError>;
