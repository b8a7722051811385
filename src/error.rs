//! Error types for routegen
//!
//! Library code returns `RegenResult`; the binary wraps it in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ports::file_system::FsError;
use crate::domain::ports::module_parser::ParseError;
use crate::infrastructure::repositories::HashMapError;

/// Result type alias for routegen operations
pub type RegenResult<T> = Result<T, RegenError>;

/// Main error type for routegen operations
#[derive(Error, Debug)]
pub enum RegenError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File system port error
    #[error(transparent)]
    Fs(#[from] FsError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration file
    #[error("invalid config in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// Source module could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Hash-map artifact could not be read or written
    #[error(transparent)]
    HashMap(#[from] HashMapError),

    /// Worker threads could not be created
    #[error("failed to start worker for route '{route}': {message}")]
    WorkerPool { route: String, message: String },

    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Two source modules export a route with the same id
    #[error("duplicate route '{id}' in {file} (first declared in {first})")]
    DuplicateRoute {
        id: String,
        file: PathBuf,
        first: PathBuf,
    },
}
