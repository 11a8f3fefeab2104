//! Error types for alert persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving the alert store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create the directory holding the store file.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read the store file.
    #[error("Failed to read store '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write the store file.
    #[error("Failed to write store '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The store file is not a valid document.
    #[error("Failed to parse store '{path}': {source}")]
    ParseJson {
        /// The path that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize the document.
    #[error("Failed to serialize store: {0}")]
    SerializeJson(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
