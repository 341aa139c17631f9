// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 403 Forbidden

    #[error("Codeforces rate limit likely exceeded")]
    RateLimited,

    #[error("Contest {0} not found")]
    ContestNotFound(String),

    #[error("Problem {letter} of contest {contest} not found")]
    ProblemNotFound { contest: String, letter: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    // A failing sample writer aborts only the problem being extracted;
    // sibling problems keep going (handled in main).
    #[error("Sample writer failed: {0}")]
    Sink(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Codeforces interaction failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
