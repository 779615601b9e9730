//! Error types for the Netease EAPI client.
//!
//! Only conditions the caller cannot shrug off end up here. A failed HTTP
//! exchange or a non-200 application `code` is reported by the client
//! operations as "no result" (`Ok(None)` / `Ok(false)`) instead.

use thiserror::Error;

/// Errors that can occur when talking to the EAPI gateway.
#[derive(Debug, Error)]
pub enum EapiError {
    /// HTTP transport error (client construction, TLS setup, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// File I/O error. Writing the cookie store is the fatal case: the
    /// session cannot continue without durable cookies.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or parse JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope encryption or decryption failed (bad block length, padding).
    #[error("envelope crypto failed: {0}")]
    Crypto(String),

    /// Building the in-memory log archive failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Catch-all for other errors (e.g. missing config directory).
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for `Result<T, EapiError>`.
pub type Result<T> = std::result::Result<T, EapiError>;
