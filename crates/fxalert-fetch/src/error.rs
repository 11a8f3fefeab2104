//! Fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching a quote.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status.
    #[error("Server error: {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The payload could not be decoded.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// The envelope reported a non-200 status.
    #[error("Provider status {status}")]
    Status {
        /// Status reported inside the envelope.
        status: i64,
    },

    /// The envelope carried no bars.
    #[error("No quotes in response")]
    Empty,

    /// The decoded bar failed validation.
    #[error("Invalid quote: {0}")]
    InvalidBar(String),
}
