//! Error types for the REST client.

/// Errors returned by [`crate::RestClient`].
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The caller supplied something the API would reject anyway.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a structured error object.
    #[error("API returned {status} (expected 200) with error \"{code}: {message}\"")]
    Api {
        /// HTTP status code.
        status: u16,
        /// API error code from the response body.
        code: i64,
        /// API error message from the response body.
        message: String,
    },

    /// The API answered with a non-200 status and no error object.
    #[error("API returned {status} (expected 200) with no error object")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },

    /// A request or response body was not valid JSON.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// An attachment could not be read from disk.
    #[error("failed to read attachment: {0}")]
    Io(#[from] std::io::Error),
}
