/// Error types for census data access
use thiserror::Error;

/// Failure while fetching or decoding census data
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Payload was not the JSON we expected
    #[error("Failed to decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: simd_json::Error,
    },

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data source cannot serve this request
    #[error("Not available: {0}")]
    Unsupported(&'static str),
}

/// Type alias for Results using ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
