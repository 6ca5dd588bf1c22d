//! Error taxonomy for query execution.

use thiserror::Error;

/// Everything a query round trip can fail with.
///
/// Errors are returned to the caller as-is; the library never retries and
/// never logs them.
#[derive(Debug, Error)]
pub enum Error {
    /// Duration literal did not match `<int><unit>`.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// HTTP status outside 2xx and outside the codes Prometheus uses for
    /// structured errors (400, 422, 503).
    #[error("request to {url} failed with HTTP status {status}")]
    Transport { status: u16, url: String },

    /// Connection or body read failure reported by the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `status: "error"` envelope returned by the server.
    #[error("{error_type}: {message}")]
    Application { error_type: String, message: String },

    /// `resultType` discriminator not one of vector, matrix, scalar, string.
    #[error("unknown result type: {0}")]
    UnknownResultType(String),

    /// Body was not JSON or did not have the expected shape.
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A `[timestamp, value]` pair that cannot be turned into a sample.
    #[error("malformed sample: {0}")]
    MalformedSample(String),

    /// Success envelope without a `data` object.
    #[error("response has status success but no data")]
    MissingData,

    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The connection was released with `close()`.
    #[error("client has been closed")]
    ClientClosed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
