//! Error types for the catalog API client.
//!
//! # Design
//! Two kinds of failure matter to callers: the request never completed
//! (`Transport`), or the server answered with a non-success status
//! (`Application`). The remaining variants cover the local steps around the
//! exchange: encoding the body, building the URL, decoding the answer.

/// Errors returned by the gateway and every `CatalogClient` operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// DNS, connect, abort, timeout or body-read failure, passed through as-is.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server returned a non-2xx status. `message` is the body's `error`
    /// field when present, otherwise `HTTP <status>`.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// A response body was not JSON or did not match the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request payload could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of an application error, or the status attached to a
    /// transport error if reqwest recorded one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Application { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
