//! Errors returned by the node client.

use thiserror::Error;

/// Error type for calls into the node API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("request to node failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a status code other than the expected one.
    #[error("server returned HTTP {status} (expected: {expected}), body: {body}")]
    UnexpectedStatus {
        status: u16,
        expected: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("received incorrect response from node: {0}")]
    Decode(#[from] serde_json::Error),

    /// A configured node address is not a usable base URL.
    #[error("invalid node address: {0}")]
    InvalidUrl(String),
}
