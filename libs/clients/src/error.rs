//! Error types for the component clients.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the BBS, Garden, Consul and router clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or invalid TLS material.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The BBS answered with an error model.
    #[error("bbs error {kind}: {message}")]
    Bbs { kind: i32, message: String },

    /// A server answered with an unexpected status.
    #[error("{url} returned {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// Garden refused an operation on a container.
    #[error("garden: {handle}: {message}")]
    Garden { handle: String, message: String },

    /// A condition was not met in time.
    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    /// An address from the deployment could not be used.
    #[error(transparent)]
    World(#[from] dusts_world::WorldError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
