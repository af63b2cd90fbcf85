//! Error types for the world crate.

use thiserror::Error;

/// Errors raised while preparing artifacts, addresses or component runners.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A component was requested whose executable was never built.
    #[error("no executable built for {0}")]
    MissingExecutable(String),

    /// Compiling a package failed.
    #[error("failed to build {package}:\n{output}")]
    Build { package: String, output: String },

    /// A source tree needed for a build is not configured.
    #[error("missing source path: set {0}")]
    MissingSource(String),

    /// The port range cannot satisfy a claim.
    #[error("port range exhausted: requested {requested} ports, {remaining} left before {end}")]
    PortsExhausted {
        requested: u16,
        remaining: u32,
        end: u32,
    },

    /// A port range is malformed.
    #[error("invalid port range {start}..{end}")]
    InvalidPortRange { start: u32, end: u32 },

    /// An address could not be parsed as host:port.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Unsupported V0 release.
    #[error("unsupported diego version {0:?} (expected v1.0.0 or v1.25.2)")]
    UnknownVersion(String),

    /// Certificate generation failed.
    #[error("certificate error: {0}")]
    Certificate(#[from] rcgen::Error),

    /// The component maker was used before `setup()`.
    #[error("component maker is not set up")]
    NotSetUp,

    /// Database provisioning failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization failed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
