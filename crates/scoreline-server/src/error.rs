//! Server error types.

/// Errors raised while building or starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding or inspecting the listener failed.
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),

    /// The configured frontend URL is not a valid `Origin` header value.
    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(String),

    /// A configuration value the server cannot run with.
    #[error("invalid server config: {0}")]
    InvalidConfig(&'static str),

    /// The Prometheus recorder could not be installed.
    #[error("failed to install metrics recorder: {0}")]
    Metrics(String),
}
