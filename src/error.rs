//! Error taxonomy for queries and the mock server lifecycle.

use thiserror::Error;

use crate::tree::Role;

/// Failures raised by the query surface. All of these surface as failing
/// tests, never as process aborts.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no element matched {query}")]
    NotFound { query: String },

    #[error("{count} elements matched {query}, expected exactly one")]
    Ambiguous { query: String, count: usize },

    /// The handle was taken from an earlier render and the node is gone.
    #[error("element handle {path} is stale: no {role} at that position anymore")]
    Stale { path: String, role: Role },

    #[error("no element matched {query} within {waited_ms} ms")]
    Timeout { query: String, waited_ms: u64 },

    /// The component itself failed while queued input was being flushed.
    #[error("component failed while {context}: {message}")]
    Component { context: String, message: String },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("mock server is not listening")]
    NotListening,

    #[error("failed to bind mock server: {0}")]
    Bind(#[from] std::io::Error),
}
