//! Error and result types for cluster client operations.
//!
//! Every fallible operation in this crate returns [`ClusterResult<T>`].
//! The variants of [`ClusterError`] are the full error surface a caller
//! needs to inspect; none of them is ever swallowed internally.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the cluster access layer.
///
/// The taxonomy distinguishes connectivity problems from query-level and
/// document-level failures so that callers can map each to their own
/// user-visible behavior.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// No live cluster handle exists: the client was never initialized,
    /// bootstrap failed, or the connection has been shut down.
    #[error("cluster connection unavailable: {0}")]
    ConnectionUnavailable(String),
    /// A query executed but the cluster reported an error status.
    /// Carries the full statement and the bucket for diagnostics.
    #[error("query against bucket {bucket} returned error status: {statement}")]
    QueryExecution {
        /// The statement as sent to the cluster.
        statement: String,
        /// The bucket the statement was scoped to.
        bucket: String,
    },
    /// The requested document was not found in the bucket's default
    /// collection. The first argument is the document id, the second the
    /// bucket name.
    #[error("document {0} not found in bucket {1}")]
    DocumentNotFound(String, String),
    /// A payload could not be encoded to, or decoded from, the cluster's
    /// native document format.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// A failure in the underlying transport while talking to the cluster.
    #[error("transport error: {0}")]
    Transport(String),
}

/// A specialized `Result` type for cluster client operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

impl From<SerdeJsonError> for ClusterError {
    fn from(err: SerdeJsonError) -> Self {
        ClusterError::Serialization(err.to_string())
    }
}
