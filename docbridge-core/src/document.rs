//! Document and result types for cluster operations.
//!
//! Documents are schema-less: any JSON-shaped value tree can be stored,
//! keyed by a string id unique within the bucket's default collection.
//! Nothing in this module imposes a schema or performs object mapping —
//! callers work with the value tree directly.

use serde_json::{Map, Value};

use crate::error::{ClusterError, ClusterResult};

/// A schema-less document: an ordered mapping from field name to value,
/// where a value may be a scalar, a nested mapping, or a sequence.
pub type Document = Map<String, Value>;

/// Parses a raw JSON string into a [`Document`].
///
/// # Errors
///
/// Returns [`ClusterError::Serialization`] if the string is not valid JSON
/// or does not describe an object at the top level.
pub fn document_from_json(content: &str) -> ClusterResult<Document> {
    match serde_json::from_str::<Value>(content)? {
        Value::Object(map) => Ok(map),
        other => Err(ClusterError::Serialization(format!(
            "expected a JSON object at the top level, got {other}"
        ))),
    }
}

/// Terminal status of an executed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The query completed and all results were returned.
    Success,
    /// The query executed but the cluster reported errors.
    Errors,
    /// The query was aborted by the server-side timeout.
    Timeout,
    /// The cluster reported a status this client does not recognize.
    Unknown,
}

/// The outcome of one query execution: the matched documents plus the
/// status the cluster reported. Transient — consumed once by the caller.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// The documents matched by the query, in cluster-returned order.
    pub rows: Vec<Document>,
    /// The status reported by the cluster.
    pub status: QueryStatus,
}

impl QueryResult {
    /// Creates a successful result over the given rows.
    pub fn success(rows: Vec<Document>) -> Self {
        Self {
            rows,
            status: QueryStatus::Success,
        }
    }

    /// Creates an empty result carrying an error status.
    pub fn errors() -> Self {
        Self {
            rows: Vec::new(),
            status: QueryStatus::Errors,
        }
    }

    /// Returns true if the result contains at least one row.
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Returns the number of matched documents.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Confirmation metadata returned by a successful write.
///
/// The `cas` value is the cluster's sequence marker for the mutation;
/// callers that do not need optimistic-concurrency checks may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationToken {
    /// Compare-and-swap sequence value assigned by the cluster.
    pub cas: u64,
}

impl MutationToken {
    /// Wraps a cas sequence value.
    pub fn new(cas: u64) -> Self {
        Self { cas }
    }
}
