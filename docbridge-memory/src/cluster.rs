//! In-memory cluster implementation.
//!
//! [`MemoryCluster`] keeps every bucket's default collection in a HashMap
//! behind an async read-write lock, which makes it a complete stand-in for
//! a real cluster in tests and embedded deployments. Cloning shares the
//! underlying state, so a connector can hand out fresh handles to the same
//! data across re-initializations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use docbridge_core::config::ClusterConfig;
use docbridge_core::document::{Document, MutationToken, QueryResult};
use docbridge_core::error::{ClusterError, ClusterResult};
use docbridge_core::handle::{ClusterConnector, ClusterHandle};

use crate::predicate::Predicate;

type CollectionMap = HashMap<String, Document>;
type BucketMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document cluster.
///
/// Documents live in per-bucket default collections; upserts overwrite,
/// and every mutation is stamped with a monotonically increasing cas
/// value.
#[derive(Default, Clone, Debug)]
pub struct MemoryCluster {
    buckets: Arc<RwLock<BucketMap>>,
    cas: Arc<AtomicU64>,
}

impl MemoryCluster {
    /// Creates an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_cas(&self) -> MutationToken {
        MutationToken::new(self.cas.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

// The stand-in accepts exactly the statement shape the client emits.
fn split_statement(statement: &str) -> Option<(&str, &str)> {
    let rest = statement.strip_prefix("SELECT * FROM `")?;
    rest.split_once("` WHERE ")
}

#[async_trait]
impl ClusterHandle for MemoryCluster {
    async fn query(
        &self,
        statement: &str,
        parameters: Option<&Map<String, Value>>,
    ) -> ClusterResult<QueryResult> {
        let Some((bucket, predicate_text)) = split_statement(statement) else {
            debug!(statement, "rejecting statement outside the supported shape");
            return Ok(QueryResult::errors());
        };
        let predicate = match Predicate::parse(predicate_text).and_then(|p| p.bind(parameters)) {
            Ok(predicate) => predicate,
            Err(err) => {
                debug!(statement, error = %err, "rejecting predicate");
                return Ok(QueryResult::errors());
            }
        };

        let buckets = self.buckets.read().await;
        let rows = match buckets.get(bucket) {
            Some(collection) => collection
                .values()
                .filter(|document| predicate.matches(document))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(QueryResult::success(rows))
    }

    async fn upsert(
        &self,
        bucket: &str,
        id: &str,
        document: Document,
    ) -> ClusterResult<MutationToken> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(self.next_cas())
    }

    async fn get(&self, bucket: &str, id: &str) -> ClusterResult<Document> {
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .and_then(|collection| collection.get(id))
            .cloned()
            .ok_or_else(|| ClusterError::DocumentNotFound(id.to_string(), bucket.to_string()))
    }

    async fn remove(&self, bucket: &str, id: &str) -> ClusterResult<MutationToken> {
        let mut buckets = self.buckets.write().await;
        buckets
            .get_mut(bucket)
            .and_then(|collection| collection.remove(id))
            .map(|_| self.next_cas())
            .ok_or_else(|| ClusterError::DocumentNotFound(id.to_string(), bucket.to_string()))
    }
}

/// Connector handing out handles to one shared [`MemoryCluster`].
///
/// Reachability can be toggled to exercise bootstrap-failure and
/// background-reconnect behavior without a network.
pub struct MemoryConnector {
    cluster: MemoryCluster,
    reachable: Arc<AtomicBool>,
}

impl MemoryConnector {
    /// Creates a reachable connector over a fresh cluster.
    pub fn new() -> Self {
        Self::with_cluster(MemoryCluster::new())
    }

    /// Creates a reachable connector over an existing cluster.
    pub fn with_cluster(cluster: MemoryCluster) -> Self {
        Self {
            cluster,
            reachable: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Creates a connector whose cluster is down until
    /// [`set_reachable`](MemoryConnector::set_reachable) flips it.
    pub fn unreachable() -> Self {
        let connector = Self::new();
        connector.set_reachable(false);
        connector
    }

    /// Marks the cluster reachable or unreachable for future connects.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Returns the shared cluster behind this connector.
    pub fn cluster(&self) -> &MemoryCluster {
        &self.cluster
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterConnector for MemoryConnector {
    type Handle = MemoryCluster;

    async fn connect(&self, config: &ClusterConfig) -> ClusterResult<MemoryCluster> {
        let nodes = config.seed_nodes();
        if nodes.is_empty() {
            return Err(ClusterError::ConnectionUnavailable(
                "empty seed-node set".to_string(),
            ));
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(ClusterError::ConnectionUnavailable(format!(
                "no reachable seed node in {nodes:?}"
            )));
        }
        Ok(self.cluster.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn upsert_overwrites_and_advances_cas() {
        let cluster = MemoryCluster::new();
        let first = cluster
            .upsert("users", "u1", doc(json!({"n": 1})))
            .await
            .unwrap();
        let second = cluster
            .upsert("users", "u1", doc(json!({"n": 2})))
            .await
            .unwrap();
        assert!(second.cas > first.cas);
        let fetched = cluster.get("users", "u1").await.unwrap();
        assert_eq!(fetched, doc(json!({"n": 2})));
    }

    #[tokio::test]
    async fn get_and_remove_missing_documents() {
        let cluster = MemoryCluster::new();
        assert!(matches!(
            cluster.get("users", "nope").await.unwrap_err(),
            ClusterError::DocumentNotFound(id, bucket) if id == "nope" && bucket == "users"
        ));
        assert!(matches!(
            cluster.remove("users", "nope").await.unwrap_err(),
            ClusterError::DocumentNotFound(_, _)
        ));
    }

    #[tokio::test]
    async fn query_filters_documents() {
        let cluster = MemoryCluster::new();
        cluster
            .upsert("users", "u1", doc(json!({"email": "a@x.com"})))
            .await
            .unwrap();
        cluster
            .upsert("users", "u2", doc(json!({"email": "b@x.com"})))
            .await
            .unwrap();

        let result = cluster
            .query("SELECT * FROM `users` WHERE email = 'a@x.com'", None)
            .await
            .unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.rows[0]["email"], json!("a@x.com"));
    }

    #[tokio::test]
    async fn zero_match_query_is_success_not_error() {
        let cluster = MemoryCluster::new();
        let result = cluster
            .query("SELECT * FROM `users` WHERE email = 'nobody'", None)
            .await
            .unwrap();
        assert_eq!(result.status, docbridge_core::document::QueryStatus::Success);
        assert!(!result.has_rows());
    }

    #[tokio::test]
    async fn malformed_statement_reports_error_status() {
        let cluster = MemoryCluster::new();
        let result = cluster
            .query("SELECT * FROM `users` WHERE email ~~ oops", None)
            .await
            .unwrap();
        assert_eq!(result.status, docbridge_core::document::QueryStatus::Errors);
        let result = cluster.query("DROP TABLE users", None).await.unwrap();
        assert_eq!(result.status, docbridge_core::document::QueryStatus::Errors);
    }

    #[tokio::test]
    async fn connector_reachability_gates_connect() {
        let connector = MemoryConnector::unreachable();
        let config = ClusterConfig::new("db1", "users");
        assert!(matches!(
            connector.connect(&config).await.unwrap_err(),
            ClusterError::ConnectionUnavailable(_)
        ));

        connector.set_reachable(true);
        assert!(connector.connect(&config).await.is_ok());
    }
}
