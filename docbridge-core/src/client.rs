//! The cluster client: connection lifecycle, scoped queries, and document
//! operations against one bucket.
//!
//! A [`ClusterClient`] owns at most one live [`ClusterHandle`] at a time.
//! Operations acquire the handle through a read lock and hold it for their
//! full duration; [`ClusterClient::initialize`] and
//! [`ClusterClient::shutdown`] take the write side, so a re-initialization
//! never exposes a torn or half-replaced handle to concurrent callers —
//! in-flight operations finish against the handle they started with.
//!
//! The hosting process is expected to outlive cluster outages. The minimal
//! contract is connect-or-fail: `initialize` makes one attempt and surfaces
//! the failure. Deployments that must start while the cluster is down can
//! opt into [`ClusterClient::spawn_reconnect`], which keeps retrying on a
//! fixed interval in the background and picks the connection up once the
//! cluster comes online.

use std::sync::Arc;
use std::time::Duration;

use mea::rwlock::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClusterConfig;
use crate::document::{Document, MutationToken, QueryResult, QueryStatus, document_from_json};
use crate::error::{ClusterError, ClusterResult};
use crate::handle::{ClusterConnector, ClusterHandle};
use crate::statement::select_from_bucket;

/// A client for one bucket of a document-oriented database cluster.
///
/// # Example
///
/// ```ignore
/// use docbridge_core::{client::ClusterClient, config::ClusterConfig};
///
/// let config = ClusterConfig::new("db1,db2", "users").credentials("svc", "secret");
/// let client = ClusterClient::connect(config, connector).await?;
///
/// let (id, _) = client.upsert(doc).await?;
/// let fetched = client.get(&id).await?;
/// ```
pub struct ClusterClient<C: ClusterConnector> {
    config: ClusterConfig,
    connector: C,
    handle: RwLock<Option<C::Handle>>,
}

impl<C: ClusterConnector> std::fmt::Debug for ClusterClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: ClusterConnector> ClusterClient<C> {
    /// Creates a client without connecting. Call [`initialize`] (or use
    /// [`connect`]) before issuing operations.
    ///
    /// [`initialize`]: ClusterClient::initialize
    /// [`connect`]: ClusterClient::connect
    pub fn new(config: ClusterConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            handle: RwLock::new(None),
        }
    }

    /// Creates a client and establishes the cluster connection.
    pub async fn connect(config: ClusterConfig, connector: C) -> ClusterResult<Self> {
        let client = Self::new(config, connector);
        client.initialize().await?;
        Ok(client)
    }

    /// Returns the configuration this client was built from.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Returns the bucket all operations are scoped to.
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Returns the connector used to (re-)establish connections.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Establishes the cluster connection, replacing any existing one.
    ///
    /// Idempotent: an existing handle is disconnected before the new one
    /// is installed, so exactly one handle is live at any time. The write
    /// lock is held for the whole exchange — concurrent operations either
    /// complete against the old handle before the swap or start against
    /// the new one after it.
    ///
    /// # Errors
    ///
    /// Fails fast with [`ClusterError::ConnectionUnavailable`] when the
    /// cluster cannot be reached; no retry is attempted here.
    pub async fn initialize(&self) -> ClusterResult<()> {
        let mut guard = self.handle.write().await;
        if let Some(previous) = guard.take() {
            debug!(bucket = %self.config.bucket, "disconnecting previous cluster handle");
            previous.disconnect().await?;
        }
        let nodes = self.config.seed_nodes();
        debug!(?nodes, bucket = %self.config.bucket, "initializing cluster connection");
        let handle = self.connector.connect(&self.config).await?;
        *guard = Some(handle);
        Ok(())
    }

    /// Gracefully disconnects the live handle, if any.
    ///
    /// Safe to call with no handle present and safe to call repeatedly.
    pub async fn shutdown(&self) -> ClusterResult<()> {
        let mut guard = self.handle.write().await;
        if let Some(handle) = guard.take() {
            debug!(bucket = %self.config.bucket, "disconnecting from cluster");
            handle.disconnect().await?;
        }
        Ok(())
    }

    /// Returns true when a live handle is installed.
    pub async fn is_connected(&self) -> bool {
        self.handle.read().await.is_some()
    }

    /// Executes a bucket-scoped query for the given predicate.
    ///
    /// The statement takes the shape
    /// ``SELECT * FROM `bucket` WHERE <predicate>`` with the predicate
    /// passed through verbatim.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::ConnectionUnavailable`] when no live handle exists.
    /// - [`ClusterError::QueryExecution`] when the cluster reports an error
    ///   status; a result with unchecked error status is never returned.
    pub async fn query(&self, predicate: &str) -> ClusterResult<QueryResult> {
        self.execute_query(predicate, None).await
    }

    /// Executes a bucket-scoped query, binding a named-parameter object.
    pub async fn query_with_params(
        &self,
        predicate: &str,
        parameters: Map<String, Value>,
    ) -> ClusterResult<QueryResult> {
        self.execute_query(predicate, Some(&parameters)).await
    }

    async fn execute_query(
        &self,
        predicate: &str,
        parameters: Option<&Map<String, Value>>,
    ) -> ClusterResult<QueryResult> {
        let statement = select_from_bucket(&self.config.bucket, predicate);
        let guard = self.handle.read().await;
        let handle = guard.as_ref().ok_or_else(|| self.no_handle())?;
        let result = handle.query(&statement, parameters).await?;
        if result.status == QueryStatus::Errors {
            return Err(ClusterError::QueryExecution {
                statement,
                bucket: self.config.bucket.clone(),
            });
        }
        Ok(result)
    }

    /// Writes a document under a freshly generated unique id.
    ///
    /// Returns the generated id together with the write confirmation.
    pub async fn upsert(&self, document: Document) -> ClusterResult<(String, MutationToken)> {
        let id = Uuid::new_v4().to_string();
        let token = self.upsert_with_id(&id, document).await?;
        Ok((id, token))
    }

    /// Creates or overwrites the document at `id` within the bucket's
    /// default collection.
    pub async fn upsert_with_id(&self, id: &str, document: Document) -> ClusterResult<MutationToken> {
        let guard = self.handle.read().await;
        let handle = guard.as_ref().ok_or_else(|| self.no_handle())?;
        handle.upsert(&self.config.bucket, id, document).await
    }

    /// Parses raw JSON content and writes it under a generated id.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Serialization`] when the content is not a
    /// JSON object.
    pub async fn upsert_json(&self, content: &str) -> ClusterResult<(String, MutationToken)> {
        let document = document_from_json(content)?;
        self.upsert(document).await
    }

    /// Fetches the document at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::DocumentNotFound`] when no document exists
    /// at `id`.
    pub async fn get(&self, id: &str) -> ClusterResult<Document> {
        let guard = self.handle.read().await;
        let handle = guard.as_ref().ok_or_else(|| self.no_handle())?;
        handle.get(&self.config.bucket, id).await
    }

    /// Removes the document at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::DocumentNotFound`] when no document exists
    /// at `id`.
    pub async fn remove(&self, id: &str) -> ClusterResult<MutationToken> {
        let guard = self.handle.read().await;
        let handle = guard.as_ref().ok_or_else(|| self.no_handle())?;
        handle.remove(&self.config.bucket, id).await
    }

    fn no_handle(&self) -> ClusterError {
        ClusterError::ConnectionUnavailable(format!(
            "no live handle for bucket `{}`",
            self.config.bucket
        ))
    }
}

impl<C> ClusterClient<C>
where
    C: ClusterConnector + 'static,
    C::Handle: 'static,
{
    /// Opt-in resilience extension: keeps attempting [`initialize`] on a
    /// fixed interval until a connection is established.
    ///
    /// This is what lets a host process start while the cluster is
    /// unreachable and acquire connectivity once it recovers. The task
    /// exits after the first successful attempt; nothing re-arms it if the
    /// connection is later lost. `initialize` itself never retries.
    ///
    /// [`initialize`]: ClusterClient::initialize
    pub fn spawn_reconnect(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match client.initialize().await {
                    Ok(()) => {
                        debug!(bucket = %client.config.bucket, "cluster connection established");
                        break;
                    }
                    Err(err) => {
                        warn!(
                            bucket = %client.config.bucket,
                            error = %err,
                            retry_in = ?interval,
                            "cluster unreachable, will retry"
                        );
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    /// Connector stub backed by a shared map; counts connections and can
    /// be flipped unreachable.
    #[derive(Default)]
    struct StubConnector {
        reachable: AtomicBool,
        connects: AtomicU64,
        store: Arc<Mutex<HashMap<String, Document>>>,
    }

    impl StubConnector {
        fn reachable() -> Self {
            Self {
                reachable: AtomicBool::new(true),
                ..Self::default()
            }
        }

        fn unreachable() -> Self {
            Self::default()
        }
    }

    #[derive(Debug)]
    struct StubHandle {
        store: Arc<Mutex<HashMap<String, Document>>>,
    }

    #[async_trait]
    impl ClusterHandle for StubHandle {
        async fn query(
            &self,
            statement: &str,
            _parameters: Option<&Map<String, Value>>,
        ) -> ClusterResult<QueryResult> {
            if statement.contains("BROKEN") {
                return Ok(QueryResult::errors());
            }
            Ok(QueryResult::success(
                self.store.lock().unwrap().values().cloned().collect(),
            ))
        }

        async fn upsert(
            &self,
            _bucket: &str,
            id: &str,
            document: Document,
        ) -> ClusterResult<MutationToken> {
            self.store.lock().unwrap().insert(id.to_string(), document);
            Ok(MutationToken::new(1))
        }

        async fn get(&self, bucket: &str, id: &str) -> ClusterResult<Document> {
            self.store
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ClusterError::DocumentNotFound(id.into(), bucket.into()))
        }

        async fn remove(&self, bucket: &str, id: &str) -> ClusterResult<MutationToken> {
            self.store
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| MutationToken::new(2))
                .ok_or_else(|| ClusterError::DocumentNotFound(id.into(), bucket.into()))
        }
    }

    #[async_trait]
    impl ClusterConnector for StubConnector {
        type Handle = StubHandle;

        async fn connect(&self, config: &ClusterConfig) -> ClusterResult<StubHandle> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if !self.reachable.load(Ordering::SeqCst) {
                return Err(ClusterError::ConnectionUnavailable(format!(
                    "no reachable seed node in {:?}",
                    config.seed_nodes()
                )));
            }
            Ok(StubHandle {
                store: Arc::clone(&self.store),
            })
        }
    }

    fn config() -> ClusterConfig {
        ClusterConfig::new("db1,db2", "users")
    }

    #[tokio::test]
    async fn operations_fail_fast_without_a_handle() {
        let client = ClusterClient::new(config(), StubConnector::reachable());
        let err = client.get("some-id").await.unwrap_err();
        assert!(matches!(err, ClusterError::ConnectionUnavailable(_)));
        let err = client.query("1 = 1").await.unwrap_err();
        assert!(matches!(err, ClusterError::ConnectionUnavailable(_)));
    }

    #[tokio::test]
    async fn connect_installs_a_handle() {
        let client = ClusterClient::connect(config(), StubConnector::reachable())
            .await
            .unwrap();
        assert!(client.is_connected().await);
    }

    #[tokio::test]
    async fn bootstrap_failure_surfaces_connection_unavailable() {
        let result = ClusterClient::connect(config(), StubConnector::unreachable()).await;
        assert!(matches!(
            result.unwrap_err(),
            ClusterError::ConnectionUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let client = ClusterClient::connect(config(), StubConnector::reachable())
            .await
            .unwrap();
        client.shutdown().await.unwrap();
        client.shutdown().await.unwrap();
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn reinitialize_replaces_the_handle() {
        let client = ClusterClient::connect(config(), StubConnector::reachable())
            .await
            .unwrap();
        client.initialize().await.unwrap();
        assert!(client.is_connected().await);
        assert_eq!(client.connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn upsert_generates_distinct_ids() {
        let client = ClusterClient::connect(config(), StubConnector::reachable())
            .await
            .unwrap();
        let doc = json!({"email": "a@x.com"}).as_object().cloned().unwrap();
        let (first, _) = client.upsert(doc.clone()).await.unwrap();
        let (second, _) = client.upsert(doc).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn error_status_query_reports_statement_and_bucket() {
        let client = ClusterClient::connect(config(), StubConnector::reachable())
            .await
            .unwrap();
        let err = client.query("BROKEN >").await.unwrap_err();
        match err {
            ClusterError::QueryExecution { statement, bucket } => {
                assert_eq!(statement, "SELECT * FROM `users` WHERE BROKEN >");
                assert_eq!(bucket, "users");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn upsert_json_rejects_non_objects() {
        let client = ClusterClient::connect(config(), StubConnector::reachable())
            .await
            .unwrap();
        let err = client.upsert_json("42").await.unwrap_err();
        assert!(matches!(err, ClusterError::Serialization(_)));
    }

    #[tokio::test]
    async fn spawn_reconnect_acquires_connection_once_reachable() {
        let client = Arc::new(ClusterClient::new(config(), StubConnector::unreachable()));
        let task = client.spawn_reconnect(Duration::from_millis(5));
        assert!(!client.is_connected().await);

        client.connector.reachable.store(true, Ordering::SeqCst);
        task.await.unwrap();
        assert!(client.is_connected().await);
    }
}
