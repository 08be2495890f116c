//! The outbound seam between the client and a concrete cluster transport.
//!
//! The cluster's wire protocol is an opaque dependency: everything the
//! client needs from it is expressed by [`ClusterHandle`] (one live
//! connection) and [`ClusterConnector`] (the factory that can mint a fresh
//! handle from a [`ClusterConfig`] as often as re-initialization demands).
//!
//! # Thread Safety
//!
//! Handles must support concurrent query and document operations from
//! multiple tasks; the exact concurrency model is implementation-specific.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::config::ClusterConfig;
use crate::document::{Document, MutationToken, QueryResult};
use crate::error::ClusterResult;

/// One live connection to the cluster.
///
/// Exactly one handle is active per client instance at any time; the
/// client tears the previous handle down before installing a replacement.
#[async_trait]
pub trait ClusterHandle: Send + Sync + Debug {
    /// Executes a full statement with optional named parameters and
    /// returns the raw result, whatever its status.
    ///
    /// Interpreting the status is the client's job — implementations
    /// report what the cluster said rather than failing on `ERRORS`.
    async fn query(
        &self,
        statement: &str,
        parameters: Option<&Map<String, Value>>,
    ) -> ClusterResult<QueryResult>;

    /// Creates or overwrites the document at `id` within the bucket's
    /// default collection.
    async fn upsert(
        &self,
        bucket: &str,
        id: &str,
        document: Document,
    ) -> ClusterResult<MutationToken>;

    /// Fetches the document at `id` from the bucket's default collection.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::DocumentNotFound`](crate::error::ClusterError::DocumentNotFound)
    /// if no document exists at `id`.
    async fn get(&self, bucket: &str, id: &str) -> ClusterResult<Document>;

    /// Removes the document at `id` from the bucket's default collection.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::DocumentNotFound`](crate::error::ClusterError::DocumentNotFound)
    /// if no document exists at `id`.
    async fn remove(&self, bucket: &str, id: &str) -> ClusterResult<MutationToken>;

    /// Gracefully releases the connection.
    ///
    /// The default implementation is a no-op; transports holding sockets
    /// or pools should override it.
    async fn disconnect(self) -> ClusterResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory for [`ClusterHandle`]s.
///
/// Unlike a one-shot builder, `connect` borrows the connector: the client
/// re-invokes it on every (re-)initialization against the same immutable
/// configuration.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    /// The handle type this connector produces.
    type Handle: ClusterHandle;

    /// Establishes a connection using the config's seed-node set and
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::ConnectionUnavailable`](crate::error::ClusterError::ConnectionUnavailable)
    /// when the cluster cannot be reached through any seed node.
    async fn connect(&self, config: &ClusterConfig) -> ClusterResult<Self::Handle>;
}
