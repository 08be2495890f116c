//! Main docbridge crate providing a unified interface to document clusters.
//!
//! This crate is the primary entry point for users of the docbridge
//! project. It re-exports the core types from the sub-crates and provides
//! convenient access to the available cluster backends.
//!
//! # Features
//!
//! - **Connection lifecycle** - Initialize, shut down, and safely re-initialize one cluster connection per client
//! - **Bucket-scoped queries** - Caller-supplied predicates with optional named parameters
//! - **Schema-less CRUD** - Upsert, fetch, and remove JSON documents in the bucket's default collection
//! - **Attribute extraction** - Project fetched documents into multi-valued attribute maps
//!
//! The hosting process stays operational when the cluster is down: every
//! operation fails fast with a distinct error while no connection exists,
//! and the opt-in background reconnect task picks the connection up once
//! the cluster is reachable again.
//!
//! # Quick Start
//!
//! ```ignore
//! use docbridge::{prelude::*, memory::MemoryConnector};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> ClusterResult<()> {
//!     let config = ClusterConfig::new("db1,db2", "users").credentials("svc", "secret");
//!     let client = ClusterClient::connect(config, MemoryConnector::new()).await?;
//!
//!     // Store a document under a generated id
//!     let doc = json!({"email": "a@x.com"}).as_object().cloned().unwrap();
//!     let (id, _) = client.upsert(doc).await?;
//!
//!     // Fetch it back and extract attributes
//!     let fetched = client.get(&id).await?;
//!     let attributes = collect_attributes(&fetched, |name| name.starts_with("e"));
//!     assert_eq!(attributes["email"], vec![json!("a@x.com")]);
//!
//!     // Query the bucket with a bound parameter
//!     let params = json!({"email": "a@x.com"}).as_object().cloned().unwrap();
//!     let result = client.query_with_params("email = $email", params).await?;
//!     assert_eq!(result.row_count(), 1);
//!
//!     client.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory cluster stand-in for development and testing
//! - [`http`] - HTTP gateway backend (requires the `http` feature)

pub mod prelude;

pub use docbridge_core::{attributes, client, config, document, error, handle, statement};

/// In-memory cluster backend implementations.
pub mod memory {
    pub use docbridge_memory::{MemoryCluster, MemoryConnector};
}

/// HTTP gateway backend implementations.
///
/// This module is only available when the `http` feature is enabled.
#[cfg(feature = "http")]
pub mod http {
    pub use docbridge_http::{HttpConnector, HttpHandle};
}
