//! A client-side access layer for document-oriented database clusters.
//!
//! This crate is the core of the docbridge project and provides:
//!
//! - **Configuration** ([`config`]) - Immutable cluster configuration with seed nodes, credentials, and timeouts
//! - **Connection lifecycle** ([`client`]) - The cluster client: initialize, shutdown, and safe re-initialization
//! - **Transport seam** ([`handle`]) - Traits a concrete cluster transport implements
//! - **Documents and results** ([`document`]) - Schema-less document values, query results, mutation tokens
//! - **Statement construction** ([`statement`]) - Bucket-scoped query statements
//! - **Attribute extraction** ([`attributes`]) - Multi-valued attribute maps for downstream release logic
//! - **Error handling** ([`error`]) - The error taxonomy and result type
//!
//! The database is treated as a best-effort dependency: the hosting
//! process stays operational when the cluster is unreachable and picks a
//! working connection back up through explicit re-initialization or the
//! opt-in background reconnect task.
//!
//! # Example
//!
//! ```ignore
//! use docbridge_core::{client::ClusterClient, config::ClusterConfig};
//! use docbridge_core::attributes::collect_attributes;
//!
//! let config = ClusterConfig::new("db1,db2", "users").credentials("svc", "secret");
//! let client = ClusterClient::connect(config, connector).await?;
//!
//! let (id, _) = client.upsert_json(r#"{"email":"a@x.com"}"#).await?;
//! let doc = client.get(&id).await?;
//! let attributes = collect_attributes(&doc, |name| name.starts_with("e"));
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbridge_core;

pub mod attributes;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod handle;
pub mod statement;
