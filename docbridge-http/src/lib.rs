//! HTTP gateway backend for docbridge.
//!
//! Reaches the cluster through its HTTP surface: the query service for
//! bucket-scoped statements and the KV REST endpoints for document
//! operations. Connection bootstrap probes the configured seed nodes in
//! order and settles on the first one that answers; the configured
//! timeouts and HTTP connection cap are applied to the underlying
//! `reqwest` client.

#[allow(unused_extern_crates)]
extern crate self as docbridge_http;

pub mod gateway;

pub use gateway::{HttpConnector, HttpHandle};
