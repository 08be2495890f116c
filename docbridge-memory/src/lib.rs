//! In-memory cluster backend for docbridge.
//!
//! This crate provides a complete in-memory implementation of the
//! `ClusterHandle`/`ClusterConnector` seam, enabling tests and embedded
//! deployments to run the full client surface without a cluster.
//! It includes a minimal predicate evaluator so bucket-scoped queries
//! behave like the real query service for simple comparison predicates.

#[allow(unused_extern_crates)]
extern crate self as docbridge_memory;

pub mod cluster;
pub mod predicate;

pub use cluster::{MemoryCluster, MemoryConnector};
