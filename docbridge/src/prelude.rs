//! Convenient re-exports of commonly used types from docbridge.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docbridge::prelude::*;
//! ```

pub use docbridge_core::{
    attributes::{AttributeMap, collect_attributes},
    client::ClusterClient,
    config::ClusterConfig,
    document::{Document, MutationToken, QueryResult, QueryStatus, document_from_json},
    error::{ClusterError, ClusterResult},
    handle::{ClusterConnector, ClusterHandle},
};
