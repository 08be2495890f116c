//! Cluster connection configuration.
//!
//! [`ClusterConfig`] carries everything the client needs to reach a
//! cluster: the seed-node list, credentials, the bucket to scope all
//! operations to, the per-operation timeout budget, and the HTTP
//! connection cap. The configuration is built once by the hosting
//! application and never mutated after the client takes ownership of it.

use std::collections::BTreeSet;
use std::time::Duration;

/// Configuration for one cluster client instance.
///
/// All timeouts default to the values the cluster's own driver ships with;
/// override the ones that matter for your deployment with the fluent
/// setters.
///
/// # Example
///
/// ```ignore
/// use docbridge_core::config::ClusterConfig;
/// use std::time::Duration;
///
/// let config = ClusterConfig::new("db1.internal,db2.internal", "users")
///     .credentials("svc-auth", "secret")
///     .query_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Comma-delimited list of seed-node addresses.
    pub node_set: String,
    /// The bucket all queries and document operations are scoped to.
    pub bucket: String,
    /// Username for cluster authentication.
    pub username: String,
    /// Password for cluster authentication.
    pub password: String,
    /// Timeout for establishing the cluster connection.
    pub connect_timeout: Duration,
    /// Timeout for key-value operations (upsert, get, remove).
    pub kv_timeout: Duration,
    /// Timeout for query execution.
    pub query_timeout: Duration,
    /// Timeout for search operations.
    pub search_timeout: Duration,
    /// Timeout for view operations.
    pub view_timeout: Duration,
    /// Upper bound on concurrent HTTP connections to the cluster.
    pub max_http_connections: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_set: "localhost".to_string(),
            bucket: "default".to_string(),
            username: String::new(),
            password: String::new(),
            connect_timeout: Duration::from_secs(10),
            kv_timeout: Duration::from_millis(2500),
            query_timeout: Duration::from_secs(75),
            search_timeout: Duration::from_secs(75),
            view_timeout: Duration::from_secs(75),
            max_http_connections: 12,
        }
    }
}

impl ClusterConfig {
    /// Creates a configuration for the given node list and bucket with
    /// default timeouts.
    pub fn new(node_set: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            node_set: node_set.into(),
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Sets the cluster credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the key-value operation timeout.
    pub fn kv_timeout(mut self, timeout: Duration) -> Self {
        self.kv_timeout = timeout;
        self
    }

    /// Sets the query timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Sets the search timeout.
    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    /// Sets the view timeout.
    pub fn view_timeout(mut self, timeout: Duration) -> Self {
        self.view_timeout = timeout;
        self
    }

    /// Sets the maximum number of concurrent HTTP connections.
    pub fn max_http_connections(mut self, max: usize) -> Self {
        self.max_http_connections = max;
        self
    }

    /// Parses the comma-delimited node list into the seed-node set.
    ///
    /// Entries are trimmed, blanks are skipped, and duplicates collapse;
    /// the order of the list is irrelevant to bootstrap.
    pub fn seed_nodes(&self) -> BTreeSet<String> {
        self.node_set
            .split(',')
            .map(str::trim)
            .filter(|node| !node.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let config = ClusterConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.kv_timeout, Duration::from_millis(2500));
        assert_eq!(config.query_timeout, Duration::from_secs(75));
        assert_eq!(config.max_http_connections, 12);
    }

    #[test]
    fn seed_nodes_are_deduplicated() {
        let config = ClusterConfig::new("db1, db2,db1,  db2 ", "users");
        let nodes = config.seed_nodes();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.contains("db1"));
        assert!(nodes.contains("db2"));
    }

    #[test]
    fn seed_nodes_skip_blank_entries() {
        let config = ClusterConfig::new("db1,, ,db2,", "users");
        assert_eq!(config.seed_nodes().len(), 2);
    }

    #[test]
    fn fluent_setters() {
        let config = ClusterConfig::new("db1", "users")
            .credentials("svc", "secret")
            .query_timeout(Duration::from_secs(30))
            .max_http_connections(4);
        assert_eq!(config.username, "svc");
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.max_http_connections, 4);
    }
}
