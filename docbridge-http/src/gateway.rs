//! Connector and handle speaking the cluster's HTTP gateway.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use docbridge_core::config::ClusterConfig;
use docbridge_core::document::{Document, MutationToken, QueryResult, QueryStatus};
use docbridge_core::error::{ClusterError, ClusterResult};
use docbridge_core::handle::{ClusterConnector, ClusterHandle};

/// Connector that bootstraps an [`HttpHandle`] from the seed-node set.
#[derive(Debug, Default)]
pub struct HttpConnector;

impl HttpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClusterConnector for HttpConnector {
    type Handle = HttpHandle;

    async fn connect(&self, config: &ClusterConfig) -> ClusterResult<HttpHandle> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_http_connections)
            .build()
            .map_err(|err| ClusterError::Transport(err.to_string()))?;

        let nodes = config.seed_nodes();
        for node in &nodes {
            let base = base_url(node);
            let probe = client
                .get(format!("{base}/pools"))
                .basic_auth(&config.username, Some(&config.password))
                .timeout(config.connect_timeout)
                .send()
                .await;
            match probe {
                Ok(response) if response.status().is_success() => {
                    debug!(node = %node, "bootstrapped cluster connection");
                    return Ok(HttpHandle {
                        client,
                        base,
                        username: config.username.clone(),
                        password: config.password.clone(),
                        kv_timeout: config.kv_timeout,
                        query_timeout: config.query_timeout,
                    });
                }
                Ok(response) => {
                    warn!(node = %node, status = %response.status(), "seed node rejected bootstrap probe");
                }
                Err(err) => {
                    warn!(node = %node, error = %err, "seed node unreachable");
                }
            }
        }

        Err(ClusterError::ConnectionUnavailable(format!(
            "no reachable seed node in {nodes:?}"
        )))
    }
}

/// One live gateway connection, pinned to the node that answered the
/// bootstrap probe.
pub struct HttpHandle {
    client: reqwest::Client,
    base: String,
    username: String,
    password: String,
    kv_timeout: Duration,
    query_timeout: Duration,
}

impl fmt::Debug for HttpHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandle")
            .field("base", &self.base)
            .field("username", &self.username)
            .finish()
    }
}

#[derive(Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    results: Vec<Value>,
    status: String,
}

#[derive(Deserialize)]
struct MutationEnvelope {
    cas: u64,
}

impl HttpHandle {
    fn doc_url(&self, bucket: &str, id: &str) -> String {
        format!("{}/buckets/{}/docs/{}", self.base, bucket, id)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

#[async_trait]
impl ClusterHandle for HttpHandle {
    async fn query(
        &self,
        statement: &str,
        parameters: Option<&Map<String, Value>>,
    ) -> ClusterResult<QueryResult> {
        let body = query_body(statement, parameters);
        let response = self
            .apply_auth(self.client.post(format!("{}/query/service", self.base)))
            .timeout(self.query_timeout)
            .json(&body)
            .send()
            .await
            .map_err(transport_err)?;
        let envelope: QueryEnvelope = response.json().await.map_err(transport_err)?;

        let rows = envelope
            .results
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(map),
                other => Err(ClusterError::Serialization(format!(
                    "expected object row from query service, got {other}"
                ))),
            })
            .collect::<ClusterResult<Vec<Document>>>()?;
        Ok(QueryResult {
            rows,
            status: parse_status(&envelope.status),
        })
    }

    async fn upsert(
        &self,
        bucket: &str,
        id: &str,
        document: Document,
    ) -> ClusterResult<MutationToken> {
        let response = self
            .apply_auth(self.client.put(self.doc_url(bucket, id)))
            .timeout(self.kv_timeout)
            .json(&document)
            .send()
            .await
            .map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(ClusterError::Transport(format!(
                "upsert of {id} in bucket {bucket} failed with status {}",
                response.status()
            )));
        }
        let envelope: MutationEnvelope = response.json().await.map_err(transport_err)?;
        Ok(MutationToken::new(envelope.cas))
    }

    async fn get(&self, bucket: &str, id: &str) -> ClusterResult<Document> {
        let response = self
            .apply_auth(self.client.get(self.doc_url(bucket, id)))
            .timeout(self.kv_timeout)
            .send()
            .await
            .map_err(transport_err)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ClusterError::DocumentNotFound(
                id.to_string(),
                bucket.to_string(),
            )),
            status if status.is_success() => match response.json().await.map_err(transport_err)? {
                Value::Object(map) => Ok(map),
                other => Err(ClusterError::Serialization(format!(
                    "expected object document for {id}, got {other}"
                ))),
            },
            status => Err(ClusterError::Transport(format!(
                "get of {id} in bucket {bucket} failed with status {status}"
            ))),
        }
    }

    async fn remove(&self, bucket: &str, id: &str) -> ClusterResult<MutationToken> {
        let response = self
            .apply_auth(self.client.delete(self.doc_url(bucket, id)))
            .timeout(self.kv_timeout)
            .send()
            .await
            .map_err(transport_err)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ClusterError::DocumentNotFound(
                id.to_string(),
                bucket.to_string(),
            )),
            status if status.is_success() => {
                let envelope: MutationEnvelope = response.json().await.map_err(transport_err)?;
                Ok(MutationToken::new(envelope.cas))
            }
            status => Err(ClusterError::Transport(format!(
                "remove of {id} in bucket {bucket} failed with status {status}"
            ))),
        }
    }
}

fn base_url(node: &str) -> String {
    if node.contains("://") {
        node.trim_end_matches('/').to_string()
    } else {
        format!("http://{node}")
    }
}

fn parse_status(status: &str) -> QueryStatus {
    match status {
        "success" => QueryStatus::Success,
        "errors" | "fatal" => QueryStatus::Errors,
        "timeout" => QueryStatus::Timeout,
        _ => QueryStatus::Unknown,
    }
}

// Named parameters travel alongside the statement with a `$` prefix, the
// way the query service expects them.
fn query_body(statement: &str, parameters: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert(
        "statement".to_string(),
        Value::String(statement.to_string()),
    );
    if let Some(parameters) = parameters {
        for (name, value) in parameters {
            body.insert(format!("${name}"), value.clone());
        }
    }
    body
}

fn transport_err(err: reqwest::Error) -> ClusterError {
    if err.is_decode() {
        ClusterError::Serialization(err.to_string())
    } else {
        ClusterError::Transport(err.to_string())
    }
}
