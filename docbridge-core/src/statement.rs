//! Bucket-scoped query statement construction.

/// Builds the bucket-scoped statement for a caller-supplied predicate.
///
/// The predicate is passed through verbatim: callers are trusted internal
/// code, and the cluster's query service is the component that parses the
/// statement.
pub fn select_from_bucket(bucket: &str, predicate: &str) -> String {
    format!("SELECT * FROM `{bucket}` WHERE {predicate}")
}
