//! Attribute extraction from fetched documents.
//!
//! Downstream attribute-release logic consumes documents as multi-valued
//! attribute maps: every retained field maps to a sequence of values, even
//! when the stored field holds a single scalar. [`collect_attributes`] is
//! the pure projection that performs that normalization.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::Document;

/// A multi-valued attribute mapping derived from one document.
///
/// Single-valued fields are normalized to one-element sequences; fields
/// that already hold a sequence contribute their elements unchanged.
pub type AttributeMap = BTreeMap<String, Vec<Value>>;

/// Projects a document's fields into a multi-valued attribute map.
///
/// Field names are filtered through `predicate`; a retained scalar value
/// is wrapped as a singleton sequence, while an array value passes its
/// elements through. Pure and deterministic — the document is not
/// modified.
///
/// # Example
///
/// ```ignore
/// let attributes = collect_attributes(&doc, |name| name.starts_with("e"));
/// assert_eq!(attributes["email"], vec![Value::String("a@x.com".into())]);
/// ```
pub fn collect_attributes<F>(document: &Document, predicate: F) -> AttributeMap
where
    F: Fn(&str) -> bool,
{
    document
        .iter()
        .filter(|(name, _)| predicate(name))
        .map(|(name, value)| (name.clone(), wrap_values(value)))
        .collect()
}

fn wrap_values(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> Document {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn scalars_are_wrapped_as_singletons() {
        let doc = document(json!({"email": "a@x.com", "age": 3}));
        let attributes = collect_attributes(&doc, |_| true);
        assert_eq!(attributes["email"], vec![json!("a@x.com")]);
        assert_eq!(attributes["age"], vec![json!(3)]);
    }

    #[test]
    fn sequences_pass_through() {
        let doc = document(json!({"roles": ["admin", "staff"]}));
        let attributes = collect_attributes(&doc, |_| true);
        assert_eq!(attributes["roles"], vec![json!("admin"), json!("staff")]);
    }

    #[test]
    fn predicate_filters_field_names() {
        let doc = document(json!({"email": "a@x.com", "name": "Alice"}));
        let attributes = collect_attributes(&doc, |name| name.starts_with('e'));
        assert_eq!(attributes.len(), 1);
        assert!(attributes.contains_key("email"));
        assert!(!attributes.contains_key("name"));
    }

    #[test]
    fn empty_document_yields_empty_map() {
        let attributes = collect_attributes(&Document::new(), |_| true);
        assert!(attributes.is_empty());
    }

    #[test]
    fn nested_mappings_are_wrapped_whole() {
        let doc = document(json!({"address": {"city": "Kista"}}));
        let attributes = collect_attributes(&doc, |_| true);
        assert_eq!(attributes["address"], vec![json!({"city": "Kista"})]);
    }
}
