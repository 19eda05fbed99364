//! Result normalization: prune an extraction result down to the fields the
//! downstream receiver consumes.
//!
//! The raw result is large: per-page word and line geometry, tables,
//! detected languages, model versions and per-value confidence scores. The
//! receiver only wants the extracted values and their field types, so each
//! level of the tree drops a fixed set of keys:
//!
//! | Node | Dropped keys | Descends into |
//! |------|--------------|---------------|
//! | document | `detectedDocumentTypes`, `detectedLanguages`, `*ModelVersion`, `errors`, `searchablePdf` | `pages[]` |
//! | page | `dimensions`, `detectedDocumentTypes`, `detectedLanguages`, `words`, `lines`, `tables` | `documentFields[]` |
//! | `KEY_VALUE` field | `fieldName` | `fieldValue` |
//! | `LINE_ITEM_GROUP` field | — | `fieldValue.items[]` |
//! | line item | `fieldLabel`, `fieldName` | `fieldValue`, then `fieldValue.items[]` |
//! | nested item | `fieldName` | `fieldValue` |
//! | any value above | `text`, `confidence`, `boundingPolygon`, `wordIndexes` | — |
//!
//! The transform is pure: it reads the input tree and builds a new one. Keys
//! not listed pass through untouched, as does any subtree whose shape does
//! not match (a missing container, a non-object entry, an unknown
//! `fieldType`). Dropping is subtractive only, so `normalize` is idempotent.

use serde_json::{Map, Value};

const DOCUMENT_DROPPED: &[&str] = &[
    "detectedDocumentTypes",
    "detectedLanguages",
    "documentClassificationModelVersion",
    "languageClassificationModelVersion",
    "textExtractionModelVersion",
    "keyValueExtractionModelVersion",
    "tableExtractionModelVersion",
    "errors",
    "searchablePdf",
];

const PAGE_DROPPED: &[&str] = &[
    "dimensions",
    "detectedDocumentTypes",
    "detectedLanguages",
    "words",
    "lines",
    "tables",
];

const VALUE_DROPPED: &[&str] = &["text", "confidence", "boundingPolygon", "wordIndexes"];

/// The role an object plays in the extraction result tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Document,
    Page,
    KeyValueField,
    LineItemGroupField,
    /// `fieldValue` of a line-item group: only holds `items`.
    LineItemGroupValue,
    LineItem,
    /// `fieldValue` of a line item: a value that also nests `items`.
    LineItemValue,
    NestedItem,
    /// `fieldValue` of a key-value field or nested item.
    Value,
}

/// How a child key is descended into.
enum Descend {
    One(Node),
    Each(Node),
    EachField,
}

impl Node {
    /// Classify a `documentFields` entry by its `fieldType`.
    pub fn for_field(field: &Value) -> Option<Node> {
        match field.get("fieldType").and_then(Value::as_str) {
            Some("KEY_VALUE") => Some(Node::KeyValueField),
            Some("LINE_ITEM_GROUP") => Some(Node::LineItemGroupField),
            _ => None,
        }
    }

    fn dropped(self) -> &'static [&'static str] {
        match self {
            Node::Document => DOCUMENT_DROPPED,
            Node::Page => PAGE_DROPPED,
            Node::KeyValueField => &["fieldName"],
            Node::LineItemGroupField | Node::LineItemGroupValue => &[],
            Node::LineItem => &["fieldLabel", "fieldName"],
            Node::NestedItem => &["fieldName"],
            Node::LineItemValue | Node::Value => VALUE_DROPPED,
        }
    }

    fn descend(self, key: &str) -> Option<Descend> {
        match (self, key) {
            (Node::Document, "pages") => Some(Descend::Each(Node::Page)),
            (Node::Page, "documentFields") => Some(Descend::EachField),
            (Node::KeyValueField, "fieldValue") => Some(Descend::One(Node::Value)),
            (Node::LineItemGroupField, "fieldValue") => Some(Descend::One(Node::LineItemGroupValue)),
            (Node::LineItemGroupValue, "items") => Some(Descend::Each(Node::LineItem)),
            (Node::LineItem, "fieldValue") => Some(Descend::One(Node::LineItemValue)),
            (Node::LineItemValue, "items") => Some(Descend::Each(Node::NestedItem)),
            (Node::NestedItem, "fieldValue") => Some(Descend::One(Node::Value)),
            _ => None,
        }
    }

    /// Build the pruned copy of `value` read as this node.
    pub fn prune(self, value: &Value) -> Value {
        let Value::Object(map) = value else {
            return value.clone();
        };

        let dropped = self.dropped();
        let mut out = Map::new();
        for (key, child) in map {
            if dropped.contains(&key.as_str()) {
                continue;
            }
            let pruned = match self.descend(key) {
                Some(Descend::One(node)) => node.prune(child),
                Some(Descend::Each(node)) => each(child, |v| node.prune(v)),
                Some(Descend::EachField) => each(child, prune_field),
                None => child.clone(),
            };
            out.insert(key.clone(), pruned);
        }
        Value::Object(out)
    }
}

fn each(value: &Value, f: impl Fn(&Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(f).collect()),
        other => other.clone(),
    }
}

fn prune_field(field: &Value) -> Value {
    match Node::for_field(field) {
        Some(node) => node.prune(field),
        None => field.clone(),
    }
}

/// Prune a raw extraction result to the minimal schema.
pub fn normalize(document: &Value) -> Value {
    Node::Document.prune(document)
}
