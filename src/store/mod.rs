//! Storage capability interfaces and the item attribute encoding.
//!
//! The pipeline talks to three independent capabilities: an object store
//! holding immutable archive blobs, a record store holding the queryable
//! index, and a work queue feeding ingestion runs. Each is a trait so runs
//! can be wired to the bundled filesystem providers, to the in-memory
//! providers, or to whatever backs them in a hosted deployment.
//!
//! Record-store items carry their attributes as [`AttrValue`] trees, in which
//! numbers travel as decimal strings the way document stores transport them.
//! [`crate::query::normalize`] converts them back to native numbers at the
//! read boundary.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod fs;
pub mod memory;

/// Attribute value of a record-store item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    /// UTF-8 string.
    S(String),

    /// Number, carried as its decimal string form.
    N(String),

    /// Boolean.
    Bool(bool),

    /// Explicit null.
    Null,

    /// Ordered list.
    L(Vec<AttrValue>),

    /// Nested attribute map.
    M(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Convert plain JSON into the store encoding. Numbers become `N` values
    /// holding their decimal string form.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::N(n.to_string()),
            serde_json::Value::String(s) => Self::S(s.clone()),
            serde_json::Value::Array(items) => Self::L(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => Self::M(map.iter().map(|(k, v)| (k.clone(), Self::from_json(v))).collect()),
        }
    }
}

/// Build an item attribute map from a JSON object. Callers pass object
/// values; anything else yields an empty map.
#[must_use]
pub fn attributes_from_json(value: &serde_json::Value) -> BTreeMap<String, AttrValue> {
    match AttrValue::from_json(value) {
        AttrValue::M(map) => map,
        _ => BTreeMap::new(),
    }
}

/// One record-store item: subject-scoped partition key, kind-prefixed sort
/// key, and an attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexItem {
    pub pk: String,
    pub sk: String,
    pub attributes: BTreeMap<String, AttrValue>,
}

/// Partition key shared by all of a subject's items.
#[must_use]
pub fn subject_key(subject: &str) -> String {
    format!("USER#{subject}")
}

/// Item kinds held in the record store, disambiguated by sort-key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Profile,
    Repo,
    Event,
    Run,
}

impl ItemKind {
    /// Sort-key prefix for this kind.
    #[must_use]
    pub const fn sk_prefix(self) -> &'static str {
        match self {
            Self::Profile => "PROFILE#",
            Self::Repo => "REPO#",
            Self::Event => "EVENT#",
            Self::Run => "RUN#",
        }
    }

    /// Full sort key for an item of this kind.
    #[must_use]
    pub fn sort_key(self, natural_key: &str) -> String {
        format!("{}{natural_key}", self.sk_prefix())
    }
}

/// Sort-key ordering for record-store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}

/// Work item consumed by one ingestion run.
///
/// `username` is optional on the wire; a message arriving without one is
/// reported as a rejected run rather than an error, so a malformed message
/// is not redelivered forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// Durable blob storage for immutable archive objects.
pub trait ObjectStore: Send + Sync + core::fmt::Debug {
    /// Commit one immutable object under `key`.
    fn put(&self, key: &str, body: &[u8], content_type: &str, content_encoding: &str) -> Result<()>;
}

/// Queryable key-value index with subject-scoped partition keys.
pub trait RecordStore: Send + Sync + core::fmt::Debug {
    /// Unconditionally upsert one item (last write wins).
    fn put(&self, item: IndexItem) -> Result<()>;

    /// Return up to `limit` items under `pk` whose sort key starts with
    /// `prefix`, in lexicographic sort-key order per `order`.
    fn query(&self, pk: &str, prefix: &str, order: ScanOrder, limit: usize) -> Result<Vec<IndexItem>>;
}

/// FIFO work queue feeding ingestion runs.
pub trait WorkQueue: Send + Sync + core::fmt::Debug {
    /// Enqueue one message.
    fn send(&self, message: &WorkMessage) -> Result<()>;

    /// Take the oldest message off the queue, if any.
    fn receive(&self) -> Result<Option<WorkMessage>>;
}
