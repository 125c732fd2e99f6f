//! In-memory providers, used by tests and by single-shot local runs where
//! nothing needs to survive the process.

use crate::Result;
use crate::store::{IndexItem, ObjectStore, RecordStore, ScanOrder, WorkMessage, WorkQueue};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// Archived object held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub content_encoding: String,
}

/// Object store backed by a map of key to blob.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored object by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(key).cloned()
    }

    /// All stored keys, in lexicographic order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, body: &[u8], content_type: &str, content_encoding: &str) -> Result<()> {
        let object = StoredObject {
            body: body.to_vec(),
            content_type: content_type.to_owned(),
            content_encoding: content_encoding.to_owned(),
        };

        let _ = self
            .objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), object);

        Ok(())
    }
}

/// Record store backed by a map keyed on (partition key, sort key), which
/// keeps each partition sorted the way the real thing does.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    items: Mutex<BTreeMap<(String, String), IndexItem>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items held, across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryRecordStore {
    fn put(&self, item: IndexItem) -> Result<()> {
        let _ = self
            .items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert((item.pk.clone(), item.sk.clone()), item);

        Ok(())
    }

    fn query(&self, pk: &str, prefix: &str, order: ScanOrder, limit: usize) -> Result<Vec<IndexItem>> {
        let items = self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut matches: Vec<IndexItem> = items
            .range((pk.to_owned(), prefix.to_owned())..)
            .take_while(|((item_pk, item_sk), _)| item_pk == pk && item_sk.starts_with(prefix))
            .map(|(_, item)| item.clone())
            .collect();

        if order == ScanOrder::Descending {
            matches.reverse();
        }

        matches.truncate(limit);
        Ok(matches)
    }
}

/// FIFO queue backed by a deque.
#[derive(Debug, Default)]
pub struct MemoryWorkQueue {
    messages: Mutex<VecDeque<WorkMessage>>,
}

impl MemoryWorkQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WorkQueue for MemoryWorkQueue {
    fn send(&self, message: &WorkMessage) -> Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(message.clone());

        Ok(())
    }

    fn receive(&self) -> Result<Option<WorkMessage>> {
        Ok(self
            .messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front())
    }
}
