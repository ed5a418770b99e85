//! In-memory repository implementation.

use super::filter::{Filter, ID};
use super::repository::{
    Check, Document, FindOptions, Mutation, Repository, SortOrder, StoreError, StoreResult,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// A stored document alongside its JSON form, which filters evaluate against.
struct Entry<T> {
    doc: T,
    json: Value,
}

/// In-memory collection backed by a concurrent map.
pub struct MemoryRepository<T: Document> {
    entries: DashMap<Uuid, Entry<T>>,
    unique_fields: Vec<&'static str>,
    /// Serializes writers so unique checks and the write are atomic.
    write_lock: Mutex<()>,
}

impl<T: Document> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            unique_fields: Vec::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Enforce uniqueness of a top-level field across the collection,
    /// including inactive documents.
    pub fn with_unique(mut self, field: &'static str) -> Self {
        self.unique_fields.push(field);
        self
    }

    fn check_unique(&self, id: Uuid, json: &Value) -> StoreResult<()> {
        for field in &self.unique_fields {
            let Some(value) = json.get(*field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = self
                .entries
                .iter()
                .any(|entry| *entry.key() != id && entry.value().json.get(*field) == Some(value));
            if clash {
                return Err(StoreError::Duplicate {
                    collection: T::COLLECTION,
                    field: field.to_string(),
                    value: value.as_str().map(String::from).unwrap_or_else(|| value.to_string()),
                });
            }
        }
        Ok(())
    }

    fn collect(&self, filter: &Filter, sort: SortOrder) -> Vec<T> {
        let mut matches: Vec<T> = self
            .entries
            .iter()
            .filter(|entry| filter.matches(&entry.value().json))
            .map(|entry| entry.value().doc.clone())
            .collect();

        matches.sort_by(|a, b| {
            let ordering = a
                .meta()
                .created_at
                .cmp(&b.meta().created_at)
                .then_with(|| a.key().cmp(&b.key()));
            match sort {
                SortOrder::OldestFirst => ordering,
                SortOrder::NewestFirst => ordering.reverse(),
            }
        });
        matches
    }

    /// Key of the first document matching `filter`.
    fn locate(&self, filter: &Filter) -> Option<Uuid> {
        match id_clause(filter) {
            Some(id) => self
                .entries
                .get(&id)
                .filter(|entry| filter.matches(&entry.value().json))
                .map(|_| id),
            None => self
                .collect(filter, SortOrder::NewestFirst)
                .first()
                .map(Document::key),
        }
    }
}

impl<T: Document> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> Repository<T> for MemoryRepository<T> {
    async fn insert(&self, doc: T) -> StoreResult<T> {
        let json = serde_json::to_value(&doc)?;
        let id = doc.key();

        let _guard = self.write_lock.lock();
        self.check_unique(id, &json)?;
        self.entries.insert(id, Entry { doc: doc.clone(), json });

        debug!(collection = T::COLLECTION, id = %id, "Document inserted");
        Ok(doc)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<T>> {
        Ok(self.entries.get(&id).map(|entry| entry.value().doc.clone()))
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<T>> {
        if let Some(id) = id_clause(filter) {
            return Ok(self
                .entries
                .get(&id)
                .filter(|entry| filter.matches(&entry.value().json))
                .map(|entry| entry.value().doc.clone()));
        }
        Ok(self.collect(filter, SortOrder::NewestFirst).into_iter().next())
    }

    async fn find(&self, filter: &Filter, options: FindOptions) -> StoreResult<Vec<T>> {
        let iter = self.collect(filter, options.sort).into_iter().skip(options.skip);
        Ok(match options.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        })
    }

    async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| filter.matches(&entry.value().json))
            .count() as u64)
    }

    async fn insert_checked(&self, doc: T, peers: &Filter, check: Check<'_, T>) -> StoreResult<T> {
        let json = serde_json::to_value(&doc)?;
        let id = doc.key();

        let _guard = self.write_lock.lock();
        let existing = self.collect(peers, SortOrder::OldestFirst);
        check(&existing).map_err(StoreError::Rejected)?;
        self.check_unique(id, &json)?;
        self.entries.insert(id, Entry { doc: doc.clone(), json });

        debug!(collection = T::COLLECTION, id = %id, "Document inserted");
        Ok(doc)
    }

    async fn update_with(
        &self,
        filter: &Filter,
        peers: Option<&Filter>,
        mutate: Mutation<'_, T>,
    ) -> StoreResult<Option<T>> {
        let _guard = self.write_lock.lock();
        let Some(id) = self.locate(filter) else {
            return Ok(None);
        };
        let Some(mut doc) = self.entries.get(&id).map(|entry| entry.value().doc.clone()) else {
            return Ok(None);
        };
        let others: Vec<T> = match peers {
            Some(peers) => self
                .collect(peers, SortOrder::OldestFirst)
                .into_iter()
                .filter(|other| other.key() != id)
                .collect(),
            None => Vec::new(),
        };

        mutate(&mut doc, &others).map_err(StoreError::Rejected)?;
        doc.meta_mut().touch();
        let json = serde_json::to_value(&doc)?;
        self.check_unique(id, &json)?;
        self.entries.insert(id, Entry { doc: doc.clone(), json });

        debug!(collection = T::COLLECTION, id = %id, "Document updated");
        Ok(Some(doc))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();
        let Some(mut entry) = self.entries.get_mut(&id) else {
            return Err(StoreError::NotFound {
                collection: T::COLLECTION,
                id,
            });
        };
        if !entry.doc.is_active() {
            return Ok(false);
        }

        let meta = entry.doc.meta_mut();
        meta.is_active = false;
        meta.touch();
        entry.json = serde_json::to_value(&entry.doc)?;

        debug!(collection = T::COLLECTION, id = %id, "Document soft-deleted");
        Ok(true)
    }
}

/// Extract a top-level `id` equality clause, if the filter has one.
fn id_clause(filter: &Filter) -> Option<Uuid> {
    use super::filter::Clause;
    filter.clauses().iter().find_map(|clause| match clause {
        Clause::Eq { field, value } if field == ID => {
            value.as_str().and_then(|s| Uuid::parse_str(s).ok())
        }
        _ => None,
    })
}
