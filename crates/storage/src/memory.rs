//! MemoryTable: in-process document table
//!
//! Implements [`DocumentTable`] using:
//! - `FxHashMap<RecordId, Record>` for O(1) point reads and writes
//! - one [`SecondaryIndex`] per defined index, keyed by name
//! - a single `parking_lot::RwLock` around rows and indexes together
//!
//! # Design Notes
//!
//! - **Row atomicity**: every write updates the row and all of its index
//!   entries under the same write guard, so readers never see a row whose
//!   index entries are stale.
//! - **No implicit indexes**: range and equality queries only work on
//!   indexes created through [`MemoryTable::create_index`].
//! - **Full-table scans** return rows in primary-key order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::seq::IteratorRandom;
use rustc_hash::FxHashMap;
use tracing::debug;

use recordb_core::{Error, Record, RecordId, Result};

use crate::index::{IndexSpec, SecondaryIndex};
use crate::query::{Order, Predicate, RangeQuery, ScanQuery, Selection, Take};
use crate::traits::{DocumentTable, Replacer, WriteSummary};

#[derive(Debug, Default)]
struct TableState {
    rows: FxHashMap<RecordId, Record>,
    indexes: BTreeMap<String, SecondaryIndex>,
}

impl TableState {
    fn put(&mut self, record: Record) {
        if let Some(old) = self.rows.get(&record.id) {
            for index in self.indexes.values_mut() {
                index.remove(old);
            }
        }
        for index in self.indexes.values_mut() {
            index.insert(&record);
        }
        self.rows.insert(record.id, record);
    }

    fn take(&mut self, id: &RecordId) -> Option<Record> {
        let old = self.rows.remove(id)?;
        for index in self.indexes.values_mut() {
            index.remove(&old);
        }
        Some(old)
    }

    fn index(&self, table: &str, name: &str) -> Result<&SecondaryIndex> {
        self.indexes.get(name).ok_or_else(|| Error::IndexNotFound {
            table: table.to_string(),
            index: name.to_string(),
        })
    }

    fn selected(&self, table: &str, selection: &Selection) -> Result<Vec<&Record>> {
        match selection {
            Selection::Table => {
                let mut rows: Vec<&Record> = self.rows.values().collect();
                rows.sort_by_key(|r| r.id);
                Ok(rows)
            }
            Selection::Index { index, key } => Ok(self
                .index(table, index)?
                .get(key)
                .filter_map(|id| self.rows.get(id))
                .collect()),
        }
    }
}

fn passes(filter: &Option<Predicate>, record: &Record) -> bool {
    filter.as_ref().map_or(true, |p| p.matches(record))
}

/// In-memory document table with secondary indexes
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    state: RwLock<TableState>,
}

impl MemoryTable {
    /// Create an empty table without indexes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(TableState::default()),
        }
    }

    /// Define a secondary index and build it over the existing rows
    ///
    /// # Errors
    ///
    /// `Error::AlreadyExists` when an index with the same name exists.
    pub fn create_index(&self, spec: IndexSpec) -> Result<()> {
        let mut state = self.state.write();
        if state.indexes.contains_key(&spec.name) {
            return Err(Error::index_exists(&self.name, &spec.name));
        }

        let mut index = SecondaryIndex::new(spec);
        for record in state.rows.values() {
            index.insert(record);
        }
        debug!(
            table = %self.name,
            index = %index.spec().name,
            keys = index.len(),
            "created secondary index"
        );
        state.indexes.insert(index.spec().name.clone(), index);
        Ok(())
    }

    /// Remove a secondary index
    ///
    /// # Errors
    ///
    /// `Error::IndexNotFound` when no such index exists.
    pub fn drop_index(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        state
            .indexes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::IndexNotFound {
                table: self.name.clone(),
                index: name.to_string(),
            })
    }

    /// Definitions of all indexes, ordered by name
    pub fn index_specs(&self) -> Vec<IndexSpec> {
        self.state
            .read()
            .indexes
            .values()
            .map(|i| i.spec().clone())
            .collect()
    }

    /// Copy of every row, in primary-key order
    pub fn rows(&self) -> Vec<Record> {
        let state = self.state.read();
        let mut rows: Vec<Record> = state.rows.values().cloned().collect();
        rows.sort_by_key(|r| r.id);
        rows
    }

    /// Bulk-load rows, overwriting rows with the same id
    pub fn load(&self, rows: impl IntoIterator<Item = Record>) {
        let mut state = self.state.write();
        for record in rows {
            state.put(record);
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.state.read().rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.state.read().rows.is_empty()
    }
}

#[async_trait]
impl DocumentTable for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        Ok(self.state.read().rows.get(id).cloned())
    }

    async fn insert(&self, record: Record) -> Result<WriteSummary> {
        let mut state = self.state.write();
        if state.rows.contains_key(&record.id) {
            return Err(Error::DuplicateId(record.id));
        }
        state.put(record);
        Ok(WriteSummary::inserted())
    }

    async fn replace(&self, id: &RecordId, replacer: Replacer) -> Result<WriteSummary> {
        let mut state = self.state.write();
        let current = state.rows.get(id).cloned();
        let next = replacer(current.as_ref());

        if let Some(next) = &next {
            if next.id != *id {
                return Err(Error::invalid_input(format!(
                    "Replace of {} cannot change the primary key to {}",
                    id, next.id
                )));
            }
        }

        let summary = match (current, next) {
            (None, None) => WriteSummary::default(),
            (None, Some(next)) => {
                state.put(next);
                WriteSummary::inserted()
            }
            (Some(current), Some(next)) if current == next => WriteSummary {
                unchanged: 1,
                ..WriteSummary::default()
            },
            (Some(_), Some(next)) => {
                state.put(next);
                WriteSummary {
                    replaced: 1,
                    ..WriteSummary::default()
                }
            }
            (Some(_), None) => {
                state.take(id);
                WriteSummary::deleted(1)
            }
        };
        Ok(summary)
    }

    async fn delete(&self, id: &RecordId) -> Result<WriteSummary> {
        let deleted = self.state.write().take(id).map_or(0, |_| 1);
        Ok(WriteSummary::deleted(deleted))
    }

    async fn between(&self, query: &RangeQuery) -> Result<Vec<Record>> {
        let state = self.state.read();
        let index = state.index(&self.name, &query.index)?;

        let ids = index.range(&query.lower, &query.upper);
        let ids: Box<dyn Iterator<Item = &RecordId> + '_> = match query.order {
            Order::Ascending => Box::new(ids),
            Order::Descending => Box::new(ids.rev()),
        };

        let matching = ids
            .filter_map(|id| state.rows.get(id))
            .filter(|r| passes(&query.filter, r))
            .cloned();

        Ok(match query.limit {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        })
    }

    async fn select(&self, query: &ScanQuery) -> Result<Vec<Record>> {
        let state = self.state.read();
        let matching = state
            .selected(&self.name, &query.selection)?
            .into_iter()
            .filter(|r| passes(&query.filter, r));

        Ok(match query.take {
            Take::All => matching.cloned().collect(),
            Take::Limit(n) => matching.take(n).cloned().collect(),
            Take::Sample(n) => matching
                .choose_multiple(&mut rand::thread_rng(), n)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    async fn count(&self, query: &ScanQuery) -> Result<u64> {
        let state = self.state.read();
        let n = state
            .selected(&self.name, &query.selection)?
            .into_iter()
            .filter(|r| passes(&query.filter, r))
            .count();
        Ok(n as u64)
    }

    async fn delete_where(&self, filter: &Predicate) -> Result<WriteSummary> {
        let mut state = self.state.write();
        let doomed: Vec<RecordId> = state
            .rows
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| r.id)
            .collect();
        for id in &doomed {
            state.take(id);
        }
        Ok(WriteSummary::deleted(doomed.len() as u64))
    }

    async fn index_list(&self) -> Result<Vec<String>> {
        Ok(self.state.read().indexes.keys().cloned().collect())
    }
}
