//! In-memory document registry.
//!
//! Keeps the ordered list of records for one review session together with
//! the table schema (the ordered column list shared by every record).
//! Each committed mutation is announced on a broadcast channel; a view
//! re-reads `all()` when it receives an event.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config;
use crate::error::ReviewError;
use crate::models::{DocumentPatch, DocumentRecord, Fields, ReviewStatus, TypeTag};

/// Events buffered per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 256;

/// A change notification. `revision` increases by one per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub revision: u64,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    Added { id: Uuid },
    Updated { id: Uuid },
    Removed { id: Uuid },
    Replaced { count: usize },
    IngestStarted { id: Uuid, name: String },
    IngestFailed { id: Uuid, reason: String },
}

/// Filter for `Registry::filter`. Unset parts match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub status: Option<ReviewStatus>,
    pub type_tag: Option<TypeTag>,
    /// Case-insensitive substring of the record name.
    pub name_contains: Option<String>,
}

impl RecordFilter {
    fn matches(&self, record: &DocumentRecord) -> bool {
        if self.status.is_some_and(|s| s != record.status) {
            return false;
        }
        if self.type_tag.is_some_and(|t| t != record.type_tag) {
            return false;
        }
        match &self.name_contains {
            Some(needle) => record
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Counts per status and per type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub by_status: BTreeMap<ReviewStatus, usize>,
    pub by_type: BTreeMap<TypeTag, usize>,
}

pub struct Registry {
    records: Vec<DocumentRecord>,
    columns: Vec<String>,
    revision: u64,
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry with the default two-column schema.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            records: Vec::new(),
            columns: config::default_columns(),
            revision: 0,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    // ── Reads ───────────────────────────────────────────────

    /// Owned snapshot in insertion order.
    pub fn all(&self) -> Vec<DocumentRecord> {
        self.records.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<&DocumentRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<DocumentRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.records.len(),
            ..Default::default()
        };
        for record in &self.records {
            *stats.by_status.entry(record.status).or_default() += 1;
            *stats.by_type.entry(record.type_tag).or_default() += 1;
        }
        stats
    }

    // ── Mutations ───────────────────────────────────────────

    /// Append a record.
    ///
    /// A record without cells gets an empty cell per column. The first record
    /// added to an empty registry defines the schema if it carries cells;
    /// afterwards cells must match the schema exactly.
    pub fn add(&mut self, mut record: DocumentRecord) -> Result<Uuid, ReviewError> {
        if self.contains(record.id) {
            return Err(ReviewError::DuplicateId(record.id));
        }

        if record.fields.is_empty() {
            record.fields = Fields::blank(&self.columns);
        } else if self.records.is_empty() {
            self.columns = record.fields.key_list();
        } else if !record.fields.matches_columns(&self.columns) {
            return Err(self.schema_mismatch(&record.fields));
        }

        let id = record.id;
        self.records.push(record);
        tracing::debug!(%id, total = self.records.len(), "Record added");
        self.emit(ChangeKind::Added { id });
        Ok(id)
    }

    /// Merge `patch` into the record and return the updated copy.
    pub fn update(&mut self, id: Uuid, patch: DocumentPatch) -> Result<DocumentRecord, ReviewError> {
        let index = self.index_of(id)?;
        if let Some(fields) = &patch.fields {
            if !fields.matches_columns(&self.columns) {
                return Err(self.schema_mismatch(fields));
            }
        }

        let record = &mut self.records[index];
        patch.apply(record);
        let updated = record.clone();
        tracing::debug!(%id, "Record updated");
        self.emit(ChangeKind::Updated { id });
        Ok(updated)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<DocumentRecord, ReviewError> {
        let index = self.index_of(id)?;
        let removed = self.records.remove(index);
        tracing::debug!(%id, total = self.records.len(), "Record removed");
        self.emit(ChangeKind::Removed { id });
        Ok(removed)
    }

    /// Swap the whole collection. The schema is taken from the first record,
    /// or the default columns when `records` is empty. Invalid input leaves
    /// the registry untouched.
    pub fn replace_all(&mut self, records: Vec<DocumentRecord>) -> Result<(), ReviewError> {
        let columns = match records.first() {
            Some(first) => first.fields.key_list(),
            None => config::default_columns(),
        };

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id) {
                return Err(ReviewError::DuplicateId(record.id));
            }
            if !record.fields.matches_columns(&columns) {
                return Err(ReviewError::SchemaMismatch {
                    expected: columns,
                    found: record.fields.key_list(),
                });
            }
        }

        let count = records.len();
        self.records = records;
        self.columns = columns;
        tracing::debug!(count, columns = ?self.columns, "Registry replaced");
        self.emit(ChangeKind::Replaced { count });
        Ok(())
    }

    /// Overwrite one cell of the table.
    pub fn set_cell(&mut self, id: Uuid, column: &str, value: impl Into<String>) -> Result<(), ReviewError> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(ReviewError::InvalidInput(format!("unknown column: {column}")));
        }
        let index = self.index_of(id)?;
        self.records[index].fields.insert(column, value);
        self.emit(ChangeKind::Updated { id });
        Ok(())
    }

    /// Publish a workflow event that is not itself a record mutation.
    pub(crate) fn announce(&mut self, kind: ChangeKind) {
        self.emit(kind);
    }

    fn index_of(&self, id: Uuid) -> Result<usize, ReviewError> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(ReviewError::NotFound(id))
    }

    fn schema_mismatch(&self, fields: &Fields) -> ReviewError {
        ReviewError::SchemaMismatch {
            expected: self.columns.clone(),
            found: fields.key_list(),
        }
    }

    fn emit(&mut self, kind: ChangeKind) {
        self.revision += 1;
        // No subscribers is fine: nobody is rendering.
        let _ = self.events.send(ChangeEvent {
            revision: self.revision,
            kind,
        });
    }
}
