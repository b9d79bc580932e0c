//! Review workflow over the document registry.
//!
//! Status machine per record: `pending → validated → archived`. Edits change
//! name and type but never status, and nothing leads back to `pending`.
//! Uploads go through an asynchronous recognition step; while it runs the
//! document is visible as `IngestState::Processing`.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::BoxFuture;
use rand::Rng;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::classify::{classify, sanitize_filename, FileKind};
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::export::{self, ExportTransport};
use crate::models::{DocumentPatch, DocumentRecord, Fields, ReviewStatus, TypeTag};
use crate::registry::{ChangeEvent, ChangeKind, RecordFilter, Registry, RegistryStats};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A file handed over for recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub size_bytes: u64,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }

    /// Name and size of a file on disk. Contents are not read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self::new(name, metadata.len()))
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_filename(&self.name)
    }
}

/// Where an upload is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    /// Recognition still running.
    Processing,
    /// Recognized and listed in the registry.
    Done,
}

/// An upload whose recognition has not finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InFlightIngest {
    pub id: Uuid,
    pub name: String,
}

/// Produces the type tag for an uploaded file.
pub trait Recognizer: Send + Sync {
    fn recognize<'a>(&'a self, file: &'a IncomingFile) -> BoxFuture<'a, Result<TypeTag, ReviewError>>;
}

/// Keyword classification behind a simulated processing delay.
#[derive(Debug, Clone)]
pub struct KeywordRecognizer {
    delay_min: Duration,
    delay_max: Duration,
}

impl KeywordRecognizer {
    pub fn new(delay_min: Duration, delay_max: Duration) -> Self {
        Self {
            delay_min,
            delay_max: delay_max.max(delay_min),
        }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(config.ingest_delay_min, config.ingest_delay_max)
    }

    fn pick_delay(&self) -> Duration {
        if self.delay_max <= self.delay_min {
            return self.delay_min;
        }
        let min = self.delay_min.as_millis() as u64;
        let max = self.delay_max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Recognizer for KeywordRecognizer {
    fn recognize<'a>(&'a self, file: &'a IncomingFile) -> BoxFuture<'a, Result<TypeTag, ReviewError>> {
        Box::pin(async move {
            let delay = self.pick_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(classify(&file.name))
        })
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// One review session: the registry plus the uploads still being recognized.
///
/// All registry mutations happen under a short synchronous lock that is
/// never held across an `.await`, so observers only see committed states.
pub struct ReviewWorkflow {
    registry: Mutex<Registry>,
    in_flight: Mutex<HashMap<Uuid, String>>,
    recognizer: Arc<dyn Recognizer>,
    config: ReviewConfig,
}

impl ReviewWorkflow {
    pub fn new(config: ReviewConfig) -> Self {
        let recognizer = Arc::new(KeywordRecognizer::from_config(&config));
        Self::with_recognizer(config, recognizer)
    }

    pub fn with_recognizer(config: ReviewConfig, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            in_flight: Mutex::new(HashMap::new()),
            recognizer,
            config,
        }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    // ── Reads ───────────────────────────────────────────────

    pub fn subscribe(&self) -> Result<broadcast::Receiver<ChangeEvent>, ReviewError> {
        Ok(self.registry()?.subscribe())
    }

    pub fn records(&self) -> Result<Vec<DocumentRecord>, ReviewError> {
        Ok(self.registry()?.all())
    }

    pub fn get(&self, id: Uuid) -> Result<DocumentRecord, ReviewError> {
        self.registry()?
            .get(id)
            .cloned()
            .ok_or(ReviewError::NotFound(id))
    }

    pub fn columns(&self) -> Result<Vec<String>, ReviewError> {
        Ok(self.registry()?.columns().to_vec())
    }

    pub fn filter(&self, filter: &RecordFilter) -> Result<Vec<DocumentRecord>, ReviewError> {
        Ok(self.registry()?.filter(filter))
    }

    pub fn stats(&self) -> Result<RegistryStats, ReviewError> {
        Ok(self.registry()?.stats())
    }

    /// `Processing` while recognition runs, `Done` once listed, `None` otherwise.
    pub fn ingest_state(&self, id: Uuid) -> Result<Option<IngestState>, ReviewError> {
        if self.registry()?.contains(id) {
            return Ok(Some(IngestState::Done));
        }
        let processing = self.in_flight()?.contains_key(&id);
        Ok(processing.then_some(IngestState::Processing))
    }

    pub fn in_flight_ingests(&self) -> Result<Vec<InFlightIngest>, ReviewError> {
        let mut ingests: Vec<_> = self
            .in_flight()?
            .iter()
            .map(|(id, name)| InFlightIngest {
                id: *id,
                name: name.clone(),
            })
            .collect();
        ingests.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(ingests)
    }

    // ── Status transitions ──────────────────────────────────

    /// Mark a pending record validated. Already validated or archived
    /// records are left as they are.
    pub fn validate(&self, id: Uuid) -> Result<(), ReviewError> {
        let mut registry = self.registry()?;
        let status = registry.get(id).ok_or(ReviewError::NotFound(id))?.status;
        if status != ReviewStatus::Pending {
            tracing::debug!(%id, %status, "Validate is a no-op");
            return Ok(());
        }
        registry.update(id, DocumentPatch::default().status(ReviewStatus::Validated))?;
        tracing::info!(%id, "Document validated");
        Ok(())
    }

    /// Move a validated record to the archive.
    pub fn archive(&self, id: Uuid) -> Result<(), ReviewError> {
        let mut registry = self.registry()?;
        let status = registry.get(id).ok_or(ReviewError::NotFound(id))?.status;
        match status {
            ReviewStatus::Archived => Ok(()),
            ReviewStatus::Pending => Err(ReviewError::InvalidInput(
                "only validated documents can be archived".into(),
            )),
            ReviewStatus::Validated => {
                registry.update(id, DocumentPatch::default().status(ReviewStatus::Archived))?;
                tracing::info!(%id, "Document archived");
                Ok(())
            }
        }
    }

    /// Rename and retype a record. Status is kept.
    pub fn edit(&self, id: Uuid, new_name: &str, new_type_tag: &str) -> Result<(), ReviewError> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(ReviewError::InvalidInput("document name must not be empty".into()));
        }
        let type_tag = TypeTag::from_str(new_type_tag.trim())?;

        self.registry()?.update(
            id,
            DocumentPatch::default().name(name).type_tag(type_tag),
        )?;
        tracing::info!(%id, %type_tag, "Document edited");
        Ok(())
    }

    pub fn delete(&self, id: Uuid) -> Result<DocumentRecord, ReviewError> {
        let removed = self.registry()?.remove(id)?;
        tracing::info!(%id, "Document deleted");
        Ok(removed)
    }

    // ── Table editing ───────────────────────────────────────

    /// Append an empty row: blank name, `unknown` type, one empty cell per column.
    pub fn add_row(&self) -> Result<Uuid, ReviewError> {
        let mut registry = self.registry()?;
        let record = DocumentRecord::new("", TypeTag::Unknown)
            .with_fields(Fields::blank(registry.columns()));
        registry.add(record)
    }

    pub fn set_cell(&self, id: Uuid, column: &str, value: &str) -> Result<(), ReviewError> {
        self.registry()?.set_cell(id, column, value)
    }

    /// Replace the whole session content, e.g. with a freshly parsed table.
    pub fn load(&self, records: Vec<DocumentRecord>) -> Result<(), ReviewError> {
        let count = records.len();
        self.registry()?.replace_all(records)?;
        tracing::info!(count, "Review session loaded");
        Ok(())
    }

    pub fn start_over(&self) -> Result<(), ReviewError> {
        self.load(Vec::new())
    }

    // ── Async operations ────────────────────────────────────

    /// Recognize an upload and list it as `pending`. Returns the new id.
    ///
    /// Dropping the returned future before completion leaves no record and
    /// no in-flight entry behind.
    pub async fn ingest(&self, file: IncomingFile) -> Result<Uuid, ReviewError> {
        let name = sanitize_filename(&file.name);
        if file.size_bytes > self.config.max_file_size_bytes {
            return Err(ReviewError::InvalidInput(format!(
                "{name} is {:.1}MB, limit is {}MB",
                file.size_bytes as f64 / (1024.0 * 1024.0),
                self.config.max_file_size_bytes / (1024 * 1024)
            )));
        }
        let file = IncomingFile { name, ..file };

        let id = Uuid::new_v4();
        let guard = InFlightGuard::register(&self.in_flight, id, &file.name)?;
        self.registry()?.announce(ChangeKind::IngestStarted {
            id,
            name: file.name.clone(),
        });
        tracing::info!(%id, file = %file.name, "Recognizing document");

        let timeout = self.config.ingest_timeout;
        let type_tag = match tokio::time::timeout(timeout, self.recognizer.recognize(&file)).await {
            Ok(Ok(tag)) => tag,
            Ok(Err(e)) => return Err(self.fail_ingest(id, e)),
            Err(_) => return Err(self.fail_ingest(id, ReviewError::IngestTimedOut(timeout))),
        };

        let record = DocumentRecord::new(file.name.clone(), type_tag).with_id(id);
        self.registry()?.add(record)?;
        drop(guard);

        tracing::info!(%id, file = %file.name, %type_tag, "Document recognized");
        Ok(id)
    }

    /// Export the current table through `transport`.
    pub async fn export(&self, transport: &dyn ExportTransport) -> Result<Vec<u8>, ReviewError> {
        let (records, columns) = {
            let registry = self.registry()?;
            (registry.all(), registry.columns().to_vec())
        };
        export::export_table(transport, &records, &columns).await
    }

    // ── Internals ───────────────────────────────────────────

    fn fail_ingest(&self, id: Uuid, error: ReviewError) -> ReviewError {
        tracing::warn!(%id, error = %error, "Document recognition failed");
        if let Ok(mut registry) = self.registry() {
            registry.announce(ChangeKind::IngestFailed {
                id,
                reason: error.to_string(),
            });
        }
        error
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry>, ReviewError> {
        self.registry.lock().map_err(|_| ReviewError::LockPoisoned)
    }

    fn in_flight(&self) -> Result<MutexGuard<'_, HashMap<Uuid, String>>, ReviewError> {
        self.in_flight.lock().map_err(|_| ReviewError::LockPoisoned)
    }
}

/// Removes the in-flight entry when the ingest finishes or is abandoned.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<Uuid, String>>,
    id: Uuid,
}

impl<'a> InFlightGuard<'a> {
    fn register(
        in_flight: &'a Mutex<HashMap<Uuid, String>>,
        id: Uuid,
        name: &str,
    ) -> Result<Self, ReviewError> {
        in_flight
            .lock()
            .map_err(|_| ReviewError::LockPoisoned)?
            .insert(id, name.to_string());
        Ok(Self { in_flight, id })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
