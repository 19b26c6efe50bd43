//! Identity store collaborator.
//!
//! Persists one identity record per service id. A record is a single line:
//!
//! ```text
//! <uuid>,<id>,<class>,<rfc3339 timestamp>
//! ```
//!
//! Only the leading 36-character uuid matters when reading; any record that
//! does not start with a canonical hyphenated uuid is treated as absent.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::trace;
use uuid::Uuid;

use crate::error::IdentityStoreError;
use crate::service::ServiceSpec;

/// Length of a canonical hyphenated uuid.
const UUID_TEXT_LEN: usize = 36;

/// Persistent storage for service identities, keyed by service id.
pub trait IdentityStore: Send + Sync {
    /// Reads the identity stored for `id`; malformed records read as `None`.
    fn read(&self, id: &str) -> Result<Option<Uuid>, IdentityStoreError>;

    /// Stores `uuid` as the identity of `id`.
    fn write(&self, id: &str, uuid: Uuid, spec: &ServiceSpec) -> Result<(), IdentityStoreError>;
}

/// Extracts the uuid from a stored record.
pub fn parse_identity_record(record: &str) -> Option<Uuid> {
    let head = record.get(..UUID_TEXT_LEN)?;
    match record[UUID_TEXT_LEN..].chars().next() {
        None | Some(',') | Some('\n') | Some('\r') => {}
        Some(_) => return None,
    }
    let bytes = head.as_bytes();
    if [8, 13, 18, 23].iter().any(|&i| bytes[i] != b'-') {
        return None;
    }
    Uuid::try_parse(head).ok()
}

/// Formats the record stored for `spec`.
pub fn format_identity_record(uuid: Uuid, spec: &ServiceSpec) -> String {
    format!(
        "{},{},{},{}",
        uuid.hyphenated(),
        spec.id,
        spec.class,
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

// =============================================================================
// FileIdentityStore
// =============================================================================

/// Stores each identity in `<dir>/<id>.uuid`.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the record path for `id`.
    pub fn record_path(&self, id: &str) -> Result<PathBuf, IdentityStoreError> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\', '\0']);
        if !valid {
            return Err(IdentityStoreError::InvalidKey(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.uuid")))
    }
}

impl IdentityStore for FileIdentityStore {
    fn read(&self, id: &str) -> Result<Option<Uuid>, IdentityStoreError> {
        let path = self.record_path(id)?;
        match fs::read_to_string(&path) {
            Ok(record) => {
                let uuid = parse_identity_record(&record);
                if uuid.is_none() {
                    trace!(path = %path.display(), "Ignoring malformed identity record");
                }
                Ok(uuid)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, id: &str, uuid: Uuid, spec: &ServiceSpec) -> Result<(), IdentityStoreError> {
        let path = self.record_path(id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, format_identity_record(uuid, spec))?;
        trace!(path = %path.display(), %uuid, "Identity record written");
        Ok(())
    }
}

// =============================================================================
// MemoryIdentityStore
// =============================================================================

/// In-memory store holding the same record text as [`FileIdentityStore`].
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw record, bypassing formatting.
    pub fn insert_raw(&self, id: impl Into<String>, record: impl Into<String>) {
        self.records.lock().insert(id.into(), record.into());
    }

    /// Returns the raw record stored for `id`.
    pub fn raw(&self, id: &str) -> Option<String> {
        self.records.lock().get(id).cloned()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn read(&self, id: &str) -> Result<Option<Uuid>, IdentityStoreError> {
        Ok(self
            .records
            .lock()
            .get(id)
            .and_then(|record| parse_identity_record(record)))
    }

    fn write(&self, id: &str, uuid: Uuid, spec: &ServiceSpec) -> Result<(), IdentityStoreError> {
        self.insert_raw(id, format_identity_record(uuid, spec));
        Ok(())
    }
}
