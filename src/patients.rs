use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{EngineError, Result};

/// Generate a short unique record id
fn generate_record_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// One stored patient record with arbitrary clinical fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    pub id: String,
    /// Free-form clinical data, keyed by field name
    pub patient_data: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientRecord {
    /// Create a new record with a generated id
    pub fn new(patient_data: HashMap<String, serde_json::Value>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_record_id(),
            patient_data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge new fields into the record and touch the update timestamp
    pub fn update(&mut self, patient_data: HashMap<String, serde_json::Value>) {
        self.patient_data.extend(patient_data);
        self.updated_at = Utc::now();
    }
}

/// File-per-record JSON persistence for patient records
///
/// Peer of the inference core with no dependency on it; invoked by the
/// same outer request layer.
#[derive(Debug)]
pub struct PatientStore {
    storage_dir: PathBuf,
}

impl PatientStore {
    /// Open the store, creating the storage directory if needed
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", id))
    }

    /// Create and persist a new record
    pub fn create(&self, patient_data: HashMap<String, serde_json::Value>) -> Result<PatientRecord> {
        let record = PatientRecord::new(patient_data);
        self.save(&record)?;
        Ok(record)
    }

    /// Persist a record, overwriting any previous version
    pub fn save(&self, record: &PatientRecord) -> Result<()> {
        let path = self.record_path(&record.id);
        let data = serde_json::to_string_pretty(record)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Load one record by id
    pub fn load(&self, id: &str) -> Result<PatientRecord> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(EngineError::RecordNotFound(id.to_string()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Merge new fields into an existing record and persist it
    pub fn update(
        &self,
        id: &str,
        patient_data: HashMap<String, serde_json::Value>,
    ) -> Result<PatientRecord> {
        let mut record = self.load(id)?;
        record.update(patient_data);
        self.save(&record)?;
        Ok(record)
    }

    /// Delete one record by id
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(EngineError::RecordNotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// All records, newest first (by creation timestamp)
    ///
    /// Unreadable files are skipped with a warning rather than failing
    /// the whole listing.
    pub fn list(&self) -> Result<Vec<PatientRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.storage_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

fn read_record(path: &Path) -> Result<PatientRecord> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_data(name: &str) -> HashMap<String, serde_json::Value> {
        let mut data = HashMap::new();
        data.insert("name".to_string(), json!(name));
        data.insert("age_onset".to_string(), json!(24));
        data
    }

    #[test]
    fn test_create_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(dir.path()).unwrap();

        let created = store.create(sample_data("alice")).unwrap();
        assert_eq!(created.id.len(), 8);

        let loaded = store.load(&created.id).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.patient_data.get("name"), Some(&json!("alice")));
    }

    #[test]
    fn test_load_missing_record() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.load("deadbeef"),
            Err(EngineError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_update_merges_and_touches_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(dir.path()).unwrap();
        let created = store.create(sample_data("bob")).unwrap();

        let mut patch = HashMap::new();
        patch.insert("tsh_1".to_string(), json!(0.002));
        let updated = store.update(&created.id, patch).unwrap();

        assert_eq!(updated.patient_data.get("name"), Some(&json!("bob")));
        assert_eq!(updated.patient_data.get("tsh_1"), Some(&json!(0.002)));
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn test_delete_removes_record() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(dir.path()).unwrap();
        let created = store.create(sample_data("carol")).unwrap();

        store.delete(&created.id).unwrap();
        assert!(store.load(&created.id).is_err());
        assert!(store.delete(&created.id).is_err());
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(dir.path()).unwrap();

        // Distinct creation timestamps, persisted out of order
        let mut first = PatientRecord::new(sample_data("old"));
        first.created_at = Utc::now() - chrono::Duration::hours(2);
        let mut second = PatientRecord::new(sample_data("mid"));
        second.created_at = Utc::now() - chrono::Duration::hours(1);
        let third = PatientRecord::new(sample_data("new"));

        store.save(&second).unwrap();
        store.save(&third).unwrap();
        store.save(&first).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, third.id);
        assert_eq!(listed[1].id, second.id);
        assert_eq!(listed[2].id, first.id);
    }

    #[test]
    fn test_list_skips_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(dir.path()).unwrap();
        store.create(sample_data("dave")).unwrap();
        fs::write(dir.path().join("corrupt.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
    }
}
