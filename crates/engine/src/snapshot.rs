//! Table snapshots on disk
//!
//! A snapshot is one JSON file per table under `<data_dir>/tables/`,
//! holding the index definitions and every row. Files are written to a
//! temporary path and renamed into place so a crash mid-write leaves the
//! previous snapshot intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use recordb_core::{Error, Record, Result};
use recordb_storage::{IndexSpec, MemoryTable};
use serde::{Deserialize, Serialize};

/// Directory under the data dir holding table snapshots
pub const TABLES_DIR: &str = "tables";

const SNAPSHOT_EXTENSION: &str = "json";
const TMP_EXTENSION: &str = "json.tmp";

/// Serialized form of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name
    pub name: String,
    /// Secondary index definitions
    pub indexes: Vec<IndexSpec>,
    /// Rows in primary-key order
    pub rows: Vec<Record>,
}

impl TableSnapshot {
    /// Capture the current contents of a table
    pub fn capture(table: &MemoryTable) -> Self {
        use recordb_storage::DocumentTable;
        Self {
            name: table.name().to_string(),
            indexes: table.index_specs(),
            rows: table.rows(),
        }
    }

    /// Rebuild a table, indexes first so rows are indexed as they load
    pub fn restore(self) -> Result<MemoryTable> {
        let table = MemoryTable::new(self.name);
        for spec in self.indexes {
            table.create_index(spec)?;
        }
        table.load(self.rows);
        Ok(table)
    }

    /// Write atomically into `tables_dir`
    pub fn write(&self, tables_dir: &Path) -> Result<()> {
        let path = snapshot_path(tables_dir, &self.name);
        let tmp = path.with_extension(TMP_EXTENSION);

        let bytes = serde_json::to_vec(self)?;
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Read a snapshot file
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::SerializationError(format!(
                "Corrupt table snapshot '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Path of a table's snapshot file
pub fn snapshot_path(tables_dir: &Path, table: &str) -> PathBuf {
    tables_dir.join(format!("{}.{}", table, SNAPSHOT_EXTENSION))
}

/// Snapshot files present in `tables_dir`, as (table name, path)
pub fn list_snapshots(tables_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !tables_dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(tables_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
            found.push((name.to_string(), path.clone()));
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordb_core::{RecordSpec, Timestamp, Value};
    use recordb_storage::Field;
    use tempfile::TempDir;

    fn sample_table() -> MemoryTable {
        let table = MemoryTable::new("records");
        table.create_index(IndexSpec::single(Field::Type)).unwrap();
        table.load(vec![
            RecordSpec::new("test", "subject")
                .with_timestamp(Timestamp::from_millis(1))
                .with_data(Value::Int(5))
                .build()
                .unwrap(),
            RecordSpec::new("test", "subject")
                .with_object("object")
                .with_timestamp(Timestamp::from_millis(2))
                .build()
                .unwrap(),
        ]);
        table
    }

    #[test]
    fn test_write_read_restore() {
        let dir = TempDir::new().unwrap();
        let table = sample_table();

        let snapshot = TableSnapshot::capture(&table);
        snapshot.write(dir.path()).unwrap();

        let read = TableSnapshot::read(&snapshot_path(dir.path(), "records")).unwrap();
        assert_eq!(read, snapshot);

        let restored = read.restore().unwrap();
        assert_eq!(restored.rows(), table.rows());
        assert_eq!(restored.index_specs(), table.index_specs());
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        TableSnapshot::capture(&sample_table())
            .write(dir.path())
            .unwrap();

        let listed = list_snapshots(dir.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "records");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(dir.path(), "records");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            TableSnapshot::read(&path),
            Err(Error::SerializationError(_))
        ));
    }

    #[test]
    fn test_non_finite_payload_reads_back() {
        let dir = TempDir::new().unwrap();
        let mut record = RecordSpec::new("test", "subject")
            .with_timestamp(Timestamp::from_millis(3))
            .build()
            .unwrap();
        record.data = Some(Value::Array(vec![Value::Float(f64::INFINITY), Value::Int(1)]));

        let table = MemoryTable::new("records");
        table.load(vec![record]);
        TableSnapshot::capture(&table).write(dir.path()).unwrap();

        let read = TableSnapshot::read(&snapshot_path(dir.path(), "records")).unwrap();
        assert_eq!(
            read.rows[0].data,
            Some(Value::Array(vec![Value::Null, Value::Int(1)]))
        );
    }

    #[test]
    fn test_list_snapshots_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_snapshots(&dir.path().join(TABLES_DIR)).unwrap().is_empty());
    }
}
