//! Database struct and open/close logic
//!
//! The database is the handle a record store is given: it owns named
//! document tables and provides table selection, table and index creation,
//! and (for on-disk databases) snapshot load/save.
//!
//! ## Layout on disk
//!
//! ```text
//! <data_dir>/
//!   recordb.toml          configuration, written with defaults on first open
//!   tables/<name>.json    one snapshot per table
//! ```
//!
//! In-memory databases have no data directory and never touch disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};

use recordb_core::{Error, Result};
use recordb_storage::{DocumentTable, IndexSpec, MemoryTable};

use crate::config::{validate_table_name, RecordbConfig, CONFIG_FILE_NAME};
use crate::snapshot::{list_snapshots, snapshot_path, TableSnapshot, TABLES_DIR};

/// Main database struct
///
/// Create one with [`Database::open`] (on disk) or [`Database::in_memory`].
///
/// # Example
///
/// ```ignore
/// use recordb_engine::Database;
///
/// let db = Database::open("/path/to/data")?;
/// db.table_create("records")?;
/// let table = db.document_table("records")?;
/// ```
#[derive(Debug)]
pub struct Database {
    /// Data directory path (`None` for in-memory databases)
    data_dir: Option<PathBuf>,

    /// Effective configuration
    config: RecordbConfig,

    /// Tables by name
    tables: DashMap<String, Arc<MemoryTable>>,
}

impl Database {
    /// Create an in-memory database with the default configuration
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self {
            data_dir: None,
            config: RecordbConfig::default(),
            tables: DashMap::new(),
        })
    }

    /// Create an in-memory database with an explicit configuration
    pub fn in_memory_with_config(config: RecordbConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self {
            data_dir: None,
            config,
            tables: DashMap::new(),
        }))
    }

    /// Open database at given path, loading any table snapshots
    ///
    /// # Flow
    ///
    /// 1. Create the data directory if needed
    /// 2. Write a default `recordb.toml` if none exists, then read it
    /// 3. Restore every `tables/<name>.json` snapshot
    ///
    /// # Errors
    ///
    /// I/O failures, an invalid config file, or a corrupt snapshot.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let data_dir = path.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        RecordbConfig::write_default_if_missing(&config_path)?;
        let config = RecordbConfig::from_file(&config_path)?;

        Self::open_with_config(data_dir, config)
    }

    /// Open database at given path with an explicit configuration
    ///
    /// The config file in the data directory is neither read nor written.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: RecordbConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let data_dir = path.as_ref().to_path_buf();
        let tables_dir = data_dir.join(TABLES_DIR);
        std::fs::create_dir_all(&tables_dir)?;

        let tables = DashMap::new();
        let mut rows = 0usize;
        for (name, path) in list_snapshots(&tables_dir)? {
            let table = TableSnapshot::read(&path)?.restore()?;
            rows += table.len();
            tables.insert(name, Arc::new(table));
        }

        info!(
            data_dir = %data_dir.display(),
            tables = tables.len(),
            rows,
            "Database opened"
        );

        Ok(Arc::new(Self {
            data_dir: Some(data_dir),
            config,
            tables,
        }))
    }

    /// Effective configuration
    pub fn config(&self) -> &RecordbConfig {
        &self.config
    }

    /// Data directory, if this database lives on disk
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    // ========== Table selection ==========

    /// Select a table by name
    ///
    /// # Errors
    ///
    /// `Error::TableNotFound` when no such table exists.
    pub fn table(&self, name: &str) -> Result<Arc<MemoryTable>> {
        self.tables
            .get(name)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Select a table as the query surface record stores consume
    pub fn document_table(&self, name: &str) -> Result<Arc<dyn DocumentTable>> {
        let table: Arc<dyn DocumentTable> = self.table(name)?;
        Ok(table)
    }

    /// Names of all tables, sorted
    pub fn table_list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }

    // ========== Schema ==========

    /// Create an empty table
    ///
    /// # Errors
    ///
    /// `Error::AlreadyExists` when the table exists, `Error::InvalidInput`
    /// for a name that cannot be used as a snapshot file name.
    pub fn table_create(&self, name: &str) -> Result<()> {
        validate_table_name(name).map_err(Error::InvalidInput)?;
        match self.tables.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::table_exists(name)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(MemoryTable::new(name)));
                info!(table = name, "Table created");
                Ok(())
            }
        }
    }

    /// Drop a table and all of its rows
    ///
    /// # Errors
    ///
    /// `Error::TableNotFound` when no such table exists.
    pub fn table_drop(&self, name: &str) -> Result<()> {
        match self.tables.remove(name) {
            Some(_) => {
                info!(table = name, "Table dropped");
                Ok(())
            }
            None => Err(Error::TableNotFound(name.to_string())),
        }
    }

    /// Define a secondary index on a table
    ///
    /// # Errors
    ///
    /// `Error::TableNotFound`, or `Error::AlreadyExists` when the index exists.
    pub fn index_create(&self, table: &str, spec: IndexSpec) -> Result<()> {
        let name = spec.name.clone();
        self.table(table)?.create_index(spec)?;
        info!(table, index = %name, "Index created");
        Ok(())
    }

    // ========== Persistence ==========

    /// Write a snapshot of every table and remove snapshots of dropped tables
    ///
    /// No-op for in-memory databases.
    pub fn checkpoint(&self) -> Result<()> {
        let Some(data_dir) = &self.data_dir else {
            return Ok(());
        };
        let tables_dir = data_dir.join(TABLES_DIR);
        std::fs::create_dir_all(&tables_dir)?;

        let tables: Vec<Arc<MemoryTable>> =
            self.tables.iter().map(|t| Arc::clone(t.value())).collect();
        for table in &tables {
            TableSnapshot::capture(table).write(&tables_dir)?;
        }

        for (name, path) in list_snapshots(&tables_dir)? {
            if !self.tables.contains_key(&name) {
                std::fs::remove_file(path)?;
            }
        }

        info!(
            data_dir = %data_dir.display(),
            tables = tables.len(),
            "Checkpoint written"
        );
        Ok(())
    }

    /// Snapshot file a table is persisted to, if this database lives on disk
    pub fn snapshot_path(&self, table: &str) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| snapshot_path(&dir.join(TABLES_DIR), table))
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.data_dir.is_some() && self.config.snapshot_on_close {
            if let Err(e) = self.checkpoint() {
                warn!(error = %e, "Failed to write snapshot on close");
            }
        }
    }
}
