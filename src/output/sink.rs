//! Warehouse sinks
//!
//! A sink takes the whole campaign-tag batch and makes it the complete
//! contents of the target table. Nothing from earlier runs survives a
//! successful `replace`.

use super::cloud::CloudDestination;
use super::schema::{batch_to_rows, validate_batch};
use super::writer::{encode_parquet, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::flatten::CampaignTagRow;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use duckdb::{params, Connection};
use object_store::path::Path as ObjectPath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Default table name for campaign-tag rows
pub const DEFAULT_TABLE: &str = "klaviyo_campaign_tags";

/// Data file name inside a table directory in object storage
pub const TABLE_DATA_FILE: &str = "data.parquet";

/// Fully qualified warehouse table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// Project (or catalog) owning the dataset
    pub project: String,
    /// Dataset (or schema)
    pub dataset: String,
    /// Table name
    pub table: String,
}

impl TableRef {
    /// Create a table reference
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Destination accepting a full-replace write of one batch
#[async_trait]
pub trait WarehouseSink: Send + Sync {
    /// Replace the table's contents with `batch`, returning the rows written
    async fn replace(&self, table: &TableRef, batch: &RecordBatch) -> Result<usize>;

    /// Human-readable description of where data goes
    fn describe(&self) -> String;
}

// ============================================================================
// DuckDB
// ============================================================================

/// Analytical table in a DuckDB database
///
/// The dataset maps to a DuckDB schema; the project is only used for
/// display since one database file is one catalog. Writes run on the
/// blocking thread pool.
pub struct DuckDbSink {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl DuckDbSink {
    /// Open (or create) a DuckDB database file; `:memory:` opens an in-memory one
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::in_memory();
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: path.display().to_string(),
        })
    }

    /// Open an in-memory database
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
            location: ":memory:".to_string(),
        })
    }

    /// Read a table back in insertion order
    pub fn read_rows(&self, table: &TableRef) -> Result<Vec<CampaignTagRow>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT campaign_id, campaign_name, tag_id, tag_name FROM {} ORDER BY rowid",
            qualified_name(table)
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(CampaignTagRow {
                campaign_id: row.get(0)?,
                campaign_name: row.get(1)?,
                tag_id: row.get(2)?,
                tag_name: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| Error::output("DuckDB connection lock poisoned"))
}

fn replace_blocking(
    conn: &Mutex<Connection>,
    table: &TableRef,
    batch: &RecordBatch,
) -> Result<usize> {
    let rows = batch_to_rows(batch)?;
    let target = qualified_name(table);

    let mut conn = lock(conn)?;
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "CREATE SCHEMA IF NOT EXISTS {schema};
         CREATE OR REPLACE TABLE {target} (
             campaign_id VARCHAR NOT NULL,
             campaign_name VARCHAR NOT NULL,
             tag_id VARCHAR NOT NULL,
             tag_name VARCHAR
         );",
        schema = quote_ident(&table.dataset),
    ))?;
    {
        let mut insert = tx.prepare(&format!("INSERT INTO {target} VALUES (?, ?, ?, ?)"))?;
        for row in &rows {
            insert.execute(params![
                row.campaign_id,
                row.campaign_name,
                row.tag_id,
                row.tag_name
            ])?;
        }
    }
    tx.commit()?;

    Ok(rows.len())
}

#[async_trait]
impl WarehouseSink for DuckDbSink {
    async fn replace(&self, table: &TableRef, batch: &RecordBatch) -> Result<usize> {
        validate_batch(batch)?;
        let conn = Arc::clone(&self.conn);
        let (target, batch) = (table.clone(), batch.clone());
        let written =
            tokio::task::spawn_blocking(move || replace_blocking(&conn, &target, &batch))
                .await
                .map_err(|e| Error::output(format!("DuckDB write task failed: {e}")))??;
        info!(
            "Replaced {} in DuckDB {} with {} rows",
            table, self.location, written
        );
        Ok(written)
    }

    fn describe(&self) -> String {
        format!("duckdb:{}", self.location)
    }
}

impl fmt::Debug for DuckDbSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuckDbSink")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualified_name(table: &TableRef) -> String {
    format!(
        "{}.{}",
        quote_ident(&table.dataset),
        quote_ident(&table.table)
    )
}

// ============================================================================
// Object storage
// ============================================================================

/// Parquet table directory in object storage
///
/// A table lives at `{dataset}/{table}/data.parquet` under the destination
/// prefix; after a replace that file is the only object in the directory.
#[derive(Debug)]
pub struct ObjectStoreSink {
    destination: CloudDestination,
    config: ParquetWriterConfig,
}

impl ObjectStoreSink {
    /// Create a sink writing with the default Parquet settings
    pub fn new(destination: CloudDestination) -> Self {
        Self {
            destination,
            config: ParquetWriterConfig::default(),
        }
    }

    /// Override the Parquet settings
    #[must_use]
    pub fn with_config(mut self, config: ParquetWriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory holding a table
    pub fn table_dir(&self, table: &TableRef) -> ObjectPath {
        self.destination
            .object_path(&format!("{}/{}", table.dataset, table.table))
    }

    /// Data file of a table
    pub fn table_file(&self, table: &TableRef) -> ObjectPath {
        self.destination.object_path(&format!(
            "{}/{}/{TABLE_DATA_FILE}",
            table.dataset, table.table
        ))
    }

    /// Get the destination
    pub fn destination(&self) -> &CloudDestination {
        &self.destination
    }
}

#[async_trait]
impl WarehouseSink for ObjectStoreSink {
    async fn replace(&self, table: &TableRef, batch: &RecordBatch) -> Result<usize> {
        validate_batch(batch)?;
        let data = encode_parquet(batch, &self.config)?;
        let target = self.table_file(table);

        self.destination.put(&target, data).await?;

        for stale in self.destination.list(&self.table_dir(table)).await? {
            if stale != target {
                debug!(
                    "Removing stale object {}",
                    self.destination.display_path(&stale)
                );
                self.destination.delete(&stale).await?;
            }
        }

        info!(
            "Replaced {} at {} with {} rows",
            table,
            self.destination.display_path(&target),
            batch.num_rows()
        );
        Ok(batch.num_rows())
    }

    fn describe(&self) -> String {
        format!("{} object store", self.destination.scheme())
    }
}
