//! Output module
//!
//! Handles the tabular side of a sync: the fixed Arrow schema of the
//! campaign-tag table, Parquet encoding, and the warehouse sinks that
//! replace a table's contents with one batch.
//!
//! # Overview
//!
//! - `rows_to_batch` / `batch_to_rows` - rows to and from Arrow
//! - `encode_parquet` - in-memory Parquet files
//! - `WarehouseSink` - full-replace writes, implemented by `DuckDbSink`
//!   (DuckDB table) and `ObjectStoreSink` (Parquet in GCS, S3, R2, Azure or
//!   a local directory)

mod cloud;
mod schema;
mod sink;
mod writer;

pub use cloud::CloudDestination;
pub use schema::{
    batch_to_rows, campaign_tag_schema, rows_to_batch, validate_batch, CAMPAIGN_ID,
    CAMPAIGN_NAME, COLUMNS, TAG_ID, TAG_NAME,
};
pub use sink::{
    DuckDbSink, ObjectStoreSink, TableRef, WarehouseSink, DEFAULT_TABLE, TABLE_DATA_FILE,
};
pub use writer::{decode_parquet, encode_parquet, ParquetWriterConfig};
