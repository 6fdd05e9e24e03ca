//! Parquet encoding
//!
//! Encodes Arrow RecordBatches into in-memory Parquet files for upload.

use crate::error::Result;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

/// Configuration for Parquet encoding
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression algorithm
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Use ZSTD compression
    #[must_use]
    pub fn zstd(mut self) -> Self {
        self.compression = Compression::ZSTD(parquet::basic::ZstdLevel::default());
        self
    }

    /// Get the compression algorithm
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Get row group size
    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Encode a batch as a complete Parquet file in memory
pub fn encode_parquet(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(
        &mut buffer,
        batch.schema(),
        Some(config.build_properties()),
    )?;
    writer.write(batch)?;
    writer.close()?;
    Ok(Bytes::from(buffer))
}

/// Decode an in-memory Parquet file into record batches
pub fn decode_parquet(data: Bytes) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}
