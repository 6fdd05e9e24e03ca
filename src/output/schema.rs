//! Arrow schema for the campaign-tag table
//!
//! The warehouse table has exactly four string columns. Only `tag_name` is
//! nullable, since a referenced tag may not have been side-loaded.

use crate::error::{Error, Result};
use crate::flatten::CampaignTagRow;
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Column holding the campaign id
pub const CAMPAIGN_ID: &str = "campaign_id";
/// Column holding the campaign name
pub const CAMPAIGN_NAME: &str = "campaign_name";
/// Column holding the tag id
pub const TAG_ID: &str = "tag_id";
/// Column holding the tag name
pub const TAG_NAME: &str = "tag_name";

/// Column names in table order
pub const COLUMNS: [&str; 4] = [CAMPAIGN_ID, CAMPAIGN_NAME, TAG_ID, TAG_NAME];

/// The fixed schema of the campaign-tag table
pub fn campaign_tag_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(CAMPAIGN_ID, DataType::Utf8, false),
        Field::new(CAMPAIGN_NAME, DataType::Utf8, false),
        Field::new(TAG_ID, DataType::Utf8, false),
        Field::new(TAG_NAME, DataType::Utf8, true),
    ]))
}

/// Build a record batch from rows; zero rows gives an empty batch
pub fn rows_to_batch(rows: &[CampaignTagRow]) -> Result<RecordBatch> {
    let campaign_ids: StringArray = rows.iter().map(|r| Some(r.campaign_id.as_str())).collect();
    let campaign_names: StringArray =
        rows.iter().map(|r| Some(r.campaign_name.as_str())).collect();
    let tag_ids: StringArray = rows.iter().map(|r| Some(r.tag_id.as_str())).collect();
    let tag_names: StringArray = rows.iter().map(|r| r.tag_name.as_deref()).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(campaign_ids),
        Arc::new(campaign_names),
        Arc::new(tag_ids),
        Arc::new(tag_names),
    ];

    Ok(RecordBatch::try_new(campaign_tag_schema(), columns)?)
}

/// Read rows back out of a batch with the campaign-tag schema
pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<CampaignTagRow>> {
    validate_batch(batch)?;

    let campaign_ids = string_column(batch, CAMPAIGN_ID)?;
    let campaign_names = string_column(batch, CAMPAIGN_NAME)?;
    let tag_ids = string_column(batch, TAG_ID)?;
    let tag_names = string_column(batch, TAG_NAME)?;

    Ok((0..batch.num_rows())
        .map(|i| CampaignTagRow {
            campaign_id: campaign_ids.value(i).to_string(),
            campaign_name: campaign_names.value(i).to_string(),
            tag_id: tag_ids.value(i).to_string(),
            tag_name: (!tag_names.is_null(i)).then(|| tag_names.value(i).to_string()),
        })
        .collect())
}

/// Check that a batch has exactly the campaign-tag columns, in order, as strings,
/// with nulls only in `tag_name`
pub fn validate_batch(batch: &RecordBatch) -> Result<()> {
    let schema = batch.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    if names != COLUMNS {
        return Err(Error::output(format!(
            "expected columns {COLUMNS:?}, got {names:?}"
        )));
    }

    if let Some(field) = schema
        .fields()
        .iter()
        .find(|f| f.data_type() != &DataType::Utf8)
    {
        return Err(Error::output(format!(
            "column '{}' must be Utf8, got {}",
            field.name(),
            field.data_type()
        )));
    }

    for name in [CAMPAIGN_ID, CAMPAIGN_NAME, TAG_ID] {
        let nulls = batch
            .column_by_name(name)
            .map_or(0, |column| column.null_count());
        if nulls > 0 {
            return Err(Error::output(format!(
                "column '{name}' is not nullable, found {nulls} nulls"
            )));
        }
    }

    Ok(())
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::output(format!("column '{name}' is missing or not Utf8")))
}
