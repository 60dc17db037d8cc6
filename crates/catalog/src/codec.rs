// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Parquet encoding of typed record sets
//!
//! A record type describes its columns through [`ForArrow`]; `serde_arrow`
//! moves values between the typed records and an Arrow `RecordBatch`, and the
//! batch is written as a single Parquet object.
//!
//! Decoding is tolerant of objects written by older builds: the stored batch
//! is first conformed to the expected columns. Columns Arrow can cast are
//! cast, absent optional columns become null, and gaps in required columns
//! are filled with [`MISSING_SENTINEL`] (or the type's zero value) so that row
//! alignment is preserved. Anything else is a [`CatalogError::SchemaMismatch`].

use crate::{CatalogError, Result};
use arrow::array::{
    ArrayRef, BooleanArray, Int32Array, Int64Array, ListBuilder, StringArray, StringBuilder,
    new_null_array,
};
use arrow::compute::kernels::zip::zip;
use arrow::compute::{can_cast_types, cast, is_not_null};
use arrow_array::{Array, RecordBatch};
use arrow_schema::{DataType, FieldRef, Schema, SchemaRef};
use bytes::Bytes;
use diagnostics::*;
use parquet::arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder};
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Value substituted for a required string that is absent or null in storage
pub const MISSING_SENTINEL: &str = "<missing>";

/// Arrow column layout of a record type
pub trait ForArrow {
    fn for_arrow() -> Vec<FieldRef>;

    #[must_use]
    fn arrow_schema() -> SchemaRef {
        Arc::new(Schema::new(Self::for_arrow()))
    }
}

/// Encode `records` as one Parquet object
///
/// An empty slice produces a valid zero-row file.
pub fn encode<T>(records: &[T]) -> Result<Bytes>
where
    T: Serialize + ForArrow,
{
    let fields = T::for_arrow();
    let batch = serde_arrow::to_record_batch(&fields, &records)?;
    encode_batch(&batch)
}

/// Decode a Parquet object into records
///
/// Empty input and zero-row files both decode to an empty vector.
pub fn decode<T>(data: &[u8]) -> Result<Vec<T>>
where
    T: DeserializeOwned + ForArrow,
{
    let fields = T::for_arrow();
    let mut records = Vec::new();
    for batch in decode_batches(data)? {
        let conformed = conform(&batch, &fields)?;
        let mut items: Vec<T> = serde_arrow::from_record_batch(&conformed)?;
        records.append(&mut items);
    }
    Ok(records)
}

/// [`decode`] for an object that may not exist
pub fn decode_optional<T>(data: Option<Bytes>) -> Result<Vec<T>>
where
    T: DeserializeOwned + ForArrow,
{
    match data {
        Some(bytes) => decode(&bytes),
        None => Ok(Vec::new()),
    }
}

/// Serialize a RecordBatch to parquet bytes in memory
pub fn encode_batch(batch: &RecordBatch) -> Result<Bytes> {
    let mut buffer = Vec::new();
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(batch)?;
    let _ = writer.close()?;
    Ok(Bytes::from(buffer))
}

/// Read every batch of a parquet object
pub fn decode_batches(data: &[u8]) -> Result<Vec<RecordBatch>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(data))?.build()?;
    let mut batches = Vec::new();
    for batch in reader {
        let batch = batch?;
        if batch.num_rows() > 0 {
            batches.push(batch);
        }
    }
    Ok(batches)
}

/// Reshape `batch` to exactly the columns in `fields`
pub fn conform(batch: &RecordBatch, fields: &[FieldRef]) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let name = field.name().as_str();
        let column = match batch.column_by_name(name) {
            Some(stored) => {
                let column = cast_column(stored, field)?;
                if field.is_nullable() || column.null_count() == 0 {
                    column
                } else {
                    let count = column.null_count();
                    warn!(
                        "replacing {count} null values in required column {name}",
                        count: count,
                        name: name
                    );
                    fill_nulls(&column, field)?
                }
            }
            None if field.is_nullable() => new_null_array(field.data_type(), rows),
            None => {
                warn!(
                    "required column {name} is missing; substituting {rows} sentinel values",
                    name: name,
                    rows: rows
                );
                sentinel_array(field, rows)?
            }
        };
        columns.push(column);
    }

    let schema = Arc::new(Schema::new(fields.to_vec()));
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn cast_column(stored: &ArrayRef, field: &FieldRef) -> Result<ArrayRef> {
    let from = stored.data_type();
    let to = field.data_type();
    if from == to {
        return Ok(stored.clone());
    }
    if !can_cast_types(from, to) {
        return Err(CatalogError::SchemaMismatch {
            field: field.name().clone(),
            reason: format!("stored as {from}, expected {to}"),
        });
    }
    cast(stored, to).map_err(|e| CatalogError::SchemaMismatch {
        field: field.name().clone(),
        reason: e.to_string(),
    })
}

fn fill_nulls(column: &ArrayRef, field: &FieldRef) -> Result<ArrayRef> {
    let present = is_not_null(column.as_ref())?;
    let sentinels = sentinel_array(field, column.len())?;
    Ok(zip(&present, column, &sentinels)?)
}

/// A column of `len` sentinel values for a required field
fn sentinel_array(field: &FieldRef, len: usize) -> Result<ArrayRef> {
    let array: ArrayRef = match field.data_type() {
        DataType::Utf8 => Arc::new(StringArray::from(vec![MISSING_SENTINEL; len])),
        DataType::Boolean => Arc::new(BooleanArray::from(vec![false; len])),
        DataType::Int32 => Arc::new(Int32Array::from(vec![0; len])),
        DataType::Int64 => Arc::new(Int64Array::from(vec![0; len])),
        DataType::List(item) if item.data_type() == &DataType::Utf8 => {
            let mut builder = ListBuilder::new(StringBuilder::new()).with_field(item.clone());
            for _ in 0..len {
                builder.append(true);
            }
            Arc::new(builder.finish())
        }
        other => {
            return Err(CatalogError::SchemaMismatch {
                field: field.name().clone(),
                reason: format!("no sentinel for required {other} column"),
            });
        }
    };
    Ok(array)
}

/// Field for a repeated string column
#[must_use]
pub fn string_list(name: &str, nullable: bool) -> arrow_schema::Field {
    arrow_schema::Field::new(
        name,
        DataType::List(Arc::new(arrow_schema::Field::new("element", DataType::Utf8, false))),
        nullable,
    )
}
