//! Small columnar helpers shared by the table transforms: column lookup,
//! casting, exact-row dedup and index-based gathers for joins.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, UInt32Array};
use arrow::compute::{cast, take};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};

use crate::error::TransformError;

pub type Column = (FieldRef, ArrayRef);

pub fn named(batch: &RecordBatch, name: &str) -> Result<Column, TransformError> {
    let schema = batch.schema();
    let idx = schema
        .index_of(name)
        .map_err(|_| TransformError::MissingColumn(name.to_string()))?;
    Ok((schema.fields()[idx].clone(), batch.column(idx).clone()))
}

pub fn assemble(columns: Vec<Column>) -> Result<RecordBatch, TransformError> {
    let (fields, arrays): (Vec<FieldRef>, Vec<ArrayRef>) = columns.into_iter().unzip();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

pub fn utf8(array: &ArrayRef) -> Result<StringArray, TransformError> {
    cast_as(array, &DataType::Utf8)
}

pub fn int64(array: &ArrayRef) -> Result<Int64Array, TransformError> {
    cast_as(array, &DataType::Int64)
}

pub fn float64(array: &ArrayRef) -> Result<Float64Array, TransformError> {
    cast_as(array, &DataType::Float64)
}

fn cast_as<T: Array + Clone + 'static>(
    array: &ArrayRef,
    to: &DataType,
) -> Result<T, TransformError> {
    let converted = cast(array.as_ref(), to)?;
    converted
        .as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| {
            ArrowError::CastError(format!("cannot view {} as {to}", array.data_type())).into()
        })
}

/// Collapses identical rows, keeping the first occurrence of each.
pub fn unique_rows(batch: &RecordBatch) -> Result<RecordBatch, TransformError> {
    let sort_fields = batch
        .schema()
        .fields()
        .iter()
        .map(|field| SortField::new(field.data_type().clone()))
        .collect::<Vec<_>>();
    let converter = RowConverter::new(sort_fields)?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen = HashSet::with_capacity(rows.num_rows());
    let mut keep = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        if seen.insert(row) {
            keep.push(idx as u32);
        }
    }
    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }
    take_rows(batch, &UInt32Array::from(keep))
}

pub fn take_rows(batch: &RecordBatch, indices: &UInt32Array) -> Result<RecordBatch, TransformError> {
    let columns = batch
        .columns()
        .iter()
        .map(|column| take(column.as_ref(), indices, None))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}

/// Gathers `column` by `indices`; null indices produce null slots, so the
/// resulting field is always nullable. `rename` replaces the field name.
pub fn gather(
    column: &Column,
    indices: &UInt32Array,
    rename: Option<&str>,
) -> Result<Column, TransformError> {
    let (field, array) = column;
    let values = take(array.as_ref(), indices, None)?;
    let name = rename.unwrap_or(field.name());
    let field = Field::new(name, field.data_type().clone(), true)
        .with_metadata(field.metadata().clone());
    Ok((Arc::new(field), values))
}

/// Float join keys compare by bit pattern; fold -0.0 onto 0.0 first.
pub fn float_key(value: f64) -> u64 {
    if value == 0.0 { 0f64.to_bits() } else { value.to_bits() }
}
