//! Calendar date extraction from Arrow columns.

use arrow::array::{Array, ArrayRef, AsArray, OffsetSizeTrait};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dl_error::{DlError, Result, TransformError};

/// Layouts accepted for zone-less string timestamps, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validates every value of `column` as a timestamp and returns the date of
/// the first row.
///
/// Returns `Ok(None)` for an empty column. A null or unparseable value at any
/// row fails the whole column.
pub(crate) fn first_date(column: &ArrayRef, field: &str) -> Result<Option<NaiveDate>> {
    let dates = match column.data_type() {
        DataType::Utf8 => string_dates::<i32>(column, field)?,
        DataType::LargeUtf8 => string_dates::<i64>(column, field)?,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => epoch_int_dates(column, field)?,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            epoch_float_dates(column, field)?
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            temporal_dates(column, field)?
        }
        other => {
            return Err(TransformError::UnsupportedDateType {
                field: field.to_string(),
                data_type: other.to_string(),
            }
            .into())
        }
    };

    Ok(dates)
}

fn unparseable(field: &str, row: usize, value: impl ToString) -> TransformError {
    TransformError::UnparseableDate {
        field: field.to_string(),
        row,
        value: value.to_string(),
    }
}

fn null_at(field: &str, row: usize) -> TransformError {
    unparseable(field, row, "null")
}

fn widen(column: &ArrayRef, field: &str, to: &DataType) -> Result<ArrayRef> {
    cast(column, to).map_err(|e| {
        DlError::from(TransformError::UnsupportedDateType {
            field: field.to_string(),
            data_type: format!("{} ({})", column.data_type(), e),
        })
    })
}

fn string_dates<O: OffsetSizeTrait>(column: &ArrayRef, field: &str) -> Result<Option<NaiveDate>> {
    let values = column.as_string::<O>();
    let mut first = None;

    for row in 0..values.len() {
        if values.is_null(row) {
            return Err(null_at(field, row).into());
        }
        let raw = values.value(row);
        let date = parse_date_str(raw).ok_or_else(|| unparseable(field, row, raw))?;
        first.get_or_insert(date);
    }

    Ok(first)
}

fn epoch_int_dates(column: &ArrayRef, field: &str) -> Result<Option<NaiveDate>> {
    let widened = widen(column, field, &DataType::Int64)?;
    let values = widened.as_primitive::<Int64Type>();
    let mut first = None;

    for row in 0..values.len() {
        if values.is_null(row) {
            return Err(null_at(field, row).into());
        }
        let secs = values.value(row);
        let date = DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| unparseable(field, row, secs))?;
        first.get_or_insert(date);
    }

    Ok(first)
}

fn epoch_float_dates(column: &ArrayRef, field: &str) -> Result<Option<NaiveDate>> {
    let widened = widen(column, field, &DataType::Float64)?;
    let values = widened.as_primitive::<Float64Type>();
    let mut first = None;

    for row in 0..values.len() {
        if values.is_null(row) {
            return Err(null_at(field, row).into());
        }
        let secs = values.value(row);
        let date = epoch_float_to_date(secs).ok_or_else(|| unparseable(field, row, secs))?;
        first.get_or_insert(date);
    }

    Ok(first)
}

fn temporal_dates(column: &ArrayRef, field: &str) -> Result<Option<NaiveDate>> {
    let widened = widen(column, field, &DataType::Date32)?;
    let values = widened.as_primitive::<Date32Type>();
    let mut first = None;

    for row in 0..values.len() {
        if values.is_null(row) {
            return Err(null_at(field, row).into());
        }
        let date = values
            .value_as_date(row)
            .ok_or_else(|| unparseable(field, row, values.value(row)))?;
        first.get_or_insert(date);
    }

    Ok(first)
}

fn epoch_float_to_date(secs: f64) -> Option<NaiveDate> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((secs - whole) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.date_naive())
}

/// Parses a string timestamp and returns its calendar date.
///
/// Zoned values keep the date in their own offset, so
/// `2024-03-05T23:30:00-05:00` is March 5th.
pub(crate) fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}
