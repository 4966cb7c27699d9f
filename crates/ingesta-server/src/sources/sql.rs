//! Row conversion shared by the sqlx-backed connectors
//!
//! Networked engines are scanned with a plain `&str` statement, which sqlx
//! sends over the text protocol. Cells the typed list does not claim are then
//! exported with the server's own text rendering (enums, arrays, intervals,
//! network types, `YEAR`, long `TIME` values and so on).

use serde_json::{Number, Value};
use sqlx::{ColumnIndex, Column, Decode, Row, TypeInfo};
use std::fmt::Write;

use super::SourceKind;
use crate::{
    dataset::{Dataset, Record},
    error::{IngestError, IngestResult},
};

/// Try each Rust type in order and convert the first compatible one.
///
/// Evaluates to `Some(value)` (SQL `NULL` becomes `Value::Null`) or `None`
/// when no listed type matches the column.
macro_rules! decode_cell {
    ($row:expr, $idx:expr, $( $ty:ty => $conv:expr ),+ $(,)?) => {{
        'decoded: {
            $(
                if let Ok(value) = sqlx::Row::try_get::<Option<$ty>, _>($row, $idx) {
                    break 'decoded Some(value.map($conv).unwrap_or(serde_json::Value::Null));
                }
            )+
            None
        }
    }};
}

pub(crate) use decode_cell;

/// Full-scan statement for one table
pub(crate) fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", table)
}

pub(crate) fn column_names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

/// Convert fetched rows with a per-engine cell decoder.
///
/// A cell the decoder rejects fails the whole dataset.
pub(crate) fn rows_to_dataset<R>(
    kind: SourceKind,
    name: &str,
    columns: Vec<String>,
    rows: &[R],
    decode: fn(&R, usize) -> Option<Value>,
) -> IngestResult<Dataset>
where
    R: Row,
{
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let mut record = Record::new();
        for column in row.columns() {
            let value = decode(row, column.ordinal()).ok_or_else(|| {
                IngestError::query(
                    kind,
                    name,
                    format!(
                        "cannot export column {} of type {}",
                        column.name(),
                        column.type_info().name()
                    ),
                )
            })?;
            record.insert(column.name().to_string(), value);
        }
        records.push(record);
    }

    Ok(Dataset::new(name, columns, records))
}

/// The cell as the server rendered it, whatever its declared type.
///
/// Only meaningful for text-protocol rows.
pub(crate) fn as_text<'r, R>(row: &'r R, idx: usize) -> Option<Value>
where
    R: Row,
    usize: ColumnIndex<R>,
    String: Decode<'r, R::Database>,
{
    row.try_get_unchecked::<Option<String>, _>(idx)
        .ok()
        .map(|text| text.map(Value::String).unwrap_or(Value::Null))
}

/// Non-finite floats have no JSON number form; keep their text.
pub(crate) fn float(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}

pub(crate) fn hex(bytes: Vec<u8>) -> Value {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    Value::String(out)
}
