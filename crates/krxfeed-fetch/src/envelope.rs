//! Response envelope parsing.
//!
//! The exchange wraps rows in an object holding several named arrays, e.g.
//! `{"output": [...], "CURRENT_DATETIME": "..."}`. Which key holds the rows
//! depends on the routine.

use krxfeed_types::{KrxError, Result, Row, RowSet};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Descriptor;

/// Extracts the named block of rows from a payload.
///
/// # Errors
///
/// - [`KrxError::EmptyResult`] if the block is present but holds no rows
/// - [`KrxError::UpstreamFormat`] if the payload is not an object, the block
///   is missing or not an array, or a row is not an object
pub fn extract(payload: &Value, block: &str) -> Result<RowSet> {
    let envelope = payload.as_object().ok_or_else(|| {
        KrxError::UpstreamFormat(format!("expected an object envelope, got {}", kind(payload)))
    })?;

    let entries = envelope.get(block).ok_or_else(|| {
        let keys: Vec<&str> = envelope.keys().map(String::as_str).collect();
        KrxError::UpstreamFormat(format!(
            "block '{block}' missing from envelope (keys: {})",
            keys.join(", ")
        ))
    })?;

    let entries = entries.as_array().ok_or_else(|| {
        KrxError::UpstreamFormat(format!(
            "block '{block}' is {}, not an array",
            kind(entries)
        ))
    })?;

    if entries.is_empty() {
        return Err(KrxError::EmptyResult {
            block: block.to_string(),
        });
    }

    let rows = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::Object(row) => Ok(row.clone()),
            other => Err(KrxError::UpstreamFormat(format!(
                "row {index} of block '{block}' is {}, not an object",
                kind(other)
            ))),
        })
        .collect::<Result<Vec<Row>>>()?;

    Ok(RowSet::new(block, rows))
}

/// Extracts the descriptor's output block and checks every row carries its required fields.
///
/// # Errors
///
/// Same as [`extract`], plus [`KrxError::UpstreamFormat`] naming the first
/// missing field.
pub fn extract_block(payload: &Value, descriptor: &Descriptor) -> Result<RowSet> {
    let rows = extract(payload, descriptor.output())?;

    for (index, row) in rows.rows().iter().enumerate() {
        if let Some(field) = descriptor
            .fields()
            .iter()
            .find(|field| !row.contains_key(**field))
        {
            return Err(KrxError::UpstreamFormat(format!(
                "row {index} of {descriptor} lacks field '{field}'"
            )));
        }
    }

    Ok(rows)
}

/// Extracts the descriptor's output block and decodes every row into `T`.
///
/// # Errors
///
/// Same as [`extract_block`], plus [`KrxError::UpstreamFormat`] for a row
/// that does not decode.
pub fn extract_typed<T: DeserializeOwned>(
    payload: &Value,
    descriptor: &Descriptor,
) -> Result<Vec<T>> {
    extract_block(payload, descriptor)?
        .into_rows()
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(Value::Object(row)).map_err(|err| {
                KrxError::UpstreamFormat(format!("row {index} of {descriptor}: {err}"))
            })
        })
        .collect()
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
