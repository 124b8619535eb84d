//! Table codecs: convert between an in-memory `Table` and its on-disk
//! bytes, losslessly for all declared column types.
//!
//! Decode is forgiving by contract: missing columns fill with null, unknown
//! columns are dropped, malformed numeric cells become null, and empty
//! input yields an empty table. Only genuinely unreadable input fails.

use serde_json::Value as Json;

use crate::error::{StoreError, StoreResult};
use crate::table::{Record, Table, TableSpec, Value};

pub trait TableCodec: Send + Sync {
    fn decode(&self, bytes: &[u8], spec: &'static TableSpec) -> StoreResult<Table>;
    fn encode(&self, table: &Table) -> StoreResult<Vec<u8>>;
    /// File extension for this codec's backing files.
    fn extension(&self) -> &'static str;
}

/// Default backend: UTF-8 text, one header row of declared column names
/// followed by one row per record. Fields containing the separator, quotes,
/// or newlines are quoted per RFC 4180, so free text round-trips intact.
pub struct TabularCodec;

impl TableCodec for TabularCodec {
    fn decode(&self, bytes: &[u8], spec: &'static TableSpec) -> StoreResult<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| StoreError::Codec(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        // Source position of each declared column; None fills with null.
        let positions: Vec<Option<usize>> = spec
            .columns
            .iter()
            .map(|col| headers.iter().position(|h| h == col))
            .collect();

        let mut table = Table::empty(spec);
        for row in reader.records() {
            let row = row.map_err(|e| StoreError::Codec(e.to_string()))?;
            let mut record = Record::new();
            for (col, position) in spec.columns.iter().zip(&positions) {
                let cell = position.and_then(|i| row.get(i)).unwrap_or("");
                record.set(*col, Value::from_cell(cell, spec.is_int(col)));
            }
            table.push(record);
        }
        Ok(table)
    }

    fn encode(&self, table: &Table) -> StoreResult<Vec<u8>> {
        let spec = table.spec();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(spec.columns)
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        for record in table.rows() {
            writer
                .write_record(spec.columns.iter().map(|col| record.get(col).to_string()))
                .map_err(|e| StoreError::Codec(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}

/// Alternate backend: a JSON array of one object per record. Null fields
/// are omitted on encode and read back as null.
pub struct JsonCodec;

impl TableCodec for JsonCodec {
    fn decode(&self, bytes: &[u8], spec: &'static TableSpec) -> StoreResult<Table> {
        let mut table = Table::empty(spec);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(table);
        }

        let documents: Vec<serde_json::Map<String, Json>> =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Codec(e.to_string()))?;

        for document in documents {
            let mut record = Record::new();
            for col in spec.columns {
                let value = match document.get(*col) {
                    None | Some(Json::Null) => Value::Null,
                    Some(Json::Number(n)) if spec.is_int(col) => {
                        n.as_i64().map(Value::Int).unwrap_or(Value::Null)
                    }
                    Some(Json::Number(n)) => Value::from_cell(&n.to_string(), false),
                    Some(Json::String(s)) => Value::from_cell(s, spec.is_int(col)),
                    Some(_) => Value::Null,
                };
                record.set(*col, value);
            }
            table.push(record);
        }
        Ok(table)
    }

    fn encode(&self, table: &Table) -> StoreResult<Vec<u8>> {
        let spec = table.spec();
        let documents: Vec<serde_json::Map<String, Json>> = table
            .rows()
            .iter()
            .map(|record| {
                let mut document = serde_json::Map::new();
                for col in spec.columns {
                    match record.get(col) {
                        Value::Null => {}
                        Value::Int(n) => {
                            document.insert(col.to_string(), Json::from(*n));
                        }
                        Value::Str(s) => {
                            document.insert(col.to_string(), Json::from(s.clone()));
                        }
                    }
                }
                document
            })
            .collect();

        serde_json::to_vec_pretty(&documents).map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
