//! Ingestion adapter: reads a batch of raw rows from a byte source.
//!
//! The adapter only confirms the payload is a JSON array of flat objects.
//! Field semantics are the coercion step's business (see raw.rs).
//! No retries: a failed load is terminal for that attempt.

use crate::{
    config::IngestionConfig,
    error::{DeskError, DeskResult},
    raw::{RawRow, SourceRow},
};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Anything that can produce a complete, immutable snapshot of raw rows.
pub trait RowSource {
    /// Human-readable name used in errors and logs.
    fn name(&self) -> String;

    fn load(&self) -> DeskResult<Vec<RawRow>>;
}

/// Rows stored as a JSON file on disk (the static dataset).
pub struct JsonFileSource {
    path: PathBuf,
    config: IngestionConfig,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, config: IngestionConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

impl RowSource for JsonFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> DeskResult<Vec<RawRow>> {
        let bytes = std::fs::read(&self.path).map_err(|e| DeskError::SourceUnavailable {
            source_name: self.name(),
            reason: e.to_string(),
        })?;
        parse_rows(&self.name(), &bytes, &self.config)
    }
}

/// Rows already held in memory, e.g. a fetched response body or a generated payload.
pub struct JsonSliceSource {
    label: String,
    bytes: Vec<u8>,
    config: IngestionConfig,
}

impl JsonSliceSource {
    pub fn new(label: impl Into<String>, bytes: impl Into<Vec<u8>>, config: IngestionConfig) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
            config,
        }
    }

    pub fn from_value(
        label: impl Into<String>,
        payload: &serde_json::Value,
        config: IngestionConfig,
    ) -> DeskResult<Self> {
        Ok(Self::new(label, serde_json::to_vec(payload)?, config))
    }
}

impl RowSource for JsonSliceSource {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn load(&self) -> DeskResult<Vec<RawRow>> {
        parse_rows(&self.label, &self.bytes, &self.config)
    }
}

/// Parse a JSON array of row objects into typed rows.
pub fn parse_rows(
    source_name: &str,
    bytes: &[u8],
    config: &IngestionConfig,
) -> DeskResult<Vec<RawRow>> {
    // Objects stay untyped here so one odd row cannot fail the whole batch.
    let objects: Vec<Map<String, Value>> =
        serde_json::from_slice(bytes).map_err(|e| DeskError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: format!("payload is not an array of row objects: {e}"),
        })?;

    let rows: Vec<RawRow> = objects
        .iter()
        .enumerate()
        .map(|(i, obj)| RawRow::from_source(i, &SourceRow::from_object(obj), config))
        .collect();

    let degraded = rows.iter().filter(|r| !r.coercion_failures.is_empty()).count();
    for row in rows.iter().filter(|r| !r.coercion_failures.is_empty()) {
        log::debug!(
            "ingest: row {} coerced to defaults for {:?}",
            row.row_index,
            row.coercion_failures
        );
    }
    log::info!(
        "ingest: loaded {} rows from {source_name} ({degraded} with coercion failures)",
        rows.len()
    );
    Ok(rows)
}
