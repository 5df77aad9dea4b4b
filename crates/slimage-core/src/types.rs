//! Core data types for the slimage pipeline.
//!
//! A [`Record`] is one row of the tabular store: an ordered list of raw
//! field values sharing a [`Schema`] captured once from the header. Only the image
//! field is ever rewritten.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest value shown per field when labelling a record in diagnostics.
const LABEL_VALUE_CHARS: usize = 24;

/// Field layout of a record stream, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
    image_index: Option<usize>,
}

impl Schema {
    /// Build a schema from header names, resolving the image field by exact name.
    pub fn new(fields: Vec<String>, image_field: &str) -> Self {
        let image_index = fields.iter().position(|f| f == image_field);
        Self {
            fields,
            image_index,
        }
    }

    /// Header names in input order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Column index of the image field, if the header names it.
    pub fn image_index(&self) -> Option<usize> {
        self.image_index
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One row of the record stream.
///
/// Values are kept as raw bytes so fields that are not valid UTF-8 still pass
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    position: u64,
    schema: Arc<Schema>,
    values: Vec<Vec<u8>>,
}

impl Record {
    /// Create a record. `position` is the 1-based data row number.
    pub fn new(position: u64, schema: Arc<Schema>, values: Vec<Vec<u8>>) -> Self {
        Self {
            position,
            schema,
            values,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Values in field order, as read. May be shorter or longer than the
    /// schema for ragged rows.
    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// Look up a value by field name.
    pub fn get(&self, field: &str) -> Option<&[u8]> {
        let index = self.schema.fields().iter().position(|f| f == field)?;
        self.values.get(index).map(Vec::as_slice)
    }

    /// The inline image payload, or `None` when the field is absent or empty.
    pub fn image_payload(&self) -> Option<&[u8]> {
        let index = self.schema.image_index()?;
        self.values
            .get(index)
            .map(Vec::as_slice)
            .filter(|v| !v.is_empty())
    }

    /// Replace the image payload. Returns `false` if the record has no image field.
    pub fn set_image_payload(&mut self, payload: String) -> bool {
        match self
            .schema
            .image_index()
            .and_then(|i| self.values.get_mut(i))
        {
            Some(slot) => {
                *slot = payload.into_bytes();
                true
            }
            None => false,
        }
    }

    /// Human-readable identification: row number plus the non-image fields.
    pub fn label(&self) -> String {
        let image_index = self.schema.image_index();
        let fields: Vec<String> = self
            .schema
            .fields()
            .iter()
            .zip(&self.values)
            .enumerate()
            .filter(|(i, _)| Some(*i) != image_index)
            .map(|(_, (name, value))| format!("{}={}", name, truncate(value)))
            .collect();

        if fields.is_empty() {
            format!("row {}", self.position)
        } else {
            format!("row {} ({})", self.position, fields.join(", "))
        }
    }
}

fn truncate(value: &[u8]) -> String {
    let value = String::from_utf8_lossy(value);
    if value.chars().count() <= LABEL_VALUE_CHARS {
        value.into_owned()
    } else {
        let head: String = value.chars().take(LABEL_VALUE_CHARS).collect();
        format!("{head}...")
    }
}

/// Size and dimension bookkeeping for one successful transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeStats {
    /// Size of the source encoding in bytes
    pub original_size: u64,

    /// Size of the re-encoded image in bytes
    pub new_size: u64,

    /// Source dimensions (width, height)
    pub source_dimensions: (u32, u32),

    /// Output dimensions (width, height)
    pub output_dimensions: (u32, u32),
}

/// A re-encoded image and its bookkeeping.
#[derive(Debug, Clone)]
pub struct TranscodedImage {
    /// JPEG bytes
    pub bytes: Vec<u8>,

    pub stats: TranscodeStats,
}

/// What happened to one record or file.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Image replaced by its transcoded version
    Transcoded(TranscodeStats),

    /// Transcode failed; the original payload was kept
    Failed { reason: String },

    /// No image payload; written through untouched
    PassedThrough,

    /// Output already present; nothing done
    Skipped,
}
