//! Record sources and sinks over a delimited tabular store.
//!
//! The CSV implementations read with no per-field size ceiling (inline
//! images run to several megabytes). Values are handled as raw bytes, so a
//! field that is not valid UTF-8 is written back unchanged. Short rows are
//! padded with empty fields to the header width; long rows keep their extra
//! fields.

use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::iter;
use std::path::Path;
use std::sync::Arc;

use crate::error::{RecordError, SetupError};
use crate::types::{Record, Schema};

/// A forward-only stream of records sharing one schema.
pub trait RecordSource {
    /// Schema captured from the header.
    fn schema(&self) -> &Arc<Schema>;

    /// Next record, or `None` at end of input.
    fn next_record(&mut self) -> Result<Option<Record>, RecordError>;

    /// Append up to `max` records to `batch`. Fewer are appended only at end
    /// of input or on error; records read before an error stay in `batch`.
    fn read_batch(&mut self, max: usize, batch: &mut Vec<Record>) -> Result<(), RecordError> {
        for _ in 0..max {
            match self.next_record()? {
                Some(record) => batch.push(record),
                None => break,
            }
        }
        Ok(())
    }
}

/// Accepts records in order and persists them.
pub trait RecordSink {
    fn write(&mut self, record: &Record) -> Result<(), RecordError>;

    /// Push everything accepted so far to the underlying store.
    fn flush(&mut self) -> Result<(), RecordError>;

    /// Final flush once the stream has ended.
    fn finish(&mut self) -> Result<(), RecordError> {
        self.flush()
    }
}

/// Reads records from CSV with a header row.
pub struct CsvRecordSource<R: Read> {
    reader: csv::Reader<R>,
    schema: Arc<Schema>,
    position: u64,
    row: ByteRecord,
}

impl CsvRecordSource<BufReader<File>> {
    /// Open a CSV file and capture its header.
    pub fn open(path: &Path, image_field: &str) -> Result<Self, SetupError> {
        let file = File::open(path).map_err(|e| SetupError::InputUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(file), image_field).map_err(|e| match e {
            RecordError::MissingHeader => SetupError::MissingHeader(path.to_path_buf()),
            other => SetupError::InputUnreadable {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })
    }
}

impl<R: Read> CsvRecordSource<R> {
    /// Wrap any reader; the first row is taken as the header.
    pub fn from_reader(reader: R, image_field: &str) -> Result<Self, RecordError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers().map_err(|e| RecordError::Read {
            position: 0,
            message: e.to_string(),
        })?;
        if headers.is_empty() {
            return Err(RecordError::MissingHeader);
        }

        let fields: Vec<String> = headers.iter().map(str::to_string).collect();
        let schema = Arc::new(Schema::new(fields, image_field));
        if schema.image_index().is_none() {
            tracing::warn!(
                "Column {:?} not found in header; every row will pass through unchanged",
                image_field
            );
        }

        Ok(Self {
            reader,
            schema,
            position: 0,
            row: ByteRecord::new(),
        })
    }
}

impl<R: Read> RecordSource for CsvRecordSource<R> {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn next_record(&mut self) -> Result<Option<Record>, RecordError> {
        let has_row = self
            .reader
            .read_byte_record(&mut self.row)
            .map_err(|e| RecordError::Read {
                position: self.position + 1,
                message: e.to_string(),
            })?;
        if !has_row {
            return Ok(None);
        }

        self.position += 1;
        let values = self.row.iter().map(<[u8]>::to_vec).collect();
        Ok(Some(Record::new(
            self.position,
            Arc::clone(&self.schema),
            values,
        )))
    }
}

/// Count data rows (excluding the header) without materializing them.
pub fn count_records(path: &Path) -> Result<u64, SetupError> {
    let unreadable = |message: String| SetupError::InputUnreadable {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut row = ByteRecord::new();
    let mut count = 0;
    while reader
        .read_byte_record(&mut row)
        .map_err(|e| unreadable(e.to_string()))?
    {
        count += 1;
    }
    Ok(count)
}

/// Writes records as CSV under the source's header.
pub struct CsvRecordSink<W: Write> {
    writer: csv::Writer<W>,
    width: usize,
    written: u64,
}

impl CsvRecordSink<BufWriter<File>> {
    /// Create (or truncate) a CSV file and write the header.
    pub fn create(path: &Path, schema: &Schema) -> Result<Self, SetupError> {
        let uncreatable = |message: String| SetupError::OutputUncreatable {
            path: path.to_path_buf(),
            message,
        };
        let file = File::create(path).map_err(|e| uncreatable(e.to_string()))?;
        Self::from_writer(BufWriter::new(file), schema).map_err(|e| uncreatable(e.to_string()))
    }
}

impl<W: Write> CsvRecordSink<W> {
    /// Wrap any writer and emit the header immediately.
    pub fn from_writer(writer: W, schema: &Schema) -> Result<Self, RecordError> {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
        writer
            .write_record(schema.fields())
            .map_err(|e| RecordError::Write {
                position: 0,
                message: e.to_string(),
            })?;
        Ok(Self {
            writer,
            width: schema.len(),
            written: 0,
        })
    }

    /// Number of data rows accepted.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, RecordError> {
        let position = self.written;
        self.writer.into_inner().map_err(|e| RecordError::Write {
            position,
            message: e.error().to_string(),
        })
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn write(&mut self, record: &Record) -> Result<(), RecordError> {
        let values = record.values();
        let padding = self.width.saturating_sub(values.len());
        let fields = values
            .iter()
            .map(Vec::as_slice)
            .chain(iter::repeat(&[][..]).take(padding));
        self.writer
            .write_record(fields)
            .map_err(|e| RecordError::Write {
                position: record.position(),
                message: e.to_string(),
            })?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RecordError> {
        self.writer.flush().map_err(|e| RecordError::Write {
            position: self.written,
            message: e.to_string(),
        })
    }
}
