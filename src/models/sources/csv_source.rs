//! # CsvSource
//!
//! Field-mode [`Source`] over delimited text.
//! - Reads lazily from any `BufRead`, one record per row, so the row count is
//!   unknown until the reader is exhausted.
//! - Uses an explicit schema; there is no type inference.
//! - Custom delimiter, quoting and null tokens through [`CsvSourceOptions`].
//! - Quoted fields may span lines and escape quotes by doubling them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::constants::DEFAULT_CSV_NULLS;
use crate::enums::StreamType;
use crate::error::{Result, StreamError};
use crate::models::types::schema::{ColumnType, ElementType, Schema};
use crate::models::types::value::Value;
use crate::traits::source::Source;

/// Options for reading CSV records.
#[derive(Debug, Clone)]
pub struct CsvSourceOptions {
    /// Delimiter (e.g., b',' for CSV, b'\t' for TSV).
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
    /// Tokens read as null in nullable columns.
    pub nulls: Vec<String>,
    /// Whether the first non-blank line is a header to skip.
    pub has_header: bool,
}

impl Default for CsvSourceOptions {
    fn default() -> Self {
        CsvSourceOptions {
            delimiter: b',',
            quote: b'"',
            nulls: DEFAULT_CSV_NULLS.iter().map(|s| s.to_string()).collect(),
            has_header: true,
        }
    }
}

/// Lazily parsed CSV records served one field at a time.
pub struct CsvSource<R: BufRead> {
    reader: R,
    schema: Schema,
    options: CsvSourceOptions,
    header: Option<Vec<String>>,
    record: Vec<String>,
    /// Row index of `record`, when one is loaded.
    loaded: Option<usize>,
    rows_read: usize,
    exhausted: bool,
    line: Vec<u8>,
}

impl CsvSource<BufReader<File>> {
    /// Open a CSV file at the given path.
    pub fn from_path<P: AsRef<Path>>(path: P, schema: Schema, options: CsvSourceOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), schema, options)
    }
}

impl<R: BufRead> CsvSource<R> {
    /// Create from any BufRead. The header, if any, is read immediately and
    /// must have one name per schema column.
    ///
    /// The schema's row count is cleared: it is only known once every record
    /// has been read.
    pub fn from_reader(reader: R, mut schema: Schema, options: CsvSourceOptions) -> Result<Self> {
        schema.set_n_rows(None);
        let mut source = CsvSource {
            reader,
            schema,
            options,
            header: None,
            record: Vec::new(),
            loaded: None,
            rows_read: 0,
            exhausted: false,
            line: Vec::new(),
        };
        if source.options.has_header {
            if let Some(header) = source.read_record()? {
                debug!(columns = header.len(), "csv header read");
                source.header = Some(header);
            }
        }
        Ok(source)
    }

    /// Header names, when the input has a header.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Records read so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Make `row` the loaded record, reading the next one if needed.
    /// Returns `false` at end of input.
    fn load(&mut self, row: usize) -> Result<bool> {
        if self.loaded == Some(row) {
            return Ok(true);
        }
        if row != self.rows_read {
            return Err(StreamError::InputData(format!(
                "csv rows are read in order: requested row {} after {} rows",
                row, self.rows_read
            )));
        }
        if self.exhausted {
            return Ok(false);
        }
        match self.read_record()? {
            Some(record) => {
                self.record = record;
                self.loaded = Some(row);
                self.rows_read += 1;
                Ok(true)
            }
            None => {
                self.exhausted = true;
                self.loaded = None;
                Ok(false)
            }
        }
    }

    /// Next non-blank record, split into fields and checked against the
    /// schema width.
    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        let quote = self.options.quote;
        loop {
            self.line.clear();
            let n = self.reader.read_until(b'\n', &mut self.line)?;
            if n == 0 {
                return Ok(None);
            }
            let mut open = self.line.iter().filter(|&&b| b == quote).count() % 2 == 1;
            while open {
                let start = self.line.len();
                let m = self.reader.read_until(b'\n', &mut self.line)?;
                if m == 0 {
                    warn!("csv input ended inside a quoted field");
                    break;
                }
                open ^= self.line[start..].iter().filter(|&&b| b == quote).count() % 2 == 1;
            }

            let mut end = self.line.len();
            if self.line[..end].ends_with(b"\n") {
                end -= 1;
            }
            if self.line[..end].ends_with(b"\r") {
                end -= 1;
            }
            if end == 0 {
                continue;
            }

            let fields = parse_csv_line(&self.line[..end], self.options.delimiter, quote)?;
            if fields.len() != self.schema.n_cols() {
                return Err(StreamError::InputData(format!(
                    "record {} has {} fields, expected {}",
                    self.rows_read,
                    fields.len(),
                    self.schema.n_cols()
                )));
            }
            return Ok(Some(fields));
        }
    }

    fn is_null_token(&self, text: &str) -> bool {
        self.options.nulls.iter().any(|n| n == text)
    }
}

/// Split one record into fields, honouring quotes and doubled-quote escapes.
fn parse_csv_line(line: &[u8], delimiter: u8, quote: u8) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = Vec::with_capacity(32);
    let mut in_quotes = false;
    let mut i = 0;
    while i < line.len() {
        let b = line[i];
        if in_quotes {
            if b == quote {
                if i + 1 < line.len() && line[i + 1] == quote {
                    field.push(quote);
                    i += 1;
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(b);
            }
        } else if b == quote {
            in_quotes = true;
        } else if b == delimiter {
            fields.push(utf8_field(&field)?);
            field.clear();
        } else {
            field.push(b);
        }
        i += 1;
    }
    fields.push(utf8_field(&field)?);
    Ok(fields)
}

fn utf8_field(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| StreamError::InputData(format!("invalid UTF-8 in csv field: {}", e)))
}

fn parse_number<T: FromStr>(text: &str, element: ElementType) -> Result<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| StreamError::InputData(format!("cannot parse '{}' as {}", text, element)))
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim() {
        "true" | "True" | "TRUE" | "t" | "T" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "f" | "F" | "0" => Ok(false),
        other => Err(StreamError::InputData(format!("cannot parse '{}' as bool", other))),
    }
}

impl<R: BufRead> Source for CsvSource<R> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn supports(&self, stream_type: StreamType) -> bool {
        stream_type == StreamType::Field
    }

    /// Parse field `col` of record `row` as `column_type`.
    ///
    /// Null tokens become `Null` in nullable columns. In non-nullable string
    /// columns they are kept as text; in other non-nullable columns they are
    /// returned as `Null` and rejected by the destination.
    fn field(&mut self, column_type: &ColumnType, row: usize, col: usize) -> Result<Value> {
        if !self.load(row)? {
            return Err(StreamError::OutOfBounds {
                row,
                len: self.rows_read,
            });
        }
        let text = self
            .record
            .get(col)
            .ok_or(StreamError::OutOfBounds { row: col, len: self.record.len() })?;
        let element = column_type.element();
        let is_string = matches!(element, ElementType::Utf8 | ElementType::StringRef);
        if self.is_null_token(text) && (column_type.is_nullable() || !is_string) {
            return Ok(Value::Null);
        }
        Ok(match element {
            ElementType::Boolean => Value::Boolean(parse_bool(text)?),
            ElementType::Int32 => Value::Int32(parse_number(text, element)?),
            ElementType::Int64 => Value::Int64(parse_number(text, element)?),
            ElementType::UInt32 => Value::UInt32(parse_number(text, element)?),
            ElementType::UInt64 => Value::UInt64(parse_number(text, element)?),
            ElementType::Float32 => Value::Float32(parse_number(text, element)?),
            ElementType::Float64 => Value::Float64(parse_number(text, element)?),
            ElementType::Utf8 | ElementType::StringRef => Value::Utf8(text.clone()),
        })
    }

    fn is_done(&mut self, row: usize, _col: usize) -> Result<bool> {
        Ok(!self.load(row)?)
    }

    fn set_row_count(&mut self, rows: usize) {
        self.schema.set_n_rows(Some(rows));
    }
}
