//! # Stream Errors
//!
//! Unified error type for every stage of a transfer: schema construction,
//! stream type negotiation, storage writes and the reference adapters.
//!
//! All errors are terminal for the transfer that raised them. Nothing is
//! retried, and a sink that was being written when the error surfaced is left
//! in whatever state the failed step produced.

use std::io;

use thiserror::Error;

use crate::enums::StreamType;
use crate::models::types::schema::{ColumnType, ElementType, Schema};

/// Unified error type for all streaming operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Column names and column types disagree in length.
    #[error("Invalid schema: {names} column names but {types} column types")]
    InvalidSchema { names: usize, types: usize },

    /// No stream type is supported by both the source and the sink.
    #[error("Unsupported streaming mode: source supports none of the sink's stream types {preferred:?}")]
    UnsupportedStreamingMode { preferred: Vec<StreamType> },

    /// Source and sink column types differ.
    #[error(
        "Schema mismatch: source types {:?} do not match sink types {:?}",
        .source_schema.types(),
        .sink_schema.types()
    )]
    SchemaMismatch {
        source_schema: Box<Schema>,
        sink_schema: Box<Schema>,
    },

    /// A value or column of the wrong type was handed to a column.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: ColumnType, actual: String },

    /// A null reached a column whose type does not admit nulls.
    #[error("Null written to non-nullable column of type {0}")]
    NullInNonNullable(ColumnType),

    /// A row index past the end of a column.
    #[error("Row {row} out of bounds for column of length {len}")]
    OutOfBounds { row: usize, len: usize },

    /// The sink was not sized to receive a known-length field transfer.
    #[error("Sink holds {actual} rows but the field transfer requires {required}")]
    SinkNotSized { required: usize, actual: usize },

    /// Columns of one column-mode sweep have differing lengths.
    #[error("Column {col} yielded {len} rows but column 0 yielded {expected}")]
    RaggedColumns { col: usize, len: usize, expected: usize },

    /// A column-mode sweep produced no rows although the source is not done.
    #[error("Source produced no rows at row {row} without signalling end of data")]
    StalledSource { row: usize },

    /// A string reference points into an arena the receiver cannot resolve.
    #[error("String reference into arena {arena} cannot be resolved")]
    StaleReference { arena: u64 },

    /// An external type has no counterpart in the column type system.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Malformed input data (parse failure, invalid UTF-8, bad record width).
    #[error("Data error: {0}")]
    InputData(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StreamError {
    pub(crate) fn type_mismatch(expected: &ColumnType, actual: impl Into<String>) -> Self {
        StreamError::TypeMismatch {
            expected: expected.clone(),
            actual: actual.into(),
        }
    }

    pub(crate) fn element_mismatch(expected: ElementType, actual: impl Into<String>) -> Self {
        Self::type_mismatch(&ColumnType::Primitive(expected), actual)
    }
}

/// Result type for streaming operations.
pub type Result<T> = std::result::Result<T, StreamError>;
