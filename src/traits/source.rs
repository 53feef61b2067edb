use crate::enums::StreamType;
use crate::error::{Result, StreamError};
use crate::models::types::column::Column;
use crate::models::types::schema::{ColumnType, Schema};
use crate::models::types::string_arena::StringArena;
use crate::models::types::value::Value;

/// A producer of tabular data.
///
/// Implementors declare which stream types they serve through
/// [`supports`](Source::supports) (none by default) and implement the
/// matching accessor: [`field`](Source::field) for `Field`,
/// [`column`](Source::column) for `Column`. Positions are 0-based.
///
/// A source is read, never written, by a transfer. The one exception is
/// [`set_row_count`](Source::set_row_count), called once after a transfer
/// so a source that did not know its length up front can record it.
pub trait Source {
    /// Schema consistent with the data the source will yield.
    /// `n_rows()` is `None` when the length is discovered while streaming.
    fn schema(&self) -> &Schema;

    /// Whether the source serves `stream_type`.
    fn supports(&self, _stream_type: StreamType) -> bool {
        false
    }

    /// The value at `(row, col)`. Required when `Field` is supported.
    fn field(&mut self, _column_type: &ColumnType, _row: usize, _col: usize) -> Result<Value> {
        Err(StreamError::UnsupportedStreamingMode {
            preferred: vec![StreamType::Field],
        })
    }

    /// The next chunk of column `col`. Required when `Column` is supported.
    ///
    /// A column-mode transfer requests every column once per sweep, in
    /// order, and all chunks of a sweep must have the same length.
    fn column(&mut self, _column_type: &ColumnType, _col: usize) -> Result<Column> {
        Err(StreamError::UnsupportedStreamingMode {
            preferred: vec![StreamType::Column],
        })
    }

    /// Whether no data exists at or after `(row, col)`. Consulted as the
    /// loop termination check of every transfer.
    fn is_done(&mut self, row: usize, col: usize) -> Result<bool>;

    /// Arena backing the string references this source hands out, if any.
    fn reference_buffer(&self) -> Option<StringArena> {
        None
    }

    /// Records the row count established by a completed transfer.
    fn set_row_count(&mut self, _rows: usize) {}
}
