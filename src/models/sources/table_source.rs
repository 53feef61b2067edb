//! # TableSource
//!
//! Column-mode [`Source`] over a sequence of Minarrow [`Table`] batches.
//! Each sweep of a column transfer hands out one batch, converted column by
//! column; string columns arrive with their own arenas, so appending a batch
//! re-bases the destination's references.

use minarrow::{Field, Table};
use tracing::trace;

use crate::enums::StreamType;
use crate::error::{Result, StreamError};
use crate::models::types::column::Column;
use crate::models::types::schema::{ColumnType, Schema};
use crate::traits::source::Source;
use crate::utils::column_from_array;

/// Batches of Minarrow tables served as column chunks.
pub struct TableSource {
    schema: Schema,
    batches: Vec<Table>,
    cursor: usize,
}

impl TableSource {
    /// Source over `batches`, with the schema taken from the first batch.
    pub fn new(batches: Vec<Table>) -> Result<Self> {
        let first = batches
            .first()
            .ok_or_else(|| StreamError::InputData("no batches to derive a schema from".into()))?;
        let fields: Vec<Field> = first.cols.iter().map(|c| c.field.as_ref().clone()).collect();
        let schema = Schema::from_fields(&fields, None)?;
        Self::with_schema(schema, batches)
    }

    /// Source over `batches` read as `schema`.
    ///
    /// Every batch must have one column per schema entry. Empty batches are
    /// skipped; the schema's row count becomes the total across batches.
    pub fn with_schema(mut schema: Schema, batches: Vec<Table>) -> Result<Self> {
        let mut total = 0;
        let mut kept = Vec::with_capacity(batches.len());
        for (i, batch) in batches.into_iter().enumerate() {
            if batch.cols.len() != schema.n_cols() {
                return Err(StreamError::InputData(format!(
                    "batch {} has {} columns, schema has {}",
                    i,
                    batch.cols.len(),
                    schema.n_cols()
                )));
            }
            if batch.n_rows == 0 {
                continue;
            }
            total += batch.n_rows;
            kept.push(batch);
        }
        schema.set_n_rows(Some(total));
        Ok(Self {
            schema,
            batches: kept,
            cursor: 0,
        })
    }

    /// Batches not yet handed out.
    pub fn remaining(&self) -> usize {
        self.batches.len() - self.cursor
    }
}

impl Source for TableSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn supports(&self, stream_type: StreamType) -> bool {
        stream_type == StreamType::Column
    }

    fn column(&mut self, column_type: &ColumnType, col: usize) -> Result<Column> {
        let batch = self.batches.get(self.cursor).ok_or(StreamError::OutOfBounds {
            row: self.cursor,
            len: self.batches.len(),
        })?;
        let array = batch.cols.get(col).ok_or(StreamError::OutOfBounds {
            row: col,
            len: batch.cols.len(),
        })?;
        let column = column_from_array(column_type, array)?;
        if col + 1 == self.schema.n_cols() {
            trace!(batch = self.cursor, rows = batch.n_rows, "table batch served");
            self.cursor += 1;
        }
        Ok(column)
    }

    fn is_done(&mut self, _row: usize, _col: usize) -> Result<bool> {
        Ok(self.cursor >= self.batches.len())
    }
}
