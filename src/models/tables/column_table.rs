//! # ColumnTable
//!
//! In-memory table of [`Column`]s. It is both a [`Source`] (serving field and
//! column transfers) and a [`Sink`] (preferring column transfers), and it
//! converts to and from Minarrow [`Table`]s.
//!
//! As a source, string-reference columns that share one arena expose it as
//! the reference buffer, so a sink built from this table can sit on the same
//! bytes rather than copy them.

use std::sync::OnceLock;

use minarrow::{FieldArray, Table};

use crate::enums::StreamType;
use crate::error::{Result, StreamError};
use crate::models::allocator::allocate_columns;
use crate::models::types::column::{Column, Values};
use crate::models::types::schema::{ColumnType, Schema};
use crate::models::types::string_arena::{RefStrings, StringArena};
use crate::models::types::value::Value;
use crate::traits::sink::Sink;
use crate::traits::source::Source;
use crate::utils::{column_from_array, column_to_array};

/// Columns plus the schema describing them.
#[derive(Debug, Clone)]
pub struct ColumnTable {
    schema: Schema,
    columns: Vec<Column>,
    // Arena shared by every string-reference column; reset whenever the
    // columns are handed out mutably.
    shared: OnceLock<Option<StringArena>>,
}

impl ColumnTable {
    /// Build from a schema and matching columns of equal length.
    ///
    /// The schema's row count is set to the column length.
    pub fn new(mut schema: Schema, columns: Vec<Column>) -> Result<Self> {
        if schema.n_cols() != columns.len() {
            return Err(StreamError::InvalidSchema {
                names: schema.n_cols(),
                types: columns.len(),
            });
        }
        for (ty, column) in schema.types().iter().zip(&columns) {
            let actual = column.column_type();
            if &actual != ty {
                return Err(StreamError::type_mismatch(ty, actual.to_string()));
            }
        }
        let n_rows = check_lengths(&columns)?;
        schema.set_n_rows(Some(n_rows));
        Ok(Self::assemble(schema, columns))
    }

    /// Zero-row table for `schema`.
    pub fn empty(schema: &Schema) -> Self {
        let mut schema = schema.clone();
        schema.set_n_rows(Some(0));
        let columns = allocate_columns(&schema, 0, None);
        Self::assemble(schema, columns)
    }

    /// Read a Minarrow table, mapping each field onto a column type.
    pub fn from_table(table: &Table) -> Result<Self> {
        let fields: Vec<_> = table.cols.iter().map(|c| c.field.as_ref().clone()).collect();
        let schema = Schema::from_fields(&fields, Some(table.n_rows))?;
        let columns = schema
            .types()
            .iter()
            .zip(&table.cols)
            .map(|(ty, col)| column_from_array(ty, col))
            .collect::<Result<Vec<_>>>()?;
        Self::new(schema, columns)
    }

    /// Write the columns out as a Minarrow table named `name`.
    pub fn to_table(&self, name: &str) -> Result<Table> {
        let cols = self
            .schema
            .to_fields()
            .into_iter()
            .zip(&self.columns)
            .map(|(field, column)| Ok(FieldArray::new(field, column_to_array(column)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            cols,
            n_rows: self.n_rows(),
            name: name.to_owned(),
        })
    }

    fn assemble(schema: Schema, columns: Vec<Column>) -> Self {
        Self {
            schema,
            columns,
            shared: OnceLock::new(),
        }
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column `col`, if present.
    pub fn column_at(&self, col: usize) -> Option<&Column> {
        self.columns.get(col)
    }

    /// Materialized value at `(row, col)`.
    pub fn value(&self, row: usize, col: usize) -> Result<Value> {
        let n_cols = self.columns.len();
        self.columns
            .get(col)
            .ok_or(StreamError::OutOfBounds { row: col, len: n_cols })?
            .get(row)
    }

    /// Every row, materialized.
    pub fn rows(&self) -> Result<Vec<Vec<Value>>> {
        (0..self.n_rows())
            .map(|row| self.columns.iter().map(|c| c.get(row)).collect())
            .collect()
    }

    fn string_refs(&self) -> impl Iterator<Item = &RefStrings> {
        self.columns.iter().filter_map(|c| match c {
            Column::Dense(Values::StringRef(r)) => Some(r),
            Column::Nullable { values: Values::StringRef(r), .. } => Some(r),
            _ => None,
        })
    }

    fn shared_arena(&self) -> Option<&StringArena> {
        self.shared
            .get_or_init(|| {
                let mut refs = self.string_refs();
                let first = refs.next()?.arena();
                refs.all(|r| r.arena().id() == first.id()).then(|| first.clone())
            })
            .as_ref()
    }
}

fn check_lengths(columns: &[Column]) -> Result<usize> {
    let expected = columns.first().map_or(0, Column::len);
    for (col, column) in columns.iter().enumerate() {
        if column.len() != expected {
            return Err(StreamError::RaggedColumns {
                col,
                len: column.len(),
                expected,
            });
        }
    }
    Ok(expected)
}

impl Source for ColumnTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn supports(&self, _stream_type: StreamType) -> bool {
        true
    }

    /// String references into the shared reference buffer are handed out
    /// as is; everything else is materialized.
    fn field(&mut self, column_type: &ColumnType, row: usize, col: usize) -> Result<Value> {
        let column = self
            .columns
            .get(col)
            .ok_or(StreamError::OutOfBounds { row: col, len: self.columns.len() })?;
        let actual = column.column_type();
        if &actual != column_type {
            return Err(StreamError::type_mismatch(column_type, actual.to_string()));
        }
        let shared = self.shared_arena().map(StringArena::id);
        let refs = match column {
            Column::Dense(Values::StringRef(r)) => Some(r),
            Column::Nullable { values: Values::StringRef(r), .. } if column.is_valid(row) => Some(r),
            _ => None,
        };
        match refs {
            Some(r) if Some(r.arena().id()) == shared => r
                .refs()
                .get(row)
                .copied()
                .map(Value::StrRef)
                .ok_or(StreamError::OutOfBounds { row, len: r.len() }),
            _ => column.get(row),
        }
    }

    /// The whole column as a single chunk.
    fn column(&mut self, column_type: &ColumnType, col: usize) -> Result<Column> {
        let column = self
            .columns
            .get(col)
            .ok_or(StreamError::OutOfBounds { row: col, len: self.columns.len() })?;
        let actual = column.column_type();
        if &actual != column_type {
            return Err(StreamError::type_mismatch(column_type, actual.to_string()));
        }
        Ok(column.clone())
    }

    fn is_done(&mut self, row: usize, _col: usize) -> Result<bool> {
        Ok(row >= Sink::n_rows(self))
    }

    /// The arena shared by every string-reference column, if there is one.
    fn reference_buffer(&self) -> Option<StringArena> {
        self.shared_arena().cloned()
    }
}

impl Sink for ColumnTable {
    const STREAM_TYPES: &'static [StreamType] = &[StreamType::Column, StreamType::Field];

    fn from_schema(schema: &Schema, rows: usize, shared: Option<&StringArena>) -> Result<Self> {
        let mut schema = schema.clone();
        schema.set_n_rows(Some(rows));
        let columns = allocate_columns(&schema, rows, shared);
        Ok(Self::assemble(schema, columns))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn columns_mut(&mut self) -> &mut [Column] {
        self.shared = OnceLock::new();
        &mut self.columns
    }

    fn set_row_count(&mut self, rows: usize) {
        self.schema.set_n_rows(Some(rows));
    }

    fn finish(&mut self) -> Result<()> {
        check_lengths(&self.columns).map(|_| ())
    }
}

impl TryFrom<&Table> for ColumnTable {
    type Error = StreamError;

    fn try_from(table: &Table) -> Result<Self> {
        Self::from_table(table)
    }
}
