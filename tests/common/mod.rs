#![allow(dead_code)]

use std::collections::VecDeque;

use tablestream::{
    Column, ColumnTable, ColumnType, ElementType, Result, Schema, Sink, Source, StreamType,
    StringArena, Value, Values,
};

/// Two-column table: `id: i64`, `name: nullable<strref>`.
pub fn people(ids: &[i64], names: &[Option<&str>]) -> ColumnTable {
    let schema = Schema::new(
        ["id", "name"],
        vec![
            ColumnType::Primitive(ElementType::Int64),
            ColumnType::Nullable(ElementType::StringRef),
        ],
        None,
    )
    .unwrap();
    let id_col = Column::from_values(&schema.types()[0], ids.iter().copied()).unwrap();
    let name_col = Column::from_values(&schema.types()[1], names.iter().copied()).unwrap();
    ColumnTable::new(schema, vec![id_col, name_col]).unwrap()
}

/// Bytes held by the arena behind the `name` column of a [`people`] table.
pub fn name_arena_len(table: &ColumnTable) -> usize {
    match table.column_at(1).unwrap() {
        Column::Nullable { values: Values::StringRef(refs), .. } => refs.arena().len(),
        other => panic!("unexpected storage {:?}", other),
    }
}

/// Restricts a source to field-mode transfers.
pub struct FieldOnly<S>(pub S);

impl<S: Source> Source for FieldOnly<S> {
    fn schema(&self) -> &Schema {
        self.0.schema()
    }

    fn supports(&self, stream_type: StreamType) -> bool {
        stream_type == StreamType::Field
    }

    fn field(&mut self, column_type: &ColumnType, row: usize, col: usize) -> Result<Value> {
        self.0.field(column_type, row, col)
    }

    fn is_done(&mut self, row: usize, col: usize) -> Result<bool> {
        self.0.is_done(row, col)
    }

    fn reference_buffer(&self) -> Option<StringArena> {
        self.0.reference_buffer()
    }

    fn set_row_count(&mut self, rows: usize) {
        self.0.set_row_count(rows)
    }
}

/// Field-only source of unknown length producing `n` generated rows of
/// `(i64, nullable<utf8>)`.
pub struct Counter {
    schema: Schema,
    n: usize,
    pub corrected: Option<usize>,
}

impl Counter {
    pub fn new(n: usize) -> Self {
        Counter {
            schema: counter_schema(),
            n,
            corrected: None,
        }
    }

    pub fn expected(row: usize) -> Vec<Value> {
        let label = if row % 2 == 0 {
            Value::Utf8(format!("r{}", row))
        } else {
            Value::Null
        };
        vec![Value::Int64(row as i64 * 10), label]
    }
}

pub fn counter_schema() -> Schema {
    Schema::new(
        ["n", "label"],
        vec![
            ColumnType::Primitive(ElementType::Int64),
            ColumnType::Nullable(ElementType::Utf8),
        ],
        None,
    )
    .unwrap()
}

impl Source for Counter {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn supports(&self, stream_type: StreamType) -> bool {
        stream_type == StreamType::Field
    }

    fn field(&mut self, _column_type: &ColumnType, row: usize, col: usize) -> Result<Value> {
        Ok(Self::expected(row).swap_remove(col))
    }

    fn is_done(&mut self, row: usize, _col: usize) -> Result<bool> {
        Ok(row >= self.n)
    }

    fn set_row_count(&mut self, rows: usize) {
        self.corrected = Some(rows);
        self.schema.set_n_rows(Some(rows));
    }
}

/// Column-only source replaying prepared sweeps of chunks.
pub struct Chunks {
    schema: Schema,
    sweeps: VecDeque<Vec<Column>>,
}

impl Chunks {
    pub fn new(schema: Schema, sweeps: Vec<Vec<Column>>) -> Self {
        Chunks {
            schema,
            sweeps: sweeps.into(),
        }
    }
}

impl Source for Chunks {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn supports(&self, stream_type: StreamType) -> bool {
        stream_type == StreamType::Column
    }

    fn column(&mut self, _column_type: &ColumnType, col: usize) -> Result<Column> {
        let sweep = self.sweeps.front().expect("column requested after last sweep");
        let chunk = sweep[col].clone();
        if col + 1 == sweep.len() {
            self.sweeps.pop_front();
        }
        Ok(chunk)
    }

    fn is_done(&mut self, _row: usize, _col: usize) -> Result<bool> {
        Ok(self.sweeps.is_empty())
    }
}

/// Sink accepting field-mode transfers only.
pub struct FieldSink {
    schema: Schema,
    columns: Vec<Column>,
    pub recorded: Option<usize>,
}

impl Sink for FieldSink {
    const STREAM_TYPES: &'static [StreamType] = &[StreamType::Field];

    fn from_schema(schema: &Schema, rows: usize, shared: Option<&StringArena>) -> Result<Self> {
        Ok(FieldSink {
            schema: schema.clone(),
            columns: tablestream::models::allocator::allocate_columns(schema, rows, shared),
            recorded: None,
        })
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    fn set_row_count(&mut self, rows: usize) {
        self.recorded = Some(rows);
    }
}
