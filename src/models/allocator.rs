//! # Allocator
//!
//! Type-directed construction of destination column storage. The declared
//! column type alone decides the storage variant; `rows` pre-sizes it and
//! `shared` lets string-reference columns sit on an existing arena instead
//! of copying it.

use crate::enums::ColumnKind;
use crate::models::types::column::{Column, Dictionary, Values};
use crate::models::types::schema::{ColumnType, Schema};
use crate::models::types::string_arena::StringArena;

/// Allocate storage for one column.
///
/// `rows == 0` yields empty storage that grows by appends. Pre-sized slots
/// hold the element default and, for nullable kinds, are null until written.
pub fn allocate(column_type: &ColumnType, rows: usize, shared: Option<&StringArena>) -> Column {
    match column_type.kind() {
        ColumnKind::Primitive => {
            Column::Dense(Values::with_len(column_type.element(), rows, shared))
        }
        ColumnKind::Nullable => Column::Nullable {
            values: Values::with_len(column_type.element(), rows, shared),
            validity: minarrow::vec64![false; rows],
        },
        ColumnKind::Dictionary => Column::Categorical(Dictionary::with_len(rows)),
        ColumnKind::NullableDictionary => Column::NullableCategorical(Dictionary::with_len(rows)),
    }
}

/// Allocate one column per schema entry.
pub fn allocate_columns(schema: &Schema, rows: usize, shared: Option<&StringArena>) -> Vec<Column> {
    schema
        .types()
        .iter()
        .map(|ty| allocate(ty, rows, shared))
        .collect()
}
