//! # Column Storage
//!
//! Destination storage for one column. There is exactly one storage variant
//! per [`ColumnKind`](crate::enums::ColumnKind):
//!
//! | declared type          | storage                                   |
//! |------------------------|-------------------------------------------|
//! | `T`                    | [`Column::Dense`]: values only            |
//! | `Nullable<T>`          | [`Column::Nullable`]: values + validity   |
//! | `Categorical`          | [`Column::Categorical`]: codes into pool  |
//! | `Nullable<Categorical>`| [`Column::NullableCategorical`]: code `0` is null |
//!
//! Fixed-width values live in 64-byte aligned `Vec64` buffers, strings either
//! as owned `String`s or as references into a [`StringArena`].

use std::collections::HashMap;

use minarrow::{vec64, Vec64};

use crate::constants::NULL_CODE;
use crate::error::{Result, StreamError};
use crate::models::types::schema::{ColumnType, ElementType};
use crate::models::types::string_arena::{RefStrings, StrRef, StringArena};
use crate::models::types::value::Value;

/// Dense typed values of one element type.
#[derive(Debug, Clone)]
pub enum Values {
    Boolean(Vec64<bool>),
    Int32(Vec64<i32>),
    Int64(Vec64<i64>),
    UInt32(Vec64<u32>),
    UInt64(Vec64<u64>),
    Float32(Vec64<f32>),
    Float64(Vec64<f64>),
    Utf8(Vec<String>),
    StringRef(RefStrings),
}

impl Values {
    /// `rows` default-valued slots. String-reference storage is laid over
    /// `shared` when given.
    pub fn with_len(element: ElementType, rows: usize, shared: Option<&StringArena>) -> Self {
        match element {
            ElementType::Boolean => Values::Boolean(vec64![false; rows]),
            ElementType::Int32 => Values::Int32(vec64![0i32; rows]),
            ElementType::Int64 => Values::Int64(vec64![0i64; rows]),
            ElementType::UInt32 => Values::UInt32(vec64![0u32; rows]),
            ElementType::UInt64 => Values::UInt64(vec64![0u64; rows]),
            ElementType::Float32 => Values::Float32(vec64![0f32; rows]),
            ElementType::Float64 => Values::Float64(vec64![0f64; rows]),
            ElementType::Utf8 => Values::Utf8(vec![String::new(); rows]),
            ElementType::StringRef => {
                Values::StringRef(RefStrings::with_len(rows, shared.cloned().unwrap_or_default()))
            }
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Values::Boolean(_) => ElementType::Boolean,
            Values::Int32(_) => ElementType::Int32,
            Values::Int64(_) => ElementType::Int64,
            Values::UInt32(_) => ElementType::UInt32,
            Values::UInt64(_) => ElementType::UInt64,
            Values::Float32(_) => ElementType::Float32,
            Values::Float64(_) => ElementType::Float64,
            Values::Utf8(_) => ElementType::Utf8,
            Values::StringRef(_) => ElementType::StringRef,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Boolean(v) => v.0.len(),
            Values::Int32(v) => v.0.len(),
            Values::Int64(v) => v.0.len(),
            Values::UInt32(v) => v.0.len(),
            Values::UInt64(v) => v.0.len(),
            Values::Float32(v) => v.0.len(),
            Values::Float64(v) => v.0.len(),
            Values::Utf8(v) => v.len(),
            Values::StringRef(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            Values::Boolean(v) => v.0.clear(),
            Values::Int32(v) => v.0.clear(),
            Values::Int64(v) => v.0.clear(),
            Values::UInt32(v) => v.0.clear(),
            Values::UInt64(v) => v.0.clear(),
            Values::Float32(v) => v.0.clear(),
            Values::Float64(v) => v.0.clear(),
            Values::Utf8(v) => v.clear(),
            Values::StringRef(v) => v.clear(),
        }
    }

    /// Truncate, or extend with default-valued slots.
    pub fn resize(&mut self, rows: usize) {
        match self {
            Values::Boolean(v) => v.0.resize(rows, false),
            Values::Int32(v) => v.0.resize(rows, 0),
            Values::Int64(v) => v.0.resize(rows, 0),
            Values::UInt32(v) => v.0.resize(rows, 0),
            Values::UInt64(v) => v.0.resize(rows, 0),
            Values::Float32(v) => v.0.resize(rows, 0.0),
            Values::Float64(v) => v.0.resize(rows, 0.0),
            Values::Utf8(v) => v.resize(rows, String::new()),
            Values::StringRef(v) => v.resize(rows),
        }
    }

    /// Materialize row `row`. String references are returned as owned text.
    pub fn get(&self, row: usize) -> Option<Value> {
        match self {
            Values::Boolean(v) => v.0.get(row).copied().map(Value::Boolean),
            Values::Int32(v) => v.0.get(row).copied().map(Value::Int32),
            Values::Int64(v) => v.0.get(row).copied().map(Value::Int64),
            Values::UInt32(v) => v.0.get(row).copied().map(Value::UInt32),
            Values::UInt64(v) => v.0.get(row).copied().map(Value::UInt64),
            Values::Float32(v) => v.0.get(row).copied().map(Value::Float32),
            Values::Float64(v) => v.0.get(row).copied().map(Value::Float64),
            Values::Utf8(v) => v.get(row).cloned().map(Value::Utf8),
            Values::StringRef(v) => v.get(row).map(|s| Value::Utf8(s.to_string())),
        }
    }

    /// As [`get`](Self::get), with the reason a slot cannot be read.
    pub fn try_get(&self, row: usize) -> Result<Value> {
        match self {
            Values::StringRef(v) => v.try_get(row).map(|s| Value::Utf8(s.to_string())),
            other => other.get(row).ok_or(StreamError::OutOfBounds {
                row,
                len: other.len(),
            }),
        }
    }

    /// Overwrite slot `row`.
    pub fn set(&mut self, row: usize, value: Value, reference: Option<&StringArena>) -> Result<()> {
        let len = self.len();
        if row >= len {
            return Err(StreamError::OutOfBounds { row, len });
        }
        match (self, value) {
            (Values::Boolean(v), Value::Boolean(x)) => v.0[row] = x,
            (Values::Int32(v), Value::Int32(x)) => v.0[row] = x,
            (Values::Int64(v), Value::Int64(x)) => v.0[row] = x,
            (Values::UInt32(v), Value::UInt32(x)) => v.0[row] = x,
            (Values::UInt64(v), Value::UInt64(x)) => v.0[row] = x,
            (Values::Float32(v), Value::Float32(x)) => v.0[row] = x,
            (Values::Float64(v), Value::Float64(x)) => v.0[row] = x,
            (Values::Utf8(v), Value::Utf8(s)) => v[row] = s,
            (Values::Utf8(v), Value::StrRef(r)) => v[row] = resolve_owned(r, reference)?,
            (Values::StringRef(v), Value::Utf8(s)) => v.set(row, &s)?,
            (Values::StringRef(v), Value::StrRef(r)) => v.set_ref(row, r, reference)?,
            (values, other) => {
                return Err(StreamError::element_mismatch(
                    values.element_type(),
                    other.type_name(),
                ));
            }
        }
        Ok(())
    }

    /// Append one value.
    pub fn push(&mut self, value: Value, reference: Option<&StringArena>) -> Result<()> {
        match (self, value) {
            (Values::Boolean(v), Value::Boolean(x)) => v.0.push(x),
            (Values::Int32(v), Value::Int32(x)) => v.0.push(x),
            (Values::Int64(v), Value::Int64(x)) => v.0.push(x),
            (Values::UInt32(v), Value::UInt32(x)) => v.0.push(x),
            (Values::UInt64(v), Value::UInt64(x)) => v.0.push(x),
            (Values::Float32(v), Value::Float32(x)) => v.0.push(x),
            (Values::Float64(v), Value::Float64(x)) => v.0.push(x),
            (Values::Utf8(v), Value::Utf8(s)) => v.push(s),
            (Values::Utf8(v), Value::StrRef(r)) => v.push(resolve_owned(r, reference)?),
            (Values::StringRef(v), Value::Utf8(s)) => v.push(&s),
            (Values::StringRef(v), Value::StrRef(r)) => v.push_ref(r, reference)?,
            (values, other) => {
                return Err(StreamError::element_mismatch(
                    values.element_type(),
                    other.type_name(),
                ));
            }
        }
        Ok(())
    }

    /// Append one default-valued slot, used beneath null validity entries.
    pub fn push_default(&mut self) {
        let len = self.len();
        self.resize(len + 1);
    }

    /// Append another value vector of the same element type.
    pub fn append(&mut self, other: Values) -> Result<()> {
        match (self, other) {
            (Values::Boolean(a), Values::Boolean(mut b)) => a.0.append(&mut b.0),
            (Values::Int32(a), Values::Int32(mut b)) => a.0.append(&mut b.0),
            (Values::Int64(a), Values::Int64(mut b)) => a.0.append(&mut b.0),
            (Values::UInt32(a), Values::UInt32(mut b)) => a.0.append(&mut b.0),
            (Values::UInt64(a), Values::UInt64(mut b)) => a.0.append(&mut b.0),
            (Values::Float32(a), Values::Float32(mut b)) => a.0.append(&mut b.0),
            (Values::Float64(a), Values::Float64(mut b)) => a.0.append(&mut b.0),
            (Values::Utf8(a), Values::Utf8(b)) => a.extend(b),
            (Values::StringRef(a), Values::StringRef(b)) => a.append(b)?,
            (a, b) => {
                return Err(StreamError::element_mismatch(
                    a.element_type(),
                    b.element_type().type_name(),
                ));
            }
        }
        Ok(())
    }
}

fn resolve_owned(r: StrRef, reference: Option<&StringArena>) -> Result<String> {
    reference
        .and_then(|arena| arena.resolve(r))
        .map(str::to_string)
        .ok_or(StreamError::StaleReference { arena: r.arena.get() })
}

/// Dictionary-encoded strings: `u32` codes into a value pool.
///
/// Code [`NULL_CODE`] marks a null or unwritten slot; pool entry `i` has
/// code `i + 1`.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    codes: Vec64<u32>,
    pool: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// `rows` unwritten slots.
    pub fn with_len(rows: usize) -> Self {
        Self {
            codes: vec64![NULL_CODE; rows],
            ..Self::default()
        }
    }

    /// Build from existing codes and pool, validating every code.
    pub fn from_parts(codes: Vec64<u32>, pool: Vec<String>) -> Result<Self> {
        if let Some(bad) = codes.0.iter().find(|&&c| c as usize > pool.len()) {
            return Err(StreamError::InputData(format!(
                "dictionary code {} exceeds pool of {} values",
                bad,
                pool.len()
            )));
        }
        let mut lookup = HashMap::with_capacity(pool.len());
        for (i, s) in pool.iter().enumerate() {
            lookup.entry(s.clone()).or_insert(i as u32 + 1);
        }
        Ok(Self { codes, pool, lookup })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn codes(&self) -> &[u32] {
        &self.codes.0[..]
    }

    #[inline]
    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    /// Value at `row`; `None` when null, unwritten or out of bounds.
    pub fn value(&self, row: usize) -> Option<&str> {
        match self.codes.0.get(row).copied() {
            None | Some(NULL_CODE) => None,
            Some(code) => self.pool.get(code as usize - 1).map(String::as_str),
        }
    }

    pub fn has_nulls(&self) -> bool {
        self.codes.0.iter().any(|&c| c == NULL_CODE)
    }

    /// Code for `s`, adding it to the pool on first sight.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&code) = self.lookup.get(s) {
            return code;
        }
        self.pool.push(s.to_string());
        let code = self.pool.len() as u32;
        self.lookup.insert(s.to_string(), code);
        code
    }

    pub fn push(&mut self, value: Option<&str>) {
        let code = value.map_or(NULL_CODE, |s| self.intern(s));
        self.codes.0.push(code);
    }

    pub fn set(&mut self, row: usize, value: Option<&str>) -> Result<()> {
        let len = self.len();
        if row >= len {
            return Err(StreamError::OutOfBounds { row, len });
        }
        let code = value.map_or(NULL_CODE, |s| self.intern(s));
        self.codes.0[row] = code;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.codes.0.clear();
        self.pool.clear();
        self.lookup.clear();
    }

    pub fn resize(&mut self, rows: usize) {
        self.codes.0.resize(rows, NULL_CODE);
    }

    /// Append another dictionary, merging its pool into this one and
    /// remapping its codes.
    pub fn append(&mut self, other: Dictionary) -> Result<()> {
        let remap: Vec<u32> = other.pool.iter().map(|s| self.intern(s)).collect();
        self.codes.0.reserve(other.len());
        for &code in other.codes.0.iter() {
            let mapped = match code {
                NULL_CODE => NULL_CODE,
                c => *remap.get(c as usize - 1).ok_or_else(|| {
                    StreamError::InputData(format!("dictionary code {} exceeds pool", c))
                })?,
            };
            self.codes.0.push(mapped);
        }
        Ok(())
    }
}

/// Storage for one destination column.
#[derive(Debug, Clone)]
pub enum Column {
    Dense(Values),
    Nullable { values: Values, validity: Vec64<bool> },
    Categorical(Dictionary),
    NullableCategorical(Dictionary),
}

impl Column {
    /// Build a column of `column_type` from a sequence of values.
    pub fn from_values<I>(column_type: &ColumnType, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut column = crate::models::allocator::allocate(column_type, 0, None);
        for v in values {
            column.push(v.into(), None)?;
        }
        Ok(column)
    }

    /// Nullable column from values and a validity vector (`true` = valid).
    pub fn nullable(values: Values, validity: Vec64<bool>) -> Result<Self> {
        if values.len() != validity.0.len() {
            return Err(StreamError::InputData(format!(
                "{} values but {} validity entries",
                values.len(),
                validity.0.len()
            )));
        }
        Ok(Column::Nullable { values, validity })
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Dense(v) => ColumnType::Primitive(v.element_type()),
            Column::Nullable { values, .. } => ColumnType::Nullable(values.element_type()),
            Column::Categorical(_) => ColumnType::Categorical,
            Column::NullableCategorical(_) => ColumnType::NullableCategorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Dense(v) => v.len(),
            Column::Nullable { validity, .. } => validity.0.len(),
            Column::Categorical(d) | Column::NullableCategorical(d) => d.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether slot `row` holds a value.
    pub fn is_valid(&self, row: usize) -> bool {
        match self {
            Column::Dense(v) => row < v.len(),
            Column::Nullable { validity, .. } => validity.0.get(row).copied().unwrap_or(false),
            Column::Categorical(d) | Column::NullableCategorical(d) => d.value(row).is_some(),
        }
    }

    /// Materialize slot `row`.
    pub fn get(&self, row: usize) -> Result<Value> {
        let len = self.len();
        if row >= len {
            return Err(StreamError::OutOfBounds { row, len });
        }
        match self {
            Column::Dense(v) => v.try_get(row),
            Column::Nullable { values, validity } => {
                if validity.0[row] {
                    values.try_get(row)
                } else {
                    Ok(Value::Null)
                }
            }
            Column::Categorical(d) | Column::NullableCategorical(d) => {
                Ok(d.value(row).map_or(Value::Null, |s| Value::Utf8(s.to_string())))
            }
        }
    }

    /// Materialize every slot.
    pub fn to_values(&self) -> Result<Vec<Value>> {
        (0..self.len()).map(|row| self.get(row)).collect()
    }

    /// Overwrite slot `row`.
    pub fn set(&mut self, row: usize, value: Value, reference: Option<&StringArena>) -> Result<()> {
        let column_type = self.column_type();
        match self {
            Column::Dense(values) => {
                if value.is_null() {
                    return Err(StreamError::NullInNonNullable(column_type));
                }
                values.set(row, value, reference)
            }
            Column::Nullable { values, validity } => {
                let len = validity.0.len();
                if row >= len {
                    return Err(StreamError::OutOfBounds { row, len });
                }
                let valid = !value.is_null();
                if valid {
                    values.set(row, value, reference)?;
                }
                validity.0[row] = valid;
                Ok(())
            }
            Column::Categorical(d) | Column::NullableCategorical(d) => {
                let text = category_text(&column_type, value, reference)?;
                d.set(row, text.as_deref())
            }
        }
    }

    /// Append one value.
    pub fn push(&mut self, value: Value, reference: Option<&StringArena>) -> Result<()> {
        let column_type = self.column_type();
        match self {
            Column::Dense(values) => {
                if value.is_null() {
                    return Err(StreamError::NullInNonNullable(column_type));
                }
                values.push(value, reference)
            }
            Column::Nullable { values, validity } => {
                if value.is_null() {
                    values.push_default();
                    validity.0.push(false);
                } else {
                    values.push(value, reference)?;
                    validity.0.push(true);
                }
                Ok(())
            }
            Column::Categorical(d) | Column::NullableCategorical(d) => {
                let text = category_text(&column_type, value, reference)?;
                d.push(text.as_deref());
                Ok(())
            }
        }
    }

    /// Reset to zero rows, keeping the column and its storage kind.
    pub fn clear(&mut self) {
        match self {
            Column::Dense(v) => v.clear(),
            Column::Nullable { values, validity } => {
                values.clear();
                validity.0.clear();
            }
            Column::Categorical(d) | Column::NullableCategorical(d) => d.clear(),
        }
    }

    /// Truncate, or extend with unwritten slots (null where nullable).
    pub fn resize(&mut self, rows: usize) {
        match self {
            Column::Dense(v) => v.resize(rows),
            Column::Nullable { values, validity } => {
                values.resize(rows);
                validity.0.resize(rows, false);
            }
            Column::Categorical(d) | Column::NullableCategorical(d) => d.resize(rows),
        }
    }

    /// Append a whole column of the same type.
    pub fn append(&mut self, other: Column) -> Result<()> {
        let column_type = self.column_type();
        match (self, other) {
            (Column::Dense(a), Column::Dense(b)) => a.append(b),
            (
                Column::Nullable { values, validity },
                Column::Nullable {
                    values: other_values,
                    validity: mut other_validity,
                },
            ) => {
                values.append(other_values)?;
                validity.0.append(&mut other_validity.0);
                Ok(())
            }
            (Column::Categorical(a), Column::Categorical(b)) => {
                if b.has_nulls() {
                    return Err(StreamError::NullInNonNullable(column_type));
                }
                a.append(b)
            }
            (Column::NullableCategorical(a), Column::NullableCategorical(b)) => a.append(b),
            (_, other) => Err(StreamError::type_mismatch(
                &column_type,
                other.column_type().to_string(),
            )),
        }
    }
}

fn category_text(
    column_type: &ColumnType,
    value: Value,
    reference: Option<&StringArena>,
) -> Result<Option<String>> {
    match value {
        Value::Null if column_type.is_nullable() => Ok(None),
        Value::Null => Err(StreamError::NullInNonNullable(column_type.clone())),
        Value::Utf8(s) => Ok(Some(s)),
        Value::StrRef(r) => resolve_owned(r, reference).map(Some),
        other => Err(StreamError::type_mismatch(column_type, other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_string_is_not_out_of_bounds() {
        let refs = RefStrings::from_offsets(StringArena::from_bytes(&[b'o', b'k', 0xff]), &[0, 2, 3])
            .unwrap();
        let col = Column::Dense(Values::StringRef(refs));
        assert_eq!(col.get(0).unwrap(), Value::from("ok"));
        assert!(matches!(col.get(1), Err(StreamError::InputData(_))));
        assert!(matches!(col.get(2), Err(StreamError::OutOfBounds { row: 2, len: 2 })));
    }

    #[test]
    fn test_dense_push_and_null_rejection() {
        let ty = ColumnType::Primitive(ElementType::Int64);
        let mut col = Column::from_values(&ty, [1i64, 2, 3]).unwrap();
        assert_eq!(col.len(), 3);
        assert_eq!(col.get(2).unwrap(), Value::Int64(3));
        let err = col.push(Value::Null, None).unwrap_err();
        assert!(matches!(err, StreamError::NullInNonNullable(_)));
        let err = col.push(Value::Int32(1), None).unwrap_err();
        assert!(matches!(err, StreamError::TypeMismatch { .. }));
    }

    #[test]
    fn test_nullable_resize_and_set() {
        let ty = ColumnType::Nullable(ElementType::Float64);
        let mut col = Column::from_values(&ty, [Some(1.5f64), None]).unwrap();
        assert_eq!(col.to_values().unwrap(), vec![Value::Float64(1.5), Value::Null]);
        col.resize(4);
        assert_eq!(col.get(3).unwrap(), Value::Null);
        col.set(3, Value::Float64(9.0), None).unwrap();
        assert!(col.is_valid(3));
        col.set(0, Value::Null, None).unwrap();
        assert!(!col.is_valid(0));
    }

    #[test]
    fn test_dictionary_append_merges_pools() {
        let ty = ColumnType::NullableCategorical;
        let mut a = Column::from_values(&ty, [Some("red"), None, Some("blue")]).unwrap();
        let b = Column::from_values(&ty, [Some("green"), Some("red"), None]).unwrap();
        a.append(b).unwrap();
        assert_eq!(
            a.to_values().unwrap(),
            vec![
                Value::from("red"),
                Value::Null,
                Value::from("blue"),
                Value::from("green"),
                Value::from("red"),
                Value::Null,
            ]
        );
        match &a {
            Column::NullableCategorical(d) => {
                assert_eq!(d.pool(), &["red", "blue", "green"]);
                assert_eq!(d.codes(), &[1, 0, 2, 3, 1, 0]);
            }
            _ => panic!("wrong storage"),
        }
    }

    #[test]
    fn test_categorical_rejects_nulls_on_append() {
        let mut a = Column::from_values(&ColumnType::Categorical, ["x"]).unwrap();
        let b = Column::Categorical(Dictionary::with_len(1));
        assert!(matches!(a.append(b), Err(StreamError::NullInNonNullable(_))));
    }

    #[test]
    fn test_append_type_mismatch() {
        let mut a = Column::from_values(&ColumnType::Primitive(ElementType::Int32), [1i32]).unwrap();
        let b = Column::from_values(&ColumnType::Nullable(ElementType::Int32), [Some(1i32)]).unwrap();
        assert!(matches!(a.append(b), Err(StreamError::TypeMismatch { .. })));
    }

    #[test]
    fn test_nullable_string_refs_append() {
        let ty = ColumnType::Nullable(ElementType::StringRef);
        let mut a = Column::from_values(&ty, [Some("left"), None]).unwrap();
        let b = Column::from_values(&ty, [None, Some("right")]).unwrap();
        a.append(b).unwrap();
        assert_eq!(
            a.to_values().unwrap(),
            vec![Value::from("left"), Value::Null, Value::Null, Value::from("right")]
        );
    }

    #[test]
    fn test_from_parts_validates_codes() {
        let err = Dictionary::from_parts(Vec64::from_slice(&[1u32, 3]), vec!["a".into()]);
        assert!(matches!(err, Err(StreamError::InputData(_))));
    }
}
