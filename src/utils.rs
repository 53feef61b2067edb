//! Conversions between Minarrow arrays and column storage.
//!
//! Minarrow keeps validity in a separate `Bitmask` (set = valid) and
//! dictionary codes as 0-based indices into `unique_values`. Column storage
//! keeps validity as one `bool` per row and reserves dictionary code `0` for
//! null, so both directions shift codes by one.

use std::sync::Arc;

use minarrow::{
    Array, Bitmask, BooleanArray, Buffer, CategoricalArray, FieldArray, FloatArray, IntegerArray,
    NumericArray, StringArray, TextArray, Vec64,
};

use crate::constants::{NULL_CODE, STRING_BYTES_HINT};
use crate::enums::ColumnKind;
use crate::error::{Result, StreamError};
use crate::models::types::column::{Column, Dictionary, Values};
use crate::models::types::schema::{ColumnType, ElementType};
use crate::models::types::string_arena::{RefStrings, StringArena};

/// Per-row validity from an optional null mask. A missing mask is all valid.
#[inline]
pub(crate) fn validity_from_mask(mask: Option<&Bitmask>, len: usize) -> Vec64<bool> {
    match mask {
        Some(m) => (0..len).map(|i| m.get(i)).collect(),
        None => minarrow::vec64![true; len],
    }
}

/// Null mask for per-row validity; `None` when every row is valid.
#[inline]
pub(crate) fn mask_from_validity(validity: &[bool]) -> Option<Bitmask> {
    if validity.iter().all(|&v| v) {
        None
    } else {
        Some(Bitmask::from_bools(validity))
    }
}

/// Convert one Minarrow column into storage for `column_type`.
///
/// String arrays keep their bytes as the column's arena, one reference per
/// row. Nulls reaching a non-nullable type fail with `NullInNonNullable`.
pub(crate) fn column_from_array(column_type: &ColumnType, col: &FieldArray) -> Result<Column> {
    let len = col.len();
    match column_type.kind() {
        ColumnKind::Dictionary | ColumnKind::NullableDictionary => {
            let dict = dictionary_from_array(&col.array, len)?;
            if column_type.kind() == ColumnKind::Dictionary {
                if dict.has_nulls() {
                    return Err(StreamError::NullInNonNullable(column_type.clone()));
                }
                Ok(Column::Categorical(dict))
            } else {
                Ok(Column::NullableCategorical(dict))
            }
        }
        ColumnKind::Primitive | ColumnKind::Nullable => {
            let (values, mask) = values_from_array(&col.array)?;
            let values = coerce_strings(values, column_type.element());
            if values.element_type() != column_type.element() {
                return Err(StreamError::type_mismatch(
                    column_type,
                    format!("{} array '{}'", values.element_type(), col.field.name),
                ));
            }
            let validity = validity_from_mask(mask, len);
            if column_type.kind() == ColumnKind::Primitive {
                if validity.0.iter().any(|&v| !v) {
                    return Err(StreamError::NullInNonNullable(column_type.clone()));
                }
                Ok(Column::Dense(values))
            } else {
                Column::nullable(values, validity)
            }
        }
    }
}

fn values_from_array(array: &Array) -> Result<(Values, Option<&Bitmask>)> {
    Ok(match array {
        Array::NumericArray(n) => match n {
            NumericArray::Int32(a) => (Values::Int32(Vec64::from_slice(&a.data[..])), a.null_mask.as_ref()),
            NumericArray::Int64(a) => (Values::Int64(Vec64::from_slice(&a.data[..])), a.null_mask.as_ref()),
            NumericArray::UInt32(a) => (Values::UInt32(Vec64::from_slice(&a.data[..])), a.null_mask.as_ref()),
            NumericArray::UInt64(a) => (Values::UInt64(Vec64::from_slice(&a.data[..])), a.null_mask.as_ref()),
            NumericArray::Float32(a) => (Values::Float32(Vec64::from_slice(&a.data[..])), a.null_mask.as_ref()),
            NumericArray::Float64(a) => (Values::Float64(Vec64::from_slice(&a.data[..])), a.null_mask.as_ref()),
            _ => return Err(StreamError::UnsupportedType("numeric array width".into())),
        },
        Array::BooleanArray(a) => {
            let bits = (0..a.len).map(|i| a.data.get(i)).collect();
            (Values::Boolean(bits), a.null_mask.as_ref())
        }
        Array::TextArray(TextArray::String32(a)) => {
            let arena = StringArena::from_bytes(&a.data[..]);
            let refs = RefStrings::from_offsets(arena, &a.offsets[..])?;
            (Values::StringRef(refs), a.null_mask.as_ref())
        }
        _ => return Err(StreamError::UnsupportedType("array variant".into())),
    })
}

/// Owned string columns read from Minarrow copy out of the string buffer.
fn coerce_strings(values: Values, element: ElementType) -> Values {
    match (values, element) {
        (Values::StringRef(refs), ElementType::Utf8) => {
            Values::Utf8(refs.iter().map(|s| s.unwrap_or_default().to_string()).collect())
        }
        (values, _) => values,
    }
}

fn dictionary_from_array(array: &Array, len: usize) -> Result<Dictionary> {
    match array {
        Array::TextArray(TextArray::Categorical32(a)) => {
            let valid = validity_from_mask(a.null_mask.as_ref(), len);
            let codes = (0..len)
                .map(|i| if valid.0[i] { a.data[i] + 1 } else { NULL_CODE })
                .collect();
            Dictionary::from_parts(codes, a.unique_values.iter().cloned().collect())
        }
        _ => Err(StreamError::UnsupportedType(
            "dictionary column backed by a non-categorical array".into(),
        )),
    }
}

/// Convert column storage into a Minarrow array.
pub(crate) fn column_to_array(column: &Column) -> Result<Array> {
    match column {
        Column::Dense(values) => values_to_array(values, None),
        Column::Nullable { values, validity } => {
            values_to_array(values, mask_from_validity(&validity.0[..]))
        }
        Column::Categorical(d) | Column::NullableCategorical(d) => {
            let valid: Vec<bool> = d.codes().iter().map(|&c| c != NULL_CODE).collect();
            let data: Vec64<u32> = d.codes().iter().map(|&c| c.saturating_sub(1)).collect();
            Ok(Array::TextArray(TextArray::Categorical32(Arc::new(CategoricalArray {
                data: Buffer::from(data),
                unique_values: Vec64::from(d.pool().to_vec()),
                null_mask: mask_from_validity(&valid),
            }))))
        }
    }
}

fn values_to_array(values: &Values, null_mask: Option<Bitmask>) -> Result<Array> {
    Ok(match values {
        Values::Boolean(v) => Array::BooleanArray(Arc::new(BooleanArray::new(
            Bitmask::from_bools(&v.0[..]),
            null_mask,
        ))),
        Values::Int32(v) => Array::NumericArray(NumericArray::Int32(Arc::new(IntegerArray {
            data: Buffer::from(v.clone()),
            null_mask,
        }))),
        Values::Int64(v) => Array::NumericArray(NumericArray::Int64(Arc::new(IntegerArray {
            data: Buffer::from(v.clone()),
            null_mask,
        }))),
        Values::UInt32(v) => Array::NumericArray(NumericArray::UInt32(Arc::new(IntegerArray {
            data: Buffer::from(v.clone()),
            null_mask,
        }))),
        Values::UInt64(v) => Array::NumericArray(NumericArray::UInt64(Arc::new(IntegerArray {
            data: Buffer::from(v.clone()),
            null_mask,
        }))),
        Values::Float32(v) => Array::NumericArray(NumericArray::Float32(Arc::new(FloatArray {
            data: Buffer::from(v.clone()),
            null_mask,
        }))),
        Values::Float64(v) => Array::NumericArray(NumericArray::Float64(Arc::new(FloatArray {
            data: Buffer::from(v.clone()),
            null_mask,
        }))),
        Values::Utf8(v) => string_array(v.iter().map(String::as_str), v.len(), null_mask)?,
        Values::StringRef(refs) => {
            string_array(refs.iter().map(Option::unwrap_or_default), refs.len(), null_mask)?
        }
    })
}

fn string_array<'a>(
    strings: impl Iterator<Item = &'a str>,
    len: usize,
    null_mask: Option<Bitmask>,
) -> Result<Array> {
    let mut offsets = Vec64::with_capacity(len + 1);
    let mut data = Vec64::with_capacity(len * STRING_BYTES_HINT);
    offsets.0.push(0u32);
    for s in strings {
        data.0.extend_from_slice(s.as_bytes());
        let end = u32::try_from(data.0.len()).map_err(|_| {
            StreamError::InputData("string column exceeds u32 offsets".into())
        })?;
        offsets.0.push(end);
    }
    Ok(Array::TextArray(TextArray::String32(Arc::new(StringArray {
        offsets: Buffer::from(offsets),
        data: Buffer::from(data),
        null_mask,
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::value::Value;
    use crate::test_helpers::{bool_col, dict32_col, int32_col, string32_col};

    #[test]
    fn test_numeric_round_trip() {
        let col = int32_col();
        let ty = ColumnType::Primitive(ElementType::Int32);
        let column = column_from_array(&ty, &col).unwrap();
        assert_eq!(column.get(3).unwrap(), Value::Int32(4));
        match column_to_array(&column).unwrap() {
            Array::NumericArray(NumericArray::Int32(a)) => {
                assert_eq!(&a.data[..], &[1, 2, 3, 4]);
                assert!(a.null_mask.is_none());
            }
            _ => panic!("wrong array"),
        }
    }

    #[test]
    fn test_bool_with_nulls() {
        let col = bool_col();
        let column = column_from_array(&ColumnType::Nullable(ElementType::Boolean), &col).unwrap();
        assert_eq!(
            column.to_values().unwrap(),
            vec![Value::Boolean(true), Value::Null, Value::Boolean(true), Value::Boolean(false)]
        );
        let err = column_from_array(&ColumnType::Primitive(ElementType::Boolean), &col);
        assert!(matches!(err, Err(StreamError::NullInNonNullable(_))));
    }

    #[test]
    fn test_strings_become_references() {
        let col = string32_col();
        let column = column_from_array(&ColumnType::Nullable(ElementType::StringRef), &col).unwrap();
        assert_eq!(column.get(1).unwrap(), Value::from("world"));

        let owned = column_from_array(&ColumnType::Nullable(ElementType::Utf8), &col).unwrap();
        assert_eq!(owned.get(0).unwrap(), Value::from("hell"));
    }

    #[test]
    fn test_dictionary_codes_shift() {
        let col = dict32_col();
        let column = column_from_array(&ColumnType::NullableCategorical, &col).unwrap();
        match &column {
            Column::NullableCategorical(d) => assert_eq!(d.codes(), &[2, 0, 3, 2]),
            _ => panic!("wrong storage"),
        }
        match column_to_array(&column).unwrap() {
            Array::TextArray(TextArray::Categorical32(a)) => {
                assert_eq!(&a.data[..], &[1, 0, 2, 1]);
                assert!(a.null_mask.as_ref().is_some_and(|m| !m.get(1)));
            }
            _ => panic!("wrong array"),
        }
    }

    #[test]
    fn test_type_disagreement() {
        let err = column_from_array(&ColumnType::Primitive(ElementType::Int64), &int32_col());
        assert!(matches!(err, Err(StreamError::TypeMismatch { .. })));
    }
}
