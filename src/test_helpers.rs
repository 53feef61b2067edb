//! # Test Helpers - *Column and Table Generators*
//!
//! Constructors for `minarrow` columns and tables plus a temporary CSV file
//! writer used by the unit tests. Each column generator returns a
//! deterministic 4-row fixture; together they span every Minarrow type the
//! column type system maps.

use std::io::Write;
use std::sync::Arc;

use minarrow::{
    ffi::arrow_dtype::CategoricalIndexType, Array, ArrowType, Bitmask, BooleanArray, Buffer,
    CategoricalArray, Field, FieldArray, FloatArray, IntegerArray, NumericArray, StringArray, Table,
    TextArray, Vec64,
};
use tempfile::NamedTempFile;

// -------------------- Column Generators -------------------- //

fn field(name: &str, dtype: ArrowType, nullable: bool) -> Field {
    Field {
        name: name.into(),
        dtype,
        nullable,
        metadata: Default::default(),
    }
}

/// Build a non-nullable `Int32` column: `[1, 2, 3, 4]`.
pub(crate) fn int32_col() -> FieldArray {
    FieldArray::new(
        field("int32", ArrowType::Int32, false),
        Array::NumericArray(NumericArray::Int32(Arc::new(IntegerArray {
            data: Buffer::from(Vec64::from_slice(&[1, 2, 3, 4])),
            null_mask: None,
        }))),
    )
}

/// Build a non-nullable `Int64` column: `[11, 12, 13, 14]`.
pub(crate) fn int64_col() -> FieldArray {
    FieldArray::new(
        field("int64", ArrowType::Int64, false),
        Array::NumericArray(NumericArray::Int64(Arc::new(IntegerArray {
            data: Buffer::from(Vec64::from_slice(&[11i64, 12, 13, 14])),
            null_mask: None,
        }))),
    )
}

/// Build a non-nullable `UInt32` column: `[21, 22, 23, 24]`.
pub(crate) fn uint32_col() -> FieldArray {
    FieldArray::new(
        field("uint32", ArrowType::UInt32, false),
        Array::NumericArray(NumericArray::UInt32(Arc::new(IntegerArray {
            data: Buffer::from(Vec64::from_slice(&[21u32, 22, 23, 24])),
            null_mask: None,
        }))),
    )
}

/// Build a nullable `UInt64` column: `[31, null, 33, 34]`.
pub(crate) fn uint64_col() -> FieldArray {
    FieldArray::new(
        field("uint64", ArrowType::UInt64, true),
        Array::NumericArray(NumericArray::UInt64(Arc::new(IntegerArray {
            data: Buffer::from(Vec64::from_slice(&[31u64, 0, 33, 34])),
            null_mask: Some(Bitmask::from_bools(&[true, false, true, true])),
        }))),
    )
}

/// Build a non-nullable `Float32` column: `[0.5, 1.5, 2.5, 3.5]`.
pub(crate) fn float32_col() -> FieldArray {
    FieldArray::new(
        field("float32", ArrowType::Float32, false),
        Array::NumericArray(NumericArray::Float32(Arc::new(FloatArray {
            data: Buffer::from(Vec64::from_slice(&[0.5f32, 1.5, 2.5, 3.5])),
            null_mask: None,
        }))),
    )
}

/// Build a non-nullable `Float64` column: `[1.1, 2.2, 3.3, 4.4]`.
pub(crate) fn float64_col() -> FieldArray {
    FieldArray::new(
        field("float64", ArrowType::Float64, false),
        Array::NumericArray(NumericArray::Float64(Arc::new(FloatArray {
            data: Buffer::from(Vec64::from_slice(&[1.1f64, 2.2, 3.3, 4.4])),
            null_mask: None,
        }))),
    )
}

/// Build a nullable `Boolean` column: `[true, null, true, false]`.
pub(crate) fn bool_col() -> FieldArray {
    FieldArray::new(
        field("bool", ArrowType::Boolean, true),
        Array::BooleanArray(Arc::new(BooleanArray::new(
            Bitmask::from_bools(&[true, false, true, false]),
            Some(Bitmask::from_bools(&[true, false, true, true])),
        ))),
    )
}

/// Build a nullable `String32` column: `["hell", "world", "ab", "c"]`.
pub(crate) fn string32_col() -> FieldArray {
    FieldArray::new(
        field("string32", ArrowType::String, true),
        Array::TextArray(TextArray::String32(Arc::new(StringArray {
            offsets: Buffer::from(Vec64::from_slice(&[0u32, 4, 9, 11, 12])),
            data: Buffer::from(Vec64::from_slice("hellworldabc".as_bytes())),
            null_mask: None,
        }))),
    )
}

/// Build a nullable `Dictionary32` column: `["banana", null, "pear", "banana"]`
/// over uniques `["apple", "banana", "pear"]`.
pub(crate) fn dict32_col() -> FieldArray {
    FieldArray::new(
        field("dict32", ArrowType::Dictionary(CategoricalIndexType::UInt32), true),
        Array::TextArray(TextArray::Categorical32(Arc::new(CategoricalArray {
            data: Buffer::from(Vec64::from_slice(&[1u32, 0, 2, 1])),
            unique_values: Vec64::from(vec![
                "apple".to_string(),
                "banana".to_string(),
                "pear".to_string(),
            ]),
            null_mask: Some(Bitmask::from_bools(&[true, false, true, true])),
        }))),
    )
}

// -------------------- Table Generators -------------------- //

/// One 4-row table holding every column generator above.
pub(crate) fn make_all_types_table() -> Table {
    let cols = vec![
        int32_col(),
        int64_col(),
        uint32_col(),
        uint64_col(),
        float32_col(),
        float64_col(),
        bool_col(),
        string32_col(),
        dict32_col(),
    ];
    Table {
        cols,
        n_rows: 4,
        name: "all_types".to_owned(),
    }
}

// -------------------- File Writers -------------------- //

/// Write `contents` to a temporary file and return the handle.
pub(crate) fn write_csv_fixture(contents: &str) -> NamedTempFile {
    let mut temp = NamedTempFile::new().expect("Failed to create NamedTempFile");
    temp.write_all(contents.as_bytes())
        .expect("Failed to write csv fixture");
    temp.flush().expect("Failed to flush csv fixture");
    temp
}
