//! # Schema
//!
//! Column names, column types, row count and free-form metadata describing
//! one side of a transfer.
//!
//! Nullability is part of the column type rather than a separate flag, so two
//! schemas are stream-compatible exactly when their type sequences are equal.
//! Names, row counts and metadata are carried for callers but never compared.

use std::collections::BTreeMap;
use std::fmt;

use minarrow::ffi::arrow_dtype::CategoricalIndexType;
use minarrow::{ArrowType, Field};

use crate::enums::ColumnKind;
use crate::error::{Result, StreamError};

/// Element types a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Boolean,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Independently owned strings.
    Utf8,
    /// Strings stored as offset/length pairs into a shared byte arena.
    StringRef,
}

impl ElementType {
    pub fn type_name(self) -> &'static str {
        match self {
            ElementType::Boolean => "bool",
            ElementType::Int32 => "i32",
            ElementType::Int64 => "i64",
            ElementType::UInt32 => "u32",
            ElementType::UInt64 => "u64",
            ElementType::Float32 => "f32",
            ElementType::Float64 => "f64",
            ElementType::Utf8 => "utf8",
            ElementType::StringRef => "strref",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Declared type of a column.
///
/// Categorical columns are dictionary encoded over a pool of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Primitive(ElementType),
    Nullable(ElementType),
    Categorical,
    NullableCategorical,
}

impl ColumnType {
    /// Storage kind the allocator produces for this type.
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnType::Primitive(_) => ColumnKind::Primitive,
            ColumnType::Nullable(_) => ColumnKind::Nullable,
            ColumnType::Categorical => ColumnKind::Dictionary,
            ColumnType::NullableCategorical => ColumnKind::NullableDictionary,
        }
    }

    /// Element type of the values; categorical pools hold `Utf8`.
    pub fn element(&self) -> ElementType {
        match self {
            ColumnType::Primitive(e) | ColumnType::Nullable(e) => *e,
            ColumnType::Categorical | ColumnType::NullableCategorical => ElementType::Utf8,
        }
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.kind().is_nullable()
    }

    /// Map a Minarrow field descriptor onto a column type.
    ///
    /// Minarrow `String` columns are offset buffers over a data buffer and
    /// therefore map to [`ElementType::StringRef`].
    pub fn from_field(field: &Field) -> Result<Self> {
        let element = match &field.dtype {
            ArrowType::Boolean => ElementType::Boolean,
            ArrowType::Int32 => ElementType::Int32,
            ArrowType::Int64 => ElementType::Int64,
            ArrowType::UInt32 => ElementType::UInt32,
            ArrowType::UInt64 => ElementType::UInt64,
            ArrowType::Float32 => ElementType::Float32,
            ArrowType::Float64 => ElementType::Float64,
            ArrowType::String => ElementType::StringRef,
            ArrowType::Dictionary(CategoricalIndexType::UInt32) => {
                return Ok(if field.nullable {
                    ColumnType::NullableCategorical
                } else {
                    ColumnType::Categorical
                });
            }
            other => {
                return Err(StreamError::UnsupportedType(format!(
                    "{:?} (column '{}')",
                    other, field.name
                )));
            }
        };
        Ok(if field.nullable {
            ColumnType::Nullable(element)
        } else {
            ColumnType::Primitive(element)
        })
    }

    /// Minarrow data type and nullability for this column type.
    pub fn to_arrow(&self) -> (ArrowType, bool) {
        let dtype = match self {
            ColumnType::Categorical | ColumnType::NullableCategorical => {
                ArrowType::Dictionary(CategoricalIndexType::UInt32)
            }
            ColumnType::Primitive(e) | ColumnType::Nullable(e) => match e {
                ElementType::Boolean => ArrowType::Boolean,
                ElementType::Int32 => ArrowType::Int32,
                ElementType::Int64 => ArrowType::Int64,
                ElementType::UInt32 => ArrowType::UInt32,
                ElementType::UInt64 => ArrowType::UInt64,
                ElementType::Float32 => ArrowType::Float32,
                ElementType::Float64 => ArrowType::Float64,
                ElementType::Utf8 | ElementType::StringRef => ArrowType::String,
            },
        };
        (dtype, self.is_nullable())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Primitive(e) => write!(f, "{e}"),
            ColumnType::Nullable(e) => write!(f, "nullable<{e}>"),
            ColumnType::Categorical => f.write_str("categorical"),
            ColumnType::NullableCategorical => f.write_str("nullable<categorical>"),
        }
    }
}

/// Shape and typing of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    names: Vec<String>,
    types: Vec<ColumnType>,
    /// `None` when the row count is only discovered while streaming.
    n_rows: Option<usize>,
    metadata: BTreeMap<String, String>,
}

impl Schema {
    /// Build a schema, failing when names and types differ in length.
    pub fn new<N: Into<String>>(
        names: impl IntoIterator<Item = N>,
        types: Vec<ColumnType>,
        n_rows: Option<usize>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != types.len() {
            return Err(StreamError::InvalidSchema {
                names: names.len(),
                types: types.len(),
            });
        }
        Ok(Self {
            names,
            types,
            n_rows,
            metadata: BTreeMap::new(),
        })
    }

    /// Derive a schema from Minarrow field descriptors.
    pub fn from_fields(fields: &[Field], n_rows: Option<usize>) -> Result<Self> {
        let types = fields
            .iter()
            .map(ColumnType::from_field)
            .collect::<Result<Vec<_>>>()?;
        Self::new(fields.iter().map(|f| f.name.clone()), types, n_rows)
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    #[inline]
    pub fn n_rows(&self) -> Option<usize> {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.types.len()
    }

    /// `(row count, column count)`.
    #[inline]
    pub fn shape(&self) -> (Option<usize>, usize) {
        (self.n_rows, self.n_cols())
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn set_n_rows(&mut self, n_rows: Option<usize>) {
        self.n_rows = n_rows;
    }

    /// Stream compatibility: element-wise equality of the type sequences.
    pub fn is_compatible(&self, other: &Schema) -> bool {
        self.types == other.types
    }

    /// Minarrow field descriptors for this schema.
    pub fn to_fields(&self) -> Vec<Field> {
        self.names
            .iter()
            .zip(&self.types)
            .map(|(name, ty)| {
                let (dtype, nullable) = ty.to_arrow();
                Field::new(name.as_str(), dtype, nullable, None)
            })
            .collect()
    }
}
