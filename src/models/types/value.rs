//! Single field values exchanged in field-mode transfers.

use crate::models::types::schema::ElementType;
use crate::models::types::string_arena::StrRef;

/// One value at a `(row, column)` position.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    /// Reference into the producing source's string arena.
    StrRef(StrRef),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Element type the value belongs to; `None` for `Null`.
    /// String columns accept either string variant.
    pub fn element_type(&self) -> Option<ElementType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => ElementType::Boolean,
            Value::Int32(_) => ElementType::Int32,
            Value::Int64(_) => ElementType::Int64,
            Value::UInt32(_) => ElementType::UInt32,
            Value::UInt64(_) => ElementType::UInt64,
            Value::Float32(_) => ElementType::Float32,
            Value::Float64(_) => ElementType::Float64,
            Value::Utf8(_) => ElementType::Utf8,
            Value::StrRef(_) => ElementType::StringRef,
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self.element_type() {
            Some(e) => e.type_name(),
            None => "null",
        }
    }

    /// Borrow an owned string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_from!(
    bool => Boolean,
    i32 => Int32,
    i64 => Int64,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Utf8,
    StrRef => StrRef,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
