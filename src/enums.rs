use std::fmt;

/// Streaming granularity negotiated between a source and a sink.
///
/// Purely a dispatch discriminant: it decides which streamer drives the
/// transfer, and carries no data of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// The sink asks for one value at a `(row, column)` position at a time.
    Field,

    /// The sink asks for a whole column's worth of values at once.
    Column,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Field => f.write_str("field"),
            StreamType::Column => f.write_str("column"),
        }
    }
}

/// Storage kind of a column.
///
/// Every column type maps to exactly one kind, and the allocator and the
/// column append paths match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Dense sequence of values, no nulls.
    Primitive,

    /// Dense sequence of values plus a parallel validity vector.
    Nullable,

    /// Dictionary-encoded reference codes into a shared value pool.
    Dictionary,

    /// Dictionary-encoded, with code `0` reserved for null.
    NullableDictionary,
}

impl ColumnKind {
    /// Whether columns of this kind admit nulls.
    #[inline]
    pub fn is_nullable(self) -> bool {
        matches!(self, ColumnKind::Nullable | ColumnKind::NullableDictionary)
    }
}
