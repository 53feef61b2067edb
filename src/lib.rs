pub mod traits {
    pub mod sink;
    pub mod source;
}

pub mod models {
    pub mod types {
        pub mod column;
        pub mod schema;
        pub mod string_arena;
        pub mod value;
    }
    pub mod streamers {
        pub mod column;
        pub mod field;
        pub mod progress;
    }
    pub mod sources {
        pub mod csv_source;
        pub mod table_source;
    }
    pub mod tables {
        pub mod column_table;
    }
    pub mod allocator;
    pub mod dispatch;
    pub mod negotiate;
}

pub mod constants;
pub mod enums;
pub mod error;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use crate::enums::{ColumnKind, StreamType};
pub use crate::error::{Result, StreamError};
pub use crate::models::dispatch::{stream, stream_into, StreamOptions, StreamSummary, Streamed};
pub use crate::models::sources::csv_source::{CsvSource, CsvSourceOptions};
pub use crate::models::sources::table_source::TableSource;
pub use crate::models::tables::column_table::ColumnTable;
pub use crate::models::types::column::{Column, Dictionary, Values};
pub use crate::models::types::schema::{ColumnType, ElementType, Schema};
pub use crate::models::types::string_arena::{ArenaId, RefStrings, StrRef, StringArena};
pub use crate::models::types::value::Value;
pub use crate::traits::sink::Sink;
pub use crate::traits::source::Source;
