use crate::enums::StreamType;
use crate::error::Result;
use crate::models::types::column::Column;
use crate::models::types::schema::Schema;
use crate::models::types::string_arena::StringArena;

/// A consumer of tabular data that owns its column storage.
///
/// Streamers write straight into [`columns_mut`](Sink::columns_mut); the
/// sink only decides how it is built and how an existing instance is
/// prepared for another transfer.
pub trait Sink: Sized {
    /// Stream types this sink accepts, most preferred first.
    const STREAM_TYPES: &'static [StreamType];

    /// Build a fresh sink for `schema` with `rows` pre-sized slots per
    /// column. String-reference columns may share `shared` instead of
    /// copying it.
    fn from_schema(schema: &Schema, rows: usize, shared: Option<&StringArena>) -> Result<Self>;

    fn schema(&self) -> &Schema;

    fn columns(&self) -> &[Column];

    fn columns_mut(&mut self) -> &mut [Column];

    /// Record the row count after a transfer.
    fn set_row_count(&mut self, rows: usize);

    /// Current number of rows, taken from the first column.
    fn n_rows(&self) -> usize {
        self.columns().first().map_or(0, Column::len)
    }

    /// Prepare an existing sink to receive `incoming_rows` more rows.
    ///
    /// - `Column`, or `Field` with an unknown row count: columns are cleared
    ///   unless appending, and grow through appends.
    /// - `Field` with a known row count: every column is resized to the
    ///   existing rows (when appending) plus the incoming rows, so the
    ///   streamer can write absolute slots. Without appending the columns
    ///   are cleared first.
    fn prepare(&mut self, stream_type: StreamType, incoming_rows: Option<usize>, append: bool) -> Result<()> {
        match (stream_type, incoming_rows) {
            (StreamType::Field, Some(n)) => {
                let base = if append { self.n_rows() } else { 0 };
                for column in self.columns_mut() {
                    if !append {
                        column.clear();
                    }
                    column.resize(base + n);
                }
            }
            _ => {
                if !append {
                    for column in self.columns_mut() {
                        column.clear();
                    }
                }
            }
        }
        Ok(())
    }

    /// Hook run after a successful transfer.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
