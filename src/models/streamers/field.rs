//! # Field Streamer
//!
//! Row-by-row, column-by-column transfer for sources that yield one value
//! per `(row, column)` call.
//!
//! - **Known row count**: the sink must already be sized to hold the
//!   incoming rows (see [`write_origin`]); each value overwrites an absolute
//!   slot.
//! - **Unknown row count**: rows are pulled until the source reports it is
//!   done, each value appended to its column. The source's row count is then
//!   corrected to the sink's previous rows plus the rows produced.

use tracing::trace;

use crate::error::{Result, StreamError};
use crate::models::streamers::progress::Progress;
use crate::traits::sink::Sink;
use crate::traits::source::Source;

/// First sink row a known-length field transfer writes to.
///
/// Appending requires the sink to hold at least `source_rows` rows, the new
/// ones at the end; overwriting requires exactly `source_rows`.
pub fn write_origin(sink_rows: usize, source_rows: usize, append: bool) -> Result<usize> {
    let sized = if append {
        sink_rows >= source_rows
    } else {
        sink_rows == source_rows
    };
    if !sized {
        return Err(StreamError::SinkNotSized {
            required: source_rows,
            actual: sink_rows,
        });
    }
    Ok(if append { sink_rows - source_rows } else { 0 })
}

/// Stream `source` into `sink` one field at a time.
pub fn stream_fields<S, K>(source: &mut S, sink: &mut K, append: bool) -> Result<Progress>
where
    S: Source + ?Sized,
    K: Sink,
{
    let types = source.schema().types().to_vec();
    if types.is_empty() {
        return Ok(Progress { rows: 0, source_rows: source.schema().n_rows() });
    }
    let reference = source.reference_buffer();

    match source.schema().n_rows() {
        Some(rows) => {
            let origin = write_origin(sink.n_rows(), rows, append)?;
            for row in 0..rows {
                for (col, ty) in types.iter().enumerate() {
                    let value = source.field(ty, row, col)?;
                    sink.columns_mut()[col].set(origin + row, value, reference.as_ref())?;
                }
            }
            trace!(rows, origin, "field transfer wrote known rows");
            Ok(Progress { rows, source_rows: None })
        }
        None => {
            let previous = sink.n_rows();
            let last = types.len() - 1;
            let mut row = 0;
            while !source.is_done(row, last)? {
                for (col, ty) in types.iter().enumerate() {
                    let value = source.field(ty, row, col)?;
                    sink.columns_mut()[col].push(value, reference.as_ref())?;
                }
                row += 1;
            }
            let corrected = previous + row;
            source.set_row_count(corrected);
            trace!(rows = row, corrected, "field transfer reached end of data");
            Ok(Progress { rows: row, source_rows: Some(corrected) })
        }
    }
}
