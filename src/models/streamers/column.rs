//! # Column Streamer
//!
//! Whole-column transfer for sources that hand over a column chunk at a
//! time. Each sweep requests every column once and appends the chunks to the
//! matching sink columns; sweeps repeat until the source reports it is done.
//!
//! String-reference chunks are appended through
//! [`RefStrings::append`](crate::models::types::string_arena::RefStrings::append),
//! which re-bases existing and incoming references onto the grown arena.

use tracing::trace;

use crate::error::{Result, StreamError};
use crate::models::streamers::progress::Progress;
use crate::traits::sink::Sink;
use crate::traits::source::Source;

/// Stream `source` into `sink` one column chunk at a time.
///
/// The sink's columns must already be prepared: cleared when overwriting,
/// left as they are when appending.
pub fn stream_columns<S, K>(source: &mut S, sink: &mut K) -> Result<Progress>
where
    S: Source + ?Sized,
    K: Sink,
{
    let types = source.schema().types().to_vec();
    if types.is_empty() {
        return Ok(Progress { rows: 0, source_rows: source.schema().n_rows() });
    }
    let previous = sink.n_rows();
    let last = types.len() - 1;
    let mut produced = 0;

    while !source.is_done(produced, last)? {
        let mut sweep: Option<usize> = None;
        for (col, ty) in types.iter().enumerate() {
            let chunk = source.column(ty, col)?;
            let chunk_type = chunk.column_type();
            if &chunk_type != ty {
                return Err(StreamError::type_mismatch(ty, chunk_type.to_string()));
            }
            let len = chunk.len();
            match sweep {
                None => sweep = Some(len),
                Some(expected) if expected != len => {
                    return Err(StreamError::RaggedColumns { col, len, expected });
                }
                Some(_) => {}
            }
            sink.columns_mut()[col].append(chunk)?;
        }

        let rows = sweep.unwrap_or(0);
        if rows == 0 {
            return Err(StreamError::StalledSource { row: produced });
        }
        produced += rows;
        trace!(chunk = rows, total = produced, "column sweep appended");
    }

    let corrected = previous + produced;
    source.set_row_count(corrected);
    Ok(Progress { rows: produced, source_rows: Some(corrected) })
}
