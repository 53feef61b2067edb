//! # Dispatcher
//!
//! Entry points that move a [`Source`] into a [`Sink`]:
//!
//! 1. Negotiate a stream type from the sink's preference list.
//! 2. Check that source and sink column types agree.
//! 3. Return early when the source has no columns or no data.
//! 4. Build (or prepare) the sink and run the matching streamer.
//! 5. Record the resulting row count on the sink and run its `finish` hook.
//!
//! [`stream`] builds a fresh sink; [`stream_into`] reuses an existing one,
//! overwriting or appending according to [`StreamOptions`].

use tracing::debug;

use crate::enums::StreamType;
use crate::error::{Result, StreamError};
use crate::models::negotiate::negotiate;
use crate::models::streamers::column::stream_columns;
use crate::models::streamers::field::stream_fields;
use crate::models::streamers::progress::Progress;
use crate::models::types::schema::Schema;
use crate::traits::sink::Sink;
use crate::traits::source::Source;

/// Options for streaming into an existing sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOptions {
    /// Keep the sink's rows and add the source's after them.
    pub append: bool,
}

impl StreamOptions {
    pub fn append() -> Self {
        Self { append: true }
    }

    pub fn overwrite() -> Self {
        Self { append: false }
    }
}

/// What a transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub stream_type: StreamType,
    /// Rows pulled from the source.
    pub rows_streamed: usize,
    /// The source's row count after the transfer. Set by the streamer when
    /// the count had to be discovered, otherwise the schema's declared count.
    pub source_rows: Option<usize>,
}

/// A freshly built sink together with the transfer summary.
#[derive(Debug)]
pub struct Streamed<K> {
    pub sink: K,
    pub summary: StreamSummary,
}

/// Stream `source` into a new sink of type `K`.
///
/// Field transfers with a known row count pre-size the sink; everything else
/// starts from empty columns that grow by appends. String-reference columns
/// are built over the source's reference buffer when it exposes one.
pub fn stream<K, S>(source: &mut S) -> Result<Streamed<K>>
where
    K: Sink,
    S: Source + ?Sized,
{
    let stream_type = negotiate(source, K::STREAM_TYPES)?;
    let rows = match stream_type {
        StreamType::Field => source.schema().n_rows().unwrap_or(0),
        StreamType::Column => 0,
    };
    debug!(%stream_type, rows, cols = source.schema().n_cols(), "streaming into new sink");

    let shared = source.reference_buffer();
    let mut sink = K::from_schema(source.schema(), rows, shared.as_ref())?;
    check_compatible(source.schema(), sink.schema())?;

    if source_is_empty(source)? {
        return Ok(Streamed {
            sink,
            summary: empty_summary(stream_type, source.schema()),
        });
    }
    let summary = run(source, &mut sink, stream_type, false)?;
    Ok(Streamed { sink, summary })
}

/// Stream `source` into an existing `sink`.
///
/// An empty source leaves the sink untouched, whatever the options.
pub fn stream_into<K, S>(source: &mut S, sink: &mut K, options: StreamOptions) -> Result<StreamSummary>
where
    K: Sink,
    S: Source + ?Sized,
{
    let stream_type = negotiate(source, K::STREAM_TYPES)?;
    check_compatible(source.schema(), sink.schema())?;
    debug!(
        %stream_type,
        append = options.append,
        sink_rows = sink.n_rows(),
        source_rows = ?source.schema().n_rows(),
        "streaming into existing sink"
    );

    if source_is_empty(source)? {
        debug!("source is empty, sink left unchanged");
        return Ok(empty_summary(stream_type, source.schema()));
    }
    sink.prepare(stream_type, source.schema().n_rows(), options.append)?;
    run(source, sink, stream_type, options.append)
}

fn check_compatible(source: &Schema, sink: &Schema) -> Result<()> {
    if source.is_compatible(sink) {
        Ok(())
    } else {
        Err(StreamError::SchemaMismatch {
            source_schema: Box::new(source.clone()),
            sink_schema: Box::new(sink.clone()),
        })
    }
}

fn source_is_empty<S: Source + ?Sized>(source: &mut S) -> Result<bool> {
    Ok(source.schema().n_cols() == 0 || source.is_done(0, 0)?)
}

fn empty_summary(stream_type: StreamType, schema: &Schema) -> StreamSummary {
    StreamSummary {
        stream_type,
        rows_streamed: 0,
        source_rows: schema.n_rows(),
    }
}

fn run<K, S>(source: &mut S, sink: &mut K, stream_type: StreamType, append: bool) -> Result<StreamSummary>
where
    K: Sink,
    S: Source + ?Sized,
{
    let Progress { rows, source_rows } = match stream_type {
        StreamType::Field => stream_fields(source, sink, append)?,
        StreamType::Column => stream_columns(source, sink)?,
    };
    let total = sink.n_rows();
    sink.set_row_count(total);
    sink.finish()?;
    debug!(%stream_type, rows, total, "transfer complete");

    Ok(StreamSummary {
        stream_type,
        rows_streamed: rows,
        source_rows: source_rows.or(source.schema().n_rows()),
    })
}
