mod common;

use common::{counter_schema, name_arena_len, people, Counter, FieldOnly, FieldSink};
use tablestream::models::streamers::field::stream_fields;
use tablestream::{
    stream, stream_into, ColumnTable, Column, Sink, Source, StreamError, StreamOptions,
    StreamType, Values,
};

#[test]
fn test_field_round_trip_5x2() {
    let table = people(
        &[1, 2, 3, 4, 5],
        &[Some("ada"), None, Some("bob"), Some(""), Some("cyd")],
    );
    let expected = table.rows().unwrap();
    let mut source = FieldOnly(table);

    let out = stream::<ColumnTable, _>(&mut source).unwrap();
    assert_eq!(out.summary.stream_type, StreamType::Field);
    assert_eq!(out.summary.rows_streamed, 5);
    assert_eq!(Sink::n_rows(&out.sink), 5);
    assert_eq!(Sink::schema(&out.sink).n_rows(), Some(5));
    assert_eq!(out.sink.rows().unwrap(), expected);
}

#[test]
fn test_field_refs_share_source_arena() {
    let mut source = FieldOnly(people(&[1, 2], &[Some("left"), Some("right")]));
    let shared = source.reference_buffer().unwrap();
    let out = stream::<ColumnTable, _>(&mut source).unwrap();
    match out.sink.column_at(1).unwrap() {
        Column::Nullable { values: Values::StringRef(refs), .. } => {
            assert!(refs.arena().shares_memory_with(&shared));
            assert_eq!(refs.get(1), Some("right"));
        }
        other => panic!("unexpected storage {:?}", other),
    }
}

#[test]
fn test_field_append_5_plus_3() {
    let mut sink = stream::<ColumnTable, _>(&mut FieldOnly(people(
        &[1, 2, 3, 4, 5],
        &[Some("a"), Some("b"), None, Some("d"), Some("e")],
    )))
    .unwrap()
    .sink;
    let before = sink.rows().unwrap();

    let extra = people(&[6, 7, 8], &[None, Some("g"), Some("h")]);
    let extra_rows = extra.rows().unwrap();
    let summary = stream_into(&mut FieldOnly(extra), &mut sink, StreamOptions::append()).unwrap();

    assert_eq!(summary.rows_streamed, 3);
    assert_eq!(Sink::n_rows(&sink), 8);
    let after = sink.rows().unwrap();
    assert_eq!(&after[..5], &before[..]);
    assert_eq!(&after[5..], &extra_rows[..]);
}

#[test]
fn test_field_overwrite_resizes_existing_sink() {
    let mut sink = people(&[1, 2, 3, 4], &[Some("a"), Some("b"), Some("c"), Some("d")]);
    let incoming = people(&[9, 8], &[Some("z"), None]);
    let expected = incoming.rows().unwrap();
    stream_into(&mut FieldOnly(incoming), &mut sink, StreamOptions::default()).unwrap();
    assert_eq!(sink.rows().unwrap(), expected);
}

#[test]
fn test_unknown_row_count_is_corrected() {
    let mut source = Counter::new(7);
    let out = stream::<ColumnTable, _>(&mut source).unwrap();

    assert_eq!(Sink::n_rows(&out.sink), 7);
    assert_eq!(out.summary.source_rows, Some(7));
    assert_eq!(source.corrected, Some(7));
    assert_eq!(source.schema().n_rows(), Some(7));
    for row in 0..7 {
        let got: Vec<_> = (0..2).map(|col| out.sink.value(row, col).unwrap()).collect();
        assert_eq!(got, Counter::expected(row));
    }
}

#[test]
fn test_unknown_row_count_append_counts_previous_rows() {
    let mut sink = stream::<ColumnTable, _>(&mut Counter::new(2)).unwrap().sink;
    let mut source = Counter::new(3);
    let summary = stream_into(&mut source, &mut sink, StreamOptions::append()).unwrap();
    assert_eq!(summary.rows_streamed, 3);
    assert_eq!(source.corrected, Some(5));
    assert_eq!(sink.value(4, 0).unwrap(), Counter::expected(2)[0]);
}

#[test]
fn test_unknown_row_count_overwrite_clears() {
    let mut sink = stream::<ColumnTable, _>(&mut Counter::new(6)).unwrap().sink;
    stream_into(&mut Counter::new(2), &mut sink, StreamOptions::overwrite()).unwrap();
    assert_eq!(Sink::n_rows(&sink), 2);
}

#[test]
fn test_empty_source_leaves_sinks_unchanged() {
    let out = stream::<ColumnTable, _>(&mut Counter::new(0)).unwrap();
    assert_eq!(Sink::n_rows(&out.sink), 0);
    assert_eq!(out.summary.rows_streamed, 0);

    let mut sink = stream::<ColumnTable, _>(&mut Counter::new(4)).unwrap().sink;
    let before = sink.rows().unwrap();
    for options in [StreamOptions::overwrite(), StreamOptions::append()] {
        let summary = stream_into(&mut Counter::new(0), &mut sink, options).unwrap();
        assert_eq!(summary.rows_streamed, 0);
        assert_eq!(sink.rows().unwrap(), before);
    }
}

#[test]
fn test_sink_preferring_fields() {
    let mut source = people(&[1, 2, 3], &[None, Some("x"), Some("y")]);
    let expected = source.rows().unwrap();
    let out = stream::<FieldSink, _>(&mut source).unwrap();
    assert_eq!(out.summary.stream_type, StreamType::Field);
    assert_eq!(out.sink.recorded, Some(3));
    let got: Vec<Vec<_>> = (0..3)
        .map(|row| out.sink.columns().iter().map(|c| c.get(row).unwrap()).collect())
        .collect();
    assert_eq!(got, expected);
}

#[test]
fn test_direct_streamer_requires_sized_sink() {
    let mut sink = ColumnTable::empty(&counter_schema());
    let mut source = FieldOnly(people(&[1], &[None]));
    let err = stream_fields(&mut source, &mut sink, false).unwrap_err();
    assert!(matches!(err, StreamError::SinkNotSized { required: 1, actual: 0 }));
}

#[test]
fn test_repeated_field_overwrite_keeps_arena_bounded() {
    let mut sink = people(&[1, 2, 3, 4], &[Some("a"), Some("b"), Some("c"), Some("d")]);
    for i in 0..100 {
        let mut source = FieldOnly(people(&[i], &[Some("0123456789")]));
        let summary = stream_into(&mut source, &mut sink, StreamOptions::overwrite()).unwrap();
        assert_eq!(summary.stream_type, StreamType::Field);
    }
    assert_eq!(Sink::n_rows(&sink), 1);
    assert_eq!(name_arena_len(&sink), 10);
}
